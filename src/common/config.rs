//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;
use crate::emulator::EmulatorSpec;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Emulator container settings
    #[serde(default)]
    pub emulator: EmulatorConfig,

    /// Queue provisioning settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Queue address binding settings
    #[serde(default)]
    pub binding: BindingConfig,

    /// Scenario execution settings
    #[serde(default)]
    pub scenarios: ScenarioConfig,
}

/// Emulator container settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmulatorConfig {
    /// Container image name
    #[serde(default = "default_image")]
    pub image: String,

    /// Container image tag
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Port the emulator listens on inside the container
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log line substring signalling that the emulator accepts requests
    #[serde(default = "default_readiness_pattern")]
    pub readiness_pattern: String,

    /// Maximum time to wait for the readiness line
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Extra container environment, merged over the built-in variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            tag: default_tag(),
            port: default_port(),
            readiness_pattern: default_readiness_pattern(),
            startup_timeout_secs: default_startup_timeout(),
            env: BTreeMap::new(),
        }
    }
}

fn default_image() -> String {
    "localstack/localstack".to_string()
}
fn default_tag() -> String {
    "latest".to_string()
}
fn default_port() -> u16 {
    4566
}
fn default_readiness_pattern() -> String {
    "Ready.".to_string()
}
fn default_startup_timeout() -> u64 {
    120
}

/// Queue provisioning settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Name of the queue created inside the emulator
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Region used by the emulator and every client
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            region: default_region(),
        }
    }
}

fn default_queue_name() -> String {
    "notificacao-sqs".to_string()
}
fn default_region() -> String {
    "us-east-1".to_string()
}

/// Queue address binding settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    /// Name of the binding holding the queue address
    #[serde(default = "default_env_var")]
    pub env_var: String,

    /// Also export the address to the process environment
    #[serde(default = "default_export_env")]
    pub export_env: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            export_env: default_export_env(),
        }
    }
}

fn default_env_var() -> String {
    "AWS_ENDPOINT".to_string()
}
fn default_export_env() -> bool {
    true
}

/// Scenario execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Run scenarios as concurrent tasks instead of one after another
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,

    /// Body sent by the built-in scenarios
    #[serde(default = "default_message_body")]
    pub message_body: String,

    /// Batch size of the built-in receive scenario
    #[serde(default = "default_receive_max")]
    pub receive_max_messages: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            concurrent: default_concurrent(),
            message_body: default_message_body(),
            receive_max_messages: default_receive_max(),
        }
    }
}

fn default_concurrent() -> bool {
    true
}
fn default_message_body() -> String {
    "Ola".to_string()
}
fn default_receive_max() -> u32 {
    2
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| super::Error::Config(e.to_string()))
    }

    /// Build the emulator launch settings
    ///
    /// The container gets SQS service selection, the queue region and dummy
    /// credentials; `[emulator.env]` entries override these.
    pub fn emulator_spec(&self) -> EmulatorSpec {
        let mut env = BTreeMap::new();
        env.insert("SERVICES".to_string(), "sqs".to_string());
        env.insert("DEFAULT_REGION".to_string(), self.queue.region.clone());
        env.insert("AWS_ACCESS_KEY_ID".to_string(), "test".to_string());
        env.insert("AWS_SECRET_ACCESS_KEY".to_string(), "test".to_string());
        env.extend(self.emulator.env.clone());

        EmulatorSpec {
            image: self.emulator.image.clone(),
            tag: self.emulator.tag.clone(),
            port: self.emulator.port,
            env,
            readiness_pattern: self.emulator.readiness_pattern.clone(),
            startup_timeout: Duration::from_secs(self.emulator.startup_timeout_secs),
        }
    }
}
