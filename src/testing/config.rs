//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files and the
//! built-in scenario set.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Error, Result};

/// Upper bound of one receive batch on SQS
pub const MAX_RECEIVE_BATCH: u32 = 10;

/// A file containing one or more scenarios
#[derive(Deserialize, Debug)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

/// One independent send (and optionally receive) test case
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Which client configuration sends the message
    #[serde(default)]
    pub client: ClientProfile,
    /// Queue URL to send to; the published address when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_url: Option<String>,
    /// Message body
    #[serde(default = "default_body")]
    pub body: String,
    /// Expected outcome of the send
    #[serde(default)]
    pub expect: Expectation,
    /// Receive check run after a successful send
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive: Option<ReceiveCheck>,
}

fn default_body() -> String {
    "Ola".to_string()
}

/// Client configuration variant used by a scenario
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientProfile {
    /// Routed to the running emulator
    #[default]
    Emulator,
    /// Malformed endpoint, every request fails
    Broken,
}

/// Expected outcome of a scenario's send
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    #[default]
    Success,
    Failure,
}

/// Receive step following the send
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReceiveCheck {
    /// Maximum number of messages to receive
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
}

fn default_max_messages() -> u32 {
    2
}

impl Scenario {
    /// Check the scenario can run at all
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("scenario name must not be empty".to_string()));
        }
        if self.body.is_empty() {
            return Err(Error::Config(format!(
                "scenario '{}': message body must not be empty",
                self.name
            )));
        }
        if let Some(receive) = &self.receive {
            if receive.max_messages == 0 || receive.max_messages > MAX_RECEIVE_BATCH {
                return Err(Error::Config(format!(
                    "scenario '{}': max_messages must be between 1 and {}, got {}",
                    self.name, MAX_RECEIVE_BATCH, receive.max_messages
                )));
            }
            if self.expect == Expectation::Failure {
                return Err(Error::Config(format!(
                    "scenario '{}': a receive check needs a send that is expected to succeed",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Built-in scenarios: successful send, forced failure, send then receive
pub fn builtin_scenarios(body: &str, receive_max: u32) -> Vec<Scenario> {
    vec![
        Scenario {
            name: "send-success".to_string(),
            description: Some("Send to the provisioned queue through the emulator".to_string()),
            client: ClientProfile::Emulator,
            queue_url: None,
            body: body.to_string(),
            expect: Expectation::Success,
            receive: None,
        },
        Scenario {
            name: "send-error".to_string(),
            description: Some("Send through a malformed endpoint must fail".to_string()),
            client: ClientProfile::Broken,
            queue_url: Some(crate::queue::BROKEN_ENDPOINT.to_string()),
            body: body.to_string(),
            expect: Expectation::Failure,
            receive: None,
        },
        Scenario {
            name: "send-receive".to_string(),
            description: Some("Send, then receive the message back in a bounded batch".to_string()),
            client: ClientProfile::Emulator,
            queue_url: None,
            body: body.to_string(),
            expect: Expectation::Success,
            receive: Some(ReceiveCheck {
                max_messages: receive_max,
            }),
        },
    ]
}

/// Load and validate the scenarios of a YAML file
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    parse_scenarios(&content).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse and validate scenarios from YAML text
pub fn parse_scenarios(content: &str) -> Result<Vec<Scenario>> {
    let file: ScenarioFile = serde_yaml::from_str(content)
        .map_err(|e| Error::Config(format!("Failed to parse scenarios: {}", e)))?;

    for scenario in &file.scenarios {
        scenario.validate()?;
    }
    Ok(file.scenarios)
}
