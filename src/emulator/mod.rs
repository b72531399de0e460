//! Disposable emulator containers
//!
//! The lifecycle manager launches an emulator through an [`EmulatorRuntime`],
//! gates on a readiness line in the container log, and tears it down exactly
//! once. [`DockerRuntime`] is the production runtime.

mod docker;
mod lifecycle;
mod readiness;

use std::collections::BTreeMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

use crate::common::Result;

pub use docker::DockerRuntime;
pub use lifecycle::{EmulatorInstance, EmulatorState, LifecycleManager};
pub use readiness::await_log_line;

/// Line-oriented log output of a running emulator
pub type LogStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// Everything needed to launch one emulator container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorSpec {
    /// Image name, e.g. `localstack/localstack`
    pub image: String,
    /// Image tag
    pub tag: String,
    /// Container port to expose on the host
    pub port: u16,
    /// Container environment (service selection, region, dummy credentials)
    pub env: BTreeMap<String, String>,
    /// Substring of a log line that marks the emulator as ready
    pub readiness_pattern: String,
    /// How long to wait for the readiness line
    pub startup_timeout: Duration,
}

impl EmulatorSpec {
    /// Full image reference (`name:tag`)
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// Starts emulator containers
#[async_trait]
pub trait EmulatorRuntime: Send + Sync {
    /// Launch a container for `spec` without waiting for readiness
    async fn launch(&self, spec: &EmulatorSpec) -> Result<Box<dyn RunningEmulator>>;
}

/// Handle to a launched emulator container
#[async_trait]
pub trait RunningEmulator: Send + Sync {
    /// Container identifier
    fn id(&self) -> &str;

    /// Host the exposed port is reachable on
    fn host(&self) -> &str;

    /// Host port mapped to the container port
    fn host_port(&self) -> u16;

    /// Follow the container's stdout
    fn logs(&self) -> Result<LogStream>;

    /// Stop and remove the container
    async fn terminate(&mut self) -> Result<()>;
}
