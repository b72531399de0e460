//! Error types for the queue harness
//!
//! Setup errors (startup, provisioning, propagation ordering) abort a run.
//! Operation errors are recovered into scenario results so a scenario can
//! assert on them.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the queue harness
#[derive(Error, Debug)]
pub enum Error {
    // === Emulator Startup Errors ===
    #[error("Failed to launch emulator '{image}': {reason}")]
    EmulatorLaunch { image: String, reason: String },

    #[error("Emulator did not log '{pattern}' within {secs} seconds")]
    ReadinessTimeout { pattern: String, secs: u64 },

    #[error("Emulator log stream closed before readiness: {0}")]
    LogStreamClosed(String),

    #[error("Emulator is not running (state: {0})")]
    EmulatorNotRunning(String),

    #[error("Failed to terminate emulator: {0}")]
    Teardown(String),

    // === Provisioning Errors ===
    #[error("Failed to create queue '{name}': {reason}")]
    Provision { name: String, reason: String },

    // === Propagation Errors ===
    #[error("Queue address not published to '{0}'. Provision the queue before running scenarios")]
    NotPublished(String),

    #[error("Queue address already published to '{0}'")]
    AlreadyPublished(String),

    // === Queue Operation Errors ===
    #[error("{operation} failed: {message}")]
    Operation { operation: String, message: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    // === Run Control ===
    #[error("Interrupted during {0}; emulator released")]
    Interrupted(String),
}

impl Error {
    /// Create an emulator launch error
    pub fn emulator_launch(image: &str, reason: impl std::fmt::Display) -> Self {
        Self::EmulatorLaunch {
            image: image.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a provisioning error
    pub fn provision(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Provision {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a queue operation error
    pub fn operation(operation: &str, message: impl std::fmt::Display) -> Self {
        Self::Operation {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error means the emulator never became usable
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Error::EmulatorLaunch { .. } | Error::ReadinessTimeout { .. } | Error::LogStreamClosed(_)
        )
    }

    /// Stable error code for reports
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmulatorLaunch { .. }
            | Error::ReadinessTimeout { .. }
            | Error::LogStreamClosed(_) => "STARTUP",
            Error::EmulatorNotRunning(_) => "EMULATOR_NOT_RUNNING",
            Error::Teardown(_) => "TEARDOWN",
            Error::Provision { .. } => "PROVISION",
            Error::NotPublished(_) => "NOT_PUBLISHED",
            Error::AlreadyPublished(_) => "ALREADY_PUBLISHED",
            Error::Operation { .. } => "OPERATION",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG",
            Error::TestAssertion(_) => "ASSERTION",
            Error::ScenariosFailed { .. } => "SCENARIOS_FAILED",
            Error::Interrupted(_) => "INTERRUPTED",
            _ => "INTERNAL_ERROR",
        }
    }
}
