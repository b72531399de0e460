//! Emulator lifecycle management
//!
//! `start` only returns an instance once the readiness line was seen. Every
//! instance must be stopped; `stop` is idempotent.

use std::fmt;
use std::sync::Arc;

use crate::common::{Error, Result};

use super::readiness::await_log_line;
use super::{EmulatorRuntime, EmulatorSpec, RunningEmulator};

/// Lifecycle state of an emulator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorState {
    Starting,
    Ready,
    Terminated,
}

impl fmt::Display for EmulatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorState::Starting => write!(f, "starting"),
            EmulatorState::Ready => write!(f, "ready"),
            EmulatorState::Terminated => write!(f, "terminated"),
        }
    }
}

/// One running emulator container
pub struct EmulatorInstance {
    image: String,
    container_port: u16,
    handle: Box<dyn RunningEmulator>,
    state: EmulatorState,
}

impl EmulatorInstance {
    /// Image reference the container was started from
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Container identifier
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    /// Current lifecycle state
    pub fn state(&self) -> EmulatorState {
        self.state
    }

    /// Exposed port mapping as (container port, host port)
    pub fn port_mapping(&self) -> (u16, u16) {
        (self.container_port, self.handle.host_port())
    }

    /// Base URL clients use to reach the emulator
    ///
    /// Only available while the instance is ready.
    pub fn endpoint_url(&self) -> Result<String> {
        if self.state != EmulatorState::Ready {
            return Err(Error::EmulatorNotRunning(self.state.to_string()));
        }
        Ok(format!(
            "http://{}:{}",
            self.handle.host(),
            self.handle.host_port()
        ))
    }

    /// Terminate the container
    ///
    /// The first call releases the container; later calls do nothing.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == EmulatorState::Terminated {
            return Ok(());
        }

        tracing::debug!(container = %self.handle.id(), state = %self.state, "Stopping emulator");
        // Marked terminated even when removal fails so teardown is never attempted twice
        self.state = EmulatorState::Terminated;
        self.handle.terminate().await?;
        tracing::info!(container = %self.handle.id(), "Emulator stopped");
        Ok(())
    }
}

impl fmt::Debug for EmulatorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorInstance")
            .field("image", &self.image)
            .field("id", &self.handle.id())
            .field("port_mapping", &self.port_mapping())
            .field("state", &self.state)
            .finish()
    }
}

/// Starts emulator instances and gates them on readiness
#[derive(Clone)]
pub struct LifecycleManager {
    runtime: Arc<dyn EmulatorRuntime>,
}

impl LifecycleManager {
    pub fn new(runtime: Arc<dyn EmulatorRuntime>) -> Self {
        Self { runtime }
    }

    /// Launch an emulator and block until it logs the readiness pattern
    ///
    /// On timeout the launched container is terminated before the error is
    /// returned.
    pub async fn start(&self, spec: &EmulatorSpec) -> Result<EmulatorInstance> {
        let image = spec.image_ref();
        tracing::info!(image = %image, port = spec.port, "Starting emulator");

        let handle = self.runtime.launch(spec).await?;
        let mut instance = EmulatorInstance {
            image,
            container_port: spec.port,
            handle,
            state: EmulatorState::Starting,
        };

        let readiness = match instance.handle.logs() {
            Ok(logs) => {
                await_log_line(logs, &spec.readiness_pattern, spec.startup_timeout).await
            }
            Err(e) => Err(e),
        };

        match readiness {
            Ok(line) => {
                instance.state = EmulatorState::Ready;
                tracing::info!(
                    container = %instance.id(),
                    host_port = instance.handle.host_port(),
                    line = %line,
                    "Emulator ready"
                );
                Ok(instance)
            }
            Err(e) => {
                tracing::warn!(container = %instance.id(), error = %e, "Emulator failed to become ready");
                if let Err(stop_err) = instance.stop().await {
                    tracing::warn!(error = %stop_err, "Failed to release emulator after startup failure");
                }
                Err(e)
            }
        }
    }
}
