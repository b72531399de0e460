//! Docker-backed emulator runtime using testcontainers

use async_trait::async_trait;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use crate::common::{Error, Result};

use super::{EmulatorRuntime, EmulatorSpec, LogStream, RunningEmulator};

/// Launches emulators as local Docker containers
///
/// Readiness is not delegated to testcontainers; the lifecycle manager reads
/// the log stream itself so the timeout and pattern stay under its control.
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerRuntime;

impl DockerRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmulatorRuntime for DockerRuntime {
    async fn launch(&self, spec: &EmulatorSpec) -> Result<Box<dyn RunningEmulator>> {
        let image_ref = spec.image_ref();

        let image = GenericImage::new(spec.image.clone(), spec.tag.clone())
            .with_exposed_port(spec.port.tcp());
        let mut request = image.with_startup_timeout(spec.startup_timeout);
        for (key, value) in &spec.env {
            request = request.with_env_var(key.clone(), value.clone());
        }

        let container = request
            .start()
            .await
            .map_err(|e| Error::emulator_launch(&image_ref, e))?;

        // Dropping the container on these error paths removes it
        let host = container
            .get_host()
            .await
            .map_err(|e| Error::emulator_launch(&image_ref, e))?
            .to_string();
        let host_port = container
            .get_host_port_ipv4(spec.port.tcp())
            .await
            .map_err(|e| Error::emulator_launch(&image_ref, e))?;

        let id = container.id().to_string();
        tracing::debug!(container = %id, host = %host, host_port, "Container launched");

        Ok(Box::new(DockerEmulator {
            id,
            host,
            host_port,
            container: Some(container),
        }))
    }
}

/// A launched Docker container
struct DockerEmulator {
    id: String,
    host: String,
    host_port: u16,
    container: Option<ContainerAsync<GenericImage>>,
}

#[async_trait]
impl RunningEmulator for DockerEmulator {
    fn id(&self) -> &str {
        &self.id
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn host_port(&self) -> u16 {
        self.host_port
    }

    fn logs(&self) -> Result<LogStream> {
        match &self.container {
            Some(container) => Ok(container.stdout(true)),
            None => Err(Error::EmulatorNotRunning("terminated".to_string())),
        }
    }

    async fn terminate(&mut self) -> Result<()> {
        match self.container.take() {
            Some(container) => container
                .rm()
                .await
                .map_err(|e| Error::Teardown(format!("container {}: {}", self.id, e))),
            None => Ok(()),
        }
    }
}
