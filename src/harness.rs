//! Harness run orchestration
//!
//! One run: start the emulator, provision the queue, publish its address,
//! fan out the scenarios, tear the emulator down. Teardown happens on every
//! path once the emulator has started, including panics and interrupts;
//! setup errors are returned after it.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::emulator::{EmulatorInstance, EmulatorRuntime, EmulatorSpec, LifecycleManager};
use crate::queue::{create_queue, ClientConfiguration, QueueConnector, QueueEndpoint};
use crate::testing::{run_all, Scenario, ScenarioContext, ScenarioResult};

/// Settings of one harness run
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub emulator: EmulatorSpec,
    pub queue_name: String,
    pub region: String,
    /// Name of the queue address binding
    pub binding: String,
    /// Mirror the binding into the process environment
    pub export_env: bool,
    pub concurrent: bool,
}

impl HarnessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            emulator: config.emulator_spec(),
            queue_name: config.queue.name.clone(),
            region: config.queue.region.clone(),
            binding: config.binding.env_var.clone(),
            export_env: config.binding.export_env,
            concurrent: config.scenarios.concurrent,
        }
    }
}

/// Result of a completed harness run
#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub image: String,
    pub emulator_url: String,
    pub queue_address: String,
    pub results: Vec<ScenarioResult>,
}

impl HarnessReport {
    /// Whether every scenario passed
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }
}

/// Runs scenarios against a disposable emulator
pub struct Harness {
    lifecycle: LifecycleManager,
    connector: Arc<dyn QueueConnector>,
    options: HarnessOptions,
}

impl Harness {
    pub fn new(
        runtime: Arc<dyn EmulatorRuntime>,
        connector: Arc<dyn QueueConnector>,
        options: HarnessOptions,
    ) -> Self {
        Self {
            lifecycle: LifecycleManager::new(runtime),
            connector,
            options,
        }
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    /// Execute one full run
    ///
    /// Scenarios are validated before anything is started. Startup and
    /// provisioning failures abort the run; scenario failures are reported in
    /// the returned report.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> Result<HarnessReport> {
        self.run_until(scenarios, std::future::pending()).await
    }

    /// Execute one full run, abandoning it when `shutdown` completes
    ///
    /// An interrupted run still withdraws the binding and stops the emulator
    /// before returning [`Error::Interrupted`]. A panic during setup or the
    /// scenario phase is re-raised after the same teardown.
    pub async fn run_until<F>(&self, scenarios: Vec<Scenario>, shutdown: F) -> Result<HarnessReport>
    where
        F: Future<Output = ()>,
    {
        if scenarios.is_empty() {
            return Err(Error::Config("no scenarios to run".to_string()));
        }
        for scenario in &scenarios {
            scenario.validate()?;
        }

        tokio::pin!(shutdown);

        // Dropping a half-started emulator releases it through its own handle
        let mut instance = tokio::select! {
            started = self.lifecycle.start(&self.options.emulator) => started?,
            () = &mut shutdown => {
                return Err(Error::Interrupted("emulator startup".to_string()));
            }
        };
        let endpoint = Arc::new(QueueEndpoint::new(
            self.options.binding.clone(),
            self.options.export_env,
        ));

        let exercise =
            AssertUnwindSafe(self.exercise(&instance, endpoint.clone(), scenarios)).catch_unwind();
        let outcome = tokio::select! {
            outcome = exercise => outcome,
            () = &mut shutdown => {
                tracing::warn!("Interrupted, tearing down emulator");
                Ok(Err(Error::Interrupted("scenario run".to_string())))
            }
        };

        endpoint.withdraw();
        let teardown = instance.stop().await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                if let Err(stop_err) = teardown {
                    tracing::warn!(error = %stop_err, "Teardown failed after panic");
                }
                std::panic::resume_unwind(panic);
            }
        };

        match (outcome, teardown) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stop_err)) => {
                tracing::warn!(error = %stop_err, "Teardown failed after aborted run");
                Err(e)
            }
        }
    }

    async fn exercise(
        &self,
        instance: &EmulatorInstance,
        endpoint: Arc<QueueEndpoint>,
        scenarios: Vec<Scenario>,
    ) -> Result<HarnessReport> {
        let emulator_url = instance.endpoint_url()?;
        let queue_name = &self.options.queue_name;

        let client = self
            .connector
            .connect(&ClientConfiguration::emulator(
                &self.options.region,
                &emulator_url,
            ))
            .await
            .map_err(|e| Error::provision(queue_name, e))?;

        let address = create_queue(client.as_ref(), queue_name).await?;
        endpoint.publish(address.clone())?;

        let ctx = Arc::new(ScenarioContext {
            connector: self.connector.clone(),
            endpoint,
            region: self.options.region.clone(),
            emulator_url: emulator_url.clone(),
        });

        tracing::info!(
            count = scenarios.len(),
            concurrent = self.options.concurrent,
            "Running scenarios"
        );
        let results = run_all(ctx, scenarios, self.options.concurrent).await;

        Ok(HarnessReport {
            image: instance.image().to_string(),
            emulator_url,
            queue_address: address.to_string(),
            results,
        })
    }
}
