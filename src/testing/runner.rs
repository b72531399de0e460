//! Scenario runner implementation
//!
//! Executes scenarios against the queue service and turns every operation
//! error into a result value, so an expected failure can be asserted on and
//! an unexpected one is reported instead of aborting the run.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinError;

use crate::common::Error;
use crate::queue::{ClientConfiguration, QueueConnector, QueueEndpoint, ReceivedMessage};

use super::config::{ClientProfile, Expectation, Scenario};

/// Everything a scenario needs from the harness
pub struct ScenarioContext {
    /// Builds clients for each scenario's configuration
    pub connector: Arc<dyn QueueConnector>,
    /// Published queue address
    pub endpoint: Arc<QueueEndpoint>,
    /// Region every client uses
    pub region: String,
    /// Base URL of the ready emulator
    pub emulator_url: String,
}

/// Step of a scenario that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving the target or building the client
    Setup,
    Send,
    Receive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Send => write!(f, "send"),
            Stage::Receive => write!(f, "receive"),
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub expect: Expectation,
    pub passed: bool,
    /// Step that failed, when the scenario did not pass
    pub failed_stage: Option<Stage>,
    /// Failure reason, or the operation error an expected-failure scenario observed
    pub error: Option<String>,
    pub message_id: Option<String>,
    /// Messages returned by the receive step
    pub received: Vec<ReceivedMessage>,
    pub elapsed_ms: u64,
}

impl ScenarioResult {
    fn new(name: &str, expect: Expectation) -> Self {
        Self {
            name: name.to_string(),
            expect,
            passed: false,
            failed_stage: None,
            error: None,
            message_id: None,
            received: Vec::new(),
            elapsed_ms: 0,
        }
    }

    fn panicked(name: &str, expect: Expectation, err: JoinError) -> Self {
        let mut result = Self::new(name, expect);
        result.failed_stage = Some(Stage::Setup);
        result.error = Some(format!("scenario task aborted: {}", err));
        result
    }
}

/// Run one scenario
pub async fn run_scenario(ctx: &ScenarioContext, scenario: &Scenario) -> ScenarioResult {
    let started = Instant::now();
    let mut result = ScenarioResult::new(&scenario.name, scenario.expect);

    match execute(ctx, scenario, &mut result).await {
        Ok(()) => result.passed = true,
        Err((stage, e)) => {
            result.failed_stage = Some(stage);
            result.error = Some(e.to_string());
        }
    }

    result.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::debug!(
        scenario = %result.name,
        passed = result.passed,
        elapsed_ms = result.elapsed_ms,
        "Scenario finished"
    );
    result
}

async fn execute(
    ctx: &ScenarioContext,
    scenario: &Scenario,
    result: &mut ScenarioResult,
) -> std::result::Result<(), (Stage, Error)> {
    let config = match scenario.client {
        ClientProfile::Emulator => ClientConfiguration::emulator(&ctx.region, &ctx.emulator_url),
        ClientProfile::Broken => ClientConfiguration::broken(&ctx.region),
    };

    let target = match &scenario.queue_url {
        Some(url) => url.clone(),
        None => ctx
            .endpoint
            .resolve()
            .map_err(|e| (Stage::Setup, e))?
            .to_string(),
    };

    let client = ctx
        .connector
        .connect(&config)
        .await
        .map_err(|e| (Stage::Setup, e))?;

    let sent = client.send_message(&target, &scenario.body).await;
    match (scenario.expect, sent) {
        (Expectation::Failure, Err(e)) => {
            tracing::debug!(scenario = %scenario.name, error = %e, "Send failed as expected");
            result.error = Some(e.to_string());
            return Ok(());
        }
        (Expectation::Failure, Ok(message_id)) => {
            result.message_id = Some(message_id.clone());
            return Err((
                Stage::Send,
                Error::TestAssertion(format!(
                    "expected send to '{}' to fail, but it succeeded (message id '{}')",
                    target, message_id
                )),
            ));
        }
        (Expectation::Success, Err(e)) => return Err((Stage::Send, e)),
        (Expectation::Success, Ok(message_id)) => result.message_id = Some(message_id),
    }

    let Some(check) = &scenario.receive else {
        return Ok(());
    };
    let sent_id = result.message_id.clone().unwrap_or_default();

    let messages = client
        .receive_messages(&target, check.max_messages)
        .await
        .map_err(|e| (Stage::Receive, e))?;
    result.received = messages;

    if result.received.len() > check.max_messages as usize {
        return Err((
            Stage::Receive,
            Error::TestAssertion(format!(
                "received {} messages, more than the requested maximum of {}",
                result.received.len(),
                check.max_messages
            )),
        ));
    }

    // Other scenarios may send the same body to the shared queue
    let Some(own) = result.received.iter().find(|m| m.message_id == sent_id) else {
        return Err((
            Stage::Receive,
            Error::TestAssertion(format!(
                "sent message '{}' not among received ids {:?}",
                sent_id,
                result
                    .received
                    .iter()
                    .map(|m| m.message_id.as_str())
                    .collect::<Vec<_>>()
            )),
        ));
    };

    if own.body != scenario.body {
        return Err((
            Stage::Receive,
            Error::TestAssertion(format!(
                "message '{}' came back with body '{}', sent '{}'",
                sent_id, own.body, scenario.body
            )),
        ));
    }

    Ok(())
}

/// Run every scenario, each in its own task
///
/// Concurrent mode spawns all tasks up front; sequential mode awaits each
/// before starting the next. A panicking scenario becomes a failed result.
/// Results keep the order of `scenarios`.
pub async fn run_all(
    ctx: Arc<ScenarioContext>,
    scenarios: Vec<Scenario>,
    concurrent: bool,
) -> Vec<ScenarioResult> {
    let labels: Vec<(String, Expectation)> = scenarios
        .iter()
        .map(|s| (s.name.clone(), s.expect))
        .collect();

    let spawn = |scenario: Scenario| {
        let ctx = ctx.clone();
        tokio::spawn(async move { run_scenario(&ctx, &scenario).await })
    };

    let joined = if concurrent {
        join_all(scenarios.into_iter().map(spawn)).await
    } else {
        let mut joined = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            joined.push(spawn(scenario).await);
        }
        joined
    };

    labels
        .into_iter()
        .zip(joined)
        .map(|((name, expect), outcome)| match outcome {
            Ok(result) => result,
            Err(e) => ScenarioResult::panicked(&name, expect, e),
        })
        .collect()
}

/// Print one scenario result
pub fn print_result(result: &ScenarioResult, verbose: bool) {
    if result.passed {
        let note = match result.expect {
            Expectation::Failure => " (expected failure)",
            Expectation::Success => "",
        };
        println!(
            "  {} {}{} {}",
            "✓".green(),
            result.name,
            note.dimmed(),
            format!("{}ms", result.elapsed_ms).dimmed()
        );
        if verbose {
            if let Some(error) = &result.error {
                println!("      error: {}", error.dimmed());
            }
            if let Some(id) = &result.message_id {
                println!("      message id: {}", id.dimmed());
            }
        }
    } else {
        let stage = result
            .failed_stage
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {} {} [{}]: {}",
            "✗".red(),
            result.name,
            stage,
            result.error.as_deref().unwrap_or("no error recorded")
        );
    }

    for message in &result.received {
        println!(
            "      received: {} {}",
            message.body,
            format!("({})", message.message_id).dimmed()
        );
    }
}

/// Print the pass/fail summary line
pub fn print_summary(results: &[ScenarioResult]) {
    let failed = results.iter().filter(|r| !r.passed).count();
    let passed = results.len() - failed;

    if failed == 0 {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            format!("{} scenarios passed", passed).green().bold()
        );
    } else {
        println!(
            "\n{} {}\n",
            "✗".red().bold(),
            format!("{} passed, {} failed", passed, failed).red().bold()
        );
    }
}
