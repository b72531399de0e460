//! CLI command handling
//!
//! Dispatches CLI commands to the harness and formats output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::emulator::DockerRuntime;
use crate::harness::{Harness, HarnessOptions, HarnessReport};
use crate::queue::SqsConnector;
use crate::testing::{self, print_result, print_summary, Scenario};

/// Overrides for `run` taken from the command line
#[derive(Debug, Default)]
struct RunOverrides {
    image: Option<String>,
    queue_name: Option<String>,
    region: Option<String>,
    startup_timeout: Option<u64>,
    sequential: bool,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            config,
            image,
            queue_name,
            region,
            startup_timeout,
            sequential,
            json,
            verbose,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(
                &mut config,
                RunOverrides {
                    image,
                    queue_name,
                    region,
                    startup_timeout,
                    sequential,
                },
            );
            let scenarios = select_scenarios(&config, &scenarios)?;
            let options = HarnessOptions::from_config(&config);

            if !json {
                println!(
                    "\n{} {}",
                    "Starting emulator:".blue().bold(),
                    options.emulator.image_ref().white().bold()
                );
            }

            let harness = Harness::new(
                Arc::new(DockerRuntime::new()),
                Arc::new(SqsConnector),
                options,
            );
            let report = harness.run_until(scenarios, interrupted()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, verbose);
            }

            if report.passed() {
                Ok(())
            } else {
                Err(Error::ScenariosFailed {
                    failed: report.failed_count(),
                    total: report.results.len(),
                })
            }
        }

        Commands::Scenarios { json } => {
            let config = Config::load()?;
            let scenarios = testing::builtin_scenarios(
                &config.scenarios.message_body,
                config.scenarios.receive_max_messages,
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&scenarios)?);
            } else {
                println!("Built-in scenarios:");
                for scenario in &scenarios {
                    print_scenario(scenario);
                }
            }
            Ok(())
        }

        Commands::Config { config, path, init } => {
            if path {
                match paths::config_path() {
                    Some(p) => println!("{}", p.display()),
                    None => println!("No config directory available on this platform"),
                }
                return Ok(());
            }

            if init {
                return init_config();
            }

            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn apply_overrides(config: &mut Config, overrides: RunOverrides) {
    if let Some(image) = overrides.image {
        match image.rsplit_once(':') {
            Some((name, tag)) if !tag.contains('/') => {
                config.emulator.image = name.to_string();
                config.emulator.tag = tag.to_string();
            }
            _ => config.emulator.image = image,
        }
    }
    if let Some(name) = overrides.queue_name {
        config.queue.name = name;
    }
    if let Some(region) = overrides.region {
        config.queue.region = region;
    }
    if let Some(secs) = overrides.startup_timeout {
        config.emulator.startup_timeout_secs = secs;
    }
    if overrides.sequential {
        config.scenarios.concurrent = false;
    }
}

fn select_scenarios(config: &Config, files: &[PathBuf]) -> Result<Vec<Scenario>> {
    if files.is_empty() {
        return Ok(testing::builtin_scenarios(
            &config.scenarios.message_body,
            config.scenarios.receive_max_messages,
        ));
    }

    let mut scenarios = Vec::new();
    for file in files {
        scenarios.extend(testing::load_scenarios(file)?);
    }
    Ok(scenarios)
}

fn init_config() -> Result<()> {
    let Some(dir) = paths::ensure_config_dir()? else {
        return Err(Error::Config(
            "No config directory available on this platform".to_string(),
        ));
    };

    let path = dir.join("config.toml");
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, Config::default().to_toml()?)?;
    println!("Wrote default config: {}", path.display());
    Ok(())
}

fn print_report(report: &HarnessReport, verbose: bool) {
    println!("  Emulator: {}", report.emulator_url.dimmed());
    println!("  Queue: {}", report.queue_address.dimmed());
    println!("\n{}", "Scenarios:".cyan());

    for result in &report.results {
        print_result(result, verbose);
    }
    print_summary(&report.results);
}

fn print_scenario(scenario: &Scenario) {
    let target = scenario.queue_url.as_deref().unwrap_or("<published queue>");
    println!(
        "  {} ({:?} client -> {}, expect {:?})",
        scenario.name.bold(),
        scenario.client,
        target,
        scenario.expect
    );
    if let Some(desc) = &scenario.description {
        println!("      {}", desc.dimmed());
    }
    if let Some(receive) = &scenario.receive {
        println!("      then receive up to {} messages", receive.max_messages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_override_splits_tag() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            RunOverrides {
                image: Some("localstack/localstack:3.8".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(config.emulator.image, "localstack/localstack");
        assert_eq!(config.emulator.tag, "3.8");
    }

    #[test]
    fn test_image_override_with_registry_port() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            RunOverrides {
                image: Some("registry:5000/localstack".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(config.emulator.image, "registry:5000/localstack");
        assert_eq!(config.emulator.tag, "latest");
    }

    #[test]
    fn test_sequential_override() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            RunOverrides {
                sequential: true,
                queue_name: Some("orders".to_string()),
                ..Default::default()
            },
        );
        assert!(!config.scenarios.concurrent);
        assert_eq!(config.queue.name, "orders");
    }

    #[test]
    fn test_builtin_scenarios_when_no_files() {
        let scenarios = select_scenarios(&Config::default(), &[]).unwrap();
        assert_eq!(scenarios.len(), 3);
        assert!(scenarios.iter().all(|s| s.body == "Ola"));
    }
}
