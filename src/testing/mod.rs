//! Scenario runner
//!
//! Scenarios are data: a client profile, a target, a body, an expected
//! outcome and an optional receive check. They can come from YAML files or
//! from the built-in set.

mod config;
mod runner;

pub use config::*;
pub use runner::{
    print_result, print_summary, run_all, run_scenario, ScenarioContext, ScenarioResult, Stage,
};
