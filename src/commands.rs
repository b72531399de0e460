//! CLI command definitions
//!
//! Defines the clap commands for the queue harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the emulator, provision the queue and run scenarios
    Run {
        /// YAML scenario files (default: built-in scenarios)
        scenarios: Vec<PathBuf>,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emulator image as name[:tag]
        #[arg(long)]
        image: Option<String>,

        /// Name of the queue to create
        #[arg(long)]
        queue_name: Option<String>,

        /// Region for the emulator and clients
        #[arg(long)]
        region: Option<String>,

        /// Seconds to wait for the emulator readiness line
        #[arg(long)]
        startup_timeout: Option<u64>,

        /// Run scenarios one after another
        #[arg(long)]
        sequential: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the built-in scenarios
    Scenarios {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only print the default config file path
        #[arg(long)]
        path: bool,

        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}
