//! Queue harness CLI - SQS client scenarios against a disposable LocalStack
//!
//! Starts an emulator container, provisions a queue, runs send/receive
//! scenarios against it and tears the container down.

use clap::Parser;
use queue_harness::{cli, commands, common};
use commands::Commands;

#[derive(Parser)]
#[command(name = "queue-harness", about = "SQS scenario harness on a disposable emulator")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    common::logging::init_cli(verbose);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
