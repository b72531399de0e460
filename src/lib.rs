//! Queue harness - integration tests for SQS clients on a local emulator
//!
//! This library starts a disposable queue-service emulator, provisions a
//! queue in it and runs success/failure scenarios against that queue.

pub mod cli;
pub mod commands;
pub mod common;
pub mod emulator;
pub mod harness;
pub mod queue;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use harness::{Harness, HarnessOptions, HarnessReport};
