//! Queue-service client plumbing
//!
//! Builds SQS clients aimed at the emulator, provisions the harness queue and
//! carries its address to the scenarios.

pub mod client;
pub mod endpoint;
pub mod provision;

use std::fmt;

pub use client::{
    ClientConfiguration, QueueClient, QueueConnector, ReceivedMessage, SqsConnector,
    StaticCredentials, BROKEN_ENDPOINT,
};
pub use endpoint::QueueEndpoint;
pub use provision::create_queue;

/// Opaque address of a provisioned queue, as reported by the queue service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueAddress(String);

impl QueueAddress {
    /// Wrap a queue URL; empty URLs are not addresses
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        if url.is_empty() {
            None
        } else {
            Some(Self(url))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
