//! Queue address propagation
//!
//! A [`QueueEndpoint`] is a named, write-once slot. The harness publishes the
//! provisioned address into it once and hands the same slot to every
//! scenario. Optionally the address is mirrored into the process environment
//! under the slot's name for child processes.

use once_cell::sync::OnceCell;

use crate::common::{Error, Result};

use super::QueueAddress;

/// Write-once binding of the harness queue address
#[derive(Debug)]
pub struct QueueEndpoint {
    name: String,
    export_env: bool,
    address: OnceCell<QueueAddress>,
}

impl QueueEndpoint {
    /// Create an empty binding called `name`
    pub fn new(name: impl Into<String>, export_env: bool) -> Self {
        Self {
            name: name.into(),
            export_env,
            address: OnceCell::new(),
        }
    }

    /// Binding name (the environment variable when exported)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an address has been published
    pub fn is_published(&self) -> bool {
        self.address.get().is_some()
    }

    /// Publish the queue address
    ///
    /// Succeeds once; later calls fail and keep the first address.
    pub fn publish(&self, address: QueueAddress) -> Result<()> {
        self.address
            .set(address)
            .map_err(|_| Error::AlreadyPublished(self.name.clone()))?;

        if let Some(address) = self.address.get() {
            if self.export_env {
                std::env::set_var(&self.name, address.as_str());
            }
            tracing::debug!(binding = %self.name, address = %address, "Queue address published");
        }
        Ok(())
    }

    /// Read the published address
    pub fn resolve(&self) -> Result<QueueAddress> {
        self.address
            .get()
            .cloned()
            .ok_or_else(|| Error::NotPublished(self.name.clone()))
    }

    /// Remove the exported environment variable at teardown
    pub fn withdraw(&self) {
        if self.export_env && self.is_published() {
            std::env::remove_var(&self.name);
            tracing::debug!(binding = %self.name, "Queue address withdrawn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(url: &str) -> QueueAddress {
        QueueAddress::new(url).unwrap()
    }

    #[test]
    fn test_resolve_before_publish_fails() {
        let endpoint = QueueEndpoint::new("AWS_ENDPOINT", false);
        let err = endpoint.resolve().unwrap_err();
        assert!(matches!(err, Error::NotPublished(ref name) if name == "AWS_ENDPOINT"));
        assert!(!endpoint.is_published());
    }

    #[test]
    fn test_resolve_is_stable_after_publish() {
        let endpoint = QueueEndpoint::new("AWS_ENDPOINT", false);
        endpoint.publish(address("http://localhost:4566/000000000000/q")).unwrap();

        let first = endpoint.resolve().unwrap();
        for _ in 0..5 {
            assert_eq!(endpoint.resolve().unwrap(), first);
        }
    }

    #[test]
    fn test_second_publish_rejected() {
        let endpoint = QueueEndpoint::new("AWS_ENDPOINT", false);
        endpoint.publish(address("http://first")).unwrap();

        let err = endpoint.publish(address("http://second")).unwrap_err();
        assert!(matches!(err, Error::AlreadyPublished(_)));
        assert_eq!(endpoint.resolve().unwrap().as_str(), "http://first");
    }

    #[test]
    fn test_export_and_withdraw_env() {
        let name = "QUEUE_HARNESS_TEST_EXPORT_BINDING";
        let endpoint = QueueEndpoint::new(name, true);
        endpoint.publish(address("http://exported")).unwrap();
        assert_eq!(std::env::var(name).unwrap(), "http://exported");

        endpoint.withdraw();
        assert!(std::env::var(name).is_err());
    }

    #[test]
    fn test_concurrent_readers_see_same_address() {
        let endpoint = std::sync::Arc::new(QueueEndpoint::new("AWS_ENDPOINT", false));
        endpoint.publish(address("http://shared")).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let endpoint = endpoint.clone();
                std::thread::spawn(move || endpoint.resolve().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_str(), "http://shared");
        }
    }
}
