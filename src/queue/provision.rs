//! Queue provisioning

use crate::common::{Error, Result};

use super::{QueueAddress, QueueClient};

/// Create `name` and return the address the queue service reports
///
/// The address is taken verbatim. Any failure is a provisioning error;
/// nothing is retried.
pub async fn create_queue(client: &dyn QueueClient, name: &str) -> Result<QueueAddress> {
    if name.trim().is_empty() {
        return Err(Error::provision(name, "queue name must not be empty"));
    }

    tracing::debug!(queue = %name, "Creating queue");
    let url = client
        .create_queue(name)
        .await
        .map_err(|e| Error::provision(name, e))?;

    let address = QueueAddress::new(url)
        .ok_or_else(|| Error::provision(name, "queue service returned an empty queue URL"))?;

    tracing::info!(queue = %name, address = %address, "Queue created");
    Ok(address)
}
