//! Endpoint resolution and the SQS client
//!
//! A [`ClientConfiguration`] decides where requests go. With an endpoint
//! override every request is sent there; without one the SDK's regional
//! endpoint resolution applies. Retries are always disabled.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::{Credentials, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use serde::Serialize;

use crate::common::{Error, Result};

/// Bare scheme with no authority; every request against it fails
pub const BROKEN_ENDPOINT: &str = "http:";

/// Dummy credentials accepted by the emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
        }
    }
}

/// Parameters used to construct a queue-service client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfiguration {
    pub region: String,
    pub endpoint_override: Option<String>,
    pub credentials: StaticCredentials,
}

impl ClientConfiguration {
    /// Client routed to a running emulator
    pub fn emulator(region: &str, endpoint: &str) -> Self {
        Self {
            region: region.to_string(),
            endpoint_override: Some(endpoint.to_string()),
            credentials: StaticCredentials::default(),
        }
    }

    /// Client with a malformed endpoint, used to force failures
    pub fn broken(region: &str) -> Self {
        Self {
            region: region.to_string(),
            endpoint_override: Some(BROKEN_ENDPOINT.to_string()),
            credentials: StaticCredentials::default(),
        }
    }

    /// Client using the default regional endpoint
    pub fn regional(region: &str) -> Self {
        Self {
            region: region.to_string(),
            endpoint_override: None,
            credentials: StaticCredentials::default(),
        }
    }
}

/// A message returned by a receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub body: String,
}

/// Queue operations the harness consumes
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Create a queue and return its URL
    async fn create_queue(&self, name: &str) -> Result<String>;

    /// Send one message and return its message id
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String>;

    /// Receive up to `max_messages` messages
    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>>;
}

/// Builds queue clients from a configuration
#[async_trait]
pub trait QueueConnector: Send + Sync {
    async fn connect(&self, config: &ClientConfiguration) -> Result<Arc<dyn QueueClient>>;
}

/// Connector producing AWS SDK SQS clients
#[derive(Debug, Default, Clone, Copy)]
pub struct SqsConnector;

#[async_trait]
impl QueueConnector for SqsConnector {
    async fn connect(&self, config: &ClientConfiguration) -> Result<Arc<dyn QueueClient>> {
        let client = build_sqs_client(config).await;
        Ok(Arc::new(SqsQueueClient { client }))
    }
}

/// Build an SDK client for `config`
pub async fn build_sqs_client(config: &ClientConfiguration) -> aws_sdk_sqs::Client {
    let credentials = Credentials::new(
        config.credentials.access_key_id.clone(),
        config.credentials.secret_access_key.clone(),
        None,
        None,
        "queue-harness",
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .retry_config(RetryConfig::disabled());

    if let Some(endpoint) = &config.endpoint_override {
        tracing::debug!(endpoint = %endpoint, region = %config.region, "Using endpoint override");
        loader = loader.endpoint_url(endpoint.clone());
    }

    let sdk_config = loader.load().await;
    aws_sdk_sqs::Client::new(&sdk_config)
}

/// SQS client backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn create_queue(&self, name: &str) -> Result<String> {
        let output = self
            .client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| Error::operation("CreateQueue", DisplayErrorContext(&e)))?;

        output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| Error::operation("CreateQueue", "response did not include a queue URL"))
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| Error::operation("SendMessage", DisplayErrorContext(&e)))?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>> {
        let max = i32::try_from(max_messages)
            .map_err(|_| Error::operation("ReceiveMessage", "max_messages out of range"))?;

        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max)
            .send()
            .await
            .map_err(|e| Error::operation("ReceiveMessage", DisplayErrorContext(&e)))?;

        Ok(output
            .messages()
            .iter()
            .map(|m| ReceivedMessage {
                message_id: m.message_id().unwrap_or_default().to_string(),
                body: m.body().unwrap_or_default().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulator_configuration() {
        let config = ClientConfiguration::emulator("us-east-1", "http://127.0.0.1:49153");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(
            config.endpoint_override.as_deref(),
            Some("http://127.0.0.1:49153")
        );
        assert_eq!(config.credentials.access_key_id, "test");
    }

    #[test]
    fn test_broken_configuration_has_no_authority() {
        let config = ClientConfiguration::broken("us-east-1");
        assert_eq!(config.endpoint_override.as_deref(), Some("http:"));
        assert_ne!(config, ClientConfiguration::emulator("us-east-1", "http:x"));
    }

    #[tokio::test]
    async fn test_broken_endpoint_fails_send_without_network() {
        let client = SqsConnector
            .connect(&ClientConfiguration::broken("us-east-1"))
            .await
            .unwrap();

        let err = client
            .send_message(BROKEN_ENDPOINT, "Ola")
            .await
            .unwrap_err();

        match err {
            Error::Operation { operation, .. } => assert_eq!(operation, "SendMessage"),
            other => panic!("expected an operation error, got {other:?}"),
        }
    }

    #[test]
    fn test_regional_configuration_has_no_override() {
        assert!(ClientConfiguration::regional("eu-west-1")
            .endpoint_override
            .is_none());
    }
}
