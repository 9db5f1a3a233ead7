//! NATS subscriptions for incoming service requests

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving requests on one subject
pub struct RequestConsumer {
    client: Client,
    subject: String,
    /// Queue group shared by service replicas, if any
    queue_group: Option<String>,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: None,
        }
    }

    /// Load-balance the subject across replicas joined to `group`
    pub fn with_queue_group(mut self, group: Option<String>) -> Self {
        self.queue_group = group;
        self
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => self.client.subscribe(self.subject.clone()).await?,
        };
        info!(
            subject = %self.subject,
            queue_group = ?self.queue_group,
            "Subscribed to request subject"
        );
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
