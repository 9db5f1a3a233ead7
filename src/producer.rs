//! NATS reply publisher

use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::{debug, warn};

/// Publishes JSON replies to request inboxes
#[derive(Clone)]
pub struct ReplyPublisher {
    client: Client,
}

impl ReplyPublisher {
    /// Create a new reply publisher
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish `reply` to the inbox of a request.
    ///
    /// Requests sent without a reply subject are fire-and-forget; the reply
    /// is dropped with a warning.
    pub async fn reply<T: Serialize>(&self, inbox: Option<&Subject>, reply: &T) -> Result<()> {
        let Some(inbox) = inbox else {
            warn!("Request has no reply subject, dropping reply");
            return Ok(());
        };

        let payload = serde_json::to_vec(reply)?;
        self.client.publish(inbox.clone(), payload.into()).await?;

        debug!(inbox = %inbox, "Published reply");

        Ok(())
    }
}
