use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::SendOutcome;
use crate::services::NotificationSender;

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub contact: String,
    pub body: String,
}

/// Sender that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    fail_with: Option<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records messages but reports every send as failed.
    pub fn failing(error: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(error.to_string()),
        }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, contact: &str, body: &str) -> SendOutcome {
        self.sent.lock().await.push(SentMessage {
            contact: contact.to_string(),
            body: body.to_string(),
        });

        match &self.fail_with {
            Some(error) => SendOutcome::failed(error.clone()),
            None => SendOutcome::delivered(),
        }
    }
}
