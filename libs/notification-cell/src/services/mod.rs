pub mod contact;
pub mod sms;
pub mod templates;

use async_trait::async_trait;
use tracing::info;

use crate::models::SendOutcome;

pub use sms::HttpSmsGateway;

#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver `body` to a local 10-digit mobile number.
    async fn send(&self, contact: &str, body: &str) -> SendOutcome;
}

/// Used when no gateway is configured. Every send reports failure.
pub struct DisabledSender;

#[async_trait]
impl NotificationSender for DisabledSender {
    async fn send(&self, contact: &str, _body: &str) -> SendOutcome {
        info!("SMS to {} skipped: gateway not configured", contact);
        SendOutcome::failed("SMS gateway not configured")
    }
}
