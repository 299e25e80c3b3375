pub mod models;
pub mod services;
pub mod test_utils;

use std::sync::Arc;

use shared_config::AppConfig;
use tracing::warn;

pub use models::*;
pub use services::{DisabledSender, HttpSmsGateway, NotificationSender};

/// Pick the SMS gateway when configured, otherwise a sender that only logs.
pub fn sender_from_config(config: &AppConfig) -> Arc<dyn NotificationSender> {
    match HttpSmsGateway::new(config) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            warn!("SMS gateway unavailable ({}), notifications will not be delivered", e);
            Arc::new(DisabledSender)
        }
    }
}
