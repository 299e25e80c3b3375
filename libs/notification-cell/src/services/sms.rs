// libs/notification-cell/src/services/sms.rs
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::{GatewayMessage, NotificationError, SendOutcome};
use crate::services::contact::to_international;
use crate::services::NotificationSender;

/// HTTP SMS gateway client. POST {base_url}/messages with a bearer token.
#[derive(Debug)]
pub struct HttpSmsGateway {
    client: Client,
    base_url: String,
    api_token: String,
    sender_name: String,
    country_code: String,
}

impl HttpSmsGateway {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_sms_configured() {
            return Err(NotificationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.sms_gateway_url.trim_end_matches('/').to_string(),
            api_token: config.sms_api_token.clone(),
            sender_name: config.sms_sender_name.clone(),
            country_code: config.sms_country_code.clone(),
        })
    }

    async fn deliver(&self, contact: &str, body: &str) -> Result<(), NotificationError> {
        let to = to_international(contact, &self.country_code)?;
        let url = format!("{}/messages", self.base_url);

        let payload = GatewayMessage {
            to: to.clone(),
            from: self.sender_name.clone(),
            message: body.to_string(),
        };

        debug!("Sending SMS to {} via {}", to, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            error!("SMS gateway rejected message: {} - {}", status, response_text);
            return Err(NotificationError::Gateway(format!("HTTP {}: {}", status, response_text)));
        }

        info!("SMS delivered to {}", to);
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for HttpSmsGateway {
    async fn send(&self, contact: &str, body: &str) -> SendOutcome {
        match self.deliver(contact, body).await {
            Ok(()) => SendOutcome::delivered(),
            Err(e) => {
                warn!("SMS to {} failed: {}", contact, e);
                SendOutcome::failed(e.to_string())
            }
        }
    }
}
