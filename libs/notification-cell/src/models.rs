// libs/notification-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a single send. Failures are data, not errors: callers treat them
/// as warnings next to an otherwise successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn delivered() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayMessage {
    pub to: String,
    pub from: String,
    pub message: String,
}

/// Appointment details quoted in requester-facing messages.
#[derive(Debug, Clone)]
pub struct AppointmentNotice {
    pub requester_name: String,
    pub code: String,
    pub office: String,
    pub date: NaiveDate,
    pub time_range: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum NotificationError {
    #[error("SMS gateway not configured")]
    NotConfigured,

    #[error("Invalid contact number: {0}")]
    InvalidContact(String),

    #[error("SMS gateway error: {0}")]
    Gateway(String),
}
