use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::{Capability, Role};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Office assignment carried in `app_metadata.office` for staff accounts.
    pub fn office(&self) -> Option<String> {
        self.app_metadata
            .as_ref()
            .and_then(|meta| meta.get("office"))
            .and_then(|office| office.as_str())
            .map(str::to_string)
    }
}

/// Authenticated caller, as yielded by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub office: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Staff are limited to their own office; admin and director see every office.
    pub fn covers_office(&self, office: &str) -> bool {
        match self.role {
            Role::Admin | Role::Director => true,
            Role::Staff => self.office.as_deref() == Some(office),
            _ => false,
        }
    }

    pub fn display_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("full_name"))
            .and_then(|name| name.as_str())
            .map(str::to_string)
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
}
