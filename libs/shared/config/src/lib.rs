use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub store_backend: StoreBackend,
    pub sms_gateway_url: String,
    pub sms_api_token: String,
    pub sms_sender_name: String,
    pub sms_country_code: String,
    pub campus_utc_offset_hours: i32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });

        let store_backend = match env::var("DIRECTORY_STORE").ok().as_deref() {
            Some("supabase") => StoreBackend::Supabase,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                warn!("Unknown DIRECTORY_STORE '{}', falling back to detection", other);
                Self::detect_backend(&supabase_url)
            }
            None => Self::detect_backend(&supabase_url),
        };

        let config = Self {
            supabase_url,
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, every bearer token will be rejected");
                    String::new()
                }),
            store_backend,
            sms_gateway_url: env::var("SMS_GATEWAY_URL")
                .unwrap_or_else(|_| {
                    warn!("SMS_GATEWAY_URL not set, SMS notifications disabled");
                    String::new()
                }),
            sms_api_token: env::var("SMS_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SMS_API_TOKEN not set, using empty value");
                    String::new()
                }),
            sms_sender_name: env::var("SMS_SENDER_NAME")
                .unwrap_or_else(|_| "CAMPUS".to_string()),
            sms_country_code: env::var("SMS_COUNTRY_CODE")
                .unwrap_or_else(|_| "63".to_string()),
            campus_utc_offset_hours: parse_or_default("CAMPUS_UTC_OFFSET_HOURS", 8),
            port: parse_or_default("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    fn detect_backend(supabase_url: &str) -> StoreBackend {
        if supabase_url.is_empty() {
            StoreBackend::Memory
        } else {
            StoreBackend::Supabase
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
            && (self.store_backend == StoreBackend::Memory
                || (!self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()))
    }

    pub fn is_sms_configured(&self) -> bool {
        !self.sms_gateway_url.is_empty() && !self.sms_api_token.is_empty()
    }

    /// Fixed offset of the campus wall clock. Out-of-range hours fall back to UTC.
    pub fn campus_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.campus_utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Today's calendar date on campus.
    pub fn campus_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.campus_offset()).date_naive()
    }
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: "secret".to_string(),
            store_backend: StoreBackend::Memory,
            sms_gateway_url: String::new(),
            sms_api_token: String::new(),
            sms_sender_name: "CAMPUS".to_string(),
            sms_country_code: "63".to_string(),
            campus_utc_offset_hours: 8,
            port: 3000,
        }
    }

    #[test]
    fn memory_backend_needs_only_jwt_secret() {
        assert!(base().is_configured());

        let mut hosted = base();
        hosted.store_backend = StoreBackend::Supabase;
        assert!(!hosted.is_configured());
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let mut config = base();
        config.campus_utc_offset_hours = 99;
        assert_eq!(config.campus_offset().local_minus_utc(), 0);

        config.campus_utc_offset_hours = 8;
        assert_eq!(config.campus_offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn sms_requires_url_and_token() {
        let mut config = base();
        assert!(!config.is_sms_configured());
        config.sms_gateway_url = "https://sms.example.com".to_string();
        config.sms_api_token = "token".to_string();
        assert!(config.is_sms_configured());
    }
}
