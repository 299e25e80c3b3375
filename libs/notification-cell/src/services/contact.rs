use std::sync::OnceLock;

use regex::Regex;

use crate::models::NotificationError;

fn local_mobile() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0?(9\d{9})$").expect("static pattern compiles"))
}

/// Format a local mobile number as `+{country}{number}`.
/// Accepts `9XXXXXXXXX` and `09XXXXXXXXX`, ignoring spaces and dashes.
pub fn to_international(contact: &str, country_code: &str) -> Result<String, NotificationError> {
    let digits: String = contact
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    local_mobile()
        .captures(&digits)
        .and_then(|caps| caps.get(1))
        .map(|number| format!("+{}{}", country_code, number.as_str()))
        .ok_or_else(|| NotificationError::InvalidContact(contact.to_string()))
}
