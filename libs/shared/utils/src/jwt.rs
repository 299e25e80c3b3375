use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};
use shared_models::Role;

type HmacSha256 = Hmac<Sha256>;

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        },
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    // Accounts without a recognised role claim cannot use the system.
    let role: Role = claims
        .role
        .as_deref()
        .ok_or_else(|| "Missing role claim".to_string())?
        .parse()
        .map_err(|e: shared_models::role::UnknownRole| e.to_string())?;

    let created_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        office: claims.office(),
        id: claims.sub,
        email: claims.email,
        role,
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {} ({})", user.id, user.role);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};

    const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

    #[test]
    fn valid_token_yields_role_and_office() {
        let staff = TestUser::staff("registrar@example.com", "Registrar Office");
        let token = JwtTestUtils::create_test_token(&staff, SECRET, Some(1));

        let user = validate_token(&token, SECRET).unwrap();
        assert_eq!(user.id, staff.id);
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.office.as_deref(), Some("Registrar Office"));
    }

    #[test]
    fn rejects_tampered_and_expired_tokens() {
        let user = TestUser::student("s@example.com");
        let wrong = JwtTestUtils::create_invalid_signature_token(&user);
        assert_eq!(validate_token(&wrong, SECRET).unwrap_err(), "Invalid token signature");

        let expired = JwtTestUtils::create_expired_token(&user, SECRET);
        assert_eq!(validate_token(&expired, SECRET).unwrap_err(), "Token expired");

        let malformed = JwtTestUtils::create_malformed_token();
        assert!(validate_token(&malformed, SECRET).is_err());
    }

    #[test]
    fn empty_secret_rejects_tokens_signed_with_it() {
        let user = TestUser::admin("a@example.com");
        let forged = JwtTestUtils::create_test_token(&user, "", Some(1));
        assert_eq!(validate_token(&forged, "").unwrap_err(), "JWT secret is not set");
    }

    #[test]
    fn rejects_unknown_role() {
        let user = TestUser::new("p@example.com", "guest");
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(1));
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Unknown role: guest");
    }
}
