use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use ozar_types::api::Claims;

/// Lifetime of an issued access token.
pub const TOKEN_TTL_DAYS: i64 = 30;

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now() + Duration::days(TOKEN_TTL_DAYS);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

/// Decode and validate (signature + expiry) an access token.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Unguessable url-safe token, used for confirmation links and object names.
pub fn random_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 18]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret_only() {
        let id = Uuid::new_v4();
        let (token, expires_at) = create_token("s3cret", id, "ada@example.com").unwrap();
        assert!(expires_at > Utc::now());

        let claims = verify_token("s3cret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ada@example.com");
        assert!(verify_token("other", &token).is_none());
    }

    #[test]
    fn random_tokens_are_url_safe_and_distinct() {
        let a = random_token();
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, random_token());
    }
}
