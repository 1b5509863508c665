//! Bearer token issuance and validation (HMAC-signed JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::UserClaims,
};

const MAX_TTL_HOURS: u64 = 24 * 365 * 100;

/// Signs and verifies bearer tokens with a key injected at construction.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // Only the HMAC family is accepted; `alg` headers naming anything else
        // (RSA, EC, none) fail before the signature is looked at.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        // Capped at a century so expiry arithmetic stays in range.
        let hours = config.jwt_expiration_hours.min(MAX_TTL_HOURS) as i64;
        Self::new(config.jwt_secret.as_bytes(), Duration::hours(hours))
    }

    /// Issue a token for `user_id`, valid for the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<String> {
        let claims = UserClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to generate token: {}", e)))
    }

    /// Verify signature, algorithm and expiry, then return the embedded user
    pub fn validate(&self, token: &str) -> AppResult<Uuid> {
        let data = decode::<UserClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;
        Ok(data.claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret", Duration::hours(24))
    }

    #[test]
    fn issued_token_validates_to_same_user() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(matches!(tokens.validate(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let token = TokenService::new(b"other-secret", Duration::hours(24))
            .issue(Uuid::new_v4())
            .unwrap();
        assert!(matches!(service().validate(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            json!({ "user_id": Uuid::new_v4(), "iat": 0, "exp": i64::MAX / 2 }).to_string(),
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        assert!(matches!(
            tokens.validate(&parts.join(".")),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn non_hmac_algorithm_is_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "RS256", "typ": "JWT" }).to_string());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header;
        assert!(matches!(
            tokens.validate(&parts.join(".")),
            Err(AppError::Unauthenticated(_))
        ));

        let none = URL_SAFE_NO_PAD.encode(json!({ "alg": "none", "typ": "JWT" }).to_string());
        let unsigned = format!("{}.{}.", none, parts[1]);
        assert!(matches!(tokens.validate(&unsigned), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn other_hmac_variants_are_accepted() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = UserClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(service().validate(&token).unwrap(), user_id);
    }

    #[test]
    fn token_without_user_claim_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "exp": Utc::now().timestamp() + 3600 }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(service().validate(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(service().validate("not-a-token"), Err(AppError::Unauthenticated(_))));
    }
}
