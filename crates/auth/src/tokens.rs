//! Access and refresh token issuance.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tubehub_config::AuthConfig;
use tubehub_database::{new_id, User};

use crate::AuthError;

/// Claims carried by the short-lived access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Public id of the user.
    pub sub: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the long-lived refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SigningKey {
    fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    fn expiry_from(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.ttl_seconds)
    }
}

/// Signs and verifies both token kinds. Each kind has its own secret so a
/// refresh token is never accepted where an access token is expected.
#[derive(Clone)]
pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.access_token_secret.trim().is_empty() {
            return Err(AuthError::Misconfigured(
                "access token secret is empty".to_string(),
            ));
        }
        if config.refresh_token_secret.trim().is_empty() {
            return Err(AuthError::Misconfigured(
                "refresh token secret is empty".to_string(),
            ));
        }

        Ok(Self {
            access: SigningKey::new(
                &config.access_token_secret,
                config.access_token_ttl_seconds,
            ),
            refresh: SigningKey::new(
                &config.refresh_token_secret,
                config.refresh_token_ttl_seconds,
            ),
            validation: Validation::new(Algorithm::HS256),
        })
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(user)?,
            refresh_token: self.issue_refresh(user)?,
        })
    }

    pub fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.public_id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp: self.access.expiry_from(iat),
        };

        Ok(encode(&Header::default(), &claims, &self.access.encoding)?)
    }

    pub fn issue_refresh(&self, user: &User) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user.public_id.clone(),
            jti: new_id(),
            iat,
            exp: self.refresh.expiry_from(iat),
        };

        Ok(encode(&Header::default(), &claims, &self.refresh.encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.access.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| {
                tracing::debug!(%error, "access token rejected");
                AuthError::InvalidAccessToken
            })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        decode::<RefreshClaims>(token, &self.refresh.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| {
                tracing::debug!(%error, "refresh token rejected");
                AuthError::InvalidRefreshToken
            })
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access.ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh.ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-for-tests".into(),
            access_token_ttl_seconds: 900,
            refresh_token_secret: "refresh-secret-for-tests".into(),
            refresh_token_ttl_seconds: 86_400,
            secure_cookies: false,
        }
    }

    fn user() -> User {
        User {
            id: 7,
            public_id: "ckpublicid".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice Example".into(),
            avatar: "/static/a.png".into(),
            cover_image: None,
            password_hash: "hash".into(),
            refresh_token: None,
            created_at: "2024-06-01T00:00:00+00:00".into(),
            updated_at: "2024-06-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn access_token_carries_profile_claims() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let token = issuer.issue_access(&user()).unwrap();

        let claims = issuer.verify_access(&token).unwrap();
        assert_eq!(claims.sub, "ckpublicid");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.full_name, "Alice Example");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn refresh_tokens_are_unique_per_issue() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let first = issuer.issue_refresh(&user()).unwrap();
        let second = issuer.issue_refresh(&user()).unwrap();

        assert_ne!(first, second);
        let claims = issuer.verify_refresh(&first).unwrap();
        assert_eq!(claims.sub, "ckpublicid");
        assert_eq!(claims.jti.len(), new_id().len());
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let pair = issuer.issue_pair(&user()).unwrap();

        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(AuthError::InvalidAccessToken)
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.access_token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: "ckpublicid".into(),
            email: "alice@example.com".into(),
            username: "alice".into(),
            full_name: "Alice".into(),
            iat: now - 7_200,
            exp: now - 3_600,
        };
        let token = encode(&Header::default(), &claims, &issuer.access.encoding).unwrap();

        assert!(matches!(
            issuer.verify_access(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn empty_secret_is_misconfiguration() {
        let mut config = config();
        config.refresh_token_secret = String::new();

        assert!(matches!(
            TokenIssuer::new(&config),
            Err(AuthError::Misconfigured(_))
        ));
    }
}
