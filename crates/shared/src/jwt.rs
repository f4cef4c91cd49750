//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with separate keys and carry a `typ`
//! claim, so a refresh token is never accepted where an access token is due.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind, TokenPair};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens.
    pub access_secret: String,
    /// Secret key for signing refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expires_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expires_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-access".to_string(),
            refresh_secret: "change-me-refresh".to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 604_800,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is of the wrong kind.
    #[error("invalid token")]
    Invalid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    access: KeyPair,
    refresh: KeyPair,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_secs", &self.config.access_token_expires_secs)
            .field("refresh_token_expires_secs", &self.config.refresh_token_expires_secs)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let access = KeyPair::from_secret(&config.access_secret);
        let refresh = KeyPair::from_secret(&config.refresh_secret);
        Self {
            config,
            access,
            refresh,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Generates an access/refresh token pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue_pair(&self, user_id: Uuid, username: &str, role: &str) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.config.access_token_expires_secs);
        let refresh_exp = now + Duration::seconds(self.config.refresh_token_expires_secs);

        let access_claims = Claims::new(user_id, username, role, TokenKind::Access, access_exp);
        let refresh_claims = Claims::new(user_id, username, role, TokenKind::Refresh, refresh_exp);

        Ok(TokenPair {
            access_token: self.encode(&access_claims)?,
            refresh_token: self.encode(&refresh_claims)?,
            expires_in: self.config.access_token_expires_secs,
            refresh_expires_at: refresh_exp,
        })
    }

    fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.keys(claims.typ).encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.typ != kind {
            return Err(JwtError::Invalid);
        }
        Ok(claims)
    }

    /// Validates and decodes an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired, any other
    /// variant if it is malformed, mis-signed or not an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenKind::Access)
    }

    /// Validates and decodes a refresh token.
    ///
    /// # Errors
    ///
    /// Same as [`JwtService::validate_access_token`].
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenKind::Refresh)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 3600,
        })
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let pair = service.issue_pair(user_id, "alice", "admin").unwrap();
        let claims = service.validate_access_token(&pair.access_token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let service = create_test_service();
        let pair = service.issue_pair(Uuid::new_v4(), "bob", "staff").unwrap();

        assert!(service.validate_access_token(&pair.refresh_token).is_err());
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
        assert!(service.validate_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_pairs_are_unique() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let first = service.issue_pair(user_id, "carol", "hr").unwrap();
        let second = service.issue_pair(user_id, "carol", "hr").unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig {
            access_token_expires_secs: -3600,
            ..JwtConfig::default()
        });
        let pair = service.issue_pair(Uuid::new_v4(), "dave", "staff").unwrap();
        assert!(matches!(
            service.validate_access_token(&pair.access_token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_access_token("invalid.token.here");
        assert!(result.is_err());
    }
}
