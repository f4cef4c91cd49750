//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Login name.
    pub username: String,
    /// Global role of the identity.
    pub role: String,
    /// Token kind.
    pub typ: TokenKind,
    /// Unique token id, makes every issued token distinct.
    pub jti: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        username: &str,
        role: &str,
        typ: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id,
            username: username.to_string(),
            role: role.to_string(),
            typ,
            jti: Uuid::new_v4(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
    /// Refresh token expiry instant.
    #[serde(skip)]
    pub refresh_expires_at: DateTime<Utc>,
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// User password.
    pub password: String,
}

/// Refresh token request. The token may also arrive in a cookie.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Company membership returned in auth responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMembership {
    /// Company ID.
    pub company_id: Uuid,
    /// Company short code.
    pub code: String,
    /// Company display name.
    pub name: String,
    /// Role inside the company.
    pub role: String,
}

/// Identity returned in auth responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserResponse {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Global role.
    pub role: String,
    /// Companies the user belongs to.
    pub companies: Vec<CompanyMembership>,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: AuthUserResponse,
    /// Access and refresh tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}
