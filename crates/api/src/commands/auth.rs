//! Login, token rotation, logout and the current identity.

use std::sync::Arc;

use async_trait::async_trait;

use hrms_core::auth::verify_password_or_dummy;
use hrms_db::entities::users;
use hrms_db::repositories::Membership;
use hrms_db::{PermissionRepository, SessionRepository, UserRepository};
use hrms_shared::auth::{AuthUserResponse, CompanyMembership, LoginResponse};
use hrms_shared::{
    AppError, AppResult, AuditAction, EventBus, Handler, JwtService, LogEvent, MediatorBuilder,
    RequestContext, Role, TokenPair, UserInfo,
};

use super::CommandDeps;

/// Returns the caller's identity and company memberships.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentUser;

pub(crate) fn membership_response(membership: Membership) -> CompanyMembership {
    CompanyMembership {
        company_id: membership.company.id,
        code: membership.company.code,
        name: membership.company.name,
        role: membership.role.as_str().to_string(),
    }
}

async fn identity(
    permissions: &PermissionRepository,
    user: &users::Model,
) -> AppResult<AuthUserResponse> {
    let companies = permissions
        .memberships(user.id)
        .await?
        .into_iter()
        .map(membership_response)
        .collect();
    Ok(AuthUserResponse {
        id: user.id,
        username: user.username.clone(),
        role: Role::from(user.role).as_str().to_string(),
        companies,
    })
}

/// Credential checks and session rotation for the public auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    permissions: PermissionRepository,
    jwt: Arc<JwtService>,
    events: EventBus,
}

impl AuthService {
    /// Creates the service.
    #[must_use]
    pub fn new(deps: &CommandDeps, jwt: Arc<JwtService>) -> Self {
        let db = deps.transactor.connection().clone();
        Self {
            users: UserRepository::new(db.clone()),
            sessions: SessionRepository::new(db),
            permissions: PermissionRepository::new(deps.transactor.clone()),
            jwt,
            events: deps.events.clone(),
        }
    }

    fn issue(&self, user: &users::Model) -> AppResult<TokenPair> {
        let role = Role::from(user.role);
        self.jwt
            .issue_pair(user.id, &user.username, role.as_str())
            .map_err(|err| AppError::internal(err.to_string()))
    }

    /// Verifies credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized` for an unknown user or a wrong password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> AppResult<LoginResponse> {
        let user = self.users.find_by_username(username.trim()).await?;
        let valid = verify_password_or_dummy(password, user.as_ref().map(|u| u.password_hash.as_str()))
            .map_err(|err| AppError::internal(err.to_string()))?;

        let Some(user) = user.filter(|_| valid) else {
            tracing::info!(username = %username.trim(), "failed login attempt");
            return Err(AppError::unauthorized("invalid username or password"));
        };

        let tokens = self.issue(&user)?;
        self.sessions
            .create(user.id, &tokens.refresh_token, tokens.refresh_expires_at, user_agent)
            .await?;

        let ctx = RequestContext::new(UserInfo {
            id: user.id,
            username: user.username.clone(),
            role: Role::from(user.role),
        });
        self.events
            .publish(&LogEvent::from_context(&ctx, AuditAction::Login, "users", user.id));

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            user: identity(&self.permissions, &user).await?,
            tokens,
        })
    }

    /// Exchanges a refresh token for a new pair, revoking the old session.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized` for an invalid, expired or revoked token.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        user_agent: Option<&str>,
    ) -> AppResult<LoginResponse> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AppError::unauthorized("invalid or expired token"))?;

        let session = self
            .sessions
            .find_active_by_token(refresh_token)
            .await?
            .filter(|s| s.user_id == claims.sub)
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

        let tokens = self.issue(&user)?;
        self.sessions
            .rotate(
                session.id,
                user.id,
                &tokens.refresh_token,
                tokens.refresh_expires_at,
                user_agent,
            )
            .await?;

        tracing::debug!(user_id = %user.id, session_id = %session.id, "session rotated");
        Ok(LoginResponse {
            user: identity(&self.permissions, &user).await?,
            tokens,
        })
    }

    /// Revokes the session behind `refresh_token`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        if self.sessions.revoke_by_token(refresh_token).await? {
            tracing::debug!("session revoked");
        }
        Ok(())
    }
}

struct CurrentUserHandler {
    users: UserRepository,
    permissions: PermissionRepository,
}

#[async_trait]
impl Handler<CurrentUser, AuthUserResponse> for CurrentUserHandler {
    async fn handle(&self, ctx: &RequestContext, _request: CurrentUser) -> AppResult<AuthUserResponse> {
        let user = self
            .users
            .find_by_id(ctx.user().id)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;
        identity(&self.permissions, &user).await
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder.register::<CurrentUser, AuthUserResponse, _>(CurrentUserHandler {
        users: UserRepository::new(deps.transactor.connection().clone()),
        permissions: PermissionRepository::new(deps.transactor.clone()),
    });
}
