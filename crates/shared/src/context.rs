//! Request-scoped identity and tenant selection.
//!
//! The auth middleware produces a [`UserInfo`], the tenant middleware a
//! [`TenantInfo`]; handlers receive both bundled in a [`RequestContext`]
//! together with the request's tracing span. Values are immutable once
//! attached.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Global role of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform operator.
    Superadmin,
    /// Company administrator.
    Admin,
    /// Human-resources officer.
    Hr,
    /// Regular employee account.
    Staff,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::Staff => "staff",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "superadmin" => Some(Self::Superadmin),
            "admin" => Some(Self::Admin),
            "hr" => Some(Self::Hr),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Global role.
    pub role: Role,
}

/// Company/branch selection resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    /// Selected company.
    pub company_id: Uuid,
    /// Selected branches; empty means "all branches the caller may see".
    pub branch_ids: Vec<Uuid>,
    /// Whether the caller administers the company.
    pub is_admin: bool,
}

impl TenantInfo {
    /// Returns the scoping branch when exactly one branch is selected.
    #[must_use]
    pub fn branch_id(&self) -> Option<Uuid> {
        match self.branch_ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Returns the single selected branch or a `bad_request`.
    pub fn require_branch(&self) -> AppResult<Uuid> {
        self.branch_id()
            .ok_or_else(|| AppError::bad_request("exactly one branch must be selected"))
    }
}

/// Everything a handler knows about the caller.
#[derive(Debug, Clone)]
pub struct RequestContext {
    user: UserInfo,
    tenant: Option<TenantInfo>,
    span: Span,
}

impl RequestContext {
    /// Creates a context for an authenticated user with no tenant selected.
    #[must_use]
    pub fn new(user: UserInfo) -> Self {
        let span = tracing::info_span!(
            "request_ctx",
            user_id = %user.id,
            username = %user.username,
            company_id = tracing::field::Empty,
        );
        Self {
            user,
            tenant: None,
            span,
        }
    }

    /// Returns a copy of this context with the tenant attached.
    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantInfo) -> Self {
        self.span.record("company_id", tracing::field::display(tenant.company_id));
        self.tenant = Some(tenant);
        self
    }

    /// The authenticated identity.
    #[must_use]
    pub const fn user(&self) -> &UserInfo {
        &self.user
    }

    /// The resolved tenant, if the request carried one.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantInfo> {
        self.tenant.as_ref()
    }

    /// The resolved tenant, or a `bad_request` when the endpoint needs one.
    pub fn require_tenant(&self) -> AppResult<&TenantInfo> {
        self.tenant
            .as_ref()
            .ok_or_else(|| AppError::bad_request("missing X-Company-ID header"))
    }

    /// Single-branch shorthand; `None` unless exactly one branch is selected.
    #[must_use]
    pub fn branch_id(&self) -> Option<Uuid> {
        self.tenant.as_ref().and_then(TenantInfo::branch_id)
    }

    /// The span every log line of this request belongs to.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Superadmin, Role::Admin, Role::Hr, Role::Staff] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_branch_id_requires_exactly_one() {
        let mut tenant = TenantInfo {
            company_id: Uuid::new_v4(),
            branch_ids: vec![],
            is_admin: false,
        };
        assert_eq!(tenant.branch_id(), None);
        assert!(tenant.require_branch().is_err());

        let b1 = Uuid::new_v4();
        tenant.branch_ids = vec![b1];
        assert_eq!(tenant.branch_id(), Some(b1));

        tenant.branch_ids = vec![b1, Uuid::new_v4()];
        assert_eq!(tenant.branch_id(), None);
    }

    #[test]
    fn test_context_without_tenant() {
        let ctx = RequestContext::new(user());
        assert!(ctx.tenant().is_none());
        assert_eq!(ctx.branch_id(), None);
        assert_eq!(
            ctx.require_tenant().unwrap_err(),
            AppError::bad_request("missing X-Company-ID header")
        );
    }

    #[test]
    fn test_context_with_tenant() {
        let branch = Uuid::new_v4();
        let tenant = TenantInfo {
            company_id: Uuid::new_v4(),
            branch_ids: vec![branch],
            is_admin: true,
        };
        let ctx = RequestContext::new(user()).with_tenant(tenant.clone());
        assert_eq!(ctx.tenant(), Some(&tenant));
        assert_eq!(ctx.branch_id(), Some(branch));
        assert_eq!(ctx.user().role, Role::Admin);
    }
}
