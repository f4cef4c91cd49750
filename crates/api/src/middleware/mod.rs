//! Request pipeline middleware.
//!
//! Order on protected routes: [`auth`] builds the request context, [`tenant`]
//! resolves the company and branches, [`role`] gates individual endpoints.

pub mod auth;
pub mod role;
pub mod tenant;

pub use auth::auth_middleware;
pub use role::{AllowedRoles, require_role};
pub use tenant::{TenancyMode, TenantGuard, tenant_middleware};
