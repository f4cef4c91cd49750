//! API route definitions.
//!
//! Handlers here are thin: they parse input, build a command and dispatch it
//! through the mediator.

use axum::{Router, middleware, routing::MethodRouter};

use hrms_shared::Role;
use hrms_shared::types::PageRequest;

use crate::AppState;
use crate::middleware::{
    AllowedRoles, TenantGuard, auth_middleware, require_role, tenant_middleware,
};

pub mod auth;
pub mod branches;
pub mod companies;
pub mod employees;
pub mod health;
pub mod payroll;
pub mod worklogs;

/// Company administrators.
pub(crate) const ADMIN: &[Role] = &[Role::Admin];
/// Administrators and HR officers.
pub(crate) const ADMIN_HR: &[Role] = &[Role::Admin, Role::Hr];
/// Platform operators.
pub(crate) const SUPERADMIN: &[Role] = &[Role::Superadmin];

/// Restricts `method` to callers holding one of `roles`.
pub(crate) fn gated(method: MethodRouter<AppState>, roles: &[Role]) -> MethodRouter<AppState> {
    method.route_layer(middleware::from_fn_with_state(
        AllowedRoles::new(roles),
        require_role,
    ))
}

/// Builds a page request from optional query values.
pub(crate) fn page_request(page: Option<u64>, limit: Option<u64>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        limit: limit.unwrap_or(defaults.limit),
    }
}

/// Creates the API router.
///
/// Public routes need no identity; identity routes resolve a tenant when the
/// headers name one; tenant routes require it.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let identity = Router::new()
        .merge(auth::protected_routes())
        .merge(companies::routes())
        .layer(middleware::from_fn_with_state(
            TenantGuard::permissive(state.tenant_store.clone()),
            tenant_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    let tenant = Router::new()
        .merge(branches::routes())
        .merge(employees::routes())
        .merge(worklogs::routes())
        .merge(payroll::routes())
        .layer(middleware::from_fn_with_state(
            TenantGuard::strict(state.tenant_store.clone()),
            tenant_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(identity)
        .merge(tenant)
}
