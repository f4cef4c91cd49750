//! Per-route role allow-lists.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use hrms_shared::{AppError, RequestContext, Role};

use crate::error::ApiError;

/// Roles allowed through a route. Empty allows everyone.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    /// Builds an allow-list.
    #[must_use]
    pub fn new(roles: &[Role]) -> Self {
        Self(roles.into())
    }

    /// Whether `role` passes the gate.
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        self.0.is_empty() || self.0.contains(&role)
    }
}

/// Rejects callers whose global role is not in the allow-list.
pub async fn require_role(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.user().role)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    if !allowed.permits(role) {
        return Err(AppError::forbidden("insufficient permission").into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use hrms_shared::UserInfo;
    use rstest::rstest;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(allowed: AllowedRoles, role: Role) -> Router {
        Router::new()
            .route("/gated", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(allowed, require_role))
            .layer(middleware::from_fn(
                move |mut request: Request, next: Next| async move {
                    request.extensions_mut().insert(RequestContext::new(UserInfo {
                        id: Uuid::new_v4(),
                        username: "tester".to_string(),
                        role,
                    }));
                    next.run(request).await
                },
            ))
    }

    #[rstest]
    #[case(&[Role::Admin, Role::Hr], Role::Hr, StatusCode::OK)]
    #[case(&[Role::Admin, Role::Hr], Role::Admin, StatusCode::OK)]
    #[case(&[Role::Admin, Role::Hr], Role::Staff, StatusCode::FORBIDDEN)]
    #[case(&[Role::Superadmin], Role::Admin, StatusCode::FORBIDDEN)]
    #[case(&[], Role::Staff, StatusCode::OK)]
    #[tokio::test]
    async fn test_role_gate(#[case] roles: &[Role], #[case] role: Role, #[case] expected: StatusCode) {
        let response = app(AllowedRoles::new(roles), role)
            .oneshot(Request::builder().uri("/gated").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}
