//! Bearer token authentication.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use hrms_shared::{AppError, JwtService, RequestContext, Role, UserInfo};

use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validates the access token and stores a [`RequestContext`] in the request
/// extensions. Tenancy is left to [`super::tenant_middleware`].
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| AppError::unauthorized("invalid authorization header"))?;

    let claims = jwt.validate_access_token(token).map_err(|err| {
        tracing::debug!(error = %err, "rejected access token");
        AppError::unauthorized("invalid or expired token")
    })?;

    let role = Role::parse(&claims.role)
        .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

    let ctx = RequestContext::new(UserInfo {
        id: claims.sub,
        username: claims.username,
        role,
    });
    let span = ctx.span().clone();
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).instrument(span).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use http_body_util::BodyExt;
    use hrms_shared::JwtConfig;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::extractors::Ctx;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig::default()))
    }

    fn app(jwt: Arc<JwtService>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Ctx(ctx): Ctx| async move { ctx.user().username.clone() }),
            )
            .layer(middleware::from_fn_with_state(jwt, auth_middleware))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn detail(body: &str) -> String {
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        json["detail"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_valid_token_populates_context() {
        let jwt = jwt();
        let pair = jwt.issue_pair(Uuid::new_v4(), "alice", "hr").unwrap();
        let header = format!("Bearer {}", pair.access_token);

        let (status, body) = call(app(jwt), Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (status, body) = call(app(jwt()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(detail(&body), "missing authorization header");
    }

    #[tokio::test]
    async fn test_malformed_header() {
        let (status, body) = call(app(jwt()), Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(detail(&body), "invalid authorization header");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let jwt = jwt();
        let pair = jwt.issue_pair(Uuid::new_v4(), "alice", "hr").unwrap();
        let header = format!("Bearer {}", pair.refresh_token);

        let (status, body) = call(app(jwt), Some(&header)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(detail(&body), "invalid or expired token");
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let (status, body) = call(app(jwt()), Some("Bearer not.a.jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(detail(&body), "invalid or expired token");
    }
}
