//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication, tenancy and role middleware
//! - Command handlers dispatched through the mediator
//! - Problem-details error responses

pub mod commands;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::FromRef;
use axum::http::{HeaderName, header};
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use hrms_shared::{AppError, JwtService, Mediator, TenantAccessStore};

use crate::commands::auth::AuthService;
use crate::error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Command dispatch table.
    pub mediator: Arc<Mediator>,
    /// Login, refresh and logout.
    pub auth: Arc<AuthService>,
    /// JWT service for token validation.
    pub jwt: Arc<JwtService>,
    /// Company and branch permission lookups.
    pub tenant_store: Arc<dyn TenantAccessStore>,
    /// Whether the refresh cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    ApiError(AppError::internal(detail)).into_response()
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(&state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(middleware::tenant::COMPANY_HEADER),
                    HeaderName::from_static(middleware::tenant::BRANCH_HEADER),
                ]),
        )
        .with_state(state)
}
