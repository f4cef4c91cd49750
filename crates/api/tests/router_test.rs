//! Router-level tests for the request pipeline.
//!
//! Nothing here reaches a handler that needs the database, so the pool is
//! left disconnected and tenancy comes from an in-memory store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use hrms_api::commands::auth::AuthService;
use hrms_api::commands::{CommandDeps, EVENT_BUS, TRANSACTOR, build_mediator};
use hrms_api::{AppState, create_router};
use hrms_db::Transactor;
use hrms_shared::{
    AppResult, EventBus, JwtConfig, JwtService, RegistryBuilder, Role, TenantAccessStore,
};

#[derive(Default)]
struct FakeStore {
    roles: HashMap<(Uuid, Uuid), Role>,
    assigned: HashMap<(Uuid, Uuid), Vec<Uuid>>,
}

#[async_trait]
impl TenantAccessStore for FakeStore {
    async fn company_role(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<Role>> {
        Ok(self.roles.get(&(user_id, company_id)).copied())
    }

    async fn assigned_branches(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .assigned
            .get(&(user_id, company_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn company_branches(&self, _company_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(Vec::new())
    }
}

struct TestApp {
    router: Router,
    jwt: Arc<JwtService>,
    company: Uuid,
    staff: Uuid,
}

impl TestApp {
    fn new() -> Self {
        let company = Uuid::new_v4();
        let staff = Uuid::new_v4();
        let mut store = FakeStore::default();
        store.roles.insert((staff, company), Role::Staff);
        store.assigned.insert((staff, company), vec![Uuid::new_v4()]);

        let mut registry = RegistryBuilder::new();
        registry
            .provide(
                TRANSACTOR,
                Arc::new(Transactor::new(DatabaseConnection::Disconnected)),
            )
            .provide(EVENT_BUS, Arc::new(EventBus::new(16)));
        let registry = registry.build();

        let jwt = Arc::new(JwtService::new(JwtConfig::default()));
        let deps = CommandDeps::from_registry(&registry).unwrap();
        let state = AppState {
            mediator: build_mediator(&registry).unwrap(),
            auth: Arc::new(AuthService::new(&deps, jwt.clone())),
            jwt: jwt.clone(),
            tenant_store: Arc::new(store),
            cookie_secure: false,
        };

        Self {
            router: create_router(state, Duration::from_secs(5)),
            jwt,
            company,
            staff,
        }
    }

    fn bearer(&self, user_id: Uuid, role: Role) -> String {
        let pair = self.jwt.issue_pair(user_id, "tester", role.as_str()).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app
        .call(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/employees").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], "missing authorization header");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_tenant_routes_require_company_header() {
    let app = TestApp::new();
    let request = Request::get("/api/v1/branches")
        .header(header::AUTHORIZATION, app.bearer(Uuid::new_v4(), Role::Admin))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "missing X-Company-ID header");
}

#[tokio::test]
async fn test_foreign_company_is_forbidden() {
    let app = TestApp::new();
    let request = Request::get("/api/v1/employees")
        .header(header::AUTHORIZATION, app.bearer(Uuid::new_v4(), Role::Hr))
        .header("x-company-id", app.company.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "access denied to this company");
}

#[tokio::test]
async fn test_staff_cannot_create_runs() {
    let app = TestApp::new();
    let request = Request::post("/api/v1/payroll-runs")
        .header(header::AUTHORIZATION, app.bearer(app.staff, Role::Staff))
        .header("x-company-id", app.company.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "insufficient permission");
}

#[tokio::test]
async fn test_only_superadmin_creates_companies() {
    let app = TestApp::new();
    let request = Request::post("/api/v1/companies")
        .header(header::AUTHORIZATION, app.bearer(Uuid::new_v4(), Role::Admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"code":"ACME","name":"Acme"}"#))
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "insufficient permission");
}

#[tokio::test]
async fn test_refresh_without_token() {
    let app = TestApp::new();
    let request = Request::post("/api/v1/auth/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "missing refresh token");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/v1/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("refresh_token="));
}
