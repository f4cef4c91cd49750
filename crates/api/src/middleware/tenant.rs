//! Tenant resolution from the `X-Company-ID` and `X-Branch-ID` headers.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use hrms_shared::{AppError, AppResult, RequestContext, Role, TenantAccessStore, TenantInfo, UserInfo};

use crate::error::ApiError;

/// Header carrying the selected company.
pub const COMPANY_HEADER: &str = "x-company-id";
/// Header carrying the comma-separated selected branches.
pub const BRANCH_HEADER: &str = "x-branch-id";

/// How failures to resolve a tenant are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyMode {
    /// Every failure is returned to the caller; the company header is required.
    Strict,
    /// The request continues without a tenant when resolution fails.
    Permissive,
}

/// State of the tenant middleware.
#[derive(Clone)]
pub struct TenantGuard {
    store: Arc<dyn TenantAccessStore>,
    mode: TenancyMode,
}

impl std::fmt::Debug for TenantGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantGuard")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl TenantGuard {
    /// Guard that rejects requests without a resolvable tenant.
    #[must_use]
    pub fn strict(store: Arc<dyn TenantAccessStore>) -> Self {
        Self {
            store,
            mode: TenancyMode::Strict,
        }
    }

    /// Guard that lets requests through without a tenant.
    #[must_use]
    pub fn permissive(store: Arc<dyn TenantAccessStore>) -> Self {
        Self {
            store,
            mode: TenancyMode::Permissive,
        }
    }
}

fn parse_company(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    let Some(value) = headers.get(COMPANY_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::bad_request("invalid X-Company-ID header"))
}

fn parse_branches(headers: &HeaderMap) -> AppResult<Vec<Uuid>> {
    let Some(value) = headers.get(BRANCH_HEADER) else {
        return Ok(Vec::new());
    };
    let raw = value
        .to_str()
        .map_err(|_| AppError::bad_request("invalid X-Branch-ID header"))?;

    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = Uuid::parse_str(part)
            .map_err(|_| AppError::bad_request("invalid X-Branch-ID header"))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Resolves the tenant for `user` from the request headers.
///
/// Returns `None` when no company header is present. An admin with no branch
/// header sees every branch; anyone else is limited to assigned branches.
///
/// # Errors
///
/// Returns `bad_request` for malformed headers and `forbidden` when the user
/// has no role on the company or selects a branch outside their reach.
pub async fn resolve_tenant(
    store: &dyn TenantAccessStore,
    user: &UserInfo,
    headers: &HeaderMap,
) -> AppResult<Option<TenantInfo>> {
    let Some(company_id) = parse_company(headers)? else {
        return Ok(None);
    };

    let role = store
        .company_role(user.id, company_id)
        .await?
        .ok_or_else(|| AppError::forbidden("access denied to this company"))?;
    let is_admin = role == Role::Admin;

    let requested = parse_branches(headers)?;
    let branch_ids = if is_admin {
        if !requested.is_empty() {
            let owned = store.company_branches(company_id).await?;
            if requested.iter().any(|id| !owned.contains(id)) {
                return Err(AppError::forbidden("access denied to this branch"));
            }
        }
        requested
    } else {
        let assigned = store.assigned_branches(user.id, company_id).await?;
        if requested.is_empty() {
            // An empty list reads as "all branches" downstream.
            if assigned.is_empty() {
                return Err(AppError::forbidden("access denied to this branch"));
            }
            assigned
        } else if requested.iter().all(|id| assigned.contains(id)) {
            requested
        } else {
            return Err(AppError::forbidden("access denied to this branch"));
        }
    };

    Ok(Some(TenantInfo {
        company_id,
        branch_ids,
        is_admin,
    }))
}

/// Attaches the resolved [`TenantInfo`] to the request context.
///
/// Must run after [`super::auth_middleware`].
pub async fn tenant_middleware(
    State(guard): State<TenantGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    match resolve_tenant(guard.store.as_ref(), ctx.user(), request.headers()).await {
        Ok(Some(tenant)) => {
            request.extensions_mut().insert(ctx.with_tenant(tenant));
        }
        Ok(None) => {
            if guard.mode == TenancyMode::Strict {
                return Err(AppError::bad_request("missing X-Company-ID header").into());
            }
        }
        Err(err) if guard.mode == TenancyMode::Permissive && !err.is_internal() => {
            tracing::debug!(error = %err, "continuing without tenant");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::extractors::Ctx;

    #[derive(Default)]
    struct FakeStore {
        roles: HashMap<(Uuid, Uuid), Role>,
        assigned: HashMap<(Uuid, Uuid), Vec<Uuid>>,
        branches: HashMap<Uuid, Vec<Uuid>>,
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

        async fn company_branches(&self, company_id: Uuid) -> AppResult<Vec<Uuid>> {
            Ok(self.branches.get(&company_id).cloned().unwrap_or_default())
        }
    }

    struct World {
        store: Arc<FakeStore>,
        company: Uuid,
        branch_a: Uuid,
        branch_b: Uuid,
        admin: UserInfo,
        clerk: UserInfo,
        outsider: UserInfo,
    }

    fn user(name: &str, role: Role) -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            username: name.to_string(),
            role,
        }
    }

    fn world() -> World {
        let company = Uuid::new_v4();
        let branch_a = Uuid::new_v4();
        let branch_b = Uuid::new_v4();
        let admin = user("admin", Role::Admin);
        let clerk = user("clerk", Role::Hr);
        let outsider = user("outsider", Role::Admin);

        let mut store = FakeStore::default();
        store.roles.insert((admin.id, company), Role::Admin);
        store.roles.insert((clerk.id, company), Role::Hr);
        store.assigned.insert((clerk.id, company), vec![branch_a]);
        store.branches.insert(company, vec![branch_a, branch_b]);

        World {
            store: Arc::new(store),
            company,
            branch_a,
            branch_b,
            admin,
            clerk,
            outsider,
        }
    }

    fn app(guard: TenantGuard, user: UserInfo) -> Router {
        Router::new()
            .route(
                "/tenant",
                get(|Ctx(ctx): Ctx| async move {
                    match ctx.tenant() {
                        Some(t) => format!(
                            "{}:{}:{}",
                            t.company_id,
                            t.is_admin,
                            t.branch_ids
                                .iter()
                                .map(Uuid::to_string)
                                .collect::<Vec<_>>()
                                .join(",")
                        ),
                        None => "none".to_string(),
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(guard, tenant_middleware))
            .layer(middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let ctx = RequestContext::new(user.clone());
                    async move {
                        request.extensions_mut().insert(ctx);
                        next.run(request).await
                    }
                },
            ))
    }

    async fn call(app: Router, company: Option<String>, branches: Option<String>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/tenant");
        if let Some(company) = company {
            builder = builder.header(COMPANY_HEADER, company);
        }
        if let Some(branches) = branches {
            builder = builder.header(BRANCH_HEADER, branches);
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

    #[tokio::test]
    async fn test_admin_without_branch_header_sees_all() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, body) = call(app(guard, w.admin), Some(w.company.to_string()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{}:true:", w.company));
    }

    #[tokio::test]
    async fn test_non_admin_falls_back_to_assigned_branches() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, body) = call(app(guard, w.clerk), Some(w.company.to_string()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{}:false:{}", w.company, w.branch_a));
    }

    #[tokio::test]
    async fn test_branch_list_is_parsed_and_deduplicated() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let header = format!("{}, {},{}", w.branch_a, w.branch_b, w.branch_a);
        let (status, body) =
            call(app(guard, w.admin), Some(w.company.to_string()), Some(header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{}:true:{},{}", w.company, w.branch_a, w.branch_b));
    }

    #[tokio::test]
    async fn test_unassigned_branch_is_forbidden() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, body) = call(
            app(guard, w.clerk),
            Some(w.company.to_string()),
            Some(w.branch_b.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(detail(&body), "access denied to this branch");
    }

    #[tokio::test]
    async fn test_foreign_company_is_forbidden() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, body) = call(app(guard, w.outsider), Some(w.company.to_string()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(detail(&body), "access denied to this company");
    }

    #[tokio::test]
    async fn test_malformed_company_is_bad_request() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, _) = call(app(guard, w.admin), Some("acme".to_string()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_strict_requires_company_header() {
        let w = world();
        let guard = TenantGuard::strict(w.store.clone());
        let (status, body) = call(app(guard, w.admin), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail(&body), "missing X-Company-ID header");
    }

    #[tokio::test]
    async fn test_permissive_falls_through() {
        let w = world();
        let guard = TenantGuard::permissive(w.store.clone());
        let (status, body) = call(app(guard.clone(), w.admin), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "none");

        let (status, body) = call(app(guard, w.outsider), Some(w.company.to_string()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "none");
    }
}
