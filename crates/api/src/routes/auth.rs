//! Authentication routes: login, refresh, logout and the current identity.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use hrms_shared::AppError;
use hrms_shared::auth::{AuthUserResponse, LoginRequest, LoginResponse, RefreshRequest};

use crate::AppState;
use crate::commands::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, Ctx};

/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "refresh_token";
const COOKIE_PATH: &str = "/api/v1/auth";

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Routes that need an access token.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Strict)
        .path(COOKIE_PATH)
        .build()
}

/// The refresh token from the cookie, else from an optional JSON body.
fn refresh_token(jar: &CookieJar, body: &Bytes) -> ApiResult<String> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        return Ok(cookie.value().to_string());
    }
    let request: RefreshRequest = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?
    };
    request
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("missing refresh token").into())
}

/// POST /auth/login - Authenticate and issue a token pair.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let response = state
        .auth
        .login(&payload.username, &payload.password, user_agent(&headers))
        .await?;
    let jar = jar.add(refresh_cookie(&state, response.tokens.refresh_token.clone()));
    Ok((jar, Json(response)))
}

/// POST /auth/refresh - Rotate the refresh token.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let token = refresh_token(&jar, &body)?;
    let response = state.auth.refresh(&token, user_agent(&headers)).await?;
    let jar = jar.add(refresh_cookie(&state, response.tokens.refresh_token.clone()));
    Ok((jar, Json(response)))
}

/// POST /auth/logout - Revoke the session and clear the cookie.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<(CookieJar, StatusCode)> {
    if let Ok(token) = refresh_token(&jar, &body) {
        state.auth.logout(&token).await?;
    }
    let mut removal = refresh_cookie(&state, String::new());
    removal.make_removal();
    Ok((jar.add(removal), StatusCode::NO_CONTENT))
}

/// GET /auth/me - The caller and their companies.
async fn me(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<AuthUserResponse>> {
    let user = state
        .mediator
        .send::<CurrentUser, AuthUserResponse>(&ctx, CurrentUser)
        .await?;
    Ok(Json(user))
}
