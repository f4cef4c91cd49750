//! Company routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use hrms_shared::auth::CompanyMembership;

use super::{SUPERADMIN, gated};
use crate::AppState;
use crate::commands::companies::{CompanyResponse, CreateCompany, ListMyCompanies};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, Ctx};

/// Creates company routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/companies",
        get(list_companies).merge(gated(post(create_company), SUPERADMIN)),
    )
}

/// GET /companies - Companies the caller belongs to.
async fn list_companies(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
) -> ApiResult<Json<Vec<CompanyMembership>>> {
    let companies = state
        .mediator
        .send::<ListMyCompanies, Vec<CompanyMembership>>(&ctx, ListMyCompanies)
        .await?;
    Ok(Json(companies))
}

/// POST /companies - Create a company with its default branch.
async fn create_company(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiJson(payload): ApiJson<CreateCompany>,
) -> ApiResult<(StatusCode, Json<CompanyResponse>)> {
    let company = state
        .mediator
        .send::<CreateCompany, CompanyResponse>(&ctx, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}
