//! Branch routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use hrms_core::org::OrgStatus;
use hrms_shared::NoResponse;
use hrms_shared::types::{PageRequest, PageResponse};

use super::{ADMIN, gated};
use crate::AppState;
use crate::commands::branches::{
    BranchResponse, ChangeBranchStatus, CreateBranch, DeleteBranch, ListBranches, SetDefaultBranch,
};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Ctx};

/// Request body for creating a branch.
#[derive(Debug, Deserialize)]
pub struct CreateBranchBody {
    /// Code unique within the company.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    /// Target status.
    pub status: OrgStatus,
}

/// Creates branch routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/branches",
            get(list_branches).merge(gated(post(create_branch), ADMIN)),
        )
        .route("/branches/{id}", gated(delete(delete_branch), ADMIN))
        .route("/branches/{id}/status", gated(patch(change_status), ADMIN))
        .route("/branches/{id}/default", gated(post(set_default), ADMIN))
}

/// GET /branches
async fn list_branches(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<PageResponse<BranchResponse>>> {
    let branches = state
        .mediator
        .send::<ListBranches, PageResponse<BranchResponse>>(&ctx, ListBranches { page })
        .await?;
    Ok(Json(branches))
}

/// POST /branches
async fn create_branch(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiJson(body): ApiJson<CreateBranchBody>,
) -> ApiResult<(StatusCode, Json<BranchResponse>)> {
    let command = CreateBranch {
        code: body.code,
        name: body.name,
    };
    let branch = state
        .mediator
        .send::<CreateBranch, BranchResponse>(&ctx, command)
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// PATCH /branches/{id}/status
async fn change_status(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Json<BranchResponse>> {
    let command = ChangeBranchStatus {
        id,
        status: body.status,
    };
    let branch = state
        .mediator
        .send::<ChangeBranchStatus, BranchResponse>(&ctx, command)
        .await?;
    Ok(Json(branch))
}

/// POST /branches/{id}/default
async fn set_default(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<BranchResponse>> {
    let branch = state
        .mediator
        .send::<SetDefaultBranch, BranchResponse>(&ctx, SetDefaultBranch { id })
        .await?;
    Ok(Json(branch))
}

/// DELETE /branches/{id}
async fn delete_branch(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .mediator
        .send::<DeleteBranch, NoResponse>(&ctx, DeleteBranch { id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
