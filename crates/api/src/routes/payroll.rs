//! Payroll run and item routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use hrms_core::payroll::{ItemPatch, RunStatus};
use hrms_shared::NoResponse;
use hrms_shared::types::PageResponse;

use super::{ADMIN_HR, gated, page_request};
use crate::AppState;
use crate::commands::payroll_items::{AdjustItem, GetItem, ItemResponse};
use crate::commands::payroll_runs::{
    CreateRun, CreatedRunResponse, DeleteRun, GetRun, ListRunItems, ListRuns, RunResponse,
    UpdateRun,
};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Ctx};

/// Query parameters for listing runs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRunsQuery {
    /// Status filter.
    pub status: Option<RunStatus>,
    /// Payroll month filter.
    pub payroll_month: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

/// Request body for updating a run.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRunBody {
    /// New pay date.
    pub pay_date: Option<NaiveDate>,
    /// Target status.
    pub status: Option<RunStatus>,
}

/// Creates payroll routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payroll-runs",
            get(list_runs).merge(gated(post(create_run), ADMIN_HR)),
        )
        .route(
            "/payroll-runs/{id}",
            get(get_run).merge(gated(
                patch(update_run).delete(delete_run),
                ADMIN_HR,
            )),
        )
        .route("/payroll-runs/{id}/items", get(list_run_items))
        .route(
            "/payroll-items/{id}",
            get(get_item).merge(gated(patch(adjust_item), ADMIN_HR)),
        )
}

/// GET /payroll-runs
async fn list_runs(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiQuery(query): ApiQuery<ListRunsQuery>,
) -> ApiResult<Json<PageResponse<RunResponse>>> {
    let command = ListRuns {
        status: query.status,
        payroll_month: query.payroll_month,
        page: page_request(query.page, query.limit),
    };
    let runs = state
        .mediator
        .send::<ListRuns, PageResponse<RunResponse>>(&ctx, command)
        .await?;
    Ok(Json(runs))
}

/// POST /payroll-runs - Create a run for the selected branch.
async fn create_run(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiJson(payload): ApiJson<CreateRun>,
) -> ApiResult<(StatusCode, Json<CreatedRunResponse>)> {
    let run = state
        .mediator
        .send::<CreateRun, CreatedRunResponse>(&ctx, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /payroll-runs/{id}
async fn get_run(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<RunResponse>> {
    let run = state
        .mediator
        .send::<GetRun, RunResponse>(&ctx, GetRun { id })
        .await?;
    Ok(Json(run))
}

/// PATCH /payroll-runs/{id} - Change the pay date and/or move the status.
async fn update_run(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateRunBody>,
) -> ApiResult<Json<RunResponse>> {
    let command = UpdateRun {
        id,
        pay_date: body.pay_date,
        status: body.status,
    };
    let run = state
        .mediator
        .send::<UpdateRun, RunResponse>(&ctx, command)
        .await?;
    Ok(Json(run))
}

/// DELETE /payroll-runs/{id}
async fn delete_run(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .mediator
        .send::<DeleteRun, NoResponse>(&ctx, DeleteRun { id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /payroll-runs/{id}/items
async fn list_run_items(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(run_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    let items = state
        .mediator
        .send::<ListRunItems, Vec<ItemResponse>>(&ctx, ListRunItems { run_id })
        .await?;
    Ok(Json(items))
}

/// GET /payroll-items/{id}
async fn get_item(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .mediator
        .send::<GetItem, ItemResponse>(&ctx, GetItem { id })
        .await?;
    Ok(Json(item))
}

/// PATCH /payroll-items/{id} - Manual adjustment of a pending item.
async fn adjust_item(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ItemPatch>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .mediator
        .send::<AdjustItem, ItemResponse>(&ctx, AdjustItem { id, patch })
        .await?;
    Ok(Json(item))
}
