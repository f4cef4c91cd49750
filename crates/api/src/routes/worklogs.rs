//! Worklog routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use hrms_shared::NoResponse;
use hrms_shared::types::PageResponse;

use super::{ADMIN_HR, gated, page_request};
use crate::AppState;
use crate::commands::worklogs::{CreateWorklog, DeleteWorklog, ListWorklogs, WorklogResponse};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Ctx};

/// Query parameters for listing worklogs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWorklogsQuery {
    /// Employee filter.
    pub employee_id: Option<Uuid>,
    /// First work date, inclusive.
    pub from: Option<NaiveDate>,
    /// Last work date, inclusive.
    pub to: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

/// Creates worklog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/worklogs",
            get(list_worklogs).merge(gated(post(create_worklog), ADMIN_HR)),
        )
        .route("/worklogs/{id}", gated(delete(delete_worklog), ADMIN_HR))
}

/// GET /worklogs
async fn list_worklogs(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiQuery(query): ApiQuery<ListWorklogsQuery>,
) -> ApiResult<Json<PageResponse<WorklogResponse>>> {
    let command = ListWorklogs {
        employee_id: query.employee_id,
        from: query.from,
        to: query.to,
        page: page_request(query.page, query.limit),
    };
    let worklogs = state
        .mediator
        .send::<ListWorklogs, PageResponse<WorklogResponse>>(&ctx, command)
        .await?;
    Ok(Json(worklogs))
}

/// POST /worklogs
async fn create_worklog(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiJson(payload): ApiJson<CreateWorklog>,
) -> ApiResult<(StatusCode, Json<WorklogResponse>)> {
    let worklog = state
        .mediator
        .send::<CreateWorklog, WorklogResponse>(&ctx, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(worklog)))
}

/// DELETE /worklogs/{id}
async fn delete_worklog(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .mediator
        .send::<DeleteWorklog, NoResponse>(&ctx, DeleteWorklog { id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
