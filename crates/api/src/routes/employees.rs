//! Employee routes, including year-to-date accumulators.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use hrms_core::employee::EmployeeStatus;
use hrms_shared::types::PageResponse;

use super::{ADMIN_HR, gated, page_request};
use crate::AppState;
use crate::commands::accumulations::{AccumulationResponse, GetAccumulations};
use crate::commands::employees::{CreateEmployee, EmployeeResponse, GetEmployee, ListEmployees};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Ctx};

/// Query parameters for listing employees.
#[derive(Debug, Default, Deserialize)]
pub struct ListEmployeesQuery {
    /// Status filter.
    pub status: Option<EmployeeStatus>,
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

/// Query parameters for accumulators.
#[derive(Debug, Default, Deserialize)]
pub struct AccumulationsQuery {
    /// Restricts to one year; lifetime rows have no year.
    pub year: Option<i32>,
}

/// Creates employee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/employees",
            get(list_employees).merge(gated(post(create_employee), ADMIN_HR)),
        )
        .route("/employees/{id}", get(get_employee))
        .route("/employees/{id}/accumulations", get(get_accumulations))
}

/// GET /employees
async fn list_employees(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiQuery(query): ApiQuery<ListEmployeesQuery>,
) -> ApiResult<Json<PageResponse<EmployeeResponse>>> {
    let command = ListEmployees {
        status: query.status,
        page: page_request(query.page, query.limit),
    };
    let employees = state
        .mediator
        .send::<ListEmployees, PageResponse<EmployeeResponse>>(&ctx, command)
        .await?;
    Ok(Json(employees))
}

/// GET /employees/{id}
async fn get_employee(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<EmployeeResponse>> {
    let employee = state
        .mediator
        .send::<GetEmployee, EmployeeResponse>(&ctx, GetEmployee { id })
        .await?;
    Ok(Json(employee))
}

/// POST /employees
async fn create_employee(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiJson(payload): ApiJson<CreateEmployee>,
) -> ApiResult<(StatusCode, Json<EmployeeResponse>)> {
    let employee = state
        .mediator
        .send::<CreateEmployee, EmployeeResponse>(&ctx, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// GET /employees/{id}/accumulations
async fn get_accumulations(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AccumulationsQuery>,
) -> ApiResult<Json<Vec<AccumulationResponse>>> {
    let command = GetAccumulations {
        employee_id,
        year: query.year,
    };
    let rows = state
        .mediator
        .send::<GetAccumulations, Vec<AccumulationResponse>>(&ctx, command)
        .await?;
    Ok(Json(rows))
}
