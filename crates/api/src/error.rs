//! HTTP rendering of [`AppError`] as RFC 9457 problem details.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use hrms_shared::AppError;

/// Detail sent instead of the real message for `internal` errors.
const INTERNAL_DETAIL: &str = "an unexpected error occurred";

/// Problem details body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub type_uri: &'static str,
    /// Short summary of the problem kind.
    pub title: &'static str,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    pub detail: String,
}

/// Error returned by every endpoint and middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// The problem body this error renders to.
    #[must_use]
    pub fn problem(&self) -> Problem {
        let detail = if self.0.is_internal() {
            INTERNAL_DETAIL.to_string()
        } else {
            self.0.message().to_string()
        };
        Problem {
            type_uri: "about:blank",
            title: self.0.title(),
            status: self.0.status_code(),
            detail,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            tracing::error!(error = %self.0, "request failed with internal error");
        }

        let problem = self.problem();
        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(problem),
        )
            .into_response()
    }
}

/// Result type for endpoint shims.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::bad_request("no fields to update"), 400, "Bad Request")]
    #[case(AppError::unauthorized("invalid or expired token"), 401, "Unauthorized")]
    #[case(AppError::forbidden("insufficient permission"), 403, "Forbidden")]
    #[case(AppError::not_found("payroll run not found"), 404, "Not Found")]
    #[case(AppError::conflict("a payroll run already exists for this month"), 409, "Conflict")]
    fn test_problem_carries_message(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] title: &str,
    ) {
        let message = err.message().to_string();
        let problem = ApiError(err).problem();
        assert_eq!(problem.status, status);
        assert_eq!(problem.title, title);
        assert_eq!(problem.detail, message);
        assert_eq!(problem.type_uri, "about:blank");
    }

    #[test]
    fn test_internal_detail_is_masked() {
        let problem = ApiError(AppError::internal("connection refused at 10.0.0.3")).problem();
        assert_eq!(problem.status, 500);
        assert_eq!(problem.detail, INTERNAL_DETAIL);
    }

    #[tokio::test]
    async fn test_response_is_problem_json() {
        let response = ApiError(AppError::conflict("branch code already exists in this company"))
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "about:blank",
                "title": "Conflict",
                "status": 409,
                "detail": "branch code already exists in this company"
            })
        );
    }
}
