//! services/api/src/web/errors.rs
//!
//! Renders `WorkflowError` as an HTTP status plus a `{ "error", "message" }` body.

use alumni_connect_core::{UnknownVariant, WorkflowError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

/// The body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `CAPACITY_EXCEEDED`.
    pub error: String,
    pub message: String,
}

/// A handler failure. Wraps the core error so handlers can use `?`.
#[derive(Debug)]
pub struct HttpError(pub WorkflowError);

impl From<WorkflowError> for HttpError {
    fn from(err: WorkflowError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WorkflowError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        Self(WorkflowError::InvalidInput(rejection.body_text()))
    }
}

pub fn status_for(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::InvalidInput(_) | WorkflowError::InvalidRoleData(_) => {
            StatusCode::BAD_REQUEST
        }
        WorkflowError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        WorkflowError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        WorkflowError::NotFound(_) | WorkflowError::MentorNotFound => StatusCode::NOT_FOUND,
        WorkflowError::DuplicateAccount
        | WorkflowError::ProfileExists
        | WorkflowError::AlreadyApplied
        | WorkflowError::InternshipClosed
        | WorkflowError::InvalidTransition { .. }
        | WorkflowError::DuplicateRequest
        | WorkflowError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        WorkflowError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        WorkflowError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(code = self.0.code(), "request failed: {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `axum::Json` whose rejections render as `INVALID_INPUT` error bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` with the same error body for malformed ids.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct PathParam<T>(pub T);

/// Parses a wire enum value, reporting failures through `to_error`.
pub fn parse_tag<T>(raw: &str, to_error: fn(String) -> WorkflowError) -> Result<T, HttpError>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    raw.trim()
        .parse()
        .map_err(|e: UnknownVariant| HttpError(to_error(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_connect_core::{Domain, RequestStatus};

    #[test]
    fn every_category_has_a_distinct_status() {
        assert_eq!(status_for(&WorkflowError::InvalidRoleData("cgpa".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&WorkflowError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&WorkflowError::NotAuthorized("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&WorkflowError::MentorNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&WorkflowError::InvalidTransition { current: RequestStatus::Accepted }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&WorkflowError::UpstreamUnavailable), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&WorkflowError::StorageUnavailable), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_tags_become_the_requested_error() {
        let parsed: Result<Domain, _> = parse_tag(" FINANCE ", WorkflowError::InvalidInput);
        assert_eq!(parsed.unwrap(), Domain::Finance);

        let err = parse_tag::<Domain>("GARDENING", WorkflowError::InvalidRoleData).unwrap_err();
        assert!(matches!(err.0, WorkflowError::InvalidRoleData(ref m) if m.contains("GARDENING")));
    }
}
