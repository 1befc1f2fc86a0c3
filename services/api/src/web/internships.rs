//! services/api/src/web/internships.rs
//!
//! Internship posting and the application workflow.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use alumni_connect_core::{Decision, Internship, InternshipApplication, NewInternship, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{parse_tag, ErrorBody, HttpError, JsonBody, PathParam};
use crate::web::state::{AppState, Caller};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInternshipRequest {
    pub title: String,
    pub description: String,
    pub domain: String,
    pub location: String,
    /// Monthly stipend in the smallest currency unit.
    pub compensation: Option<i64>,
    pub duration_weeks: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub eligibility: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InternshipResponse {
    pub id: Uuid,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub location: String,
    pub compensation: Option<i64>,
    pub duration_weeks: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub eligibility: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Internship> for InternshipResponse {
    fn from(i: Internship) -> Self {
        Self {
            id: i.id,
            posted_by: i.posted_by,
            title: i.title,
            description: i.description,
            domain: i.domain.to_string(),
            location: i.location,
            compensation: i.compensation,
            duration_weeks: i.duration_weeks,
            starts_at: i.starts_at,
            ends_at: i.ends_at,
            eligibility: i.eligibility,
            closed: i.closed,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub student_id: Uuid,
    /// `PENDING`, `ACCEPTED` or `REJECTED`.
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<InternshipApplication> for ApplicationResponse {
    fn from(a: InternshipApplication) -> Self {
        Self {
            id: a.id,
            internship_id: a.internship_id,
            student_id: a.student_id,
            status: a.status.to_string(),
            applied_at: a.applied_at,
            decided_at: a.decided_at,
        }
    }
}

/// Body of both decision endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    /// `ACCEPTED` or `REJECTED`.
    pub status: String,
}

impl DecisionRequest {
    pub fn decision(&self) -> Result<Decision, HttpError> {
        parse_tag(&self.status, WorkflowError::InvalidInput)
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /internships - Post an internship (alumni only)
#[utoipa::path(
    post,
    path = "/internships",
    request_body = CreateInternshipRequest,
    responses(
        (status = 201, description = "Internship posted", body = InternshipResponse),
        (status = 400, description = "Invalid internship fields", body = ErrorBody),
        (status = 403, description = "Caller is not an alumni", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "internships"
)]
pub async fn post_internship_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    JsonBody(req): JsonBody<CreateInternshipRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let internship = NewInternship {
        title: req.title,
        description: req.description,
        domain: parse_tag(&req.domain, WorkflowError::InvalidInput)?,
        location: req.location,
        compensation: req.compensation,
        duration_weeks: req.duration_weeks,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        eligibility: req.eligibility,
    };
    let internship = state.engine.post_internship(caller, internship).await?;
    Ok((StatusCode::CREATED, Json(InternshipResponse::from(internship))))
}

/// GET /internships/{internship_id} - Fetch one internship
#[utoipa::path(
    get,
    path = "/internships/{internship_id}",
    params(("internship_id" = Uuid, Path, description = "Internship id")),
    responses(
        (status = 200, description = "The internship", body = InternshipResponse),
        (status = 404, description = "No such internship", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "internships"
)]
pub async fn get_internship_handler(
    State(state): State<Arc<AppState>>,
    PathParam(internship_id): PathParam<Uuid>,
) -> Result<Json<InternshipResponse>, HttpError> {
    let internship = state.engine.internship(internship_id).await?;
    Ok(Json(internship.into()))
}

/// POST /internships/{internship_id}/close - Stop accepting applications
#[utoipa::path(
    post,
    path = "/internships/{internship_id}/close",
    params(("internship_id" = Uuid, Path, description = "Internship id")),
    responses(
        (status = 200, description = "Internship closed (idempotent)", body = InternshipResponse),
        (status = 403, description = "Caller did not post this internship", body = ErrorBody),
        (status = 404, description = "No such internship", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "internships"
)]
pub async fn close_internship_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    PathParam(internship_id): PathParam<Uuid>,
) -> Result<Json<InternshipResponse>, HttpError> {
    let internship = state.engine.close_internship(caller, internship_id).await?;
    Ok(Json(internship.into()))
}

/// POST /internships/{internship_id}/applications - Apply as the calling student
#[utoipa::path(
    post,
    path = "/internships/{internship_id}/applications",
    params(("internship_id" = Uuid, Path, description = "Internship id")),
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 403, description = "Caller is not a student", body = ErrorBody),
        (status = 404, description = "No such internship", body = ErrorBody),
        (status = 409, description = "Already applied, or the internship is closed", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "internships"
)]
pub async fn apply_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    PathParam(internship_id): PathParam<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = state.engine.apply(caller, internship_id).await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

/// POST /internships/{internship_id}/applications/{student_id}/decision - Accept or reject
#[utoipa::path(
    post,
    path = "/internships/{internship_id}/applications/{student_id}/decision",
    params(
        ("internship_id" = Uuid, Path, description = "Internship id"),
        ("student_id" = Uuid, Path, description = "Applicant's account id")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = ApplicationResponse),
        (status = 403, description = "Caller did not post this internship", body = ErrorBody),
        (status = 404, description = "No such application", body = ErrorBody),
        (status = 409, description = "Application already decided", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "internships"
)]
pub async fn decide_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    PathParam((internship_id, student_id)): PathParam<(Uuid, Uuid)>,
    JsonBody(req): JsonBody<DecisionRequest>,
) -> Result<Json<ApplicationResponse>, HttpError> {
    let application = state
        .engine
        .decide_application(caller, internship_id, student_id, req.decision()?)
        .await?;
    Ok(Json(application.into()))
}
