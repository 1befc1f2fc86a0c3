//! services/api/src/web/mentorship.rs
//!
//! Mentor registration and the capacity-limited mentorship request workflow.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use alumni_connect_core::{MentorData, MentorProfile, MentorshipRequest, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{parse_tag, ErrorBody, HttpError, JsonBody, PathParam};
use crate::web::internships::DecisionRequest;
use crate::web::state::{AppState, Caller};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterMentorRequest {
    /// Domain tags, at least one.
    pub keywords: Vec<String>,
    pub experience_years: Option<i32>,
    /// `VERY_LOW`, `LOW` or `HIGH`.
    pub interaction: Option<String>,
    /// Defaults to the service's configured capacity.
    pub max_mentees: Option<i32>,
    pub mentee_levels: Vec<String>,
    pub interests: Vec<String>,
    pub linkedin_profile: Option<String>,
    pub current_organization: Option<String>,
    pub passing_year: Option<i32>,
}

fn parse_tags<T>(raw: &[String]) -> Result<BTreeSet<T>, HttpError>
where
    T: FromStr<Err = alumni_connect_core::UnknownVariant> + Ord,
{
    raw.iter()
        .map(|v| parse_tag(v, WorkflowError::InvalidInput))
        .collect()
}

impl RegisterMentorRequest {
    fn into_mentor_data(self) -> Result<MentorData, HttpError> {
        Ok(MentorData {
            keywords: parse_tags(&self.keywords)?,
            experience_years: self.experience_years,
            interaction: self
                .interaction
                .as_deref()
                .map(|i| parse_tag(i, WorkflowError::InvalidInput))
                .transpose()?,
            max_mentees: self.max_mentees,
            mentee_levels: parse_tags(&self.mentee_levels)?,
            interests: parse_tags(&self.interests)?,
            linkedin_profile: self.linkedin_profile,
            current_organization: self.current_organization,
            passing_year: self.passing_year,
        })
    }
}

fn to_strings<T: ToString>(values: BTreeSet<T>) -> Vec<String> {
    values.iter().map(T::to_string).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MentorResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keywords: Vec<String>,
    pub experience_years: Option<u32>,
    pub interaction: Option<String>,
    pub max_mentees: u32,
    /// Accepted requests; never exceeds `max_mentees`.
    pub current_mentees: u32,
    pub mentee_levels: Vec<String>,
    pub interests: Vec<String>,
    pub linkedin_profile: Option<String>,
    pub current_organization: Option<String>,
    pub passing_year: Option<u32>,
}

impl From<MentorProfile> for MentorResponse {
    fn from(m: MentorProfile) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            keywords: to_strings(m.keywords),
            experience_years: m.experience_years,
            interaction: m.interaction.map(|i| i.to_string()),
            max_mentees: m.max_mentees,
            current_mentees: m.current_mentees,
            mentee_levels: to_strings(m.mentee_levels),
            interests: to_strings(m.interests),
            linkedin_profile: m.linkedin_profile,
            current_organization: m.current_organization,
            passing_year: m.passing_year,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MentorshipRequestBody {
    /// Account id of the mentor to ask.
    pub mentor_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MentorshipResponse {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<MentorshipRequest> for MentorshipResponse {
    fn from(r: MentorshipRequest) -> Self {
        Self {
            id: r.id,
            mentor_id: r.mentor_id,
            mentee_id: r.mentee_id,
            status: r.status.to_string(),
            created_at: r.created_at,
            decided_at: r.decided_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /mentors - Register the calling alumni as a mentor
#[utoipa::path(
    post,
    path = "/mentors",
    request_body = RegisterMentorRequest,
    responses(
        (status = 201, description = "Mentor profile created", body = MentorResponse),
        (status = 400, description = "Invalid mentor fields", body = ErrorBody),
        (status = 403, description = "Caller is not an alumni", body = ErrorBody),
        (status = 409, description = "Caller is already a mentor", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "mentorship"
)]
pub async fn register_mentor_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    JsonBody(req): JsonBody<RegisterMentorRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let mentor = state
        .engine
        .register_mentor(caller, req.into_mentor_data()?)
        .await?;
    Ok((StatusCode::CREATED, Json(MentorResponse::from(mentor))))
}

/// GET /mentors/{user_id} - Fetch a mentor profile with its current occupancy
#[utoipa::path(
    get,
    path = "/mentors/{user_id}",
    params(("user_id" = Uuid, Path, description = "The mentor's account id")),
    responses(
        (status = 200, description = "The mentor profile", body = MentorResponse),
        (status = 404, description = "No mentor profile for this account", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "mentorship"
)]
pub async fn get_mentor_handler(
    State(state): State<Arc<AppState>>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<MentorResponse>, HttpError> {
    let mentor = state.engine.mentor_profile(user_id).await?;
    Ok(Json(mentor.into()))
}

/// POST /mentorships - Ask a mentor for mentorship
#[utoipa::path(
    post,
    path = "/mentorships",
    request_body = MentorshipRequestBody,
    responses(
        (status = 201, description = "Request opened", body = MentorshipResponse),
        (status = 400, description = "Caller asked themselves", body = ErrorBody),
        (status = 404, description = "No such mentor", body = ErrorBody),
        (status = 409, description = "A request is already open", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "mentorship"
)]
pub async fn request_mentorship_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    JsonBody(req): JsonBody<MentorshipRequestBody>,
) -> Result<impl IntoResponse, HttpError> {
    let request = state.engine.request_mentorship(caller, req.mentor_id).await?;
    Ok((StatusCode::CREATED, Json(MentorshipResponse::from(request))))
}

/// POST /mentorships/{mentee_id}/decision - The calling mentor accepts or rejects
#[utoipa::path(
    post,
    path = "/mentorships/{mentee_id}/decision",
    params(("mentee_id" = Uuid, Path, description = "The requesting mentee's account id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = MentorshipResponse),
        (status = 403, description = "Caller is not a mentor", body = ErrorBody),
        (status = 404, description = "No request from this mentee", body = ErrorBody),
        (status = 409, description = "Already decided, or the mentor is at capacity", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "mentorship"
)]
pub async fn decide_mentorship_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    PathParam(mentee_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<DecisionRequest>,
) -> Result<Json<MentorshipResponse>, HttpError> {
    let request = state
        .engine
        .decide_mentorship(caller, mentee_id, req.decision()?)
        .await?;
    Ok(Json(request.into()))
}
