//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup with a role profile, password sign-in,
//! external identity sign-in, and profile completion for external accounts.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use alumni_connect_core::{
    Account, AlumniData, IssuedSession, RoleData, Signup, StudentData, WorkflowError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{parse_tag, ErrorBody, HttpError, JsonBody};
use crate::web::state::{AppState, Caller};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Role-specific profile fields, discriminated by `role`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfilePayload {
    Student {
        full_name: String,
        /// On a 0-10 scale.
        cgpa: f64,
        cv_url: String,
        department: String,
        roll_number: String,
        domain: String,
    },
    Alumni {
        full_name: String,
        current_company: String,
        years_of_experience: i32,
        domain: String,
    },
}

impl ProfilePayload {
    /// Decodes a raw `profile` object. Every shape failure, including a
    /// missing object, is reported as `InvalidRoleData`.
    fn decode(raw: Option<Value>) -> Result<RoleData, HttpError> {
        let raw = raw.ok_or_else(|| {
            HttpError(WorkflowError::InvalidRoleData("profile is required".to_string()))
        })?;
        let payload: ProfilePayload = serde_json::from_value(raw)
            .map_err(|e| HttpError(WorkflowError::InvalidRoleData(e.to_string())))?;
        payload.into_role_data()
    }

    fn into_role_data(self) -> Result<RoleData, HttpError> {
        Ok(match self {
            ProfilePayload::Student {
                full_name,
                cgpa,
                cv_url,
                department,
                roll_number,
                domain,
            } => RoleData::Student(StudentData {
                full_name,
                cgpa,
                cv_url,
                department,
                roll_number,
                domain: parse_tag(&domain, WorkflowError::InvalidRoleData)?,
            }),
            ProfilePayload::Alumni {
                full_name,
                current_company,
                years_of_experience,
                domain,
            } => RoleData::Alumni(AlumniData {
                full_name,
                current_company,
                years_of_experience,
                domain: parse_tag(&domain, WorkflowError::InvalidRoleData)?,
            }),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Decoded separately so shape errors surface as `INVALID_ROLE_DATA`.
    #[schema(value_type = ProfilePayload)]
    pub profile: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExternalSigninRequest {
    /// Access token issued by the identity provider.
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// `STUDENT`, `ALUMNI`, or absent until the profile is completed.
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role.map(|r| r.to_string()),
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub account: AccountResponse,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            token: session.token,
            account: session.account.into(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create an account with exactly one role profile
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account and profile created", body = SessionResponse),
        (status = 400, description = "Invalid account or profile fields", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let signup = Signup {
        username: req.username,
        email: req.email,
        password: req.password,
        role_data: ProfilePayload::decode(req.profile)?,
    };
    let session = state.provisioner.provision_account(signup).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// POST /auth/signin - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SigninRequest>,
) -> Result<Json<SessionResponse>, HttpError> {
    let session = state.provisioner.sign_in(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

/// POST /auth/external - Sign in with an identity-provider access token
///
/// The first sign-in creates a password-less account without a role; complete
/// it with `POST /profile`.
#[utoipa::path(
    post,
    path = "/auth/external",
    request_body = ExternalSigninRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Token refused by the provider", body = ErrorBody),
        (status = 502, description = "Identity provider unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn external_signin_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ExternalSigninRequest>,
) -> Result<Json<SessionResponse>, HttpError> {
    let session = state
        .provisioner
        .sign_in_external(state.identity.as_ref(), &req.access_token)
        .await?;
    Ok(Json(session.into()))
}

/// POST /profile - Attach the role profile to an account that has none
#[utoipa::path(
    post,
    path = "/profile",
    request_body = ProfilePayload,
    responses(
        (status = 201, description = "Profile attached", body = AccountResponse),
        (status = 400, description = "Invalid profile fields", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 409, description = "The account already has a profile", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn complete_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(account_id)): Extension<Caller>,
    JsonBody(req): JsonBody<Value>,
) -> Result<impl IntoResponse, HttpError> {
    let account = state
        .provisioner
        .complete_profile(account_id, ProfilePayload::decode(Some(req))?)
        .await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student() -> Value {
        json!({
            "role": "STUDENT",
            "full_name": "Asha Rao",
            "cgpa": 8.7,
            "cv_url": "https://cv.example.com/asha.pdf",
            "department": "Computer Science",
            "roll_number": "CS-042",
            "domain": "SOFTWARE"
        })
    }

    fn role_data_error(raw: Option<Value>) -> String {
        match ProfilePayload::decode(raw) {
            Err(HttpError(WorkflowError::InvalidRoleData(message))) => message,
            other => panic!("expected invalid role data, got {other:?}"),
        }
    }

    #[test]
    fn well_formed_profiles_decode_to_role_data() {
        let data = ProfilePayload::decode(Some(student())).unwrap();
        assert!(matches!(data, RoleData::Student(ref s) if s.roll_number == "CS-042"));
    }

    #[test]
    fn shape_errors_are_role_data_errors() {
        assert!(role_data_error(None).contains("profile"));

        let mut missing = student();
        missing.as_object_mut().unwrap().remove("cv_url");
        assert!(role_data_error(Some(missing)).contains("cv_url"));

        let mut wrong_type = student();
        wrong_type["cgpa"] = json!("nine");
        role_data_error(Some(wrong_type));

        let mut unknown_role = student();
        unknown_role["role"] = json!("ADMIN");
        role_data_error(Some(unknown_role));

        role_data_error(Some(json!("STUDENT")));
    }
}
