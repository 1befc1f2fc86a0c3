//! crates/alumni_connect_core/src/workflow/mentorship.rs
//!
//! Mentor registration and the mentorship request state machine. Accepting a
//! request consumes one unit of the mentor's capacity; the capacity check and
//! the status change commit together or not at all.

use tracing::{info, warn};
use uuid::Uuid;

use super::WorkflowEngine;
use crate::domain::{Decision, MentorData, MentorProfile, MentorshipRequest};
use crate::error::{storage_failure, WorkflowError};
use crate::ports::{AcceptOutcome, ProfileInsert, RequestInsert, Transition};
use crate::validation::validate_mentor_data;

impl WorkflowEngine {
    /// Creates the mentor profile for an alumni account.
    pub async fn register_mentor(
        &self,
        user_id: Uuid,
        data: MentorData,
    ) -> Result<MentorProfile, WorkflowError> {
        let profile = validate_mentor_data(data, self.policy.default_max_mentees)?;
        match self
            .store
            .insert_mentor_profile(user_id, profile)
            .await
            .map_err(storage_failure)?
        {
            ProfileInsert::Created(mentor) => {
                info!(%user_id, max_mentees = mentor.max_mentees, "mentor registered");
                Ok(mentor)
            }
            ProfileInsert::AlreadyExists => Err(WorkflowError::ProfileExists),
            ProfileInsert::NotEligible => Err(WorkflowError::NotAuthorized(
                "only alumni can register as mentors".into(),
            )),
        }
    }

    pub async fn mentor_profile(&self, user_id: Uuid) -> Result<MentorProfile, WorkflowError> {
        self.store
            .find_mentor_profile(user_id)
            .await
            .map_err(storage_failure)?
            .ok_or(WorkflowError::MentorNotFound)
    }

    /// Opens a `PENDING` request from `mentee_id` to the mentor `mentor_id`.
    pub async fn request_mentorship(
        &self,
        mentee_id: Uuid,
        mentor_id: Uuid,
    ) -> Result<MentorshipRequest, WorkflowError> {
        if mentee_id == mentor_id {
            return Err(WorkflowError::InvalidInput(
                "cannot request mentorship from yourself".into(),
            ));
        }
        match self
            .store
            .insert_mentorship_request(mentor_id, mentee_id)
            .await
            .map_err(storage_failure)?
        {
            RequestInsert::Created(request) => {
                info!(request_id = %request.id, %mentor_id, %mentee_id, "mentorship requested");
                Ok(request)
            }
            RequestInsert::Duplicate => Err(WorkflowError::DuplicateRequest),
            RequestInsert::MentorMissing => Err(WorkflowError::MentorNotFound),
        }
    }

    /// Decides the pending request addressed to `mentor_id` by `mentee_id`.
    ///
    /// A refused acceptance for lack of capacity leaves the request `PENDING`.
    pub async fn decide_mentorship(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
        decision: Decision,
    ) -> Result<MentorshipRequest, WorkflowError> {
        // Only the targeted mentor can hold a decision over these requests.
        if self
            .store
            .find_mentor_profile(mentor_id)
            .await
            .map_err(storage_failure)?
            .is_none()
        {
            return Err(WorkflowError::NotAuthorized(
                "only mentors can decide mentorship requests".into(),
            ));
        }

        match decision {
            Decision::Accept => match self
                .store
                .accept_mentorship(mentor_id, mentee_id)
                .await
                .map_err(storage_failure)?
            {
                AcceptOutcome::Accepted {
                    request,
                    current_mentees,
                    max_mentees,
                } => {
                    info!(%mentor_id, %mentee_id, current_mentees, max_mentees, "mentorship accepted");
                    Ok(request)
                }
                AcceptOutcome::CapacityExceeded { max_mentees } => {
                    warn!(%mentor_id, %mentee_id, max_mentees, "mentor at capacity");
                    Err(WorkflowError::CapacityExceeded { max_mentees })
                }
                AcceptOutcome::NotPending(current) => {
                    Err(WorkflowError::InvalidTransition { current })
                }
                AcceptOutcome::Missing => Err(WorkflowError::NotFound("mentorship request".into())),
            },
            Decision::Reject => match self
                .store
                .reject_mentorship(mentor_id, mentee_id)
                .await
                .map_err(storage_failure)?
            {
                Transition::Applied(request) => {
                    info!(%mentor_id, %mentee_id, "mentorship rejected");
                    Ok(request)
                }
                Transition::NotPending(current) => {
                    Err(WorkflowError::InvalidTransition { current })
                }
                Transition::Missing => Err(WorkflowError::NotFound("mentorship request".into())),
            },
        }
    }
}
