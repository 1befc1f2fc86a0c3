//! crates/alumni_connect_core/src/workflow/internships.rs
//!
//! Internship posting and the application state machine:
//! `PENDING -> ACCEPTED | REJECTED`, decided by the alumni who posted the
//! internship.

use tracing::{info, warn};
use uuid::Uuid;

use super::WorkflowEngine;
use crate::domain::{Decision, Internship, InternshipApplication, NewInternship};
use crate::error::{storage_failure, WorkflowError};
use crate::ports::{ApplicationInsert, Transition};
use crate::validation::validate_internship;

impl WorkflowEngine {
    /// Publishes an internship owned by `alumni_id`.
    pub async fn post_internship(
        &self,
        alumni_id: Uuid,
        internship: NewInternship,
    ) -> Result<Internship, WorkflowError> {
        validate_internship(&internship)?;
        if !self
            .store
            .has_alumni_profile(alumni_id)
            .await
            .map_err(storage_failure)?
        {
            return Err(WorkflowError::NotAuthorized(
                "only alumni can post internships".into(),
            ));
        }
        let internship = self
            .store
            .insert_internship(alumni_id, internship)
            .await
            .map_err(storage_failure)?;
        info!(internship_id = %internship.id, %alumni_id, "internship posted");
        Ok(internship)
    }

    pub async fn internship(&self, internship_id: Uuid) -> Result<Internship, WorkflowError> {
        self.store
            .find_internship(internship_id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| WorkflowError::NotFound("internship".into()))
    }

    /// Loads the internship and checks that `alumni_id` posted it.
    async fn owned_internship(
        &self,
        alumni_id: Uuid,
        internship_id: Uuid,
    ) -> Result<Internship, WorkflowError> {
        let internship = self.internship(internship_id).await?;
        if internship.posted_by != alumni_id {
            warn!(%alumni_id, %internship_id, "decision attempted by non-owner");
            return Err(WorkflowError::NotAuthorized(
                "only the posting alumni can manage this internship".into(),
            ));
        }
        Ok(internship)
    }

    /// Closes the internship to new applications. Closing is one-way, and
    /// closing an already closed internship returns it unchanged.
    pub async fn close_internship(
        &self,
        alumni_id: Uuid,
        internship_id: Uuid,
    ) -> Result<Internship, WorkflowError> {
        let internship = self.owned_internship(alumni_id, internship_id).await?;
        if internship.closed {
            return Ok(internship);
        }
        let closed = self
            .store
            .close_internship(internship_id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| WorkflowError::NotFound("internship".into()))?;
        info!(%internship_id, "internship closed");
        Ok(closed)
    }

    /// Files a `PENDING` application for `student_id`.
    pub async fn apply(
        &self,
        student_id: Uuid,
        internship_id: Uuid,
    ) -> Result<InternshipApplication, WorkflowError> {
        if !self
            .store
            .has_student_profile(student_id)
            .await
            .map_err(storage_failure)?
        {
            return Err(WorkflowError::NotAuthorized(
                "only students can apply to internships".into(),
            ));
        }

        match self
            .store
            .insert_application(internship_id, student_id, self.policy.reapplication)
            .await
            .map_err(storage_failure)?
        {
            ApplicationInsert::Created(application) => {
                info!(application_id = %application.id, %internship_id, %student_id, "application filed");
                Ok(application)
            }
            ApplicationInsert::AlreadyApplied => Err(WorkflowError::AlreadyApplied),
            ApplicationInsert::InternshipClosed => Err(WorkflowError::InternshipClosed),
            ApplicationInsert::InternshipMissing => {
                Err(WorkflowError::NotFound("internship".into()))
            }
        }
    }

    /// Accepts or rejects a pending application. Only the posting alumni may
    /// decide, and only once.
    pub async fn decide_application(
        &self,
        alumni_id: Uuid,
        internship_id: Uuid,
        student_id: Uuid,
        decision: Decision,
    ) -> Result<InternshipApplication, WorkflowError> {
        self.owned_internship(alumni_id, internship_id).await?;

        match self
            .store
            .transition_application(internship_id, student_id, decision.outcome())
            .await
            .map_err(storage_failure)?
        {
            Transition::Applied(application) => {
                info!(application_id = %application.id, status = %application.status, "application decided");
                Ok(application)
            }
            Transition::NotPending(current) => Err(WorkflowError::InvalidTransition { current }),
            Transition::Missing => Err(WorkflowError::NotFound("application".into())),
        }
    }
}
