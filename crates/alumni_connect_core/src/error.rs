//! crates/alumni_connect_core/src/error.rs
//!
//! The failure taxonomy shared by the provisioner and the workflow engine.

use crate::domain::RequestStatus;
use crate::ports::PortError;
use tracing::error;

/// Coarse grouping used by callers to decide between "fix the input",
/// "stop", and "try again".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Authorization,
    NotFound,
    Infrastructure,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid role data: {0}")]
    InvalidRoleData(String),
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("profile already exists")]
    ProfileExists,
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already applied to this internship")]
    AlreadyApplied,
    #[error("this internship is closed")]
    InternshipClosed,
    #[error("cannot decide a request that is already {current}")]
    InvalidTransition { current: RequestStatus },
    #[error("a mentorship request to this mentor is already open")]
    DuplicateRequest,
    #[error("no mentor profile exists for this account")]
    MentorNotFound,
    #[error("mentor is at capacity ({max_mentees} mentees)")]
    CapacityExceeded { max_mentees: u32 },
    #[error("storage unavailable, try again")]
    StorageUnavailable,
    #[error("identity provider unavailable, try again")]
    UpstreamUnavailable,
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::InvalidInput(_) | WorkflowError::InvalidRoleData(_) => {
                ErrorCategory::Validation
            }
            WorkflowError::DuplicateAccount
            | WorkflowError::ProfileExists
            | WorkflowError::AlreadyApplied
            | WorkflowError::InternshipClosed
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::DuplicateRequest
            | WorkflowError::CapacityExceeded { .. } => ErrorCategory::Conflict,
            WorkflowError::InvalidCredentials | WorkflowError::NotAuthorized(_) => {
                ErrorCategory::Authorization
            }
            WorkflowError::NotFound(_) | WorkflowError::MentorNotFound => ErrorCategory::NotFound,
            WorkflowError::StorageUnavailable | WorkflowError::UpstreamUnavailable => {
                ErrorCategory::Infrastructure
            }
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidInput(_) => "INVALID_INPUT",
            WorkflowError::InvalidRoleData(_) => "INVALID_ROLE_DATA",
            WorkflowError::DuplicateAccount => "DUPLICATE_ACCOUNT",
            WorkflowError::InvalidCredentials => "INVALID_CREDENTIALS",
            WorkflowError::ProfileExists => "PROFILE_EXISTS",
            WorkflowError::NotAuthorized(_) => "NOT_AUTHORIZED",
            WorkflowError::NotFound(_) => "NOT_FOUND",
            WorkflowError::AlreadyApplied => "ALREADY_APPLIED",
            WorkflowError::InternshipClosed => "INTERNSHIP_CLOSED",
            WorkflowError::InvalidTransition { .. } => "INVALID_TRANSITION",
            WorkflowError::DuplicateRequest => "DUPLICATE_REQUEST",
            WorkflowError::MentorNotFound => "MENTOR_NOT_FOUND",
            WorkflowError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            WorkflowError::StorageUnavailable => "STORAGE_UNAVAILABLE",
            WorkflowError::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Infrastructure
            || matches!(self, WorkflowError::CapacityExceeded { .. })
    }
}

/// Converts a store failure into the opaque retryable error, logging the detail.
pub(crate) fn storage_failure(err: PortError) -> WorkflowError {
    match err {
        PortError::NotFound(what) => WorkflowError::NotFound(what),
        other => {
            error!(error = %other, "identity store operation failed");
            WorkflowError::StorageUnavailable
        }
    }
}

/// Converts an identity-provider or credential-service failure.
pub(crate) fn upstream_failure(err: PortError) -> WorkflowError {
    match err {
        PortError::Unauthorized => WorkflowError::InvalidCredentials,
        other => {
            error!(error = %other, "upstream identity service failed");
            WorkflowError::UpstreamUnavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_reported_with_their_own_codes() {
        let err = WorkflowError::CapacityExceeded { max_mentees: 2 };
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");
        assert!(err.is_retryable());

        let err = WorkflowError::InvalidTransition {
            current: RequestStatus::Rejected,
        };
        assert_eq!(err.to_string(), "cannot decide a request that is already REJECTED");
        assert!(!err.is_retryable());
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = storage_failure(PortError::Unexpected("connection reset by peer".into()));
        assert!(matches!(err, WorkflowError::StorageUnavailable));
        assert!(!err.to_string().contains("connection reset"));
    }

    #[test]
    fn missing_rows_stay_not_found() {
        let err = storage_failure(PortError::NotFound("account".into()));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
