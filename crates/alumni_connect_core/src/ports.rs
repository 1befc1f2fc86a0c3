//! crates/alumni_connect_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.
//!
//! Every `IdentityStore` method that combines a check with a write is a single
//! atomic unit: implementations run it inside one transaction (or one critical
//! section) so that concurrent callers observe each other's committed effects.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, ExternalIdentity, Internship, InternshipApplication,
    MentorProfile, MentorshipRequest, NewAccount, NewInternship, NewMentorProfile,
    ReapplicationPolicy, RequestStatus, RoleData,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Atomic Operation Outcomes
//=========================================================================================

#[derive(Debug, Clone)]
pub enum AccountInsert {
    Created(Account),
    EmailTaken,
}

#[derive(Debug, Clone)]
pub enum ProfileInsert<T> {
    Created(T),
    AlreadyExists,
    /// The owning account lacks the prerequisite role or profile.
    NotEligible,
}

#[derive(Debug, Clone)]
pub enum ApplicationInsert {
    Created(InternshipApplication),
    AlreadyApplied,
    InternshipClosed,
    InternshipMissing,
}

#[derive(Debug, Clone)]
pub enum RequestInsert {
    Created(MentorshipRequest),
    Duplicate,
    MentorMissing,
}

/// Result of a conditional `PENDING -> terminal` update.
#[derive(Debug, Clone)]
pub enum Transition<T> {
    Applied(T),
    /// The row exists but was no longer pending; carries its current status.
    NotPending(RequestStatus),
    Missing,
}

#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted {
        request: MentorshipRequest,
        current_mentees: u32,
        max_mentees: u32,
    },
    CapacityExceeded {
        max_mentees: u32,
    },
    NotPending(RequestStatus),
    Missing,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    // --- Accounts ---
    async fn find_account(&self, account_id: Uuid) -> PortResult<Option<Account>>;

    async fn find_credentials_by_email(&self, email: &str)
        -> PortResult<Option<AccountCredentials>>;

    /// Inserts the account and its single role profile in one transaction.
    /// Nothing persists unless both rows commit.
    async fn insert_account_with_profile(
        &self,
        account: NewAccount,
        profile: RoleData,
    ) -> PortResult<AccountInsert>;

    /// Returns the account registered under the identity's email, creating a
    /// password-less, role-less one if none exists.
    async fn find_or_insert_external_account(
        &self,
        identity: &ExternalIdentity,
    ) -> PortResult<Account>;

    /// Sets the role and creates the profile for an account that has neither.
    async fn attach_profile(
        &self,
        account_id: Uuid,
        profile: RoleData,
    ) -> PortResult<ProfileInsert<Account>>;

    async fn has_alumni_profile(&self, account_id: Uuid) -> PortResult<bool>;

    async fn has_student_profile(&self, account_id: Uuid) -> PortResult<bool>;

    // --- Mentors ---
    /// Requires an alumni profile for `user_id`; reports `NotEligible` otherwise.
    async fn insert_mentor_profile(
        &self,
        user_id: Uuid,
        profile: NewMentorProfile,
    ) -> PortResult<ProfileInsert<MentorProfile>>;

    async fn find_mentor_profile(&self, user_id: Uuid) -> PortResult<Option<MentorProfile>>;

    // --- Internships ---
    async fn insert_internship(
        &self,
        posted_by: Uuid,
        internship: NewInternship,
    ) -> PortResult<Internship>;

    async fn find_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>>;

    /// Sets the closed flag. Closing an already closed internship changes nothing.
    async fn close_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>>;

    /// Checks the closed flag and the pair's prior applications, then inserts
    /// a `PENDING` application, all against the same committed state.
    async fn insert_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        policy: ReapplicationPolicy,
    ) -> PortResult<ApplicationInsert>;

    /// Moves the pair's pending application to `to` only if it is still pending.
    async fn transition_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        to: RequestStatus,
    ) -> PortResult<Transition<InternshipApplication>>;

    // --- Mentorship requests ---
    async fn insert_mentorship_request(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
    ) -> PortResult<RequestInsert>;

    /// Verifies capacity, then marks the pending request accepted, as one unit.
    /// The mentor's occupancy is the count of its accepted requests.
    async fn accept_mentorship(&self, mentor_id: Uuid, mentee_id: Uuid)
        -> PortResult<AcceptOutcome>;

    async fn reject_mentorship(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
    ) -> PortResult<Transition<MentorshipRequest>>;
}

#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produces a self-describing hash of `password` (salt included).
    async fn hash(&self, password: &str) -> PortResult<String>;
    async fn verify(&self, password: &str, hash: &str) -> PortResult<bool>;
}

/// Issues and checks the signed bearer token that carries an account id.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account_id: Uuid) -> PortResult<String>;
    /// Returns the account id of a valid, unexpired token.
    fn verify(&self, token: &str) -> PortResult<Uuid>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Exchanges an external access token for the identity it belongs to.
    async fn verify_assertion(&self, access_token: &str) -> PortResult<ExternalIdentity>;
}
