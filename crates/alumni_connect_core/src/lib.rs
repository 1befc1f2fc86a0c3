pub mod domain;
pub mod error;
pub mod memory;
pub mod ports;
pub mod provisioning;
pub mod validation;
pub mod workflow;

pub use domain::{
    Account, AccountCredentials, AlumniData, AlumniProfile, Decision, Domain, ExternalIdentity,
    InteractionLevel, Internship, InternshipApplication, IssuedSession, MenteeLevel, MentorData,
    MentorInterest, MentorProfile, MentorshipRequest, NewInternship, ReapplicationPolicy,
    RequestStatus, Role, RoleData, StudentData, StudentProfile, UnknownVariant,
    DEFAULT_MAX_MENTEES,
};
pub use error::{ErrorCategory, WorkflowError};
pub use memory::InMemoryStore;
pub use ports::{
    CredentialHasher, IdentityStore, IdentityVerifier, PortError, PortResult, TokenIssuer,
};
pub use provisioning::{AccountProvisioner, Signup};
pub use workflow::{WorkflowEngine, WorkflowPolicy};
