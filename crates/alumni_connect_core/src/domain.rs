//! crates/alumni_connect_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default capacity for a mentor who does not state one.
pub const DEFAULT_MAX_MENTEES: u32 = 5;

//=========================================================================================
// String-Backed Enumerations
//=========================================================================================

/// Error returned when a wire/database string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a fieldless enum whose variants round-trip through their
/// SCREAMING_SNAKE_CASE names.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// The role tag carried by an account once its profile exists.
    Role, "role" {
        Student => "STUDENT",
        Alumni => "ALUMNI",
    }
);

string_enum!(
    /// Professional domain tags shared by profiles, mentors and internships.
    Domain, "domain" {
        Software => "SOFTWARE",
        Frontend => "FRONTEND",
        Backend => "BACKEND",
        ProductManagement => "PRODUCT_MANAGEMENT",
        WebDevelopment => "WEB_DEVELOPMENT",
        MobileDevelopment => "MOBILE_DEVELOPMENT",
        MachineLearning => "MACHINE_LEARNING",
        DataScience => "DATA_SCIENCE",
        Blockchain => "BLOCKCHAIN",
        CloudComputing => "CLOUD_COMPUTING",
        Cybersecurity => "CYBERSECURITY",
        BusinessManagement => "BUSINESS_MANAGEMENT",
        Finance => "FINANCE",
        Accounting => "ACCOUNTING",
        HumanResources => "HUMAN_RESOURCES",
        Marketing => "MARKETING",
        Sales => "SALES",
        Operations => "OPERATIONS",
        Strategy => "STRATEGY",
        ProjectManagement => "PROJECT_MANAGEMENT",
        SupplyChainManagement => "SUPPLY_CHAIN_MANAGEMENT",
        Consulting => "CONSULTING",
        Entrepreneurship => "ENTREPRENEURSHIP",
        BusinessDevelopment => "BUSINESS_DEVELOPMENT",
        BusinessAnalytics => "BUSINESS_ANALYTICS",
        Economics => "ECONOMICS",
        PublicRelations => "PUBLIC_RELATIONS",
    }
);

string_enum!(
    /// How much hands-on time a mentor offers.
    InteractionLevel, "interaction level" {
        VeryLow => "VERY_LOW",
        Low => "LOW",
        High => "HIGH",
    }
);

string_enum!(
    /// Seniority of the mentees a mentor is willing to take on.
    MenteeLevel, "mentee level" {
        SecondYear => "SECOND_YEAR",
        ThirdYear => "THIRD_YEAR",
        FourthYear => "FOURTH_YEAR",
        FifthYear => "FIFTH_YEAR",
        Research => "RESEARCH",
    }
);

string_enum!(
    MentorInterest, "mentor interest" {
        ProBonoHelp => "PRO_BONO_HELP",
        MentoringAndPartnership => "MENTORING_AND_PARTNERSHIP",
        Investing => "INVESTING",
        Networking => "NETWORKING",
        HelpingInNetworking => "HELPING_IN_NETWORKING",
        FloatingOwnProjects => "FLOATING_OWN_PROJECTS",
    }
);

string_enum!(
    /// Lifecycle state shared by internship applications and mentorship requests.
    ///
    /// `Pending` is the only state that accepts a decision; `Accepted` and
    /// `Rejected` are terminal.
    RequestStatus, "status" {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
    }
);

string_enum!(
    /// The outcome chosen by the party holding decision authority.
    Decision, "decision" {
        Accept => "ACCEPTED",
        Reject => "REJECTED",
    }
);

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Returns the state reached by applying `decision`, or `None` when the
    /// current state is terminal.
    pub fn decide(&self, decision: Decision) -> Option<RequestStatus> {
        match (self, decision) {
            (RequestStatus::Pending, Decision::Accept) => Some(RequestStatus::Accepted),
            (RequestStatus::Pending, Decision::Reject) => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

impl Decision {
    /// The terminal state this decision leads to.
    pub fn outcome(&self) -> RequestStatus {
        match self {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

//=========================================================================================
// Accounts and Profiles
//=========================================================================================

/// The public-safe projection of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for sign-in - contains sensitive data
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account: Account,
    /// `None` for accounts provisioned from an external identity; such
    /// accounts can never sign in with a local password.
    pub password_hash: Option<String>,
}

/// Everything needed to insert the base account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentData {
    pub full_name: String,
    pub cgpa: f64,
    pub cv_url: String,
    pub department: String,
    pub roll_number: String,
    pub domain: Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlumniData {
    pub full_name: String,
    pub current_company: String,
    pub years_of_experience: i32,
    pub domain: Domain,
}

/// Role-specific payload supplied at signup or profile completion.
/// The variant decides both the role tag and which profile table is written.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleData {
    Student(StudentData),
    Alumni(AlumniData),
}

impl RoleData {
    pub fn role(&self) -> Role {
        match self {
            RoleData::Student(_) => Role::Student,
            RoleData::Alumni(_) => Role::Alumni,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub data: StudentData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlumniProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub data: AlumniData,
}

/// A verified identity asserted by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub display_name: String,
}

/// A freshly issued session credential together with the account it identifies.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub account: Account,
}

//=========================================================================================
// Mentorship
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MentorData {
    pub keywords: BTreeSet<Domain>,
    pub experience_years: Option<i32>,
    pub interaction: Option<InteractionLevel>,
    pub max_mentees: Option<i32>,
    pub mentee_levels: BTreeSet<MenteeLevel>,
    pub interests: BTreeSet<MentorInterest>,
    pub linkedin_profile: Option<String>,
    pub current_organization: Option<String>,
    pub passing_year: Option<i32>,
}

/// A mentor as stored, with occupancy derived from accepted requests.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keywords: BTreeSet<Domain>,
    pub experience_years: Option<u32>,
    pub interaction: Option<InteractionLevel>,
    pub max_mentees: u32,
    /// Count of ACCEPTED mentorship requests addressed to this mentor.
    pub current_mentees: u32,
    pub mentee_levels: BTreeSet<MenteeLevel>,
    pub interests: BTreeSet<MentorInterest>,
    pub linkedin_profile: Option<String>,
    pub current_organization: Option<String>,
    pub passing_year: Option<u32>,
}

impl MentorProfile {
    pub fn has_capacity(&self) -> bool {
        self.current_mentees < self.max_mentees
    }
}

/// Mentor attributes after validation, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMentorProfile {
    pub keywords: BTreeSet<Domain>,
    pub experience_years: Option<u32>,
    pub interaction: Option<InteractionLevel>,
    pub max_mentees: u32,
    pub mentee_levels: BTreeSet<MenteeLevel>,
    pub interests: BTreeSet<MentorInterest>,
    pub linkedin_profile: Option<String>,
    pub current_organization: Option<String>,
    pub passing_year: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorshipRequest {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Internships
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NewInternship {
    pub title: String,
    pub description: String,
    pub domain: Domain,
    pub location: String,
    /// Monthly stipend in the smallest currency unit.
    pub compensation: Option<i64>,
    pub duration_weeks: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub eligibility: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Internship {
    pub id: Uuid,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub domain: Domain,
    pub location: String,
    pub compensation: Option<i64>,
    pub duration_weeks: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub eligibility: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternshipApplication {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub student_id: Uuid,
    pub status: RequestStatus,
    pub applied_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Scope of the one-application-per-pair rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReapplicationPolicy {
    /// Any prior application, whatever its state, blocks a new one.
    #[default]
    Never,
    /// A student may apply again once every prior application was rejected.
    AfterRejection,
}

impl FromStr for ReapplicationPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(ReapplicationPolicy::Never),
            "after_rejection" => Ok(ReapplicationPolicy::AfterRejection),
            other => Err(UnknownVariant {
                kind: "reapplication policy",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_decidable_state() {
        assert_eq!(
            RequestStatus::Pending.decide(Decision::Accept),
            Some(RequestStatus::Accepted)
        );
        assert_eq!(
            RequestStatus::Pending.decide(Decision::Reject),
            Some(RequestStatus::Rejected)
        );
        for terminal in [RequestStatus::Accepted, RequestStatus::Rejected] {
            assert!(terminal.is_terminal());
            assert_eq!(terminal.decide(Decision::Accept), None);
            assert_eq!(terminal.decide(Decision::Reject), None);
        }
    }

    #[test]
    fn string_enums_parse_their_wire_names() {
        assert_eq!("PUBLIC_RELATIONS".parse::<Domain>(), Ok(Domain::PublicRelations));
        assert_eq!(Domain::ALL.len(), 27);
        assert_eq!("ACCEPTED".parse::<Decision>(), Ok(Decision::Accept));

        let err = "software".parse::<Domain>().unwrap_err();
        assert_eq!(err.kind, "domain");
        assert_eq!(err.to_string(), "'software' is not a valid domain");
    }

    #[test]
    fn reapplication_policy_is_case_insensitive() {
        assert_eq!(
            "AFTER_REJECTION".parse::<ReapplicationPolicy>(),
            Ok(ReapplicationPolicy::AfterRejection)
        );
        assert_eq!(ReapplicationPolicy::default(), ReapplicationPolicy::Never);
        assert!("sometimes".parse::<ReapplicationPolicy>().is_err());
    }
}
