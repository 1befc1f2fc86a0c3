//! crates/alumni_connect_core/src/validation.rs
//!
//! Input rules applied before anything touches the store. A failed rule is
//! reported immediately and causes no state change.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::domain::{
    AlumniData, ExternalIdentity, MentorData, NewInternship, NewMentorProfile, RoleData,
    StudentData,
};
use crate::error::WorkflowError;

const MIN_NAME_CHARS: usize = 2;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("email pattern is a valid regex")
    })
}

/// Trims and lowercases an email, rejecting anything not shaped like one.
pub fn normalize_email(email: &str) -> Result<String, WorkflowError> {
    let email = email.trim().to_lowercase();
    if !email_pattern().is_match(&email) {
        return Err(WorkflowError::InvalidInput("invalid email address".into()));
    }
    Ok(email)
}

/// Checks the base account fields of a signup and returns the normalized email.
pub fn validate_signup(username: &str, email: &str, password: &str) -> Result<String, WorkflowError> {
    if username.trim().is_empty() {
        return Err(WorkflowError::InvalidInput("username cannot be empty".into()));
    }
    if password.is_empty() {
        return Err(WorkflowError::InvalidInput("password cannot be empty".into()));
    }
    normalize_email(email)
}

pub fn validate_external_identity(
    identity: &ExternalIdentity,
) -> Result<ExternalIdentity, WorkflowError> {
    let email = normalize_email(&identity.email)?;
    let display_name = identity.display_name.trim();
    Ok(ExternalIdentity {
        display_name: if display_name.is_empty() {
            email.clone()
        } else {
            display_name.to_string()
        },
        email,
    })
}

fn min_chars(value: &str, field: &str, min: usize) -> Result<(), String> {
    if value.trim().chars().count() < min {
        return Err(format!("{field} must be at least {min} characters"));
    }
    Ok(())
}

fn http_url(value: &str, field: &str) -> Result<(), String> {
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(format!("{field} must be a valid http(s) URL")),
    }
}

fn check_student(data: &StudentData) -> Result<(), String> {
    min_chars(&data.full_name, "full name", MIN_NAME_CHARS)?;
    if !data.cgpa.is_finite() || !(0.0..=10.0).contains(&data.cgpa) {
        return Err("CGPA must be between 0 and 10".into());
    }
    http_url(&data.cv_url, "CV")?;
    min_chars(&data.department, "department", MIN_NAME_CHARS)?;
    min_chars(&data.roll_number, "roll number", 1)?;
    Ok(())
}

fn check_alumni(data: &AlumniData) -> Result<(), String> {
    min_chars(&data.full_name, "full name", MIN_NAME_CHARS)?;
    min_chars(&data.current_company, "company name", MIN_NAME_CHARS)?;
    if data.years_of_experience < 0 {
        return Err("years of experience must be non-negative".into());
    }
    Ok(())
}

/// Validates the payload schema selected by the role discriminant.
pub fn validate_role_data(data: &RoleData) -> Result<(), WorkflowError> {
    let checked = match data {
        RoleData::Student(student) => check_student(student),
        RoleData::Alumni(alumni) => check_alumni(alumni),
    };
    checked.map_err(WorkflowError::InvalidRoleData)
}

fn positive(value: Option<i32>, field: &str) -> Result<Option<u32>, WorkflowError> {
    match value {
        None => Ok(None),
        Some(v) if v > 0 => Ok(Some(v as u32)),
        Some(_) => Err(WorkflowError::InvalidInput(format!("{field} must be positive"))),
    }
}

/// Validates mentor registration data, applying `default_max_mentees` when
/// the mentor states no capacity.
pub fn validate_mentor_data(
    data: MentorData,
    default_max_mentees: u32,
) -> Result<NewMentorProfile, WorkflowError> {
    if data.keywords.is_empty() {
        return Err(WorkflowError::InvalidInput("select at least one domain".into()));
    }
    if data.mentee_levels.is_empty() {
        return Err(WorkflowError::InvalidInput("select at least one mentee level".into()));
    }
    if data.interests.is_empty() {
        return Err(WorkflowError::InvalidInput("select at least one interest".into()));
    }
    let max_mentees = positive(data.max_mentees, "max mentees")?.unwrap_or(default_max_mentees);
    let experience_years = positive(data.experience_years, "experience")?;
    let passing_year = positive(data.passing_year, "passing year")?;

    // An empty LinkedIn field is the same as none.
    let linkedin_profile = match data.linkedin_profile {
        Some(link) if !link.trim().is_empty() => {
            http_url(&link, "LinkedIn profile").map_err(WorkflowError::InvalidInput)?;
            Some(link.trim().to_string())
        }
        _ => None,
    };

    Ok(NewMentorProfile {
        keywords: data.keywords,
        experience_years,
        interaction: data.interaction,
        max_mentees,
        mentee_levels: data.mentee_levels,
        interests: data.interests,
        linkedin_profile,
        current_organization: data
            .current_organization
            .map(|org| org.trim().to_string())
            .filter(|org| !org.is_empty()),
        passing_year,
    })
}

pub fn validate_internship(internship: &NewInternship) -> Result<(), WorkflowError> {
    let invalid = |msg: &str| Err(WorkflowError::InvalidInput(msg.to_string()));
    if internship.title.trim().is_empty() {
        return invalid("title cannot be empty");
    }
    if internship.location.trim().is_empty() {
        return invalid("location cannot be empty");
    }
    if internship.compensation.is_some_and(|c| c < 0) {
        return invalid("compensation must be non-negative");
    }
    if internship.duration_weeks.is_some_and(|w| w <= 0) {
        return invalid("duration must be positive");
    }
    if internship.ends_at.is_some_and(|end| end < internship.starts_at) {
        return invalid("end time must not precede start time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, MenteeLevel, MentorInterest};
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn student() -> StudentData {
        StudentData {
            full_name: "Asha Rao".into(),
            cgpa: 8.4,
            cv_url: "https://cv.example.com/asha.pdf".into(),
            department: "CSE".into(),
            roll_number: "21CS042".into(),
            domain: Domain::Backend,
        }
    }

    fn mentor() -> MentorData {
        MentorData {
            keywords: BTreeSet::from([Domain::Software]),
            experience_years: Some(6),
            interaction: None,
            max_mentees: None,
            mentee_levels: BTreeSet::from([MenteeLevel::ThirdYear]),
            interests: BTreeSet::from([MentorInterest::Networking]),
            linkedin_profile: Some(String::new()),
            current_organization: Some("  ".into()),
            passing_year: None,
        }
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Asha@Example.COM ").unwrap(), "asha@example.com");
        for bad in ["", "asha", "asha@", "@example.com", "as ha@example.com", "asha@example."] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn signup_requires_username_and_password() {
        assert!(validate_signup("", "a@b.io", "pw").is_err());
        assert!(validate_signup("asha", "a@b.io", "").is_err());
        assert_eq!(validate_signup("asha", "A@B.io", "pw").unwrap(), "a@b.io");
    }

    #[test]
    fn cgpa_must_be_within_range() {
        for cgpa in [11.0, -0.1, f64::NAN] {
            let data = RoleData::Student(StudentData { cgpa, ..student() });
            match validate_role_data(&data) {
                Err(WorkflowError::InvalidRoleData(msg)) => assert!(msg.contains("CGPA")),
                other => panic!("expected invalid role data, got {other:?}"),
            }
        }
        assert!(validate_role_data(&RoleData::Student(StudentData { cgpa: 10.0, ..student() })).is_ok());
    }

    #[test]
    fn cv_must_be_a_web_url() {
        let data = RoleData::Student(StudentData {
            cv_url: "not a url".into(),
            ..student()
        });
        assert!(matches!(validate_role_data(&data), Err(WorkflowError::InvalidRoleData(_))));

        let data = RoleData::Student(StudentData {
            cv_url: "file:///home/asha/cv.pdf".into(),
            ..student()
        });
        assert!(validate_role_data(&data).is_err());
    }

    #[test]
    fn alumni_experience_cannot_be_negative() {
        let data = RoleData::Alumni(AlumniData {
            full_name: "Vikram Shah".into(),
            current_company: "Acme".into(),
            years_of_experience: -1,
            domain: Domain::Finance,
        });
        assert!(matches!(validate_role_data(&data), Err(WorkflowError::InvalidRoleData(_))));
    }

    #[test]
    fn mentor_defaults_capacity_and_drops_blank_fields() {
        let profile = validate_mentor_data(mentor(), 5).unwrap();
        assert_eq!(profile.max_mentees, 5);
        assert_eq!(profile.linkedin_profile, None);
        assert_eq!(profile.current_organization, None);
        assert_eq!(profile.experience_years, Some(6));
    }

    #[test]
    fn mentor_capacity_must_be_positive() {
        let data = MentorData {
            max_mentees: Some(0),
            ..mentor()
        };
        assert!(matches!(
            validate_mentor_data(data, 5),
            Err(WorkflowError::InvalidInput(_))
        ));
        let data = MentorData {
            keywords: BTreeSet::new(),
            ..mentor()
        };
        assert!(validate_mentor_data(data, 5).is_err());
    }

    #[test]
    fn internship_window_must_be_ordered() {
        let starts_at = Utc::now();
        let mut internship = NewInternship {
            title: "Backend intern".into(),
            description: "Work on APIs".into(),
            domain: Domain::Backend,
            location: "Remote".into(),
            compensation: Some(20_000),
            duration_weeks: Some(12),
            starts_at,
            ends_at: Some(starts_at + Duration::weeks(12)),
            eligibility: "Third year and above".into(),
        };
        assert!(validate_internship(&internship).is_ok());

        internship.ends_at = Some(starts_at - Duration::days(1));
        assert!(validate_internship(&internship).is_err());
    }
}
