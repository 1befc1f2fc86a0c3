#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use alumni_connect_core::ports::{
    CredentialHasher, IdentityVerifier, PortError, PortResult, TokenIssuer,
};
use alumni_connect_core::{
    AccountProvisioner, AlumniData, Domain, ExternalIdentity, InMemoryStore, MenteeLevel, MentorData,
    MentorInterest, NewInternship, RoleData, Signup, StudentData, WorkflowEngine, WorkflowPolicy,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Reversible stand-in for a real password hash.
pub struct PlainHasher;

#[async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain${password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

/// Tokens of the form `token:<uuid>`.
pub struct PlainTokens;

impl TokenIssuer for PlainTokens {
    fn issue(&self, account_id: Uuid) -> PortResult<String> {
        Ok(format!("token:{account_id}"))
    }

    fn verify(&self, token: &str) -> PortResult<Uuid> {
        token
            .strip_prefix("token:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(PortError::Unauthorized)
    }
}

/// Accepts `ok:<email>`, refuses `revoked`, and is unreachable otherwise.
pub struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify_assertion(&self, access_token: &str) -> PortResult<ExternalIdentity> {
        match access_token.strip_prefix("ok:") {
            Some(email) => Ok(ExternalIdentity {
                email: email.to_string(),
                display_name: String::new(),
            }),
            None if access_token == "revoked" => Err(PortError::Unauthorized),
            None => Err(PortError::Unavailable("provider timed out".into())),
        }
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub provisioner: AccountProvisioner,
    pub engine: Arc<WorkflowEngine>,
}

pub fn harness() -> Harness {
    harness_with(WorkflowPolicy::default())
}

pub fn harness_with(policy: WorkflowPolicy) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let provisioner =
        AccountProvisioner::new(store.clone(), Arc::new(PlainHasher), Arc::new(PlainTokens));
    let engine = Arc::new(WorkflowEngine::new(store.clone(), policy));
    Harness {
        store,
        provisioner,
        engine,
    }
}

pub fn student_data() -> StudentData {
    StudentData {
        full_name: "Asha Rao".to_string(),
        cgpa: 8.4,
        cv_url: "https://cv.example.com/asha.pdf".to_string(),
        department: "Computer Science".to_string(),
        roll_number: "21CS042".to_string(),
        domain: Domain::Backend,
    }
}

pub fn alumni_data() -> AlumniData {
    AlumniData {
        full_name: "Vikram Shah".to_string(),
        current_company: "Acme Systems".to_string(),
        years_of_experience: 7,
        domain: Domain::Software,
    }
}

pub fn signup(name: &str, role_data: RoleData) -> Signup {
    Signup {
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password: "correct horse".to_string(),
        role_data,
    }
}

impl Harness {
    pub async fn student(&self, name: &str) -> Uuid {
        self.provisioner
            .provision_account(signup(name, RoleData::Student(student_data())))
            .await
            .expect("student signup")
            .account
            .id
    }

    pub async fn alumni(&self, name: &str) -> Uuid {
        self.provisioner
            .provision_account(signup(name, RoleData::Alumni(alumni_data())))
            .await
            .expect("alumni signup")
            .account
            .id
    }

    pub async fn mentor(&self, name: &str, max_mentees: i32) -> Uuid {
        let id = self.alumni(name).await;
        self.engine
            .register_mentor(id, mentor_data(Some(max_mentees)))
            .await
            .expect("mentor registration");
        id
    }

    pub async fn internship(&self, alumni_id: Uuid) -> Uuid {
        self.engine
            .post_internship(alumni_id, new_internship())
            .await
            .expect("internship posted")
            .id
    }
}

pub fn mentor_data(max_mentees: Option<i32>) -> MentorData {
    MentorData {
        keywords: BTreeSet::from([Domain::Software, Domain::Backend]),
        experience_years: Some(7),
        interaction: None,
        max_mentees,
        mentee_levels: BTreeSet::from([MenteeLevel::ThirdYear, MenteeLevel::FourthYear]),
        interests: BTreeSet::from([MentorInterest::MentoringAndPartnership]),
        linkedin_profile: None,
        current_organization: Some("Acme Systems".to_string()),
        passing_year: Some(2016),
    }
}

pub fn new_internship() -> NewInternship {
    let starts_at = Utc::now() + Duration::days(30);
    NewInternship {
        title: "Backend engineering intern".to_string(),
        description: "Build and operate internal APIs".to_string(),
        domain: Domain::Backend,
        location: "Bengaluru".to_string(),
        compensation: Some(25_000),
        duration_weeks: Some(12),
        starts_at,
        ends_at: Some(starts_at + Duration::weeks(12)),
        eligibility: "Third year and above, CGPA 7+".to_string(),
    }
}
