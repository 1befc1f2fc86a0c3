//! crates/alumni_connect_core/src/memory.rs
//!
//! An in-process implementation of the `IdentityStore` port.
//!
//! Every operation runs as a transaction over a private copy of the tables:
//! the copy is swapped in only when the operation succeeds, so a failure part
//! way through leaves no trace. All operations serialize on one lock, which
//! makes each of them linearizable.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, AlumniProfile, ExternalIdentity, Internship,
    InternshipApplication, MentorProfile, MentorshipRequest, NewAccount, NewInternship,
    NewMentorProfile, ReapplicationPolicy, RequestStatus, RoleData, StudentProfile,
};
use crate::ports::{
    AcceptOutcome, AccountInsert, ApplicationInsert, IdentityStore, PortError, PortResult,
    ProfileInsert, RequestInsert, Transition,
};

#[derive(Clone)]
struct AccountRow {
    account: Account,
    password_hash: Option<String>,
}

#[derive(Clone)]
struct MentorRow {
    id: Uuid,
    profile: NewMentorProfile,
}

#[derive(Clone, Default)]
struct Tables {
    accounts: HashMap<Uuid, AccountRow>,
    emails: HashMap<String, Uuid>,
    students: HashMap<Uuid, StudentProfile>,
    alumni: HashMap<Uuid, AlumniProfile>,
    mentors: HashMap<Uuid, MentorRow>,
    internships: HashMap<Uuid, Internship>,
    applications: Vec<InternshipApplication>,
    mentorships: Vec<MentorshipRequest>,
}

impl Tables {
    fn insert_profile(&mut self, account_id: Uuid, profile: RoleData) {
        match profile {
            RoleData::Student(data) => {
                self.students.insert(
                    account_id,
                    StudentProfile {
                        id: Uuid::new_v4(),
                        account_id,
                        data,
                    },
                );
            }
            RoleData::Alumni(data) => {
                self.alumni.insert(
                    account_id,
                    AlumniProfile {
                        id: Uuid::new_v4(),
                        account_id,
                        data,
                    },
                );
            }
        }
    }

    fn accepted_count(&self, mentor_id: Uuid) -> u32 {
        self.mentorships
            .iter()
            .filter(|r| r.mentor_id == mentor_id && r.status == RequestStatus::Accepted)
            .count() as u32
    }

    fn mentor_profile(&self, user_id: Uuid) -> Option<MentorProfile> {
        self.mentors.get(&user_id).map(|row| {
            let p = row.profile.clone();
            MentorProfile {
                id: row.id,
                user_id,
                keywords: p.keywords,
                experience_years: p.experience_years,
                interaction: p.interaction,
                max_mentees: p.max_mentees,
                current_mentees: self.accepted_count(user_id),
                mentee_levels: p.mentee_levels,
                interests: p.interests,
                linkedin_profile: p.linkedin_profile,
                current_organization: p.current_organization,
                passing_year: p.passing_year,
            }
        })
    }

    /// Index of the pair's open (PENDING or ACCEPTED) request, if any.
    fn open_mentorship(&self, mentor_id: Uuid, mentee_id: Uuid) -> Option<usize> {
        self.mentorships.iter().position(|r| {
            r.mentor_id == mentor_id && r.mentee_id == mentee_id && !matches!(r.status, RequestStatus::Rejected)
        })
    }

    fn last_mentorship_status(&self, mentor_id: Uuid, mentee_id: Uuid) -> Option<RequestStatus> {
        self.mentorships
            .iter()
            .rev()
            .find(|r| r.mentor_id == mentor_id && r.mentee_id == mentee_id)
            .map(|r| r.status)
    }
}

/// A transactional in-memory store for development and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_profile_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent profile write fail after the account row has
    /// been staged. Lets tests observe that the account write is rolled back.
    pub fn inject_profile_write_failure(&self, enabled: bool) {
        self.fail_profile_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> usize {
        self.tables.lock().map(|t| t.accounts.len()).unwrap_or_default()
    }

    /// All applications for a pair, oldest first.
    pub fn applications_for(&self, internship_id: Uuid, student_id: Uuid) -> Vec<InternshipApplication> {
        self.tables
            .lock()
            .map(|t| {
                t.applications
                    .iter()
                    .filter(|a| a.internship_id == internship_id && a.student_id == student_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All mentorship requests addressed to a mentor, oldest first.
    pub fn mentorships_for(&self, mentor_id: Uuid) -> Vec<MentorshipRequest> {
        self.tables
            .lock()
            .map(|t| t.mentorships.iter().filter(|r| r.mentor_id == mentor_id).cloned().collect())
            .unwrap_or_default()
    }

    /// Runs `op` against a copy of the tables and commits the copy only on success.
    /// Every write copies every table, so this store is for tests and local runs only.
    fn transact<T>(&self, op: impl FnOnce(&mut Tables) -> PortResult<T>) -> PortResult<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| PortError::Unavailable("in-memory store lock poisoned".into()))?;
        let mut staged = tables.clone();
        let result = op(&mut staged)?;
        *tables = staged;
        Ok(result)
    }

    fn read<T>(&self, op: impl FnOnce(&Tables) -> T) -> PortResult<T> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| PortError::Unavailable("in-memory store lock poisoned".into()))?;
        Ok(op(&tables))
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_account(&self, account_id: Uuid) -> PortResult<Option<Account>> {
        self.read(|t| t.accounts.get(&account_id).map(|row| row.account.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<AccountCredentials>> {
        self.read(|t| {
            t.emails
                .get(email)
                .and_then(|id| t.accounts.get(id))
                .map(|row| AccountCredentials {
                    account: row.account.clone(),
                    password_hash: row.password_hash.clone(),
                })
        })
    }

    async fn insert_account_with_profile(
        &self,
        account: NewAccount,
        profile: RoleData,
    ) -> PortResult<AccountInsert> {
        let fail_profile = self.fail_profile_writes.load(Ordering::SeqCst);
        self.transact(|t| {
            if t.emails.contains_key(&account.email) {
                return Ok(AccountInsert::EmailTaken);
            }
            let created = Account {
                id: Uuid::new_v4(),
                username: account.username,
                email: account.email,
                role: Some(profile.role()),
                created_at: Utc::now(),
            };
            t.emails.insert(created.email.clone(), created.id);
            t.accounts.insert(
                created.id,
                AccountRow {
                    account: created.clone(),
                    password_hash: account.password_hash,
                },
            );

            if fail_profile {
                return Err(PortError::Unexpected("profile insert failed".into()));
            }
            t.insert_profile(created.id, profile);
            Ok(AccountInsert::Created(created))
        })
    }

    async fn find_or_insert_external_account(&self, identity: &ExternalIdentity) -> PortResult<Account> {
        self.transact(|t| {
            if let Some(row) = t.emails.get(&identity.email).and_then(|id| t.accounts.get(id)) {
                return Ok(row.account.clone());
            }
            let created = Account {
                id: Uuid::new_v4(),
                username: identity.display_name.clone(),
                email: identity.email.clone(),
                role: None,
                created_at: Utc::now(),
            };
            t.emails.insert(created.email.clone(), created.id);
            t.accounts.insert(
                created.id,
                AccountRow {
                    account: created.clone(),
                    password_hash: None,
                },
            );
            Ok(created)
        })
    }

    async fn attach_profile(&self, account_id: Uuid, profile: RoleData) -> PortResult<ProfileInsert<Account>> {
        let fail_profile = self.fail_profile_writes.load(Ordering::SeqCst);
        self.transact(|t| {
            let Some(row) = t.accounts.get_mut(&account_id) else {
                return Ok(ProfileInsert::NotEligible);
            };
            if row.account.role.is_some() {
                return Ok(ProfileInsert::AlreadyExists);
            }
            row.account.role = Some(profile.role());
            let account = row.account.clone();
            if fail_profile {
                return Err(PortError::Unexpected("profile insert failed".into()));
            }
            t.insert_profile(account_id, profile);
            Ok(ProfileInsert::Created(account))
        })
    }

    async fn has_alumni_profile(&self, account_id: Uuid) -> PortResult<bool> {
        self.read(|t| t.alumni.contains_key(&account_id))
    }

    async fn has_student_profile(&self, account_id: Uuid) -> PortResult<bool> {
        self.read(|t| t.students.contains_key(&account_id))
    }

    async fn insert_mentor_profile(
        &self,
        user_id: Uuid,
        profile: NewMentorProfile,
    ) -> PortResult<ProfileInsert<MentorProfile>> {
        self.transact(|t| {
            if !t.alumni.contains_key(&user_id) {
                return Ok(ProfileInsert::NotEligible);
            }
            if t.mentors.contains_key(&user_id) {
                return Ok(ProfileInsert::AlreadyExists);
            }
            t.mentors.insert(
                user_id,
                MentorRow {
                    id: Uuid::new_v4(),
                    profile,
                },
            );
            t.mentor_profile(user_id)
                .map(ProfileInsert::Created)
                .ok_or_else(|| PortError::Unexpected("mentor row vanished".into()))
        })
    }

    async fn find_mentor_profile(&self, user_id: Uuid) -> PortResult<Option<MentorProfile>> {
        self.read(|t| t.mentor_profile(user_id))
    }

    async fn insert_internship(&self, posted_by: Uuid, internship: NewInternship) -> PortResult<Internship> {
        self.transact(|t| {
            let created = Internship {
                id: Uuid::new_v4(),
                posted_by,
                title: internship.title,
                description: internship.description,
                domain: internship.domain,
                location: internship.location,
                compensation: internship.compensation,
                duration_weeks: internship.duration_weeks,
                starts_at: internship.starts_at,
                ends_at: internship.ends_at,
                eligibility: internship.eligibility,
                closed: false,
                created_at: Utc::now(),
            };
            t.internships.insert(created.id, created.clone());
            Ok(created)
        })
    }

    async fn find_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>> {
        self.read(|t| t.internships.get(&internship_id).cloned())
    }

    async fn close_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>> {
        self.transact(|t| {
            Ok(t.internships.get_mut(&internship_id).map(|internship| {
                internship.closed = true;
                internship.clone()
            }))
        })
    }

    async fn insert_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        policy: ReapplicationPolicy,
    ) -> PortResult<ApplicationInsert> {
        self.transact(|t| {
            let Some(internship) = t.internships.get(&internship_id) else {
                return Ok(ApplicationInsert::InternshipMissing);
            };
            let closed = internship.closed;

            let blocked = t.applications.iter().any(|a| {
                a.internship_id == internship_id
                    && a.student_id == student_id
                    && match policy {
                        ReapplicationPolicy::Never => true,
                        ReapplicationPolicy::AfterRejection => a.status != RequestStatus::Rejected,
                    }
            });
            if blocked {
                return Ok(ApplicationInsert::AlreadyApplied);
            }
            if closed {
                return Ok(ApplicationInsert::InternshipClosed);
            }

            let application = InternshipApplication {
                id: Uuid::new_v4(),
                internship_id,
                student_id,
                status: RequestStatus::Pending,
                applied_at: Utc::now(),
                decided_at: None,
            };
            t.applications.push(application.clone());
            Ok(ApplicationInsert::Created(application))
        })
    }

    async fn transition_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        to: RequestStatus,
    ) -> PortResult<Transition<InternshipApplication>> {
        self.transact(|t| {
            let pair = |a: &&mut InternshipApplication| {
                a.internship_id == internship_id && a.student_id == student_id
            };
            if let Some(application) = t
                .applications
                .iter_mut()
                .filter(pair)
                .find(|a| a.status == RequestStatus::Pending)
            {
                application.status = to;
                application.decided_at = Some(Utc::now());
                return Ok(Transition::Applied(application.clone()));
            }
            Ok(match t.applications.iter_mut().filter(pair).last() {
                Some(latest) => Transition::NotPending(latest.status),
                None => Transition::Missing,
            })
        })
    }

    async fn insert_mentorship_request(&self, mentor_id: Uuid, mentee_id: Uuid) -> PortResult<RequestInsert> {
        self.transact(|t| {
            if !t.mentors.contains_key(&mentor_id) {
                return Ok(RequestInsert::MentorMissing);
            }
            if t.open_mentorship(mentor_id, mentee_id).is_some() {
                return Ok(RequestInsert::Duplicate);
            }
            let request = MentorshipRequest {
                id: Uuid::new_v4(),
                mentor_id,
                mentee_id,
                status: RequestStatus::Pending,
                created_at: Utc::now(),
                decided_at: None,
            };
            t.mentorships.push(request.clone());
            Ok(RequestInsert::Created(request))
        })
    }

    async fn accept_mentorship(&self, mentor_id: Uuid, mentee_id: Uuid) -> PortResult<AcceptOutcome> {
        self.transact(|t| {
            let Some(max_mentees) = t.mentors.get(&mentor_id).map(|m| m.profile.max_mentees) else {
                return Ok(AcceptOutcome::Missing);
            };
            let Some(index) = t.open_mentorship(mentor_id, mentee_id) else {
                return Ok(match t.last_mentorship_status(mentor_id, mentee_id) {
                    Some(status) => AcceptOutcome::NotPending(status),
                    None => AcceptOutcome::Missing,
                });
            };
            if t.mentorships[index].status != RequestStatus::Pending {
                return Ok(AcceptOutcome::NotPending(t.mentorships[index].status));
            }

            let current = t.accepted_count(mentor_id);
            if current >= max_mentees {
                return Ok(AcceptOutcome::CapacityExceeded { max_mentees });
            }

            let request = &mut t.mentorships[index];
            request.status = RequestStatus::Accepted;
            request.decided_at = Some(Utc::now());
            Ok(AcceptOutcome::Accepted {
                request: request.clone(),
                current_mentees: current + 1,
                max_mentees,
            })
        })
    }

    async fn reject_mentorship(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
    ) -> PortResult<Transition<MentorshipRequest>> {
        self.transact(|t| {
            let Some(index) = t.open_mentorship(mentor_id, mentee_id) else {
                return Ok(match t.last_mentorship_status(mentor_id, mentee_id) {
                    Some(status) => Transition::NotPending(status),
                    None => Transition::Missing,
                });
            };
            let request = &mut t.mentorships[index];
            if request.status != RequestStatus::Pending {
                return Ok(Transition::NotPending(request.status));
            }
            request.status = RequestStatus::Rejected;
            request.decided_at = Some(Utc::now());
            Ok(Transition::Applied(request.clone()))
        })
    }
}
