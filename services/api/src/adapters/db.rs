//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `IdentityStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every check-then-write port operation runs inside a single transaction. Row
//! locks (`FOR UPDATE` / `FOR SHARE`) serialize the competing writers, and the
//! partial unique indexes in the migrations back the uniqueness rules up.

use std::collections::BTreeSet;
use std::str::FromStr;

use alumni_connect_core::domain::{
    Account, AccountCredentials, ExternalIdentity, Internship, InternshipApplication,
    MentorProfile, MentorshipRequest, NewAccount, NewInternship, NewMentorProfile,
    ReapplicationPolicy, RequestStatus, RoleData, UnknownVariant,
};
use alumni_connect_core::ports::{
    AcceptOutcome, AccountInsert, ApplicationInsert, IdentityStore, PortError, PortResult,
    ProfileInsert, RequestInsert, Transition,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `IdentityStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn corrupt(e: UnknownVariant) -> PortError {
    PortError::Unexpected(format!("Corrupt row: {}", e))
}

fn parse<T: FromStr<Err = UnknownVariant>>(raw: &str) -> PortResult<T> {
    raw.parse().map_err(corrupt)
}

fn parse_set<T: FromStr<Err = UnknownVariant> + Ord>(raw: Vec<String>) -> PortResult<BTreeSet<T>> {
    raw.iter().map(|v| parse(v)).collect()
}

fn to_texts<T>(values: &BTreeSet<T>, as_str: impl Fn(&T) -> &'static str) -> Vec<String> {
    values.iter().map(|v| as_str(v).to_string()).collect()
}

fn non_negative(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const ACCOUNT_COLUMNS: &str = "id, username, email, role, created_at";

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    username: String,
    email: String,
    role: Option<String>,
    created_at: DateTime<Utc>,
}
impl AccountRecord {
    fn to_domain(self) -> PortResult<Account> {
        Ok(Account {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role.as_deref().map(parse).transpose()?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    #[sqlx(flatten)]
    account: AccountRecord,
    password_hash: Option<String>,
}

const MENTOR_COLUMNS: &str = "m.id, m.user_id, m.keywords, m.experience_years, m.interaction, \
     m.max_mentees, m.mentee_levels, m.interests, m.linkedin_profile, m.current_organization, \
     m.passing_year, \
     (SELECT COUNT(*) FROM mentorship_requests r \
       WHERE r.mentor_id = m.user_id AND r.status = 'ACCEPTED') AS current_mentees";

#[derive(FromRow)]
struct MentorRecord {
    id: Uuid,
    user_id: Uuid,
    keywords: Vec<String>,
    experience_years: Option<i32>,
    interaction: Option<String>,
    max_mentees: i32,
    mentee_levels: Vec<String>,
    interests: Vec<String>,
    linkedin_profile: Option<String>,
    current_organization: Option<String>,
    passing_year: Option<i32>,
    current_mentees: i64,
}
impl MentorRecord {
    fn to_domain(self) -> PortResult<MentorProfile> {
        Ok(MentorProfile {
            id: self.id,
            user_id: self.user_id,
            keywords: parse_set(self.keywords)?,
            experience_years: self.experience_years.and_then(non_negative),
            interaction: self.interaction.as_deref().map(parse).transpose()?,
            max_mentees: non_negative(self.max_mentees).unwrap_or_default(),
            current_mentees: u32::try_from(self.current_mentees).unwrap_or(u32::MAX),
            mentee_levels: parse_set(self.mentee_levels)?,
            interests: parse_set(self.interests)?,
            linkedin_profile: self.linkedin_profile,
            current_organization: self.current_organization,
            passing_year: self.passing_year.and_then(non_negative),
        })
    }
}

const INTERNSHIP_COLUMNS: &str = "id, posted_by, title, description, domain, location, \
     compensation, duration_weeks, starts_at, ends_at, eligibility, closed, created_at";

#[derive(FromRow)]
struct InternshipRecord {
    id: Uuid,
    posted_by: Uuid,
    title: String,
    description: String,
    domain: String,
    location: String,
    compensation: Option<i64>,
    duration_weeks: Option<i32>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    eligibility: String,
    closed: bool,
    created_at: DateTime<Utc>,
}
impl InternshipRecord {
    fn to_domain(self) -> PortResult<Internship> {
        Ok(Internship {
            id: self.id,
            posted_by: self.posted_by,
            title: self.title,
            description: self.description,
            domain: parse(&self.domain)?,
            location: self.location,
            compensation: self.compensation,
            duration_weeks: self.duration_weeks,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            eligibility: self.eligibility,
            closed: self.closed,
            created_at: self.created_at,
        })
    }
}

const APPLICATION_COLUMNS: &str = "id, internship_id, student_id, status, applied_at, decided_at";

#[derive(FromRow)]
struct ApplicationRecord {
    id: Uuid,
    internship_id: Uuid,
    student_id: Uuid,
    status: String,
    applied_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}
impl ApplicationRecord {
    fn to_domain(self) -> PortResult<InternshipApplication> {
        Ok(InternshipApplication {
            id: self.id,
            internship_id: self.internship_id,
            student_id: self.student_id,
            status: parse(&self.status)?,
            applied_at: self.applied_at,
            decided_at: self.decided_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, mentor_id, mentee_id, status, created_at, decided_at";

#[derive(FromRow)]
struct RequestRecord {
    id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}
impl RequestRecord {
    fn to_domain(self) -> PortResult<MentorshipRequest> {
        Ok(MentorshipRequest {
            id: self.id,
            mentor_id: self.mentor_id,
            mentee_id: self.mentee_id,
            status: parse(&self.status)?,
            created_at: self.created_at,
            decided_at: self.decided_at,
        })
    }
}

//=========================================================================================
// Shared Statements
//=========================================================================================

async fn insert_profile(
    conn: &mut PgConnection,
    account_id: Uuid,
    profile: &RoleData,
) -> Result<(), sqlx::Error> {
    match profile {
        RoleData::Student(s) => {
            sqlx::query(
                "INSERT INTO students (id, account_id, full_name, cgpa, cv_url, department, roll_number, domain) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(&s.full_name)
            .bind(s.cgpa)
            .bind(&s.cv_url)
            .bind(&s.department)
            .bind(&s.roll_number)
            .bind(s.domain.as_str())
            .execute(&mut *conn)
            .await?;
        }
        RoleData::Alumni(a) => {
            sqlx::query(
                "INSERT INTO alumni (id, account_id, full_name, current_company, years_of_experience, domain) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(&a.full_name)
            .bind(&a.current_company)
            .bind(a.years_of_experience)
            .bind(a.domain.as_str())
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn profile_exists(pool: &PgPool, table: &str, account_id: Uuid) -> PortResult<bool> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE account_id = $1)",
        table
    ))
    .bind(account_id)
    .fetch_one(pool)
    .await
    .map_err(db_error)
}

/// Status of the request that decisions for this pair would target: the open
/// one if any, else the most recent.
async fn latest_request_status(
    conn: &mut PgConnection,
    mentor_id: Uuid,
    mentee_id: Uuid,
) -> PortResult<Option<RequestStatus>> {
    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM mentorship_requests WHERE mentor_id = $1 AND mentee_id = $2 \
         ORDER BY (status <> 'REJECTED') DESC, created_at DESC LIMIT 1",
    )
    .bind(mentor_id)
    .bind(mentee_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;
    status.as_deref().map(parse).transpose()
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_account(&self, account_id: Uuid) -> PortResult<Option<Account>> {
        sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(AccountRecord::to_domain)
        .transpose()
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<AccountCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(&format!(
            "SELECT {}, password_hash FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        record
            .map(|r| {
                Ok(AccountCredentials {
                    account: r.account.to_domain()?,
                    password_hash: r.password_hash,
                })
            })
            .transpose()
    }

    async fn insert_account_with_profile(
        &self,
        account: NewAccount,
        profile: RoleData,
    ) -> PortResult<AccountInsert> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Insert the account; a concurrent holder of the email makes this a no-op.
        let inserted = sqlx::query_as::<_, AccountRecord>(&format!(
            "INSERT INTO accounts (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (email) DO NOTHING RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(profile.role().as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(record) = inserted else {
            tx.rollback().await.map_err(db_error)?;
            return Ok(AccountInsert::EmailTaken);
        };

        // 2. Insert the profile. Dropping `tx` on error rolls the account back.
        insert_profile(&mut tx, record.id, &profile)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(AccountInsert::Created(record.to_domain()?))
    }

    async fn find_or_insert_external_account(&self, identity: &ExternalIdentity) -> PortResult<Account> {
        let inserted = sqlx::query_as::<_, AccountRecord>(&format!(
            "INSERT INTO accounts (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, NULL, NULL) ON CONFLICT (email) DO NOTHING RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&identity.display_name)
        .bind(&identity.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(record) = inserted {
            return record.to_domain();
        }

        sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(&identity.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Account {} not found", identity.email)),
            _ => db_error(e),
        })?
        .to_domain()
    }

    async fn attach_profile(&self, account_id: Uuid, profile: RoleData) -> PortResult<ProfileInsert<Account>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query_as::<_, AccountRecord>(&format!(
            "UPDATE accounts SET role = $2 WHERE id = $1 AND role IS NULL RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(account_id)
        .bind(profile.role().as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(record) = updated else {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
            tx.rollback().await.map_err(db_error)?;
            return Ok(if exists {
                ProfileInsert::AlreadyExists
            } else {
                ProfileInsert::NotEligible
            });
        };

        insert_profile(&mut tx, account_id, &profile)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(ProfileInsert::Created(record.to_domain()?))
    }

    async fn has_alumni_profile(&self, account_id: Uuid) -> PortResult<bool> {
        profile_exists(&self.pool, "alumni", account_id).await
    }

    async fn has_student_profile(&self, account_id: Uuid) -> PortResult<bool> {
        profile_exists(&self.pool, "students", account_id).await
    }

    async fn insert_mentor_profile(
        &self,
        user_id: Uuid,
        profile: NewMentorProfile,
    ) -> PortResult<ProfileInsert<MentorProfile>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Lock the alumni row so the eligibility check holds until commit.
        let eligible = sqlx::query_scalar::<_, Uuid>("SELECT id FROM alumni WHERE account_id = $1 FOR SHARE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .is_some();
        if !eligible {
            tx.rollback().await.map_err(db_error)?;
            return Ok(ProfileInsert::NotEligible);
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO mentors (id, user_id, keywords, experience_years, interaction, max_mentees, \
             mentee_levels, interests, linkedin_profile, current_organization, passing_year) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (user_id) DO NOTHING RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(to_texts(&profile.keywords, |k| k.as_str()))
        .bind(profile.experience_years.map(|v| v as i32))
        .bind(profile.interaction.map(|i| i.as_str()))
        .bind(profile.max_mentees as i32)
        .bind(to_texts(&profile.mentee_levels, |l| l.as_str()))
        .bind(to_texts(&profile.interests, |i| i.as_str()))
        .bind(&profile.linkedin_profile)
        .bind(&profile.current_organization)
        .bind(profile.passing_year.map(|v| v as i32))
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(id) = id else {
            tx.rollback().await.map_err(db_error)?;
            return Ok(ProfileInsert::AlreadyExists);
        };
        tx.commit().await.map_err(db_error)?;

        Ok(ProfileInsert::Created(MentorProfile {
            id,
            user_id,
            keywords: profile.keywords,
            experience_years: profile.experience_years,
            interaction: profile.interaction,
            max_mentees: profile.max_mentees,
            current_mentees: 0,
            mentee_levels: profile.mentee_levels,
            interests: profile.interests,
            linkedin_profile: profile.linkedin_profile,
            current_organization: profile.current_organization,
            passing_year: profile.passing_year,
        }))
    }

    async fn find_mentor_profile(&self, user_id: Uuid) -> PortResult<Option<MentorProfile>> {
        sqlx::query_as::<_, MentorRecord>(&format!(
            "SELECT {} FROM mentors m WHERE m.user_id = $1",
            MENTOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(MentorRecord::to_domain)
        .transpose()
    }

    async fn insert_internship(&self, posted_by: Uuid, internship: NewInternship) -> PortResult<Internship> {
        sqlx::query_as::<_, InternshipRecord>(&format!(
            "INSERT INTO internships (id, posted_by, title, description, domain, location, compensation, \
             duration_weeks, starts_at, ends_at, eligibility) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            INTERNSHIP_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(posted_by)
        .bind(&internship.title)
        .bind(&internship.description)
        .bind(internship.domain.as_str())
        .bind(&internship.location)
        .bind(internship.compensation)
        .bind(internship.duration_weeks)
        .bind(internship.starts_at)
        .bind(internship.ends_at)
        .bind(&internship.eligibility)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn find_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>> {
        sqlx::query_as::<_, InternshipRecord>(&format!(
            "SELECT {} FROM internships WHERE id = $1",
            INTERNSHIP_COLUMNS
        ))
        .bind(internship_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(InternshipRecord::to_domain)
        .transpose()
    }

    async fn close_internship(&self, internship_id: Uuid) -> PortResult<Option<Internship>> {
        sqlx::query_as::<_, InternshipRecord>(&format!(
            "UPDATE internships SET closed = TRUE WHERE id = $1 RETURNING {}",
            INTERNSHIP_COLUMNS
        ))
        .bind(internship_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(InternshipRecord::to_domain)
        .transpose()
    }

    async fn insert_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        policy: ReapplicationPolicy,
    ) -> PortResult<ApplicationInsert> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Share-lock the internship: a concurrent close waits for this apply.
        let closed = sqlx::query_scalar::<_, bool>("SELECT closed FROM internships WHERE id = $1 FOR SHARE")
            .bind(internship_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        let Some(closed) = closed else {
            tx.rollback().await.map_err(db_error)?;
            return Ok(ApplicationInsert::InternshipMissing);
        };

        // 2. Prior applications for the pair.
        let prior = sqlx::query_scalar::<_, String>(
            "SELECT status FROM internship_applications WHERE internship_id = $1 AND student_id = $2",
        )
        .bind(internship_id)
        .bind(student_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        let blocked = match policy {
            ReapplicationPolicy::Never => !prior.is_empty(),
            ReapplicationPolicy::AfterRejection => {
                prior.iter().any(|s| s != RequestStatus::Rejected.as_str())
            }
        };
        if blocked {
            tx.rollback().await.map_err(db_error)?;
            return Ok(ApplicationInsert::AlreadyApplied);
        }
        if closed {
            tx.rollback().await.map_err(db_error)?;
            return Ok(ApplicationInsert::InternshipClosed);
        }

        // 3. Insert. A racing insert for the same pair trips the live-pair index.
        let inserted = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "INSERT INTO internship_applications (id, internship_id, student_id) \
             VALUES ($1, $2, $3) RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(internship_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await;
        let record = match inserted {
            Ok(record) => record,
            Err(e) if is_unique_violation(&e) => return Ok(ApplicationInsert::AlreadyApplied),
            Err(e) => return Err(db_error(e)),
        };

        tx.commit().await.map_err(db_error)?;
        Ok(ApplicationInsert::Created(record.to_domain()?))
    }

    async fn transition_application(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        to: RequestStatus,
    ) -> PortResult<Transition<InternshipApplication>> {
        // The status guard is re-evaluated after a competing update commits,
        // so only one decision ever lands.
        let updated = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "UPDATE internship_applications SET status = $3, decided_at = now() \
             WHERE internship_id = $1 AND student_id = $2 AND status = 'PENDING' RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(internship_id)
        .bind(student_id)
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(record) = updated {
            return Ok(Transition::Applied(record.to_domain()?));
        }

        let latest = sqlx::query_scalar::<_, String>(
            "SELECT status FROM internship_applications WHERE internship_id = $1 AND student_id = $2 \
             ORDER BY applied_at DESC LIMIT 1",
        )
        .bind(internship_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(match latest {
            Some(status) => Transition::NotPending(parse(&status)?),
            None => Transition::Missing,
        })
    }

    async fn insert_mentorship_request(&self, mentor_id: Uuid, mentee_id: Uuid) -> PortResult<RequestInsert> {
        let inserted = sqlx::query_as::<_, RequestRecord>(&format!(
            "INSERT INTO mentorship_requests (id, mentor_id, mentee_id) \
             SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM mentors WHERE user_id = $2) \
             RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(mentor_id)
        .bind(mentee_id)
        .fetch_optional(&self.pool)
        .await;

        match inserted {
            Ok(Some(record)) => Ok(RequestInsert::Created(record.to_domain()?)),
            Ok(None) => Ok(RequestInsert::MentorMissing),
            Err(e) if is_unique_violation(&e) => Ok(RequestInsert::Duplicate),
            Err(e) => Err(db_error(e)),
        }
    }

    async fn accept_mentorship(&self, mentor_id: Uuid, mentee_id: Uuid) -> PortResult<AcceptOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Lock the mentor row. Every accept for this mentor queues here,
        //    which keeps the count below stable until commit.
        let max_mentees = sqlx::query_scalar::<_, i32>("SELECT max_mentees FROM mentors WHERE user_id = $1 FOR UPDATE")
            .bind(mentor_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        let Some(max_mentees) = max_mentees.and_then(non_negative) else {
            tx.rollback().await.map_err(db_error)?;
            return Ok(AcceptOutcome::Missing);
        };

        // 2. The request must exist and still be pending.
        match latest_request_status(&mut tx, mentor_id, mentee_id).await? {
            None => {
                tx.rollback().await.map_err(db_error)?;
                return Ok(AcceptOutcome::Missing);
            }
            Some(RequestStatus::Pending) => {}
            Some(status) => {
                tx.rollback().await.map_err(db_error)?;
                return Ok(AcceptOutcome::NotPending(status));
            }
        }

        // 3. Capacity check against the committed accepted count.
        let current = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM mentorship_requests WHERE mentor_id = $1 AND status = 'ACCEPTED'",
        )
        .bind(mentor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        let current = u32::try_from(current).unwrap_or(u32::MAX);
        if current >= max_mentees {
            tx.rollback().await.map_err(db_error)?;
            return Ok(AcceptOutcome::CapacityExceeded { max_mentees });
        }

        // 4. Conditional update; a concurrent reject leaves nothing to update.
        let updated = sqlx::query_as::<_, RequestRecord>(&format!(
            "UPDATE mentorship_requests SET status = 'ACCEPTED', decided_at = now() \
             WHERE mentor_id = $1 AND mentee_id = $2 AND status = 'PENDING' RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(mentor_id)
        .bind(mentee_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(record) = updated else {
            let status = latest_request_status(&mut tx, mentor_id, mentee_id).await?;
            tx.rollback().await.map_err(db_error)?;
            return Ok(match status {
                Some(status) => AcceptOutcome::NotPending(status),
                None => AcceptOutcome::Missing,
            });
        };

        tx.commit().await.map_err(db_error)?;
        Ok(AcceptOutcome::Accepted {
            request: record.to_domain()?,
            current_mentees: current + 1,
            max_mentees,
        })
    }

    async fn reject_mentorship(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
    ) -> PortResult<Transition<MentorshipRequest>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let updated = sqlx::query_as::<_, RequestRecord>(&format!(
            "UPDATE mentorship_requests SET status = 'REJECTED', decided_at = now() \
             WHERE mentor_id = $1 AND mentee_id = $2 AND status = 'PENDING' RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(mentor_id)
        .bind(mentee_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;

        if let Some(record) = updated {
            return Ok(Transition::Applied(record.to_domain()?));
        }
        Ok(match latest_request_status(&mut conn, mentor_id, mentee_id).await? {
            Some(status) => Transition::NotPending(status),
            None => Transition::Missing,
        })
    }
}
