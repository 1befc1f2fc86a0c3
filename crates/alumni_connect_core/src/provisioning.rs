//! crates/alumni_connect_core/src/provisioning.rs
//!
//! The Account Provisioner: creates a base account together with exactly one
//! role profile, signs existing accounts in, and maps verified external
//! identities onto local accounts.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Account, ExternalIdentity, IssuedSession, NewAccount, RoleData};
use crate::error::{storage_failure, upstream_failure, WorkflowError};
use crate::ports::{
    AccountInsert, CredentialHasher, IdentityStore, IdentityVerifier, ProfileInsert, TokenIssuer,
};
use crate::validation::{
    normalize_email, validate_external_identity, validate_role_data, validate_signup,
};

/// A signup request after the API boundary has decoded it.
#[derive(Debug, Clone)]
pub struct Signup {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_data: RoleData,
}

#[derive(Clone)]
pub struct AccountProvisioner {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountProvisioner {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Creates the account and its role profile atomically and issues a session.
    pub async fn provision_account(&self, signup: Signup) -> Result<IssuedSession, WorkflowError> {
        // 1. Validate everything up front; nothing is written on failure.
        let email = validate_signup(&signup.username, &signup.email, &signup.password)?;
        validate_role_data(&signup.role_data)?;

        // 2. Skip hashing for an obviously taken email. The insert below
        //    re-checks inside its transaction.
        if self
            .store
            .find_credentials_by_email(&email)
            .await
            .map_err(storage_failure)?
            .is_some()
        {
            return Err(WorkflowError::DuplicateAccount);
        }

        // 3. Hash the password
        let password_hash = self
            .hasher
            .hash(&signup.password)
            .await
            .map_err(upstream_failure)?;

        // 4. Create the account and its profile in one transaction
        let role = signup.role_data.role();
        let new_account = NewAccount {
            username: signup.username.trim().to_string(),
            email,
            password_hash: Some(password_hash),
        };
        let account = match self
            .store
            .insert_account_with_profile(new_account, signup.role_data)
            .await
            .map_err(storage_failure)?
        {
            AccountInsert::Created(account) => account,
            AccountInsert::EmailTaken => return Err(WorkflowError::DuplicateAccount),
        };
        info!(account_id = %account.id, %role, "account provisioned");

        self.issue(account)
    }

    /// Checks an email/password pair. Every failure reads the same to the caller.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, WorkflowError> {
        let email = normalize_email(email).map_err(|_| WorkflowError::InvalidCredentials)?;
        let credentials = self
            .store
            .find_credentials_by_email(&email)
            .await
            .map_err(storage_failure)?
            .ok_or(WorkflowError::InvalidCredentials)?;

        // Externally provisioned accounts have no local password.
        let Some(hash) = credentials.password_hash.as_deref() else {
            warn!(account_id = %credentials.account.id, "password sign-in for external account");
            return Err(WorkflowError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify(password, hash)
            .await
            .map_err(upstream_failure)?;
        if !valid {
            return Err(WorkflowError::InvalidCredentials);
        }

        self.issue(credentials.account)
    }

    /// Maps a verified external identity to a local account, creating a
    /// password-less account without a role on first sight.
    pub async fn provision_external(
        &self,
        identity: ExternalIdentity,
    ) -> Result<IssuedSession, WorkflowError> {
        let identity = validate_external_identity(&identity)?;
        let account = self
            .store
            .find_or_insert_external_account(&identity)
            .await
            .map_err(storage_failure)?;
        info!(account_id = %account.id, "external identity signed in");
        self.issue(account)
    }

    /// Verifies a provider access token, then signs the identity it names in.
    /// A refused token reads as bad credentials; an unreachable provider as
    /// `UpstreamUnavailable`.
    pub async fn sign_in_external(
        &self,
        verifier: &dyn IdentityVerifier,
        access_token: &str,
    ) -> Result<IssuedSession, WorkflowError> {
        if access_token.trim().is_empty() {
            return Err(WorkflowError::InvalidCredentials);
        }
        let identity = verifier
            .verify_assertion(access_token.trim())
            .await
            .map_err(upstream_failure)?;
        self.provision_external(identity).await
    }

    /// Gives a role-less account its role and single profile.
    pub async fn complete_profile(
        &self,
        account_id: Uuid,
        role_data: RoleData,
    ) -> Result<Account, WorkflowError> {
        validate_role_data(&role_data)?;
        match self
            .store
            .attach_profile(account_id, role_data)
            .await
            .map_err(storage_failure)?
        {
            ProfileInsert::Created(account) => {
                info!(%account_id, "profile completed");
                Ok(account)
            }
            ProfileInsert::AlreadyExists => Err(WorkflowError::ProfileExists),
            ProfileInsert::NotEligible => Err(WorkflowError::NotFound("account".into())),
        }
    }

    /// Resolves a bearer token to the caller's account id.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, WorkflowError> {
        self.tokens
            .verify(token)
            .map_err(|_| WorkflowError::InvalidCredentials)
    }

    fn issue(&self, account: Account) -> Result<IssuedSession, WorkflowError> {
        let token = self.tokens.issue(account.id).map_err(upstream_failure)?;
        Ok(IssuedSession { token, account })
    }
}
