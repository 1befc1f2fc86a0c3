//! services/api/src/adapters/credentials.rs
//!
//! Argon2id implementation of the `CredentialHasher` port. Hashing is CPU-bound,
//! so both operations run on the blocking thread pool.

use alumni_connect_core::ports::{CredentialHasher, PortError, PortResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use tracing::warn;

/// Hashes passwords into PHC strings (`$argon2id$v=19$...`), salt included.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Uses the crate's recommended cost parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Uses explicit cost parameters. Verification always honours the
    /// parameters recorded in the stored hash.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

fn join_error(e: tokio::task::JoinError) -> PortError {
    PortError::Unexpected(format!("Hashing task failed: {}", e))
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> PortResult<String> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&hash) {
                Ok(parsed) => parsed,
                Err(e) => {
                    // An unreadable stored hash can never match.
                    warn!("Stored password hash is malformed: {}", e);
                    return Ok(false);
                }
            };
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(PortError::Unexpected(format!("Failed to verify password: {}", e))),
            }
        })
        .await
        .map_err(join_error)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Hasher {
        Argon2Hasher::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[tokio::test]
    async fn hashes_are_salted_and_verifiable() {
        let hasher = cheap();
        let first = hasher.hash("correct horse").await.unwrap();
        let second = hasher.hash("correct horse").await.unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(hasher.verify("correct horse", &first).await.unwrap());
        assert!(!hasher.verify("battery staple", &first).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hashes_never_match() {
        let hasher = cheap();
        assert!(!hasher.verify("anything", "not-a-phc-string").await.unwrap());
        assert!(!hasher.verify("", "").await.unwrap());
    }
}
