//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for an OpenID Connect `userinfo` endpoint.
//! It implements the `IdentityVerifier` port from the `core` crate by trading a
//! provider access token for the email and display name it was issued to.

use std::time::Duration;

use alumni_connect_core::ports::{IdentityVerifier, PortError, PortResult};
use alumni_connect_core::ExternalIdentity;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct UserInfoVerifier {
    client: Client,
    userinfo_url: String,
}

impl UserInfoVerifier {
    /// Builds the HTTP client. Every provider call is bounded by `timeout`.
    pub fn new(userinfo_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

/// The subset of the standard userinfo claims we read.
#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

impl UserInfo {
    fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Only a provider-verified email identifies an account.
    fn into_identity(self) -> PortResult<ExternalIdentity> {
        let display_name = self.display_name();
        let email = self
            .email
            .ok_or_else(|| PortError::Unexpected("Identity provider returned no email".to_string()))?;
        if self.email_verified != Some(true) {
            warn!("Identity provider has not verified the account's email; refusing sign-in");
            return Err(PortError::Unauthorized);
        }
        Ok(ExternalIdentity {
            email,
            display_name,
        })
    }
}

//=========================================================================================
// `IdentityVerifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityVerifier for UserInfoVerifier {
    async fn verify_assertion(&self, access_token: &str) -> PortResult<ExternalIdentity> {
        // 1. Call the provider with the caller's access token.
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PortError::Unavailable(format!("Identity provider unreachable: {}", e))
                } else {
                    PortError::Unexpected(e.to_string())
                }
            })?;

        // 2. Classify the provider's answer.
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PortError::Unauthorized);
        }
        if status.is_server_error() {
            return Err(PortError::Unavailable(format!("Identity provider returned {}", status)));
        }
        if !status.is_success() {
            warn!("Identity provider answered with unexpected status {}", status);
            return Err(PortError::Unexpected(format!("Identity provider returned {}", status)));
        }

        // 3. Extract the identity.
        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed userinfo response: {}", e)))?;
        info.into_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_the_full_name() {
        let info: UserInfo = serde_json::from_str(
            r#"{"email":"a@b.io","name":"Meera Iyer","given_name":"M","family_name":"I"}"#,
        )
        .unwrap();
        assert_eq!(info.display_name(), "Meera Iyer");

        let info: UserInfo =
            serde_json::from_str(r#"{"email":"a@b.io","given_name":"Meera","family_name":"Iyer"}"#)
                .unwrap();
        assert_eq!(info.display_name(), "Meera Iyer");

        let info: UserInfo = serde_json::from_str(r#"{"email":"a@b.io"}"#).unwrap();
        assert_eq!(info.display_name(), "");
    }

    #[test]
    fn only_verified_emails_become_identities() {
        let info: UserInfo =
            serde_json::from_str(r#"{"email":"a@b.io","email_verified":true,"name":"Meera"}"#).unwrap();
        let identity = info.into_identity().unwrap();
        assert_eq!(identity.email, "a@b.io");
        assert_eq!(identity.display_name, "Meera");

        for body in [
            r#"{"email":"a@b.io","email_verified":false}"#,
            r#"{"email":"a@b.io"}"#,
        ] {
            let info: UserInfo = serde_json::from_str(body).unwrap();
            assert!(matches!(info.into_identity(), Err(PortError::Unauthorized)), "{body}");
        }

        let info: UserInfo = serde_json::from_str(r#"{"email_verified":true}"#).unwrap();
        assert!(matches!(info.into_identity(), Err(PortError::Unexpected(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let verifier = UserInfoVerifier::new("http://127.0.0.1:9/userinfo", Duration::from_millis(500)).unwrap();
        match verifier.verify_assertion("token").await {
            Err(PortError::Unavailable(_)) => {}
            other => panic!("expected unavailable, got {other:?}"),
        }
    }
}
