//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use alumni_connect_core::ports::IdentityVerifier;
use alumni_connect_core::{AccountProvisioner, WorkflowEngine};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provisioner: AccountProvisioner,
    pub engine: WorkflowEngine,
    pub identity: Arc<dyn IdentityVerifier>,
}

/// The authenticated account behind a request, inserted by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);
