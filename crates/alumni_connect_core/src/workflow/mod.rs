//! crates/alumni_connect_core/src/workflow/mod.rs
//!
//! The Relationship Workflow Engine. Internship applications and mentorship
//! requests follow the same propose -> decide pattern: one side proposes a
//! `PENDING` row, the side holding authority moves it to a terminal state.
//!
//! Authority is always re-derived from stored ownership, never from claims
//! carried by the caller's session token.

mod internships;
mod mentorship;

use std::sync::Arc;

use crate::domain::{ReapplicationPolicy, DEFAULT_MAX_MENTEES};
use crate::ports::IdentityStore;

/// Tunables that change workflow semantics rather than infrastructure.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowPolicy {
    pub reapplication: ReapplicationPolicy,
    pub default_max_mentees: u32,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            reapplication: ReapplicationPolicy::Never,
            default_max_mentees: DEFAULT_MAX_MENTEES,
        }
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn IdentityStore>,
    policy: WorkflowPolicy,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn IdentityStore>, policy: WorkflowPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> WorkflowPolicy {
        self.policy
    }
}
