//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use alumni_connect_core::WorkflowError;
use std::sync::Arc;

use crate::web::errors::HttpError;
use crate::web::state::{AppState, Caller};

/// Middleware that validates the bearer token and extracts the account id.
///
/// If valid, inserts a `Caller` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(HttpError(WorkflowError::InvalidCredentials))?;

    // 2. Verify signature and expiry, get the account id
    let account_id = state.provisioner.authenticate(token)?;

    // 3. Insert the caller into request extensions
    req.extensions_mut().insert(Caller(account_id));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
