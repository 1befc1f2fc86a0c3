pub mod auth;
pub mod errors;
pub mod internships;
pub mod mentorship;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub use middleware::require_auth;
pub use state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring unparsable CORS origin '{}'", origin);
            layer
        }
    }
}

/// Builds the API router: public auth routes plus the bearer-protected rest.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/signin", post(auth::signin_handler))
        .route("/auth/external", post(auth::external_signin_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/profile", post(auth::complete_profile_handler))
        .route("/internships", post(internships::post_internship_handler))
        .route("/internships/{internship_id}", get(internships::get_internship_handler))
        .route(
            "/internships/{internship_id}/close",
            post(internships::close_internship_handler),
        )
        .route(
            "/internships/{internship_id}/applications",
            post(internships::apply_handler),
        )
        .route(
            "/internships/{internship_id}/applications/{student_id}/decision",
            post(internships::decide_application_handler),
        )
        .route("/mentors", post(mentorship::register_mentor_handler))
        .route("/mentors/{user_id}", get(mentorship::get_mentor_handler))
        .route("/mentorships", post(mentorship::request_mentorship_handler))
        .route(
            "/mentorships/{mentee_id}/decision",
            post(mentorship::decide_mentorship_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&state.config.cors_origin);
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
