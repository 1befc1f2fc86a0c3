//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use crate::web::{auth, errors, internships, mentorship};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::signin_handler,
        auth::external_signin_handler,
        auth::complete_profile_handler,
        internships::post_internship_handler,
        internships::get_internship_handler,
        internships::close_internship_handler,
        internships::apply_handler,
        internships::decide_application_handler,
        mentorship::register_mentor_handler,
        mentorship::get_mentor_handler,
        mentorship::request_mentorship_handler,
        mentorship::decide_mentorship_handler,
    ),
    components(
        schemas(
            errors::ErrorBody,
            auth::ProfilePayload,
            auth::SignupRequest,
            auth::SigninRequest,
            auth::ExternalSigninRequest,
            auth::AccountResponse,
            auth::SessionResponse,
            internships::CreateInternshipRequest,
            internships::InternshipResponse,
            internships::ApplicationResponse,
            internships::DecisionRequest,
            mentorship::RegisterMentorRequest,
            mentorship::MentorResponse,
            mentorship::MentorshipRequestBody,
            mentorship::MentorshipResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts, sign-in and role profiles."),
        (name = "internships", description = "Internship postings and applications."),
        (name = "mentorship", description = "Mentor profiles and mentorship requests.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/signup",
            "/auth/signin",
            "/auth/external",
            "/profile",
            "/internships",
            "/internships/{internship_id}/applications/{student_id}/decision",
            "/mentors/{user_id}",
            "/mentorships/{mentee_id}/decision",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
