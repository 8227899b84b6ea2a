use super::handlers::{auth, health, stores, ErrorBody};
use crate::records::{RecordStatus, StoreRecord};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Add new endpoints to `paths(...)` so they show up in the generated document.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup,
        auth::login,
        auth::me,
        stores::create,
        stores::list_all,
        stores::list_mine,
        stores::list_pending,
        stores::set_status,
    ),
    components(schemas(
        ErrorBody,
        RecordStatus,
        StoreRecord,
        auth::Credentials,
        auth::TokenResponse,
        auth::MeResponse,
        stores::NewStore,
        stores::StatusUpdate,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Signup, login and session identity"),
        (name = "stores", description = "Store submission and moderation"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        for path in [
            "/health",
            "/api/signup",
            "/api/login",
            "/api/me",
            "/api/stores",
            "/api/stores/my",
            "/api/stores/pending",
            "/api/stores/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn document_declares_bearer_scheme() {
        let doc = openapi();
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|components| components.security_schemes.contains_key("bearer"));
        assert!(has_bearer);
    }
}
