use crate::{
    accounts::AccountDirectory,
    auth::{AuthConfig, AuthorizationGate},
    records::RecordRegistry,
    store::DocumentStore,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    response::Json,
    routing::{get, post},
    Router,
};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

pub use openapi::{openapi, ApiDoc};

/// Core services shared by every request.
#[derive(Clone, Debug)]
pub struct Services {
    pub accounts: Arc<AccountDirectory>,
    pub registry: Arc<RecordRegistry>,
    pub gate: Arc<AuthorizationGate>,
}

impl Services {
    /// Wire the core services over one document store.
    #[must_use]
    pub fn new(store: &DocumentStore, auth_config: &AuthConfig) -> Self {
        let gate = Arc::new(AuthorizationGate::new(auth_config));
        Self {
            accounts: Arc::new(AccountDirectory::new(store)),
            registry: Arc::new(RecordRegistry::new(store, gate.clone())),
            gate,
        }
    }
}

/// Build the application router.
pub fn router(services: &Services) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi()) }))
        .route("/api/signup", post(handlers::auth::signup))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/me", get(handlers::auth::me))
        .route(
            "/api/stores",
            get(handlers::stores::list_all).post(handlers::stores::create),
        )
        .route("/api/stores/my", get(handlers::stores::list_mine))
        .route("/api/stores/pending", get(handlers::stores::list_pending))
        .route("/api/stores/:id/status", post(handlers::stores::set_status))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive())
                .layer(Extension(services.accounts.clone()))
                .layer(Extension(services.registry.clone()))
                .layer(Extension(services.gate.clone())),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, data_dir: PathBuf, auth_config: AuthConfig) -> Result<()> {
    let store = DocumentStore::new(data_dir);
    let services = Services::new(&store, &auth_config);

    info!(
        "Session tokens valid for {}s",
        services.gate.tokens().ttl_seconds()
    );
    if auth_config.admin_email().is_none() {
        info!("No admin email configured; moderation endpoints will reject everyone");
    }

    let app = router(&services);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(
        "Listening on [::]:{}, data in {}",
        port,
        store.root().display()
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
