//! services/api/src/bin/api.rs

use alumni_connect_core::ports::IdentityStore;
use alumni_connect_core::{AccountProvisioner, InMemoryStore, WorkflowEngine, WorkflowPolicy};
use api_lib::{
    adapters::{Argon2Hasher, JwtTokenIssuer, PgStore, UserInfoVerifier},
    config::{Config, StoreBackend},
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Identity Store ---
    let store: Arc<dyn IdentityStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            let pg_store = PgStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown and writes slow down as it grows. Not for production.");
            Arc::new(InMemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenIssuer::new(&config.jwt_secret, config.token_ttl_hours));
    let identity = Arc::new(UserInfoVerifier::new(
        config.identity_userinfo_url.clone(),
        config.upstream_timeout,
    )?);

    // --- 4. Build the Shared AppState ---
    let policy = WorkflowPolicy {
        reapplication: config.reapplication_policy,
        default_max_mentees: config.default_max_mentees,
    };
    let app_state = Arc::new(AppState {
        config: config.clone(),
        provisioner: AccountProvisioner::new(store.clone(), hasher, tokens),
        engine: WorkflowEngine::new(store, policy),
        identity,
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
