//! Shared application state and router construction.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::handlers::{protected, public, system};
use crate::identity::{IdentityVerifier, JwtVerifier};
use crate::middleware::identity_auth_middleware;
use crate::profile::ProfileRepository;
use crate::store::{MemoryProfileStore, PgProfileStore, ProfileStore};

/// Built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub repository: ProfileRepository,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(repository: ProfileRepository, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { repository, verifier }
    }

    /// Connect the configured store and verifier.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ProfileStore> = match config.store.backend {
            StoreBackend::Memory => {
                warn!("Using in-memory profile store; data is lost on restart");
                Arc::new(MemoryProfileStore::new())
            }
            StoreBackend::Postgres => {
                let store = PgProfileStore::connect(&config.store)
                    .await
                    .context("failed to connect profile store")?;
                store.ensure_schema().await.context("failed to prepare profile schema")?;
                Arc::new(store)
            }
        };
        info!("Profile store ready ({})", store.backend_tag());

        let verifier = JwtVerifier::from_config(&config.security).context("invalid token verifier configuration")?;

        Ok(Self::new(
            ProfileRepository::new(store, config.profile.clone()),
            Arc::new(verifier),
        ))
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", api_routes(state.clone()))
        .layer(RequestBodyLimitLayer::new(config.server.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        app = app.layer(cors_layer(config));
    }
    if config.server.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn api_routes(state: AppState) -> Router<AppState> {
    // Bearer token required
    let protected_routes = Router::new()
        .route("/fetch-user-data", get(protected::fetch_user_data))
        .route("/update-user-data", put(protected::update_user_data))
        .route_layer(middleware::from_fn_with_state(state, identity_auth_middleware));

    Router::new()
        .route("/verify-user", post(public::verify_user))
        .route("/create-user", post(public::create_user))
        .route("/grouped-user", get(public::grouped_user))
        .merge(protected_routes)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins = allowed_origins(&config.security.cors_origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Explicit origins only: a wildcard cannot be combined with credentials.
fn allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                warn!("Ignoring wildcard CORS origin; list explicit origins instead");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            }
        })
        .collect()
}
