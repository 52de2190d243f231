use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::enqueue::Enqueuer;
use crate::executor::{ProcessExecutor, TokioExecutor};
use crate::search::{SearchClient, SearchError};

pub mod error;
pub mod handlers;
pub mod models;

/// Shared handler state. Each handler pulls out only the component it uses.
#[derive(Clone)]
pub struct AppState {
    pub search_client: Arc<SearchClient>,
    pub enqueuer: Arc<Enqueuer>,
}

impl AppState {
    pub fn new(search_client: SearchClient, enqueuer: Enqueuer) -> Self {
        AppState {
            search_client: Arc::new(search_client),
            enqueuer: Arc::new(enqueuer),
        }
    }

    /// Build the production components: a real HTTP client for the indexer
    /// and real child processes for sabcmd.
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let search_client = SearchClient::new(
            &config.nzbgeek_api_url,
            &config.nzbgeek_api_key,
            config.nzbgeek_timeout,
        )?;
        let executor: Arc<dyn ProcessExecutor> = Arc::new(TokioExecutor::new(config.sabcmd_timeout));
        let enqueuer = Enqueuer::new(
            executor,
            config.sabcmd_path.clone(),
            config.failure_policy,
            config.sabcmd_max_concurrent,
        );
        Ok(Self::new(search_client, enqueuer))
    }
}

impl FromRef<AppState> for Arc<SearchClient> {
    fn from_ref(state: &AppState) -> Self {
        state.search_client.clone()
    }
}

impl FromRef<AppState> for Arc<Enqueuer> {
    fn from_ref(state: &AppState) -> Self {
        state.enqueuer.clone()
    }
}

pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/search", get(handlers::search_handler))
        .route("/api/save", post(handlers::save_handler))
        .with_state(state);

    // Static file serving for the UI
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}
