pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod graph;
pub mod handlers;
pub mod jobs;
pub mod signature;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, dispatch::Dispatcher, jobs::JobSubmitter};

/// Per-process state shared by every request. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub webhook_secret: String,
    pub validate_signatures: bool,
    pub dispatcher: Dispatcher,
    pub jobs: Arc<dyn JobSubmitter>,
}

impl AppState {
    pub fn new(config: &Config, jobs: Arc<dyn JobSubmitter>) -> Self {
        Self {
            webhook_secret: config.secret.clone(),
            validate_signatures: config.validate_signatures,
            dispatcher: Dispatcher::new(config.trigger.clone()),
            jobs,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/postreceive", post(handlers::postreceive))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
