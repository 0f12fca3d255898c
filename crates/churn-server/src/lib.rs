//! Churn Server - prediction API
//!
//! HTTP server exposing the churn classifier.

pub mod http;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use churn_core::{load_scorer, ChurnConfig, ChurnError, ConfigError, Predictor};

/// Errors raised while starting the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Churn(#[from] ChurnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state, built once at startup and never mutated
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub config: ChurnConfig,
}

impl AppState {
    pub fn new(predictor: Predictor, config: ChurnConfig) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config,
        }
    }

    /// Build the schema and load the model named by the configuration
    pub fn from_config(config: ChurnConfig) -> Result<Self, ServerError> {
        let schema = config.validate()?;
        let scorer = load_scorer(&config.model.path)?;
        let predictor = Predictor::new(Arc::new(schema), scorer)?;
        tracing::info!(
            "Feature schema ready: {} columns",
            predictor.schema().width()
        );
        Ok(Self::new(predictor, config))
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Prediction endpoints
        .route("/api/churn_predict", post(http::churn_predict))
        .route("/api/encode", post(http::encode_features))
        .route("/api/schema", get(http::get_schema))
        // System endpoints
        .route("/status", get(http::get_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), ServerError> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Churn server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
