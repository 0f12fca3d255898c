//! Churn Server Binary
//!
//! Loads the feature schema and model once, then serves predictions.

use std::sync::Arc;

use churn_core::ChurnConfig;
use churn_server::{serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ChurnConfig::from_env()?;
    let addr = config.server.addr.clone();
    let state = Arc::new(AppState::from_config(config)?);

    serve(&addr, state).await?;
    Ok(())
}
