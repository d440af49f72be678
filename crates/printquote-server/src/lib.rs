//! HTTP front end for printquote
//!
//! - `GET /health`: liveness probe
//! - `POST /quote`: multipart STEP upload, returns a priced quote

mod config;
mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use printquote::{PricingParameters, Quoter, StepKernel};
use tower_http::trace::TraceLayer;

pub use config::{AllowedOrigins, ServerConfig};
pub use handlers::*;
pub use types::*;

/// Where each request gets its pricing parameters.
#[derive(Debug, Clone, Default)]
pub enum PricingSource {
    /// Re-read the environment on every request.
    #[default]
    Env,
    /// Fixed parameters.
    Fixed(PricingParameters),
}

impl PricingSource {
    /// Parameters for one request.
    pub fn parameters(&self) -> PricingParameters {
        match self {
            PricingSource::Env => PricingParameters::from_env(),
            PricingSource::Fixed(params) => params.clone(),
        }
    }
}

/// API server state shared across handlers
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub quoter: Quoter<StepKernel>,
    pub pricing: PricingSource,
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/quote", post(create_quote))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(config.allowed_origins.cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), std::io::Error> {
    tracing::info!(
        addr = %config.addr,
        max_upload_mb = config.max_upload_mb,
        origins = ?config.allowed_origins,
        "starting quote server"
    );

    let app = build_router(state, config);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    axum::serve(listener, app).await
}
