//! HTTP request handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use printquote::{Quote, QuoteError};
use tracing::info;

use crate::{types::HealthResponse, ApiError, AppState};

/// Material used when the form omits one.
pub const DEFAULT_MATERIAL: &str = "PLA Basic";

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Price an uploaded STEP file
///
/// Expects `multipart/form-data` with a `file` part and an optional
/// `material` text part. Unknown parts are skipped.
pub async fn create_quote(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<Quote>, ApiError> {
    let mut file = None;
    let mut material = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(field.bytes().await?),
            "material" => material = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| QuoteError::Validation("missing `file` field".into()))?;
    let material = material.unwrap_or_else(|| DEFAULT_MATERIAL.to_string());
    info!(bytes = file.len(), material = %material, "quote request");

    let quoter = state.quoter.clone();
    let params = state.pricing.parameters();
    let quote = tokio::task::spawn_blocking(move || quoter.quote(&file, &material, &params)).await??;

    info!(
        price = quote.estimated_price,
        volume_cm3 = quote.volume_cm3,
        units = %quote.units_detected,
        "quote computed"
    );
    Ok(Json(quote))
}
