use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::PricingError;
use crate::service::{PriceQuote, PricingService, RideRequest};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PricingService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

// ---------- Handlers ----------

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "google_api_key": state.service.provider_configured(),
    }))
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<RideRequest>,
) -> Result<Json<PriceQuote>, (StatusCode, Json<serde_json::Value>)> {
    let quote = state.service.quote(&req).await.map_err(client_error)?;
    Ok(Json(quote))
}

// Every PricingError is a client error.
fn client_error(e: PricingError) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": e.to_string() })))
}
