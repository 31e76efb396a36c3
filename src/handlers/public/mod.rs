mod donate;
mod callback;
mod status;
mod parishes;

pub use donate::*;
pub use callback::*;
pub use status::*;
pub use parishes::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/payments", post(initiate_donation))
        .route("/api/payments/callback", get(payment_callback))
        .route("/api/payments/status", get(payment_status))
        .route("/api/parishes/{slug}", get(parish_profile))
}
