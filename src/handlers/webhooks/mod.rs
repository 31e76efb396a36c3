pub mod przelewy24;

pub use przelewy24::handle_p24_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(handle_p24_webhook))
}
