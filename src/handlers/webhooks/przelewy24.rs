use axum::extract::State;
use chrono::Utc;
use subtle::ConstantTimeEq;

use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Form, Json};
use crate::gateway::VerifyRequest;
use crate::models::{PaymentStatus, TransitionOutcome};

/// Form-encoded notification exactly as Przelewy24 posts it. Everything is
/// optional at parse time so missing-field handling stays in one place.
#[derive(Debug, Deserialize)]
pub struct P24Notification {
    #[serde(default)]
    pub p24_merchant_id: Option<i64>,
    #[serde(default)]
    pub p24_pos_id: Option<i64>,
    #[serde(default)]
    pub p24_session_id: Option<String>,
    #[serde(default)]
    pub p24_amount: Option<i64>,
    #[serde(default)]
    pub p24_currency: Option<String>,
    #[serde(default)]
    pub p24_order_id: Option<i64>,
    #[serde(default)]
    pub p24_method: Option<i64>,
    #[serde(default)]
    pub p24_statement: Option<String>,
    #[serde(default)]
    pub p24_sign: Option<String>,
}

/// POST /api/payments/webhook - server-to-server notification.
///
/// Machine-to-machine: errors come back as JSON status codes, never as
/// redirects. The gateway retries on non-2xx, so the handler is safe to run
/// any number of times for the same notification.
pub async fn handle_p24_webhook(
    State(state): State<AppState>,
    Form(notification): Form<P24Notification>,
) -> Result<Json<serde_json::Value>> {
    let session_id = notification
        .p24_session_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing p24_session_id".into()))?;
    let posted_amount = notification
        .p24_amount
        .ok_or_else(|| AppError::BadRequest("missing p24_amount".into()))?;
    let order_id = notification
        .p24_order_id
        .ok_or_else(|| AppError::BadRequest("missing p24_order_id".into()))?;
    let currency = notification.p24_currency.as_deref().unwrap_or("PLN");

    let payment = {
        let conn = state.db.get()?;
        queries::get_payment_by_session(&conn, session_id)?
            .ok_or_else(|| AppError::NotFound("unknown payment session".into()))?
    };

    if posted_amount != payment.amount_grosze {
        tracing::warn!(
            session_id = %session_id,
            posted = posted_amount,
            stored = payment.amount_grosze,
            "webhook amount does not match payment record"
        );
        return Err(AppError::BadRequest("amount mismatch".into()));
    }

    // Advisory local signature check. Authenticity is established by the
    // verify call below; a bad sign is only logged (truncated, no secrets).
    if let (Some(expected), Some(provided)) = (
        state
            .gateway
            .notification_sign(session_id, order_id, posted_amount, currency),
        notification.p24_sign.as_deref(),
    ) {
        let matches: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();
        if !matches {
            tracing::warn!(
                session_id = %session_id,
                sign_prefix = provided.get(..8).unwrap_or(""),
                "webhook signature mismatch"
            );
        }
    }

    let verify = VerifyRequest {
        session_id: session_id.to_string(),
        amount_grosze: posted_amount,
        currency: currency.to_string(),
        order_id,
    };

    // Transport failure -> 502 so the gateway retries later. A negative
    // verification -> 422 and the record stays untouched.
    let verified = state.gateway.verify_transaction(&verify).await?;
    if !verified {
        tracing::warn!(
            session_id = %session_id,
            order_id,
            "webhook verification rejected by gateway"
        );
        return Err(AppError::Unverified(
            "transaction could not be verified".into(),
        ));
    }

    let patch = serde_json::json!({
        "p24_order_id": order_id,
        "p24_method": notification.p24_method,
        "p24_statement": notification.p24_statement,
        "verified_by_webhook": true,
        "webhook_received_at": Utc::now().timestamp(),
    });

    let outcome = {
        let mut conn = state.db.get()?;
        queries::apply_terminal_status(
            &mut conn,
            &payment.id,
            PaymentStatus::Completed,
            &patch,
            "webhook",
        )?
    };

    match outcome {
        TransitionOutcome::Applied | TransitionOutcome::AlreadyApplied => {
            let conn = state.db.get()?;
            if let Err(e) = queries::touch_parish(&conn, &payment.parish_id) {
                tracing::warn!(parish_id = %payment.parish_id, "failed to touch parish: {}", e);
            }
        }
        TransitionOutcome::Conflict(existing) => {
            // Flagged in metadata by the guard; acknowledge anyway so the
            // gateway stops redelivering a notification we will never apply.
            tracing::warn!(
                payment_id = %payment.id,
                existing = %existing,
                "webhook completion conflicts with earlier terminal status"
            );
        }
    }

    tracing::info!(
        payment_id = %payment.id,
        session_id = %session_id,
        order_id,
        "webhook processed"
    );

    Ok(Json(serde_json::json!({ "status": "OK" })))
}
