use axum::{extract::State, response::Redirect};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::Query;
use crate::gateway::VerifyRequest;
use crate::models::{Parish, Payment, PaymentStatus, TransitionOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Where the donor's browser goes next. Redirects are values, not
/// exceptions: every path through the handler resolves to one of these.
enum CallbackOutcome {
    Success { parish: Parish, payment: Payment },
    Cancelled { parish: Parish },
    Failed { parish: Parish, payment: Payment },
    GenericError,
}

impl CallbackOutcome {
    fn into_redirect(self, frontend_url: &str) -> Redirect {
        let url = match self {
            Self::Success { parish, payment } => format!(
                "{}/{}/wsparcie/sukces?paymentId={}&amount={}",
                frontend_url,
                urlencoding::encode(&parish.slug),
                payment.id,
                crate::amount::format_major(payment.amount_grosze)
            ),
            Self::Cancelled { parish } => format!(
                "{}/{}/wsparcie?komunikat=platnosc-anulowana",
                frontend_url,
                urlencoding::encode(&parish.slug)
            ),
            Self::Failed { parish, payment } => format!(
                "{}/{}/wsparcie/blad?paymentId={}&error=platnosc-nieudana",
                frontend_url,
                urlencoding::encode(&parish.slug),
                payment.id
            ),
            Self::GenericError => format!("{}/wsparcie/blad", frontend_url),
        };
        Redirect::temporary(&url)
    }
}

/// GET /api/payments/callback - browser redirect back from the gateway.
///
/// This endpoint faces a human mid-payment: whatever goes wrong internally,
/// the answer is a redirect, never a raw error response.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let frontend_url = state.frontend_url.clone();
    let outcome = resolve_callback(state, query).await.unwrap_or_else(|e| {
        tracing::error!("callback handling failed: {}", e);
        CallbackOutcome::GenericError
    });
    outcome.into_redirect(&frontend_url)
}

async fn resolve_callback(state: AppState, query: CallbackQuery) -> Result<CallbackOutcome> {
    let Some(session_id) = query.session_id.as_deref() else {
        tracing::warn!("callback without sessionId");
        return Ok(CallbackOutcome::GenericError);
    };

    let payment = {
        let conn = state.db.get()?;
        queries::get_payment_by_session(&conn, session_id)?
    };
    let Some(payment) = payment else {
        tracing::warn!(session_id = %session_id, "callback for unknown session");
        return Ok(CallbackOutcome::GenericError);
    };

    // Independent confirmation with the gateway, when an order id came back.
    // A transport failure counts as "not verified", never as a thrown error.
    let verified = match query.order_id {
        Some(order_id) => {
            let verify = VerifyRequest {
                session_id: payment.session_id.clone(),
                amount_grosze: payment.amount_grosze,
                currency: "PLN".to_string(),
                order_id,
            };
            match state.gateway.verify_transaction(&verify).await {
                Ok(ok) => ok,
                Err(e) => {
                    tracing::warn!(
                        session_id = %payment.session_id,
                        order_id,
                        "callback verification errored: {}",
                        e
                    );
                    false
                }
            }
        }
        None => false,
    };

    let hint = query.status.as_deref();
    let decided = match hint {
        Some("success") if verified => PaymentStatus::Completed,
        Some("cancel") => PaymentStatus::Cancelled,
        _ => PaymentStatus::Failed,
    };

    let patch = serde_json::json!({
        "p24_order_id": query.order_id,
        "callback_status": hint,
        "verified": verified,
        "verified_at": Utc::now().timestamp(),
    });

    let outcome = {
        let mut conn = state.db.get()?;
        queries::apply_terminal_status(&mut conn, &payment.id, decided, &patch, "callback")?
    };

    // The record keeps whatever the guard decided; the donor sees the state
    // the record actually ended up in.
    let effective = match outcome {
        TransitionOutcome::Applied | TransitionOutcome::AlreadyApplied => decided,
        TransitionOutcome::Conflict(existing) => existing,
    };

    let parish = {
        let conn = state.db.get()?;
        let parish = queries::get_parish_by_id(&conn, &payment.parish_id)?
            .ok_or_else(|| crate::error::AppError::Internal("parish row missing".into()))?;

        if effective == PaymentStatus::Completed {
            // Aggregate-statistics hook; never fails the callback itself.
            if let Err(e) = queries::touch_parish(&conn, &parish.id) {
                tracing::warn!(parish_id = %parish.id, "failed to touch parish: {}", e);
            }
        }
        parish
    };

    Ok(match effective {
        PaymentStatus::Completed => CallbackOutcome::Success { parish, payment },
        PaymentStatus::Cancelled => CallbackOutcome::Cancelled { parish },
        _ => CallbackOutcome::Failed { parish, payment },
    })
}
