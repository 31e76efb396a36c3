use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::amount;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::gateway::TransactionRequest;
use crate::id;
use crate::models::NewPayment;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateRequest {
    pub parish_id: String,
    /// Major-unit amount (number or string); parsed exactly into grosze.
    #[serde(deserialize_with = "amount::deserialize_grosze")]
    pub amount: i64,
    pub donor_email: String,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub payment_method: String,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateResponse {
    pub success: bool,
    pub payment_id: String,
    /// Gateway-hosted page the caller should navigate the donor to.
    pub payment_url: String,
    pub session_id: String,
    pub message: String,
}

/// Loose sanity check, not RFC 5322. The gateway re-validates the email on
/// its side; this only rejects obvious garbage before the external call.
fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// POST /api/payments - initiate a donation.
///
/// Validation happens before any external call; the gateway registration
/// happens before persistence, so a failed gateway call leaves no pending
/// row behind and a persisted row always carries a valid token.
pub async fn initiate_donation(
    State(state): State<AppState>,
    Json(request): Json<DonateRequest>,
) -> Result<(StatusCode, Json<DonateResponse>)> {
    if !amount::in_bounds(request.amount) {
        return Err(AppError::BadRequest(format!(
            "amount must be between {} and {} PLN",
            amount::MIN_AMOUNT_GROSZE / 100,
            amount::MAX_AMOUNT_GROSZE / 100
        )));
    }
    if !looks_like_email(&request.donor_email) {
        return Err(AppError::BadRequest("invalid donor email".into()));
    }
    if request.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest("payment method is required".into()));
    }

    let parish = {
        let conn = state.db.get()?;
        queries::get_parish_by_id(&conn, &request.parish_id)?
            .ok_or_else(|| AppError::NotFound("Parish not found".into()))?
    };

    let session_id = id::gen_session_id();

    let txn = TransactionRequest {
        session_id: session_id.clone(),
        amount_grosze: request.amount,
        currency: "PLN".to_string(),
        description: parish.donation_description(),
        email: request.donor_email.clone(),
        return_url: format!(
            "{}/api/payments/callback?sessionId={}",
            state.base_url, session_id
        ),
        status_url: format!("{}/api/payments/webhook", state.base_url),
    };

    // Gateway first. If this fails there is nothing to clean up locally.
    let registered = state.gateway.register_transaction(&txn).await?;

    let payment = {
        let conn = state.db.get()?;
        queries::create_payment(
            &conn,
            &NewPayment {
                session_id: session_id.clone(),
                parish_id: parish.id.clone(),
                goal_id: request.goal_id.clone(),
                amount_grosze: request.amount,
                donor_name: request.donor_name.clone(),
                donor_email: request.donor_email.clone(),
                message: request.message.clone(),
                is_anonymous: request.is_anonymous,
                payment_method: request.payment_method.clone(),
                is_recurring: request.is_recurring,
                recurring_frequency: request.recurring_frequency.clone(),
                metadata: serde_json::json!({
                    "p24_token": registered.token,
                    "redirect_url": registered.redirect_url,
                    "registered_at": Utc::now().timestamp(),
                }),
            },
        )?
    };

    tracing::info!(
        payment_id = %payment.id,
        session_id = %session_id,
        parish_id = %parish.id,
        amount_grosze = request.amount,
        "donation session initiated"
    );

    Ok((
        StatusCode::CREATED,
        Json(DonateResponse {
            success: true,
            payment_id: payment.id,
            payment_url: registered.redirect_url,
            session_id,
            message: "Payment session created".to_string(),
        }),
    ))
}
