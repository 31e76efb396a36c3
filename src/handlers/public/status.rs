use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::models::{Parish, Payment, PaymentStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParishSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub city: String,
}

/// Public snapshot of a payment. Donor email and the metadata bag stay
/// server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub session_id: String,
    /// Major-unit amount as a string, e.g. "25" or "25.50".
    pub amount: String,
    pub status: PaymentStatus,
    pub is_anonymous: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub parish: ParishSummary,
}

impl PaymentStatusResponse {
    fn from_record(payment: Payment, parish: Parish) -> Self {
        Self {
            payment_id: payment.id,
            session_id: payment.session_id,
            amount: crate::amount::format_major(payment.amount_grosze),
            status: payment.status,
            is_anonymous: payment.is_anonymous,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
            parish: ParishSummary {
                id: parish.id,
                name: parish.name,
                slug: parish.slug,
                city: parish.city,
            },
        }
    }
}

/// GET /api/payments/status?paymentId=... | ?sessionId=...
pub async fn payment_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<PaymentStatusResponse>> {
    let conn = state.db.get()?;

    let payment = match (&query.payment_id, &query.session_id) {
        (Some(id), _) => queries::get_payment_by_id(&conn, id)?,
        (None, Some(session_id)) => queries::get_payment_by_session(&conn, session_id)?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "paymentId or sessionId is required".into(),
            ))
        }
    };

    let payment = payment.ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
    let parish = queries::get_parish_by_id(&conn, &payment.parish_id)?
        .ok_or_else(|| AppError::Internal("parish row missing".into()))?;

    Ok(Json(PaymentStatusResponse::from_record(payment, parish)))
}
