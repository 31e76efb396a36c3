//! Payment gateway seam.
//!
//! The rest of the service only sees the [`PaymentGateway`] trait; the
//! production implementation talks to Przelewy24 over HTTP. Handlers get an
//! `Arc<dyn PaymentGateway>` injected through `AppState`, so tests swap in a
//! recording mock without touching any handler code.

mod przelewy24;

pub use przelewy24::Przelewy24Client;

use thiserror::Error;

/// Transport-level gateway failure. Deliberately distinct from
/// "verification returned false", which is an `Ok(false)` - only broken
/// plumbing lands here.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected gateway response: {0}")]
    BadResponse(String),

    #[error("gateway misconfigured: {0}")]
    InvalidConfig(String),
}

/// Everything the gateway needs to register one donation transaction.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub session_id: String,
    pub amount_grosze: i64,
    pub currency: String,
    pub description: String,
    pub email: String,
    /// Browser comes back here after the gateway UI.
    pub return_url: String,
    /// Server-to-server notification target.
    pub status_url: String,
}

/// Result of registering a transaction: the gateway token and the URL to
/// send the donor's browser to.
#[derive(Debug, Clone)]
pub struct RegisteredTransaction {
    pub token: String,
    pub redirect_url: String,
}

/// Parameters for independently confirming a transaction with the gateway.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub session_id: String,
    pub amount_grosze: i64,
    pub currency: String,
    pub order_id: i64,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn register_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<RegisteredTransaction, GatewayError>;

    /// Confirm a transaction with the gateway. `Ok(false)` means the gateway
    /// rejected the verification; `Err` means we could not ask.
    async fn verify_transaction(&self, request: &VerifyRequest) -> Result<bool, GatewayError>;

    /// Expected `p24_sign` for an inbound webhook notification, when this
    /// gateway can compute one. Advisory only: authenticity is established
    /// by `verify_transaction`, a mismatch is logged but not fatal.
    fn notification_sign(
        &self,
        _session_id: &str,
        _order_id: i64,
        _amount_grosze: i64,
        _currency: &str,
    ) -> Option<String> {
        None
    }
}
