use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha384};

use crate::config::P24Config;

use super::{
    GatewayError, PaymentGateway, RegisteredTransaction, TransactionRequest, VerifyRequest,
};

/// Outbound calls must not hang a handler; the gateway client owns the
/// timeout and turns it into a typed `Transport` error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    data: RegisterData,
}

#[derive(Debug, Deserialize)]
struct RegisterData {
    token: String,
}

#[derive(Debug, Clone)]
pub struct Przelewy24Client {
    client: reqwest::Client,
    merchant_id: i64,
    pos_id: i64,
    crc: String,
    api_key: String,
    api_base: String,
}

impl Przelewy24Client {
    pub fn new(config: &P24Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            merchant_id: config.merchant_id,
            pos_id: config.pos_id,
            crc: config.crc.clone(),
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// SHA-384 over the documented JSON sign payload. Field order matters,
    /// so the payload is built by hand rather than through serde_json.
    fn sha384_hex(payload: &str) -> String {
        let mut hasher = Sha384::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn register_sign(&self, session_id: &str, amount: i64, currency: &str) -> String {
        Self::sha384_hex(&format!(
            r#"{{"sessionId":"{}","merchantId":{},"amount":{},"currency":"{}","crc":"{}"}}"#,
            session_id, self.merchant_id, amount, currency, self.crc
        ))
    }

    fn verify_sign(&self, session_id: &str, order_id: i64, amount: i64, currency: &str) -> String {
        Self::sha384_hex(&format!(
            r#"{{"sessionId":"{}","orderId":{},"amount":{},"currency":"{}","crc":"{}"}}"#,
            session_id, order_id, amount, currency, self.crc
        ))
    }

    fn check_config(&self) -> Result<(), GatewayError> {
        if self.merchant_id == 0 || self.crc.is_empty() || self.api_key.is_empty() {
            return Err(GatewayError::InvalidConfig(
                "P24 merchant credentials missing".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaymentGateway for Przelewy24Client {
    fn name(&self) -> &'static str {
        "przelewy24"
    }

    async fn register_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<RegisteredTransaction, GatewayError> {
        self.check_config()?;

        let sign = self.register_sign(
            &request.session_id,
            request.amount_grosze,
            &request.currency,
        );

        let body = serde_json::json!({
            "merchantId": self.merchant_id,
            "posId": self.pos_id,
            "sessionId": request.session_id,
            "amount": request.amount_grosze,
            "currency": request.currency,
            "description": request.description,
            "email": request.email,
            "country": "PL",
            "language": "pl",
            "urlReturn": request.return_url,
            "urlStatus": request.status_url,
            "sign": sign,
        });

        let response = self
            .client
            .post(format!("{}/api/v1/transaction/register", self.api_base))
            .basic_auth(self.pos_id, Some(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RegisterResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(format!("register response: {}", e)))?;

        let redirect_url = format!("{}/trnRequest/{}", self.api_base, parsed.data.token);

        Ok(RegisteredTransaction {
            token: parsed.data.token,
            redirect_url,
        })
    }

    async fn verify_transaction(&self, request: &VerifyRequest) -> Result<bool, GatewayError> {
        self.check_config()?;

        let sign = self.verify_sign(
            &request.session_id,
            request.order_id,
            request.amount_grosze,
            &request.currency,
        );

        let body = serde_json::json!({
            "merchantId": self.merchant_id,
            "posId": self.pos_id,
            "sessionId": request.session_id,
            "amount": request.amount_grosze,
            "currency": request.currency,
            "orderId": request.order_id,
            "sign": sign,
        });

        let response = self
            .client
            .put(format!("{}/api/v1/transaction/verify", self.api_base))
            .basic_auth(self.pos_id, Some(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        // 4xx is the gateway saying "no" - a negative verification, not an
        // infrastructure failure. 5xx is the gateway being broken.
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                session_id = %request.session_id,
                order_id = request.order_id,
                "P24 verification rejected ({}): {}",
                status,
                body
            );
            return Ok(false);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Http {
            status: status.as_u16(),
            body,
        })
    }

    fn notification_sign(
        &self,
        session_id: &str,
        order_id: i64,
        amount_grosze: i64,
        currency: &str,
    ) -> Option<String> {
        if self.crc.is_empty() {
            return None;
        }
        Some(self.verify_sign(session_id, order_id, amount_grosze, currency))
    }
}
