//! Payment gateway client.
//!
//! The booking flow talks to the gateway through [`PaymentGateway`]; the
//! production implementation speaks the Instamojo v1.1 REST API
//! (form-encoded payment requests, `X-Api-Key`/`X-Auth-Token` headers).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayConfig;

/// Gateway status for captured funds.
pub const CAPTURED_STATUS: &str = "Credit";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

/// What the booking flow asks the gateway to collect.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub purpose: String,
    pub amount: i64,
    pub buyer_name: String,
    pub email: String,
    pub phone: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPaymentRequest {
    pub id: String,
    pub payment_url: String,
}

/// A payment attempt as reported by the gateway after the redirect.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub payment_id: String,
    pub status: String,
    pub amount: String,
    pub buyer_name: String,
    pub buyer_email: String,
    /// Full gateway payload, passed back to the success page.
    pub raw: Value,
}

impl GatewayPayment {
    pub fn is_captured(&self) -> bool {
        self.status == CAPTURED_STATUS
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Shown as the payment method on the admin payments screen.
    fn name(&self) -> &str;

    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<CreatedPaymentRequest, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

pub struct InstamojoGateway {
    client: Client,
    config: GatewayConfig,
}

impl InstamojoGateway {
    pub fn new(client: Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(default)]
    success: bool,
    payment_request: Option<PaymentRequestBody>,
    #[serde(default)]
    message: Value,
}

#[derive(Deserialize)]
struct PaymentRequestBody {
    id: String,
    longurl: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    #[serde(default)]
    success: bool,
    payment: Option<Value>,
    #[serde(default)]
    message: Value,
}

fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn rejection(message: &Value) -> GatewayError {
    match message {
        Value::Null => GatewayError::Rejected("no message".to_string()),
        Value::String(s) => GatewayError::Rejected(s.clone()),
        other => GatewayError::Rejected(other.to_string()),
    }
}

impl GatewayPayment {
    fn from_raw(raw: Value) -> Self {
        Self {
            payment_id: text_field(&raw, "payment_id"),
            status: text_field(&raw, "status"),
            amount: text_field(&raw, "amount"),
            buyer_name: text_field(&raw, "buyer_name"),
            buyer_email: text_field(&raw, "buyer_email"),
            raw,
        }
    }
}

#[async_trait]
impl PaymentGateway for InstamojoGateway {
    fn name(&self) -> &str {
        "Instamojo"
    }

    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<CreatedPaymentRequest, GatewayError> {
        let amount = request.amount.to_string();
        let form = [
            ("purpose", request.purpose.as_str()),
            ("amount", amount.as_str()),
            ("phone", request.phone.as_str()),
            ("buyer_name", request.buyer_name.as_str()),
            ("redirect_url", request.redirect_url.as_str()),
            ("send_email", "true"),
            ("email", request.email.as_str()),
            ("allow_repeated_payments", "false"),
        ];

        let response = self
            .client
            .post(self.url("payment-requests/"))
            .header("X-Api-Key", &self.config.api_key)
            .header("X-Auth-Token", &self.config.auth_token)
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body: CreateResponse = response.json().await?;

        match body.payment_request {
            Some(created) if status.is_success() && body.success => Ok(CreatedPaymentRequest {
                id: created.id,
                payment_url: created.longurl,
            }),
            _ => Err(rejection(&body.message)),
        }
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("payments/{payment_id}/")))
            .header("X-Api-Key", &self.config.api_key)
            .header("X-Auth-Token", &self.config.auth_token)
            .send()
            .await?;
        let status = response.status();
        let body: PaymentResponse = response.json().await?;

        match body.payment {
            Some(raw) if status.is_success() && body.success => Ok(GatewayPayment::from_raw(raw)),
            _ => Err(rejection(&body.message)),
        }
    }
}
