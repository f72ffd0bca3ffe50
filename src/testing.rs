//! In-process gateway and mailer doubles plus a ready-made `AppState`.

use async_trait::async_trait;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::gateway::{CreatedPaymentRequest, GatewayError, GatewayPayment, PaymentGateway, PaymentRequest};
use crate::mailer::{EmailMessage, MailError, Mailer};
use crate::state::AppState;
use crate::storage::temp_storage;

pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct FakeGateway {
    pub reject_create: Mutex<Option<String>>,
    pub created: Mutex<Vec<PaymentRequest>>,
    pub payments: Mutex<HashMap<String, GatewayPayment>>,
    pub fetches: Mutex<u32>,
    next_id: Mutex<u32>,
}

impl FakeGateway {
    pub fn settle(&self, payment_id: &str, status: &str, amount: &str) {
        let raw = serde_json::json!({
            "payment_id": payment_id,
            "status": status,
            "amount": amount,
            "buyer_name": "Asha Kulkarni",
            "buyer_email": "asha@example.com",
        });
        let payment = GatewayPayment {
            payment_id: payment_id.to_string(),
            status: status.to_string(),
            amount: amount.to_string(),
            buyer_name: "Asha Kulkarni".to_string(),
            buyer_email: "asha@example.com".to_string(),
            raw,
        };
        self.payments.lock().unwrap().insert(payment_id.to_string(), payment);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &str {
        "FakePay"
    }

    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<CreatedPaymentRequest, GatewayError> {
        if let Some(message) = self.reject_create.lock().unwrap().clone() {
            return Err(GatewayError::Rejected(message));
        }
        self.created.lock().unwrap().push(request.clone());
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(CreatedPaymentRequest {
            id: format!("req_{}", *next),
            payment_url: format!("https://pay.example.com/@hotel/req_{}", *next),
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        *self.fetches.lock().unwrap() += 1;
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected(format!("unknown payment {payment_id}")))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub fail: Mutex<bool>,
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if *self.fail.lock().unwrap() {
            return Err(MailError::Rejected {
                status: 500,
                body: "mail provider down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub dir: PathBuf,
}

impl TestApp {
    pub fn new(name: &str) -> Self {
        let (storage, dir) = temp_storage(name);
        let config = Config::parse_from([
            "hotel_booking",
            "--jwt-secret",
            TEST_SECRET,
            "--public-base-url",
            "http://localhost:3000",
            "--property-name",
            "Hyatt Regency Pune & Residences",
        ]);
        let gateway = Arc::new(FakeGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(storage, gateway.clone(), mailer.clone(), config);
        Self {
            state,
            gateway,
            mailer,
            dir,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
