//! Booking-to-payment lifecycle.
//!
//! `initiate_payment` prices the stay, opens a gateway payment request and
//! records a pending booking under the gateway's request id.
//! `verify_payment` runs after the gateway redirect and settles that booking
//! as completed or failed. Local bookkeeping never blocks the payment: storage
//! failures are logged and the flow carries on. Nothing is retried.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::gateway::{GatewayPayment, PaymentRequest};
use crate::mailer::{ConfirmationEmail, MailError};
use crate::models::{Booking, BookingForm, PaymentStatus};
use crate::pricing::calculate_booking_amount;
use crate::state::AppState;

pub const BOOKING_REFERENCE_PREFIX: &str = "HRP";

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiated {
    pub success: bool,
    pub payment_url: String,
    pub payment_request_id: String,
    pub booking_id: String,
    pub amount: i64,
}

/// Result of asking the gateway how a payment settled.
#[derive(Debug, Clone)]
pub enum Verification {
    Completed {
        payment: GatewayPayment,
        booking: Option<Booking>,
    },
    NotCaptured {
        payment: GatewayPayment,
        booking: Option<Booking>,
    },
}

impl Verification {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            Verification::Completed { booking, .. } | Verification::NotCaptured { booking, .. } => booking.as_ref(),
        }
    }
}

/// `HRP` + Unix millis + four random uppercase alphanumerics.
///
/// Uniqueness is best effort; collisions are not checked.
pub fn generate_booking_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}{}{}", BOOKING_REFERENCE_PREFIX, Utc::now().timestamp_millis(), suffix)
}

pub async fn initiate_payment(state: &AppState, form: BookingForm) -> Result<PaymentInitiated, AppError> {
    form.validate()?;
    if !form.agree_to_policy {
        return Err(AppError::Validation("You must agree to the booking policy".to_string()));
    }
    let (checkin, checkout) = form
        .stay_dates()
        .ok_or_else(|| AppError::Validation("Check-in and check-out dates are required".to_string()))?;

    let amount = calculate_booking_amount(checkin, checkout, form.room_type);
    let booking_id = generate_booking_reference();

    let request = PaymentRequest {
        purpose: format!("Hotel Booking - {}", state.config.property.name),
        amount,
        buyer_name: form.guest_name(),
        email: form.email.clone(),
        phone: form.mobile.clone(),
        redirect_url: state.config.payment_redirect_url(),
    };

    let created = state
        .gateway
        .create_payment_request(&request)
        .await
        .map_err(|e| AppError::Upstream("Payment creation failed", e.to_string()))?;

    let now = Utc::now();
    let booking = Booking {
        guest: form,
        booking_id: booking_id.clone(),
        payment_request_id: created.id.clone(),
        payment_id: None,
        amount,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    match state.storage.insert_booking(&booking) {
        Ok(()) => info!(booking_id = %booking_id, payment_request_id = %created.id, amount, "booking stored"),
        Err(e) => error!(booking_id = %booking_id, error = %e, "failed to store booking, continuing with payment"),
    }

    Ok(PaymentInitiated {
        success: true,
        payment_url: created.payment_url,
        payment_request_id: created.id,
        booking_id,
        amount,
    })
}

/// Settle the booking created for `payment_request_id`.
///
/// Calling this twice re-applies the update; a completed booking can be
/// flipped to failed by a later non-capture result.
pub async fn verify_payment(
    state: &AppState,
    payment_id: &str,
    payment_request_id: &str,
) -> Result<Verification, AppError> {
    if payment_id.trim().is_empty() || payment_request_id.trim().is_empty() {
        return Err(AppError::Validation(
            "payment_id and payment_request_id are required".to_string(),
        ));
    }

    let payment = state
        .gateway
        .fetch_payment(payment_id)
        .await
        .map_err(|e| AppError::Upstream("Payment verification failed", e.to_string()))?;

    if !payment.is_captured() {
        let booking = settle(state, payment_request_id, PaymentStatus::Failed, None);
        info!(payment_id, payment_request_id, status = %payment.status, "payment not captured");
        return Ok(Verification::NotCaptured { payment, booking });
    }

    let booking = settle(state, payment_request_id, PaymentStatus::Completed, Some(payment_id));
    info!(payment_id, payment_request_id, "payment captured");

    let notify = state.storage.email_notifications_enabled().unwrap_or_else(|e| {
        warn!(error = %e, "could not read settings, sending confirmation anyway");
        true
    });
    if notify {
        let email = confirmation_for(&payment, booking.as_ref());
        if let Err(e) = send_confirmation(state, &email).await {
            warn!(payment_id, error = %e, "confirmation email failed");
        }
    }

    Ok(Verification::Completed { payment, booking })
}

fn settle(
    state: &AppState,
    payment_request_id: &str,
    status: PaymentStatus,
    payment_id: Option<&str>,
) -> Option<Booking> {
    match state.storage.update_booking_status(payment_request_id, status, payment_id) {
        Ok(Some(booking)) => Some(booking),
        Ok(None) => {
            warn!(payment_request_id, status = status.as_str(), "no booking for payment request");
            None
        }
        Err(e) => {
            error!(payment_request_id, error = %e, "failed to update booking status");
            None
        }
    }
}

/// Email facts, preferring what was stored at booking time over the gateway echo.
fn confirmation_for(payment: &GatewayPayment, booking: Option<&Booking>) -> ConfirmationEmail {
    match booking {
        Some(b) => ConfirmationEmail {
            email: b.guest.email.clone(),
            name: b.guest.guest_name(),
            payment_id: payment.payment_id.clone(),
            amount: b.amount.to_string(),
            booking_id: b.booking_id.clone(),
        },
        None => ConfirmationEmail {
            email: payment.buyer_email.clone(),
            name: payment.buyer_name.clone(),
            payment_id: payment.payment_id.clone(),
            amount: payment.amount.clone(),
            booking_id: generate_booking_reference(),
        },
    }
}

pub async fn send_confirmation(state: &AppState, email: &ConfirmationEmail) -> Result<(), MailError> {
    let message = email.render(&state.config.property);
    state.mailer.send(&message).await?;
    info!(booking_id = %email.booking_id, "confirmation email sent");
    Ok(())
}

/// JSON body returned by the verify endpoint.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub payment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_confirmed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Verification> for VerificationResponse {
    fn from(verification: &Verification) -> Self {
        match verification {
            Verification::Completed { payment, booking } => Self {
                success: true,
                payment: Some(payment.raw.clone()),
                booking_confirmed: Some(true),
                booking_id: booking.as_ref().map(|b| b.booking_id.clone()),
                error: None,
            },
            Verification::NotCaptured { .. } => Self {
                success: false,
                payment: None,
                booking_confirmed: None,
                booking_id: None,
                error: Some("Payment not completed".to_string()),
            },
        }
    }
}
