//! Booking confirmation emails.
//!
//! [`Mailer`] is the seam the payment flow calls; [`ZeptoMailer`] posts to a
//! ZeptoMail-compatible `/v1.1/email` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::{EmailConfig, PropertyProfile};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("email provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Facts shown in the confirmation email.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEmail {
    pub email: String,
    pub name: String,
    pub payment_id: String,
    pub amount: String,
    pub booking_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to_address: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl ConfirmationEmail {
    pub fn render(&self, property: &PropertyProfile) -> EmailMessage {
        let name = escape_html(&self.name);
        let hotel = escape_html(&property.name);
        let address = escape_html(&property.address);
        let phone = escape_html(&property.phone);
        let booking_id = escape_html(&self.booking_id);
        let payment_id = escape_html(&self.payment_id);
        let amount = escape_html(&self.amount);

        let html_body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 30px; text-align: center; color: white;">
    <h1 style="margin: 0; font-size: 28px;">Booking Confirmed!</h1>
    <p style="margin: 10px 0 0 0; opacity: 0.9;">{hotel}</p>
  </div>
  <div style="padding: 30px; background: #f8f9ff;">
    <h2 style="color: #333; margin-bottom: 20px;">Dear {name},</h2>
    <p style="color: #666; line-height: 1.6;">Thank you for choosing {hotel}. Your booking has been confirmed successfully.</p>
    <div style="background: white; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <h3 style="color: #667eea; margin-top: 0;">Booking Details</h3>
      <p><strong>Booking ID:</strong> {booking_id}</p>
      <p><strong>Payment ID:</strong> {payment_id}</p>
      <p><strong>Amount Paid:</strong> &#8377;{amount}</p>
      <p><strong>Payment Status:</strong> <span style="color: #10b981;">Confirmed</span></p>
    </div>
    <div style="background: white; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <h3 style="color: #667eea; margin-top: 0;">Hotel Information</h3>
      <p><strong>Hotel:</strong> {hotel}</p>
      <p><strong>Address:</strong> {address}</p>
      <p><strong>Phone:</strong> {phone}</p>
    </div>
    <p style="color: #666; line-height: 1.6;">Please keep this confirmation email for your records. If you have any questions, feel free to contact our customer service team.</p>
    <div style="text-align: center; margin-top: 30px;">
      <p style="color: #888; font-size: 14px;">Thank you for choosing {hotel}<br>We look forward to hosting you!</p>
    </div>
  </div>
</div>"#
        );

        EmailMessage {
            to_address: self.email.clone(),
            to_name: self.name.clone(),
            subject: format!("Booking Confirmation - {}", property.name),
            html_body,
        }
    }
}

pub struct ZeptoMailer {
    client: Client,
    config: EmailConfig,
    from_name: String,
}

impl ZeptoMailer {
    pub fn new(client: Client, config: EmailConfig, from_name: impl Into<String>) -> Self {
        Self {
            client,
            config,
            from_name: from_name.into(),
        }
    }
}

#[async_trait]
impl Mailer for ZeptoMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let payload = json!({
            "from": {
                "address": self.config.from_address,
                "name": self.from_name,
            },
            "to": [{
                "email_address": {
                    "address": message.to_address,
                    "name": message.to_name,
                }
            }],
            "subject": message.subject,
            "htmlbody": message.html_body,
        });

        let response = self
            .client
            .post(format!("{}/v1.1/email", self.config.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Zoho-enczapikey {}", self.config.token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property() -> PropertyProfile {
        PropertyProfile {
            name: "Hyatt Regency Pune & Residences".to_string(),
            address: "Nagar Rd, Pune".to_string(),
            phone: "+91 20 6645 1234".to_string(),
        }
    }

    #[test]
    fn test_render_fills_booking_facts() {
        let email = ConfirmationEmail {
            email: "asha@example.com".to_string(),
            name: "Asha Kulkarni".to_string(),
            payment_id: "MOJO123".to_string(),
            amount: "450".to_string(),
            booking_id: "HRP1718000000000AB12".to_string(),
        };
        let message = email.render(&property());
        assert_eq!(message.to_address, "asha@example.com");
        assert_eq!(message.subject, "Booking Confirmation - Hyatt Regency Pune & Residences");
        assert!(message.html_body.contains("HRP1718000000000AB12"));
        assert!(message.html_body.contains("MOJO123"));
        assert!(message.html_body.contains("&#8377;450"));
        assert!(message.html_body.contains("Hyatt Regency Pune &amp; Residences"));
    }

    #[test]
    fn test_render_escapes_guest_input() {
        let email = ConfirmationEmail {
            email: "x@example.com".to_string(),
            name: "<script>alert(1)</script>".to_string(),
            payment_id: "p".to_string(),
            amount: "1".to_string(),
            booking_id: "b".to_string(),
        };
        let message = email.render(&property());
        assert!(!message.html_body.contains("<script>"));
        assert!(message.html_body.contains("&lt;script&gt;"));
    }
}
