use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// The two bookable room categories.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    Single,
    Double,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Guest and stay details submitted by the booking page.
#[derive(Serialize, Deserialize, Debug, Clone, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(
        length(min = 1, message = "First name is required"),
        custom(function = "alphabetic_name", message = "First name may only contain letters")
    )]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[validate(
        length(min = 1, message = "Last name is required"),
        custom(function = "alphabetic_name", message = "Last name may only contain letters")
    )]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 10, message = "Mobile number must be at least 10 digits"))]
    pub mobile: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "Please select a state"))]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[validate(custom(function = "iso_date", message = "Check-in date must be YYYY-MM-DD"))]
    pub checkin_date: String,
    #[validate(custom(function = "iso_date", message = "Check-out date must be YYYY-MM-DD"))]
    pub checkout_date: String,
    pub room_type: RoomCategory,
    #[serde(default)]
    pub agree_to_policy: bool,
}

fn alphabetic_name(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        Ok(())
    } else {
        Err(ValidationError::new("alphabetic"))
    }
}

fn iso_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date"))
}

impl BookingForm {
    /// Parsed (check-in, check-out). Only meaningful after `validate` passed.
    pub fn stay_dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        let checkin = NaiveDate::parse_from_str(&self.checkin_date, "%Y-%m-%d").ok()?;
        let checkout = NaiveDate::parse_from_str(&self.checkout_date, "%Y-%m-%d").ok()?;
        Some((checkin, checkout))
    }

    pub fn guest_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A stored reservation attempt, keyed by the gateway's payment-request id.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(flatten)]
    pub guest: BookingForm,
    pub booking_id: String,
    pub payment_request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub amount: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Distances {
    pub railway_station: String,
    pub airport: String,
    pub venue: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotelRoomType {
    #[serde(rename = "type")]
    pub name: String,
    pub occupancy: RoomCategory,
    pub max_guests: u32,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub map_link: String,
    pub star_rating: u8,
    pub address: String,
    pub distances: Distances,
    pub room_types: Vec<HotelRoomType>,
    pub policies: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of hotel create/update requests.
#[derive(Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelInput {
    #[validate(length(min = 1, message = "Hotel name is required"))]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub map_link: String,
    #[validate(range(min = 1, max = 5, message = "Star rating must be between 1 and 5"))]
    pub star_rating: u8,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub distances: Distances,
    #[serde(default)]
    pub room_types: Vec<HotelRoomType>,
    #[serde(default)]
    pub policies: Vec<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signed into every admin token.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub hotel_name: String,
    pub room_type: String,
    pub total_rooms: i64,
    pub available_rooms: i64,
    pub booked_rooms: i64,
    pub maintenance_rooms: i64,
    pub price: i64,
    pub last_updated: DateTime<Utc>,
}

/// Counter an admin can nudge from the inventory screen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InventoryCounter {
    TotalRooms,
    AvailableRooms,
    BookedRooms,
    MaintenanceRooms,
}

impl InventoryItem {
    /// Apply `change` to one counter; counters never go below zero.
    pub fn adjust(&mut self, counter: InventoryCounter, change: i64) {
        let slot = match counter {
            InventoryCounter::TotalRooms => &mut self.total_rooms,
            InventoryCounter::AvailableRooms => &mut self.available_rooms,
            InventoryCounter::BookedRooms => &mut self.booked_rooms,
            InventoryCounter::MaintenanceRooms => &mut self.maintenance_rooms,
        };
        *slot = slot.saturating_add(change).max(0);
        self.last_updated = Utc::now();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_bookings: u64,
    pub total_revenue: i64,
    pub total_hotels: u64,
    pub pending_bookings: u64,
    pub completed_bookings: u64,
    pub failed_payments: u64,
}

/// A booking seen from the payments screen.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub payment_request_id: String,
    pub payment_id: String,
    pub booking_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentSummary {
    pub fn from_booking(booking: &Booking, payment_method: &str) -> Self {
        Self {
            payment_request_id: booking.payment_request_id.clone(),
            payment_id: booking.payment_id.clone().unwrap_or_else(|| "N/A".to_string()),
            booking_id: booking.booking_id.clone(),
            customer_name: booking.guest.guest_name(),
            customer_email: booking.guest.email.clone(),
            amount: booking.amount,
            status: booking.payment_status,
            payment_method: payment_method.to_string(),
            created_at: booking.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> BookingForm {
    BookingForm {
        title: Some("Ms".to_string()),
        first_name: "Asha".to_string(),
        middle_name: None,
        last_name: "Kulkarni".to_string(),
        email: "asha@example.com".to_string(),
        mobile: "9876543210".to_string(),
        address: "12 MG Road".to_string(),
        state: "Maharashtra".to_string(),
        company_name: None,
        gst: None,
        checkin_date: "2025-06-01".to_string(),
        checkout_date: "2025-06-04".to_string(),
        room_type: RoomCategory::Double,
        agree_to_policy: true,
    }
}
