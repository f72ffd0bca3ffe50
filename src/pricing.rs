//! Room pricing: a fixed nightly-rate table and the stay amount calculation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::RoomCategory;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRate {
    pub key: RoomCategory,
    pub name: &'static str,
    pub price: i64,
    pub description: &'static str,
}

pub const ROOM_RATES: [RoomRate; 2] = [
    RoomRate {
        key: RoomCategory::Single,
        name: "Single Occupancy",
        price: 100,
        description: "Comfortable room for one person",
    },
    RoomRate {
        key: RoomCategory::Double,
        name: "Double Occupancy",
        price: 150,
        description: "Spacious room for two people",
    },
];

pub fn room_rate(category: RoomCategory) -> &'static RoomRate {
    match category {
        RoomCategory::Single => &ROOM_RATES[0],
        RoomCategory::Double => &ROOM_RATES[1],
    }
}

/// Whole nights between check-in and check-out; zero or negative when the
/// dates are equal or reversed.
pub fn nights_between(checkin: NaiveDate, checkout: NaiveDate) -> i64 {
    (checkout - checkin).num_days()
}

/// Amount due for a stay. A zero or negative night count still bills one night.
pub fn calculate_booking_amount(checkin: NaiveDate, checkout: NaiveDate, category: RoomCategory) -> i64 {
    let rate = room_rate(category).price;
    let nights = nights_between(checkin, checkout);
    if nights > 0 {
        nights * rate
    } else {
        rate
    }
}
