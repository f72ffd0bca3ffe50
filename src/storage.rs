use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AdminStats, AdminUser, Booking, Hotel, HotelInput, InventoryCounter, InventoryItem, PaymentStatus};

const SETTINGS_KEY: &[u8] = b"system";
/// Set, in the default tree, in the same transaction that writes the default inventory.
const INVENTORY_SEEDED_KEY: &[u8] = b"inventory_seeded";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    #[error("document encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} already exists")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Filter for the public booking lookup.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub email: Option<String>,
    pub booking_id: Option<String>,
}

/// Document store for the booking service.
///
/// One Sled tree per collection, values are serde_json documents:
/// - bookings: keyed by gateway payment-request id
/// - hotels / inventory: keyed by generated UUID
/// - admins: keyed by username
/// - settings: a single document under a fixed key
#[derive(Clone)] // Sled handles are cheap to clone and thread-safe
pub struct Storage {
    db: Db,
    bookings: sled::Tree,
    hotels: sled::Tree,
    admins: sled::Tree,
    settings: sled::Tree,
    inventory: sled::Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            bookings: db.open_tree("bookings")?,
            hotels: db.open_tree("hotels")?,
            admins: db.open_tree("admins")?,
            settings: db.open_tree("settings")?,
            inventory: db.open_tree("inventory")?,
            db,
        })
    }

    pub async fn flush(&self) -> StorageResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    // --- Bookings ---

    pub fn insert_booking(&self, booking: &Booking) -> StorageResult<()> {
        put(&self.bookings, booking.payment_request_id.as_bytes(), booking)
    }

    pub fn get_booking(&self, payment_request_id: &str) -> StorageResult<Option<Booking>> {
        get(&self.bookings, payment_request_id.as_bytes())
    }

    /// Set the status (and payment id, when given) of the booking created for
    /// `payment_request_id`. Returns the updated booking, or `None` when no
    /// booking carries that id.
    ///
    /// No check on the prior status: a completed booking can be rewritten.
    pub fn update_booking_status(
        &self,
        payment_request_id: &str,
        status: PaymentStatus,
        payment_id: Option<&str>,
    ) -> StorageResult<Option<Booking>> {
        let updated = self.bookings.update_and_fetch(payment_request_id.as_bytes(), |old| {
            let bytes = old?;
            match serde_json::from_slice::<Booking>(bytes) {
                Ok(mut booking) => {
                    booking.payment_status = status;
                    if let Some(id) = payment_id {
                        booking.payment_id = Some(id.to_string());
                    }
                    booking.updated_at = Utc::now();
                    Some(serde_json::to_vec(&booking).unwrap_or_else(|_| bytes.to_vec()))
                }
                // Leave undecodable documents as they are.
                Err(_) => Some(bytes.to_vec()),
            }
        })?;

        match updated {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All bookings, newest first.
    pub fn list_bookings(&self) -> StorageResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = scan(&self.bookings)?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    /// Bookings matching the email, or else the booking reference; newest first.
    pub fn find_bookings(&self, query: &BookingQuery) -> StorageResult<Vec<Booking>> {
        let bookings = self.list_bookings()?;
        let matches = bookings
            .into_iter()
            .filter(|b| match (&query.email, &query.booking_id) {
                (Some(email), _) => b.guest.email.eq_ignore_ascii_case(email),
                (None, Some(reference)) => &b.booking_id == reference,
                (None, None) => true,
            })
            .collect();
        Ok(matches)
    }

    pub fn stats(&self) -> StorageResult<AdminStats> {
        let mut stats = AdminStats::default();
        for booking in scan::<Booking>(&self.bookings)? {
            stats.total_bookings += 1;
            match booking.payment_status {
                PaymentStatus::Pending => stats.pending_bookings += 1,
                PaymentStatus::Completed => {
                    stats.completed_bookings += 1;
                    stats.total_revenue += booking.amount;
                }
                PaymentStatus::Failed => stats.failed_payments += 1,
            }
        }
        stats.total_hotels = scan::<Hotel>(&self.hotels)?
            .iter()
            .filter(|h| h.is_active)
            .count() as u64;
        Ok(stats)
    }

    // --- Hotels ---

    pub fn create_hotel(&self, input: HotelInput) -> StorageResult<Hotel> {
        let now = Utc::now();
        let hotel = Hotel {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            image_url: input.image_url,
            map_link: input.map_link,
            star_rating: input.star_rating,
            address: input.address,
            distances: input.distances,
            room_types: input.room_types,
            policies: input.policies,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        put(&self.hotels, hotel.id.as_bytes(), &hotel)?;
        Ok(hotel)
    }

    pub fn get_hotel(&self, id: &str) -> StorageResult<Option<Hotel>> {
        get(&self.hotels, id.as_bytes())
    }

    /// Replace a hotel's editable fields, keeping its id and creation time.
    ///
    /// Applied atomically: a hotel deleted concurrently stays deleted.
    pub fn update_hotel(&self, id: &str, input: HotelInput) -> StorageResult<Option<Hotel>> {
        let now = Utc::now();
        let updated = self.hotels.update_and_fetch(id.as_bytes(), |old| {
            let bytes = old?;
            match serde_json::from_slice::<Hotel>(bytes) {
                Ok(existing) => {
                    let hotel = Hotel {
                        id: existing.id,
                        name: input.name.clone(),
                        image_url: input.image_url.clone(),
                        map_link: input.map_link.clone(),
                        star_rating: input.star_rating,
                        address: input.address.clone(),
                        distances: input.distances.clone(),
                        room_types: input.room_types.clone(),
                        policies: input.policies.clone(),
                        is_active: input.is_active.unwrap_or(existing.is_active),
                        created_at: existing.created_at,
                        updated_at: now,
                    };
                    Some(serde_json::to_vec(&hotel).unwrap_or_else(|_| bytes.to_vec()))
                }
                Err(_) => Some(bytes.to_vec()),
            }
        })?;

        match updated {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a hotel was removed.
    pub fn delete_hotel(&self, id: &str) -> StorageResult<bool> {
        Ok(self.hotels.remove(id.as_bytes())?.is_some())
    }

    /// All hotels, newest first.
    pub fn list_hotels(&self) -> StorageResult<Vec<Hotel>> {
        let mut hotels: Vec<Hotel> = scan(&self.hotels)?;
        hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(hotels)
    }

    // --- Admins ---

    /// Insert a new admin; fails if the username is taken.
    pub fn create_admin(&self, admin: &AdminUser) -> StorageResult<()> {
        let bytes = serde_json::to_vec(admin)?;
        self.admins
            .compare_and_swap(admin.username.as_bytes(), None as Option<&[u8]>, Some(bytes))?
            .map_err(|_| StorageError::AlreadyExists(format!("admin '{}'", admin.username)))
    }

    pub fn get_admin(&self, username: &str) -> StorageResult<Option<AdminUser>> {
        get(&self.admins, username.as_bytes())
    }

    // --- Settings ---

    /// The settings blob, or `None` if never saved.
    pub fn get_settings(&self) -> StorageResult<Option<Value>> {
        let doc: Option<Value> = get(&self.settings, SETTINGS_KEY)?;
        Ok(doc.and_then(|mut d| d.get_mut("data").map(Value::take)))
    }

    /// Overwrite the whole settings blob.
    pub fn put_settings(&self, data: Value) -> StorageResult<()> {
        let doc = serde_json::json!({
            "type": "system",
            "data": data,
            "updatedAt": Utc::now(),
        });
        put(&self.settings, SETTINGS_KEY, &doc)
    }

    /// The `emailNotifications` toggle; on unless explicitly disabled.
    pub fn email_notifications_enabled(&self) -> StorageResult<bool> {
        Ok(self
            .get_settings()?
            .and_then(|s| s.get("emailNotifications").and_then(Value::as_bool))
            .unwrap_or(true))
    }

    // --- Inventory ---

    /// Inventory ordered by hotel then room type. An empty collection is
    /// populated with the default counters first, once per database.
    pub fn list_inventory(&self) -> StorageResult<Vec<InventoryItem>> {
        if self.inventory.is_empty() {
            self.seed_default_inventory()?;
        }
        let mut items: Vec<InventoryItem> = scan(&self.inventory)?;
        items.sort_by(|a, b| {
            a.hotel_name
                .cmp(&b.hotel_name)
                .then_with(|| a.room_type.cmp(&b.room_type))
        });
        Ok(items)
    }

    /// Write the default items unless another caller already did. Returns
    /// whether this call seeded.
    fn seed_default_inventory(&self) -> StorageResult<bool> {
        let now = Utc::now();
        let hotel_name = "Hyatt Regency Pune & Residences";
        let defaults = [
            ("Single Occupancy", 50, 30, 15, 5, 100),
            ("Double Occupancy", 40, 25, 12, 3, 150),
        ];
        let mut docs = Vec::with_capacity(defaults.len());
        for (room_type, total, available, booked, maintenance, price) in defaults {
            let item = InventoryItem {
                id: Uuid::new_v4().to_string(),
                hotel_name: hotel_name.to_string(),
                room_type: room_type.to_string(),
                total_rooms: total,
                available_rooms: available,
                booked_rooms: booked,
                maintenance_rooms: maintenance,
                price,
                last_updated: now,
            };
            docs.push((item.id.clone(), serde_json::to_vec(&item)?));
        }

        (&*self.db, &self.inventory)
            .transaction(|(meta, inventory)| -> ConflictableTransactionResult<bool> {
                if meta.get(INVENTORY_SEEDED_KEY)?.is_some() {
                    return Ok(false);
                }
                meta.insert(INVENTORY_SEEDED_KEY, b"1".as_ref())?;
                for (id, bytes) in &docs {
                    inventory.insert(id.as_bytes(), bytes.as_slice())?;
                }
                Ok(true)
            })
            .map_err(|e| match e {
                TransactionError::Storage(e) => StorageError::Sled(e),
                TransactionError::Abort(()) => {
                    StorageError::Sled(sled::Error::Unsupported("inventory seeding aborted".to_string()))
                }
            })
    }

    pub fn adjust_inventory(
        &self,
        id: &str,
        counter: InventoryCounter,
        change: i64,
    ) -> StorageResult<Option<InventoryItem>> {
        let updated = self.inventory.update_and_fetch(id.as_bytes(), |old| {
            let bytes = old?;
            match serde_json::from_slice::<InventoryItem>(bytes) {
                Ok(mut item) => {
                    item.adjust(counter, change);
                    Some(serde_json::to_vec(&item).unwrap_or_else(|_| bytes.to_vec()))
                }
                Err(_) => Some(bytes.to_vec()),
            }
        })?;

        match updated {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec(value)?;
    tree.insert(key, bytes)?;
    Ok(())
}

fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> StorageResult<Option<T>> {
    match tree.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> StorageResult<Vec<T>> {
    let mut docs = vec![];
    for item in tree.iter() {
        let (_, value) = item?;
        docs.push(serde_json::from_slice(&value)?);
    }
    Ok(docs)
}

#[cfg(test)]
pub(crate) fn temp_storage(name: &str) -> (Storage, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!("hotel_booking_{}_{}", name, Uuid::new_v4()));
    let storage = Storage::open(&dir).expect("Failed to open storage");
    (storage, dir)
}
