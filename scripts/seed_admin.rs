//! Seed script for the hotel booking store
//!
//! Admin accounts are never created over HTTP. This creates one directly in
//! the Sled store and fills the default room inventory when it is empty.
//! Run with the server stopped (Sled holds an exclusive lock):
//!   cargo run --bin seed_admin -- --username admin --password <pw>

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

use hotel_booking::auth::hash_password;
use hotel_booking::models::AdminUser;
use hotel_booking::storage::{Storage, StorageError};

#[derive(Parser)]
#[command(name = "seed_admin")]
#[command(about = "Create an admin account and default inventory")]
struct Args {
    #[arg(short, long, default_value = "admin")]
    username: String,

    #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(short, long, default_value = "superadmin")]
    role: String,

    #[arg(long, env = "DATA_DIR", default_value = "hotel_data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let storage = Storage::open(&args.data_dir)?;

    let now = Utc::now();
    let admin = AdminUser {
        id: Uuid::new_v4().to_string(),
        username: args.username.clone(),
        password_hash: hash_password(&args.password)?,
        role: args.role,
        created_at: now,
        updated_at: now,
    };

    match storage.create_admin(&admin) {
        Ok(()) => println!("Created admin '{}'", args.username),
        Err(StorageError::AlreadyExists(_)) => println!("Admin '{}' already exists, left unchanged", args.username),
        Err(e) => return Err(e.into()),
    }

    let inventory = storage.list_inventory()?;
    println!("Inventory holds {} room types", inventory.len());

    storage.flush().await?;
    Ok(())
}
