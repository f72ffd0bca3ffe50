use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

const TOKEN_FILE: &str = ".hotel_admin_token";

#[derive(Parser)]
#[command(name = "booking-cli")]
#[command(about = "Admin CLI for the hotel booking service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, env = "BOOKING_API_URL", default_value = "http://localhost:3000")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    Stats,
    Hotels,
    Hotel {
        #[arg(short, long)]
        id: String,
    },
    /// Create a hotel from a JSON file
    CreateHotel {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a hotel from a JSON file
    UpdateHotel {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    DeleteHotel {
        #[arg(short, long)]
        id: String,
    },
    Bookings,
    Payments,
    Inventory,
    AdjustInventory {
        #[arg(short, long)]
        id: String,
        /// totalRooms, availableRooms, bookedRooms or maintenanceRooms
        #[arg(short, long)]
        field: String,
        #[arg(short, long, allow_negative_numbers = true)]
        change: i64,
    },
    Settings,
    /// Overwrite the settings document from a JSON file
    PutSettings {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Public booking lookup by guest email or booking reference
    Lookup {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        booking_id: Option<String>,
    },
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn authed(builder: RequestBuilder) -> RequestBuilder {
    let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
    builder.header("Authorization", format!("Bearer {}", token.trim()))
}

fn read_json(path: &PathBuf) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let admin = format!("{}/api/admin", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{admin}/login"))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in. Token saved to {TOKEN_FILE}");
            } else {
                println!("Login failed: {}", res.text().await?);
            }
            return Ok(());
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
            return Ok(());
        }
        Commands::Stats => authed(client.get(format!("{admin}/stats"))).send().await?,
        Commands::Hotels => authed(client.get(format!("{admin}/hotels"))).send().await?,
        Commands::Hotel { id } => authed(client.get(format!("{admin}/hotels/{id}"))).send().await?,
        Commands::CreateHotel { file } => {
            let body = read_json(&file)?;
            authed(client.post(format!("{admin}/hotels"))).json(&body).send().await?
        }
        Commands::UpdateHotel { id, file } => {
            let body = read_json(&file)?;
            authed(client.put(format!("{admin}/hotels/{id}"))).json(&body).send().await?
        }
        Commands::DeleteHotel { id } => authed(client.delete(format!("{admin}/hotels/{id}"))).send().await?,
        Commands::Bookings => authed(client.get(format!("{admin}/bookings"))).send().await?,
        Commands::Payments => authed(client.get(format!("{admin}/payments"))).send().await?,
        Commands::Inventory => authed(client.get(format!("{admin}/inventory"))).send().await?,
        Commands::AdjustInventory { id, field, change } => {
            authed(client.patch(format!("{admin}/inventory/{id}")))
                .json(&json!({ "field": field, "change": change }))
                .send()
                .await?
        }
        Commands::Settings => authed(client.get(format!("{admin}/settings"))).send().await?,
        Commands::PutSettings { file } => {
            let body = read_json(&file)?;
            authed(client.put(format!("{admin}/settings"))).json(&body).send().await?
        }
        Commands::Lookup { email, booking_id } => {
            let mut query = Vec::new();
            if let Some(email) = email {
                query.push(("email", email));
            }
            if let Some(booking_id) = booking_id {
                query.push(("bookingId", booking_id));
            }
            client
                .get(format!("{}/api/bookings", cli.url.trim_end_matches('/')))
                .query(&query)
                .send()
                .await?
        }
    };

    println!("Response ({}): {}", res.status(), res.text().await?);
    Ok(())
}
