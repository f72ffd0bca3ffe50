//! Process-wide configuration, parsed once at startup.
//!
//! Every field can come from a CLI flag or an environment variable; `main`
//! loads `.env` through dotenvy before parsing so local setups only need a file.

use clap::{Args, Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "hotel_booking")]
#[command(about = "Hotel booking server: public booking flow and admin back office")]
pub struct Config {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Directory holding the Sled document store
    #[arg(long, env = "DATA_DIR", default_value = "hotel_data")]
    pub data_dir: PathBuf,

    /// Public URL of this service, used to build the gateway redirect URL
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:3000")]
    pub public_base_url: String,

    /// Secret used to sign admin tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Timeout applied to every outbound call (gateway, email provider)
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    #[command(flatten)]
    pub gateway: GatewayConfig,

    #[command(flatten)]
    pub email: EmailConfig,

    #[command(flatten)]
    pub property: PropertyProfile,

    #[command(flatten)]
    pub log: LogConfig,
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Where the gateway sends the guest back after payment.
    pub fn payment_redirect_url(&self) -> String {
        format!("{}/booking/success", self.public_base_url.trim_end_matches('/'))
    }

    /// Absolute URL of one of the static result pages.
    pub fn page_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path_and_query)
    }
}

/// Credentials and endpoint of the payment gateway.
#[derive(Args, Debug, Clone)]
pub struct GatewayConfig {
    #[arg(id = "gateway_url", long = "gateway-url", env = "INSTAMOJO_BASE_URL", default_value = "https://www.instamojo.com/api/1.1")]
    pub base_url: String,

    #[arg(long = "gateway-api-key", env = "INSTAMOJO_PRIVATE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(long = "gateway-auth-token", env = "INSTAMOJO_PRIVATE_AUTH_TOKEN", default_value = "", hide_env_values = true)]
    pub auth_token: String,
}

/// Transactional-email provider settings.
#[derive(Args, Debug, Clone)]
pub struct EmailConfig {
    #[arg(id = "email_url", long = "email-url", env = "ZEPTO_URL", default_value = "https://api.zeptomail.in")]
    pub base_url: String,

    #[arg(long = "email-token", env = "ZEPTO_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    #[arg(long = "email-from", env = "ZEPTO_FROM", default_value = "noreply@hyattpune.com")]
    pub from_address: String,
}

/// The property being booked; shown in the payment purpose and the confirmation email.
#[derive(Args, Debug, Clone)]
pub struct PropertyProfile {
    #[arg(long = "property-name", env = "PROPERTY_NAME", default_value = "Hyatt Regency Pune & Residences")]
    pub name: String,

    #[arg(
        long = "property-address",
        env = "PROPERTY_ADDRESS",
        default_value = "Weikfield IT City, Nagar Rd, Ramwadi, Waghere, Pune, Maharashtra 411014"
    )]
    pub address: String,

    #[arg(long = "property-phone", env = "PROPERTY_PHONE", default_value = "+91 20 6645 1234")]
    pub phone: String,
}

#[derive(Args, Debug, Clone)]
pub struct LogConfig {
    /// Fallback filter when RUST_LOG is not set
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info,tower_http=debug")]
    pub level: String,

    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub format: LogFormat,

    /// Write daily-rolling log files here instead of stdout
    #[arg(long = "log-dir", env = "LOG_DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}
