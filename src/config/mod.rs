use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
///
/// Built once at startup from the environment and injected into the
/// services that need it. Nothing reads configuration from process-wide
/// state after this point.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub daraja: DarajaConfig,
    pub orders: OrdersConfig,
    pub poller: PollerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Safaricom Daraja API credentials and endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DarajaConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub short_code: String,
    pub passkey: String,
    pub base_url: String,
    /// Publicly reachable URL of this service's STK callback endpoint
    pub callback_url: String,
}

/// Order-management system endpoint (external collaborator)
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    pub base_url: String,
}

/// Status poller schedule: first check after `initial_delay_secs`, then
/// every `interval_secs`, at most `max_attempts` times.
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    pub initial_delay_secs: u64,
    pub interval_secs: u64,
    pub max_attempts: u32,
}

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let sandbox = env::var("DARAJA_SANDBOX")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(true);

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            daraja: DarajaConfig {
                consumer_key: env::var("DARAJA_CONSUMER_KEY").map_err(|_| {
                    AppError::Configuration("DARAJA_CONSUMER_KEY not set".to_string())
                })?,
                consumer_secret: env::var("DARAJA_CONSUMER_SECRET").map_err(|_| {
                    AppError::Configuration("DARAJA_CONSUMER_SECRET not set".to_string())
                })?,
                short_code: env::var("DARAJA_SHORT_CODE").map_err(|_| {
                    AppError::Configuration("DARAJA_SHORT_CODE not set".to_string())
                })?,
                passkey: env::var("DARAJA_PASSKEY")
                    .map_err(|_| AppError::Configuration("DARAJA_PASSKEY not set".to_string()))?,
                base_url: env::var("DARAJA_BASE_URL").unwrap_or_else(|_| {
                    if sandbox {
                        SANDBOX_BASE_URL.to_string()
                    } else {
                        PRODUCTION_BASE_URL.to_string()
                    }
                }),
                callback_url: env::var("DARAJA_CALLBACK_URL").map_err(|_| {
                    AppError::Configuration("DARAJA_CALLBACK_URL not set".to_string())
                })?,
            },
            orders: OrdersConfig {
                base_url: env::var("ORDERS_BASE_URL").map_err(|_| {
                    AppError::Configuration("ORDERS_BASE_URL not set".to_string())
                })?,
            },
            poller: PollerConfig {
                initial_delay_secs: env::var("POLLER_INITIAL_DELAY_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid POLLER_INITIAL_DELAY_SECS".to_string())
                    })?,
                interval_secs: env::var("POLLER_INTERVAL_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid POLLER_INTERVAL_SECS".to_string())
                    })?,
                max_attempts: env::var("POLLER_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid POLLER_MAX_ATTEMPTS".to_string())
                    })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.daraja.short_code.trim().is_empty() {
            return Err(AppError::Configuration(
                "Daraja short code cannot be empty".to_string(),
            ));
        }

        if !self.daraja.callback_url.starts_with("http") {
            return Err(AppError::Configuration(
                "Daraja callback URL must be an absolute URL".to_string(),
            ));
        }

        if self.poller.interval_secs == 0 {
            return Err(AppError::Configuration(
                "Poller interval must be greater than 0".to_string(),
            ));
        }

        if self.poller.max_attempts == 0 {
            return Err(AppError::Configuration(
                "Poller attempt budget must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
