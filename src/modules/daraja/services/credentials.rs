use crate::config::DarajaConfig;
use crate::core::{AppError, Result};
use crate::modules::daraja::models::AuthResponse;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Margin subtracted from the provider-reported lifetime so a cached token
/// is never used close to its expiry (tokens live ~60 minutes; the cache
/// keeps them for ~55).
const TOKEN_SAFETY_MARGIN_SECS: i64 = 300;

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";

/// Ephemeral Daraja access credential. Replaced wholesale on refresh, never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Performs the client-credentials exchange against the token endpoint.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self) -> Result<AccessToken>;
}

/// Basic-auth client-credentials exchange against the Daraja OAuth endpoint
pub struct DarajaTokenExchanger {
    http: Client,
    config: DarajaConfig,
}

impl DarajaTokenExchanger {
    pub fn new(config: DarajaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl TokenExchanger for DarajaTokenExchanger {
    async fn exchange(&self) -> Result<AccessToken> {
        debug!("Requesting new Daraja access token");

        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::auth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AppError::auth(format!("Invalid token response: {}", e)))?;

        let lifetime_secs: i64 = auth.expires_in.parse().unwrap_or(3600);
        let expires_at =
            Utc::now() + ChronoDuration::seconds((lifetime_secs - TOKEN_SAFETY_MARGIN_SECS).max(0));

        info!(expires_at = %expires_at, "Daraja access token obtained");
        Ok(AccessToken {
            token: auth.access_token,
            expires_at,
        })
    }
}

/// Cache around a [`TokenExchanger`].
///
/// The cache slot lock is held across the exchange, so concurrent callers
/// racing on a cold or expired cache wait for the single in-flight refresh
/// instead of issuing duplicate exchanges. Failed exchanges are never
/// cached.
pub struct CredentialCache {
    exchanger: Arc<dyn TokenExchanger>,
    cached: Mutex<Option<AccessToken>>,
}

impl CredentialCache {
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            exchanger,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached token, refreshing it first if missing or expired.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchanger.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
