use crate::config::DarajaConfig;
use crate::core::{phone, AppError, Result};
use crate::modules::daraja::models::{
    DarajaErrorResponse, StkPushRequest, StkPushResponse, StkQueryRequest, StkQueryResponse,
};
use crate::modules::daraja::services::credentials::CredentialCache;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const STK_QUERY_PATH: &str = "/mpesa/stkpushquery/v1/query";
const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Daraja error code meaning the push is still in flight and the query
/// should be retried later.
const PROCESSING_ERROR_CODE: &str = "500.001.1001";

/// Provider accepted the push request; the payer is being prompted.
///
/// `checkout_request_id` is the reconciliation key for the rest of the
/// transaction's life.
#[derive(Debug, Clone)]
pub struct StkPushAcceptance {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub customer_message: String,
}

/// Outcome of a status query, mapped from the provider's response.
///
/// Terminal variants carry the raw response body for the audit trail.
#[derive(Debug, Clone)]
pub enum StkQueryOutcome {
    Completed {
        raw: serde_json::Value,
    },
    Failed {
        result_code: i64,
        result_desc: String,
        raw: serde_json::Value,
    },
    /// The provider has no result yet; poll again later.
    Processing,
}

/// Outbound payment operations against the provider network
#[async_trait]
pub trait StkGateway: Send + Sync {
    /// Submit a push-payment request. Returns the provider correlation ids
    /// on acceptance; a rejection or network failure leaves no local state.
    async fn initiate(
        &self,
        phone: &str,
        amount: Decimal,
        order_ref: &str,
    ) -> Result<StkPushAcceptance>;

    /// Query the current status of a previously accepted push request.
    async fn query_status(&self, checkout_request_id: &str) -> Result<StkQueryOutcome>;
}

/// Daraja (Safaricom) STK push client
pub struct DarajaClient {
    http: Client,
    config: DarajaConfig,
    credentials: Arc<CredentialCache>,
}

impl DarajaClient {
    pub fn new(config: DarajaConfig, credentials: Arc<CredentialCache>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Daraja request timestamp: `YYYYMMDDHHMMSS`
    pub fn timestamp(now: DateTime<Utc>) -> String {
        now.format("%Y%m%d%H%M%S").to_string()
    }

    /// Daraja STK password: `base64(shortcode + passkey + timestamp)`.
    /// A keyed encoding, not a signature, but it must be bit-exact.
    pub fn password(short_code: &str, passkey: &str, timestamp: &str) -> String {
        base64.encode(format!("{}{}{}", short_code, passkey, timestamp))
    }

    /// Daraja accepts whole-unit amounts only; round half away from zero.
    fn wire_amount(amount: Decimal) -> String {
        amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_string()
    }

    fn credentials_for_request(&self, now: DateTime<Utc>) -> (String, String) {
        let timestamp = Self::timestamp(now);
        let password = Self::password(&self.config.short_code, &self.config.passkey, &timestamp);
        (timestamp, password)
    }

    fn rejection(status: reqwest::StatusCode, body: &str) -> AppError {
        match serde_json::from_str::<DarajaErrorResponse>(body) {
            Ok(err) => AppError::ProviderRejected {
                code: err.error_code.unwrap_or_else(|| status.to_string()),
                message: err.error_message.unwrap_or_else(|| body.to_string()),
            },
            Err(_) => AppError::ProviderRejected {
                code: status.to_string(),
                message: body.to_string(),
            },
        }
    }
}

#[async_trait]
impl StkGateway for DarajaClient {
    async fn initiate(
        &self,
        phone: &str,
        amount: Decimal,
        order_ref: &str,
    ) -> Result<StkPushAcceptance> {
        let phone = phone::normalize(phone)?;
        let token = self.credentials.token().await?;
        let (timestamp, password) = self.credentials_for_request(Utc::now());

        let request = StkPushRequest {
            business_short_code: self.config.short_code.clone(),
            password,
            timestamp,
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount: Self::wire_amount(amount),
            party_a: phone.clone(),
            party_b: self.config.short_code.clone(),
            phone_number: phone,
            callback_url: self.config.callback_url.clone(),
            account_reference: format!("Order-{}", order_ref),
            transaction_desc: format!("Payment for order {}", order_ref),
        };

        let url = format!("{}{}", self.config.base_url, STK_PUSH_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = body.as_str(), "STK push rejected");
            return Err(Self::rejection(status, &body));
        }

        let accepted: StkPushResponse = response.json().await?;
        if accepted.response_code != "0" {
            error!(
                response_code = accepted.response_code.as_str(),
                description = accepted.response_description.as_str(),
                "STK push returned non-zero response code"
            );
            return Err(AppError::ProviderRejected {
                code: accepted.response_code,
                message: accepted.response_description,
            });
        }

        info!(
            merchant_request_id = accepted.merchant_request_id.as_str(),
            checkout_request_id = accepted.checkout_request_id.as_str(),
            "STK push accepted"
        );

        Ok(StkPushAcceptance {
            merchant_request_id: accepted.merchant_request_id,
            checkout_request_id: accepted.checkout_request_id,
            customer_message: accepted.customer_message,
        })
    }

    async fn query_status(&self, checkout_request_id: &str) -> Result<StkQueryOutcome> {
        let token = self.credentials.token().await?;
        let (timestamp, password) = self.credentials_for_request(Utc::now());

        let request = StkQueryRequest {
            business_short_code: self.config.short_code.clone(),
            password,
            timestamp,
            checkout_request_id: checkout_request_id.to_string(),
        };

        let url = format!("{}{}", self.config.base_url, STK_QUERY_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // "Transaction is being processed" arrives as an error body.
            if let Ok(err) = serde_json::from_str::<DarajaErrorResponse>(&body) {
                if err.error_code.as_deref() == Some(PROCESSING_ERROR_CODE) {
                    return Ok(StkQueryOutcome::Processing);
                }
            }

            return Err(Self::rejection(status, &body));
        }

        let raw: serde_json::Value = response.json().await?;
        let parsed: StkQueryResponse = serde_json::from_value(raw.clone())?;

        let result_code: i64 = parsed.result_code.parse().map_err(|_| {
            AppError::internal(format!(
                "Unparseable ResultCode in status query response: {}",
                parsed.result_code
            ))
        })?;

        if result_code == 0 {
            Ok(StkQueryOutcome::Completed { raw })
        } else {
            Ok(StkQueryOutcome::Failed {
                result_code,
                result_desc: parsed.result_desc,
                raw,
            })
        }
    }
}
