use crate::config::OrdersConfig;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Interface to the merchant's order-management system.
///
/// Every call must be safe to repeat for the same order: the reconciler
/// notifies at most once per applied transition, but a crash between the
/// transition and the notification can lead to a repeat on a later
/// delivery.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn mark_paid(&self, order_ref: &str, receipt_number: Option<&str>) -> Result<()>;
    async fn mark_failed(&self, order_ref: &str, reason: &str) -> Result<()>;
    async fn mark_awaiting_payment(&self, order_ref: &str) -> Result<()>;
}

/// Notifies the order system over HTTP.
///
/// Posts a payment-status document to
/// `{base_url}/orders/{order_ref}/payment-status`; the receiving side is
/// expected to treat repeated statuses as no-ops.
pub struct HttpOrderNotifier {
    http: Client,
    base_url: String,
}

impl HttpOrderNotifier {
    pub fn new(config: OrdersConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_status(&self, order_ref: &str, body: serde_json::Value) -> Result<()> {
        let url = format!("{}/orders/{}/payment-status", self.base_url, order_ref);
        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::internal(format!(
                "Order system returned {} for {}",
                status, order_ref
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for HttpOrderNotifier {
    async fn mark_paid(&self, order_ref: &str, receipt_number: Option<&str>) -> Result<()> {
        info!(order_ref, receipt = ?receipt_number, "Marking order paid");
        self.post_status(
            order_ref,
            serde_json::json!({
                "status": "paid",
                "receipt_number": receipt_number,
            }),
        )
        .await
    }

    async fn mark_failed(&self, order_ref: &str, reason: &str) -> Result<()> {
        info!(order_ref, reason, "Marking order failed");
        self.post_status(
            order_ref,
            serde_json::json!({
                "status": "failed",
                "reason": reason,
            }),
        )
        .await
    }

    async fn mark_awaiting_payment(&self, order_ref: &str) -> Result<()> {
        info!(order_ref, "Marking order awaiting payment");
        self.post_status(
            order_ref,
            serde_json::json!({
                "status": "awaiting_payment",
            }),
        )
        .await
    }
}
