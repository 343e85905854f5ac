use crate::core::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Transaction lifecycle state
///
/// `Pending` is the only initial state; `Completed` and `Failed` are
/// terminal and sticky. Transitions out of `Pending` are applied with
/// compare-and-swap semantics in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// Durable record of a submitted payment attempt
///
/// Created only after the provider accepts the push request; a rejected
/// request leaves no record. `checkout_request_id` is unique and is the key
/// every callback and poll result reconciles against. Mutated only by the
/// reconciler, through the store's conditional transitions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    /// Internal id (UUID), assigned on insert
    pub id: Option<String>,

    /// Merchant order reference (correlation to the external order system)
    pub order_ref: String,

    /// Payer phone in canonical 12-digit form
    pub phone: String,

    /// Submitted amount (KES)
    pub amount: Decimal,

    /// Provider's merchant request id
    pub merchant_request_id: String,

    /// Provider's checkout request id (unique reconciliation key)
    pub checkout_request_id: String,

    /// Provider receipt number, populated only on success
    pub receipt_number: Option<String>,

    /// Provider-reported failure description, populated only on failure
    pub failure_reason: Option<String>,

    /// Lifecycle state
    pub status: String,

    /// Raw callback/poll payload, stored for audit
    pub callback_payload: Option<serde_json::Value>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new pending transaction record
    pub fn new(
        order_ref: String,
        phone: String,
        amount: Decimal,
        merchant_request_id: String,
        checkout_request_id: String,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Amount must be greater than zero"));
        }

        if checkout_request_id.trim().is_empty() {
            return Err(AppError::validation(
                "Checkout request id cannot be empty",
            ));
        }

        if order_ref.trim().is_empty() {
            return Err(AppError::validation("Order reference cannot be empty"));
        }

        Ok(Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            order_ref,
            phone,
            amount,
            merchant_request_id,
            checkout_request_id,
            receipt_number: None,
            failure_reason: None,
            status: TransactionStatus::Pending.to_string(),
            callback_payload: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        })
    }

    pub fn get_status(&self) -> Result<TransactionStatus> {
        TransactionStatus::from_str(&self.status)
            .map_err(|e| AppError::internal(format!("Invalid transaction status: {}", e)))
    }

    /// Whether the transaction has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.get_status(),
            Ok(TransactionStatus::Completed) | Ok(TransactionStatus::Failed)
        )
    }
}
