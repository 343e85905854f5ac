use crate::core::{AppError, Result};
use crate::modules::transactions::models::{Transaction, TransactionStatus};
use crate::modules::transactions::repositories::TransactionStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory transaction store with the same conditional-transition
/// semantics as the MySQL store. Backs the integration tests and local
/// development without a database.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: Mutex<HashMap<String, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Transaction>>> {
        self.records
            .lock()
            .map_err(|_| AppError::internal("Transaction store mutex poisoned"))
    }

    fn transition(
        &self,
        checkout_request_id: &str,
        apply: impl FnOnce(&mut Transaction),
    ) -> Result<bool> {
        let mut records = self.lock()?;

        let Some(tx) = records.get_mut(checkout_request_id) else {
            return Ok(false);
        };

        if tx.get_status()? != TransactionStatus::Pending {
            return Ok(false);
        }

        apply(tx);
        tx.updated_at = Some(Utc::now());
        Ok(true)
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: &Transaction) -> Result<()> {
        let mut records = self.lock()?;

        if records.contains_key(&tx.checkout_request_id) {
            return Err(AppError::DuplicateKey(tx.checkout_request_id.clone()));
        }

        records.insert(tx.checkout_request_id.clone(), tx.clone());
        Ok(())
    }

    async fn find_by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<Transaction>> {
        Ok(self.lock()?.get(checkout_request_id).cloned())
    }

    async fn complete(
        &self,
        checkout_request_id: &str,
        receipt_number: Option<&str>,
        raw_payload: &serde_json::Value,
    ) -> Result<bool> {
        self.transition(checkout_request_id, |tx| {
            tx.status = TransactionStatus::Completed.to_string();
            tx.receipt_number = receipt_number.map(String::from);
            tx.callback_payload = Some(raw_payload.clone());
        })
    }

    async fn fail(
        &self,
        checkout_request_id: &str,
        reason: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<bool> {
        self.transition(checkout_request_id, |tx| {
            tx.status = TransactionStatus::Failed.to_string();
            tx.failure_reason = Some(reason.to_string());
            tx.callback_payload = Some(raw_payload.clone());
        })
    }
}
