use crate::core::{AppError, Result};
use crate::modules::transactions::models::{Transaction, TransactionStatus};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Durable store of payment transaction records.
///
/// The store is the single owner of transaction state and the only
/// serialization point between the callback endpoint and the status
/// pollers. `complete` and `fail` apply only while the stored status is
/// still `pending` and report whether the transition was applied; a
/// `false` return is the idempotency no-op for duplicate or out-of-order
/// deliveries, not an error.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new pending transaction. Fails with `DuplicateKey` if the
    /// checkout request id already exists.
    async fn insert(&self, tx: &Transaction) -> Result<()>;

    async fn find_by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<Transaction>>;

    /// Conditionally transition `pending → completed`, recording the receipt
    /// number and the raw payload. Returns whether the transition applied.
    async fn complete(
        &self,
        checkout_request_id: &str,
        receipt_number: Option<&str>,
        raw_payload: &serde_json::Value,
    ) -> Result<bool>;

    /// Conditionally transition `pending → failed`, recording the reason and
    /// the raw payload. Returns whether the transition applied.
    async fn fail(
        &self,
        checkout_request_id: &str,
        reason: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<bool>;
}

/// MySQL-backed transaction store
///
/// Transitions are single conditional UPDATEs (`WHERE status = 'pending'`),
/// so no lock is held across any I/O and concurrent deliveries for the same
/// transaction cannot double-apply.
pub struct MySqlTransactionStore {
    pool: MySqlPool,
}

impl MySqlTransactionStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for MySqlTransactionStore {
    async fn insert(&self, tx: &Transaction) -> Result<()> {
        let id = tx
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Transaction id is required for insert"))?;

        sqlx::query(
            r#"
            INSERT INTO mpesa_transactions (
                id, order_ref, phone, amount,
                merchant_request_id, checkout_request_id, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&tx.order_ref)
        .bind(&tx.phone)
        .bind(tx.amount)
        .bind(&tx.merchant_request_id)
        .bind(&tx.checkout_request_id)
        .bind(&tx.status)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateKey(tx.checkout_request_id.clone())
            }
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, order_ref, phone, amount,
                merchant_request_id, checkout_request_id,
                receipt_number, failure_reason, status, callback_payload,
                created_at, updated_at
            FROM mpesa_transactions
            WHERE checkout_request_id = ?
            "#,
        )
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn complete(
        &self,
        checkout_request_id: &str,
        receipt_number: Option<&str>,
        raw_payload: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mpesa_transactions
            SET status = ?, receipt_number = ?, callback_payload = ?, updated_at = NOW()
            WHERE checkout_request_id = ? AND status = ?
            "#,
        )
        .bind(TransactionStatus::Completed.to_string())
        .bind(receipt_number)
        .bind(raw_payload)
        .bind(checkout_request_id)
        .bind(TransactionStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail(
        &self,
        checkout_request_id: &str,
        reason: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mpesa_transactions
            SET status = ?, failure_reason = ?, callback_payload = ?, updated_at = NOW()
            WHERE checkout_request_id = ? AND status = ?
            "#,
        )
        .bind(TransactionStatus::Failed.to_string())
        .bind(reason)
        .bind(raw_payload)
        .bind(checkout_request_id)
        .bind(TransactionStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
