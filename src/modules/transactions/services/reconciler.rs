use crate::core::Result;
use crate::modules::orders::OrderNotifier;
use crate::modules::transactions::repositories::TransactionStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Reconciliation outcome reported by either the callback endpoint or a
/// status poll.
///
/// The poll path cannot supply a receipt number or confirmed amount; the
/// callback path usually supplies both.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Success {
        receipt_number: Option<String>,
        amount: Option<Decimal>,
    },
    Failure {
        result_code: i64,
        result_desc: String,
    },
}

/// What a reconciliation attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileResult {
    /// The transition applied and the order system was notified.
    Applied,
    /// The transaction was already terminal; duplicate delivery, no-op.
    AlreadyTerminal,
    /// No transaction exists for the key; logged and discarded.
    Unknown,
}

/// Applies callback and poll outcomes to the transaction store and notifies
/// the order system.
///
/// Both delivery paths converge here and may race on the same transaction;
/// the store's conditional transition decides the winner, and the loser
/// observes `AlreadyTerminal`. Order notifications happen only on the
/// applied path, so a transaction produces at most one notification.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn TransactionStore>,
    orders: Arc<dyn OrderNotifier>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn TransactionStore>, orders: Arc<dyn OrderNotifier>) -> Self {
        Self { store, orders }
    }

    pub async fn reconcile(
        &self,
        checkout_request_id: &str,
        outcome: PaymentOutcome,
        raw_payload: serde_json::Value,
    ) -> Result<ReconcileResult> {
        let Some(tx) = self.store.find_by_checkout_id(checkout_request_id).await? else {
            // Not recoverable by retrying; the provider knows keys we never
            // issued only when something upstream went badly wrong.
            warn!(
                checkout_request_id,
                "Reconciliation event for unknown transaction, discarding"
            );
            return Ok(ReconcileResult::Unknown);
        };

        match outcome {
            PaymentOutcome::Success {
                receipt_number,
                amount,
            } => {
                let applied = self
                    .store
                    .complete(checkout_request_id, receipt_number.as_deref(), &raw_payload)
                    .await?;

                if !applied {
                    info!(
                        checkout_request_id,
                        "Duplicate success delivery for terminal transaction, no-op"
                    );
                    return Ok(ReconcileResult::AlreadyTerminal);
                }

                if let Some(confirmed) = amount {
                    if confirmed != tx.amount {
                        warn!(
                            checkout_request_id,
                            submitted = %tx.amount,
                            confirmed = %confirmed,
                            "Confirmed amount differs from submitted amount"
                        );
                    }
                }

                self.orders
                    .mark_paid(&tx.order_ref, receipt_number.as_deref())
                    .await?;

                info!(
                    checkout_request_id,
                    order_ref = tx.order_ref.as_str(),
                    receipt = ?receipt_number,
                    "Payment completed"
                );
                Ok(ReconcileResult::Applied)
            }
            PaymentOutcome::Failure {
                result_code,
                result_desc,
            } => {
                let applied = self
                    .store
                    .fail(checkout_request_id, &result_desc, &raw_payload)
                    .await?;

                if !applied {
                    info!(
                        checkout_request_id,
                        result_code, "Duplicate failure delivery for terminal transaction, no-op"
                    );
                    return Ok(ReconcileResult::AlreadyTerminal);
                }

                self.orders.mark_failed(&tx.order_ref, &result_desc).await?;

                info!(
                    checkout_request_id,
                    order_ref = tx.order_ref.as_str(),
                    result_code,
                    result_desc = result_desc.as_str(),
                    "Payment failed"
                );
                Ok(ReconcileResult::Applied)
            }
        }
    }
}
