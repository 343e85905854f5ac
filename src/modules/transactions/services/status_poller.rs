use crate::config::PollerConfig;
use crate::modules::daraja::{StkGateway, StkQueryOutcome};
use crate::modules::transactions::repositories::TransactionStore;
use crate::modules::transactions::services::reconciler::{PaymentOutcome, Reconciler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Active fallback for transactions whose callback never arrives.
///
/// One polling task runs per initiated transaction: first check after the
/// initial delay, then at a fixed interval, up to the attempt budget. Each
/// tick checks the stored status first, so a transaction already reconciled
/// by callback stops the task without touching the provider. An exhausted
/// budget leaves the transaction `Pending` — the outcome is unknown, not
/// failed, and a late callback can still complete it.
#[derive(Clone)]
pub struct StatusPoller {
    gateway: Arc<dyn StkGateway>,
    store: Arc<dyn TransactionStore>,
    reconciler: Reconciler,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(
        gateway: Arc<dyn StkGateway>,
        store: Arc<dyn TransactionStore>,
        reconciler: Reconciler,
        config: PollerConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            reconciler,
            config,
        }
    }

    /// Spawn the polling task for a newly initiated transaction. The task
    /// owns its own schedule and outlives the initiating request.
    pub fn spawn(&self, checkout_request_id: String) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            poller.run(checkout_request_id).await;
        })
    }

    async fn run(self, checkout_request_id: String) {
        sleep(Duration::from_secs(self.config.initial_delay_secs)).await;

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                sleep(Duration::from_secs(self.config.interval_secs)).await;
            }

            match self.store.find_by_checkout_id(&checkout_request_id).await {
                Ok(Some(tx)) if tx.is_terminal() => {
                    debug!(
                        checkout_request_id = checkout_request_id.as_str(),
                        "Transaction already reconciled, stopping poll"
                    );
                    return;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(
                        checkout_request_id = checkout_request_id.as_str(),
                        "Transaction record missing, stopping poll"
                    );
                    return;
                }
                Err(e) => {
                    warn!(
                        checkout_request_id = checkout_request_id.as_str(),
                        attempt,
                        error = %e,
                        "Status check failed, will retry"
                    );
                    continue;
                }
            }

            match self.gateway.query_status(&checkout_request_id).await {
                Ok(StkQueryOutcome::Completed { raw }) => {
                    self.reconcile(
                        &checkout_request_id,
                        PaymentOutcome::Success {
                            receipt_number: None,
                            amount: None,
                        },
                        raw,
                    )
                    .await;
                    return;
                }
                Ok(StkQueryOutcome::Failed {
                    result_code,
                    result_desc,
                    raw,
                }) => {
                    self.reconcile(
                        &checkout_request_id,
                        PaymentOutcome::Failure {
                            result_code,
                            result_desc,
                        },
                        raw,
                    )
                    .await;
                    return;
                }
                Ok(StkQueryOutcome::Processing) => {
                    debug!(
                        checkout_request_id = checkout_request_id.as_str(),
                        attempt, "Provider still processing"
                    );
                }
                Err(e) => {
                    // Transient failures are retried within the budget.
                    warn!(
                        checkout_request_id = checkout_request_id.as_str(),
                        attempt,
                        error = %e,
                        "Status query failed, will retry"
                    );
                }
            }
        }

        info!(
            checkout_request_id = checkout_request_id.as_str(),
            attempts = self.config.max_attempts,
            "Poll budget exhausted, leaving transaction pending"
        );
    }

    async fn reconcile(
        &self,
        checkout_request_id: &str,
        outcome: PaymentOutcome,
        raw: serde_json::Value,
    ) {
        if let Err(e) = self
            .reconciler
            .reconcile(checkout_request_id, outcome, raw)
            .await
        {
            error!(
                checkout_request_id,
                error = %e,
                "Poll reconciliation failed"
            );
        }
    }
}
