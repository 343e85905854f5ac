use crate::core::{phone, AppError, Result};
use crate::modules::daraja::StkGateway;
use crate::modules::orders::OrderNotifier;
use crate::modules::transactions::models::Transaction;
use crate::modules::transactions::repositories::TransactionStore;
use crate::modules::transactions::services::status_poller::StatusPoller;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful payment initiation, returned to the caller as the
/// correlation handle for later status reads.
#[derive(Debug, Clone, Serialize)]
pub struct InitiationResult {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub customer_message: String,
}

/// Orchestrates payment initiation.
///
/// Flow: normalize the phone, submit the push, insert the `Pending` record
/// keyed by the checkout request id, tell the order system the payment is
/// awaited, and start the fallback poller. A provider rejection or network
/// failure before acceptance leaves no record at all.
#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn StkGateway>,
    store: Arc<dyn TransactionStore>,
    orders: Arc<dyn OrderNotifier>,
    poller: StatusPoller,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn StkGateway>,
        store: Arc<dyn TransactionStore>,
        orders: Arc<dyn OrderNotifier>,
        poller: StatusPoller,
    ) -> Self {
        Self {
            gateway,
            store,
            orders,
            poller,
        }
    }

    pub async fn initiate(
        &self,
        phone_raw: &str,
        amount: Decimal,
        order_ref: &str,
    ) -> Result<InitiationResult> {
        let phone = phone::normalize(phone_raw)?;

        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Amount must be greater than zero"));
        }

        info!(
            order_ref,
            phone = phone.as_str(),
            amount = %amount,
            "Initiating STK push"
        );

        let acceptance = self.gateway.initiate(&phone, amount, order_ref).await?;

        let tx = Transaction::new(
            order_ref.to_string(),
            phone,
            amount,
            acceptance.merchant_request_id.clone(),
            acceptance.checkout_request_id.clone(),
        )?;

        // A collision here means the provider handed out a checkout request
        // id we already hold, which is a fatal integrity error.
        self.store.insert(&tx).await?;

        // The payment is now in flight regardless of whether this call
        // lands; reconciliation owns the outcome from here on.
        if let Err(e) = self.orders.mark_awaiting_payment(order_ref).await {
            warn!(
                order_ref,
                error = %e,
                "Failed to mark order awaiting payment"
            );
        }

        // The polling task detaches; reconciliation does not depend on this
        // handle staying alive.
        let _ = self.poller.spawn(acceptance.checkout_request_id.clone());

        Ok(InitiationResult {
            merchant_request_id: acceptance.merchant_request_id,
            checkout_request_id: acceptance.checkout_request_id,
            customer_message: acceptance.customer_message,
        })
    }

    /// Status read for UI polling.
    pub async fn get(&self, checkout_request_id: &str) -> Result<Transaction> {
        self.store
            .find_by_checkout_id(checkout_request_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Transaction {} not found", checkout_request_id))
            })
    }
}
