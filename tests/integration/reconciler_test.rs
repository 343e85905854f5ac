#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{pending_transaction, RecordingNotifier};
use pesabridge::transactions::{
    InMemoryTransactionStore, PaymentOutcome, ReconcileResult, Reconciler, TransactionStore,
};
use std::sync::Arc;

const CHECKOUT_ID: &str = "ws_CO_191220191020363925";

fn success_outcome() -> PaymentOutcome {
    PaymentOutcome::Success {
        receipt_number: Some("ABC123".to_string()),
        amount: None,
    }
}

fn failure_outcome() -> PaymentOutcome {
    PaymentOutcome::Failure {
        result_code: 1032,
        result_desc: "Request cancelled by user".to_string(),
    }
}

async fn setup() -> (
    Arc<InMemoryTransactionStore>,
    Arc<RecordingNotifier>,
    Reconciler,
) {
    let store = Arc::new(InMemoryTransactionStore::new());
    let orders = Arc::new(RecordingNotifier::new());
    let reconciler = Reconciler::new(store.clone(), orders.clone());

    store
        .insert(&pending_transaction("ORD-1", CHECKOUT_ID))
        .await
        .unwrap();

    (store, orders, reconciler)
}

#[tokio::test]
async fn test_success_applies_and_notifies_once() {
    let (store, orders, reconciler) = setup().await;
    let raw = serde_json::json!({"ResultCode": 0});

    let result = reconciler
        .reconcile(CHECKOUT_ID, success_outcome(), raw.clone())
        .await
        .unwrap();
    assert_eq!(result, ReconcileResult::Applied);

    let tx = store.find_by_checkout_id(CHECKOUT_ID).await.unwrap().unwrap();
    assert_eq!(tx.status, "completed");
    assert_eq!(tx.receipt_number.as_deref(), Some("ABC123"));
    assert_eq!(tx.callback_payload, Some(raw));

    assert_eq!(orders.paid_count(), 1);
    let paid = orders.paid.lock().unwrap();
    assert_eq!(paid[0], ("ORD-1".to_string(), Some("ABC123".to_string())));
}

#[tokio::test]
async fn test_duplicate_success_is_a_noop() {
    let (_store, orders, reconciler) = setup().await;
    let raw = serde_json::json!({"ResultCode": 0});

    let first = reconciler
        .reconcile(CHECKOUT_ID, success_outcome(), raw.clone())
        .await
        .unwrap();
    let second = reconciler
        .reconcile(CHECKOUT_ID, success_outcome(), raw)
        .await
        .unwrap();

    assert_eq!(first, ReconcileResult::Applied);
    assert_eq!(second, ReconcileResult::AlreadyTerminal);
    assert_eq!(orders.paid_count(), 1);
}

#[tokio::test]
async fn test_terminal_state_is_sticky_against_late_failure() {
    let (store, orders, reconciler) = setup().await;
    let raw = serde_json::json!({"ResultCode": 0});

    reconciler
        .reconcile(CHECKOUT_ID, success_outcome(), raw.clone())
        .await
        .unwrap();

    // Out-of-order failure delivery after completion must not overwrite.
    let late = reconciler
        .reconcile(CHECKOUT_ID, failure_outcome(), raw)
        .await
        .unwrap();
    assert_eq!(late, ReconcileResult::AlreadyTerminal);

    let tx = store.find_by_checkout_id(CHECKOUT_ID).await.unwrap().unwrap();
    assert_eq!(tx.status, "completed");
    assert!(tx.failure_reason.is_none());
    assert_eq!(orders.failed_count(), 0);
}

#[tokio::test]
async fn test_failure_applies_and_notifies_once() {
    let (store, orders, reconciler) = setup().await;
    let raw = serde_json::json!({"ResultCode": 1032});

    let result = reconciler
        .reconcile(CHECKOUT_ID, failure_outcome(), raw)
        .await
        .unwrap();
    assert_eq!(result, ReconcileResult::Applied);

    let tx = store.find_by_checkout_id(CHECKOUT_ID).await.unwrap().unwrap();
    assert_eq!(tx.status, "failed");
    assert_eq!(
        tx.failure_reason.as_deref(),
        Some("Request cancelled by user")
    );

    assert_eq!(orders.failed_count(), 1);
    assert_eq!(orders.paid_count(), 0);
}

#[tokio::test]
async fn test_unknown_key_is_discarded() {
    let (_store, orders, reconciler) = setup().await;

    let result = reconciler
        .reconcile("ws_CO_unknown", success_outcome(), serde_json::json!({}))
        .await
        .unwrap();

    assert_eq!(result, ReconcileResult::Unknown);
    assert_eq!(orders.paid_count(), 0);
    assert_eq!(orders.failed_count(), 0);
}
