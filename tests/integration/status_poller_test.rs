#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{pending_transaction, RecordingNotifier, ScriptedGateway};
use pesabridge::config::PollerConfig;
use pesabridge::core::AppError;
use pesabridge::daraja::StkQueryOutcome;
use pesabridge::transactions::{
    InMemoryTransactionStore, PaymentOutcome, Reconciler, StatusPoller, TransactionStore,
};
use serde_json::json;
use std::sync::Arc;

const CHECKOUT_ID: &str = "ws_CO_191220191020363925";

// Zero delays keep the schedule logic intact while the tests run instantly.
fn fast_schedule(max_attempts: u32) -> PollerConfig {
    PollerConfig {
        initial_delay_secs: 0,
        interval_secs: 0,
        max_attempts,
    }
}

struct Harness {
    store: Arc<InMemoryTransactionStore>,
    orders: Arc<RecordingNotifier>,
    gateway: Arc<ScriptedGateway>,
    poller: StatusPoller,
}

async fn harness(gateway: ScriptedGateway, max_attempts: u32) -> Harness {
    let store = Arc::new(InMemoryTransactionStore::new());
    let orders = Arc::new(RecordingNotifier::new());
    let gateway = Arc::new(gateway);
    let reconciler = Reconciler::new(store.clone(), orders.clone());
    let poller = StatusPoller::new(
        gateway.clone(),
        store.clone(),
        reconciler,
        fast_schedule(max_attempts),
    );

    store
        .insert(&pending_transaction("ORD-1", CHECKOUT_ID))
        .await
        .unwrap();

    Harness {
        store,
        orders,
        gateway,
        poller,
    }
}

#[tokio::test]
async fn test_poll_completes_after_processing() {
    let gateway = ScriptedGateway::with_queries(vec![
        Ok(StkQueryOutcome::Processing),
        Ok(StkQueryOutcome::Processing),
        Ok(StkQueryOutcome::Completed {
            raw: json!({"ResultCode": "0"}),
        }),
    ]);
    let h = harness(gateway, 5).await;

    h.poller.spawn(CHECKOUT_ID.to_string()).await.unwrap();

    let tx = h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "completed");
    // The query path carries no receipt number.
    assert!(tx.receipt_number.is_none());

    assert_eq!(h.gateway.queries_issued(), 3);
    assert_eq!(h.orders.paid_count(), 1);
}

#[tokio::test]
async fn test_poll_fails_transaction_on_declined_outcome() {
    let gateway = ScriptedGateway::with_queries(vec![Ok(StkQueryOutcome::Failed {
        result_code: 1032,
        result_desc: "Request cancelled by user".to_string(),
        raw: json!({"ResultCode": "1032"}),
    })]);
    let h = harness(gateway, 5).await;

    h.poller.spawn(CHECKOUT_ID.to_string()).await.unwrap();

    let tx = h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "failed");
    assert_eq!(h.orders.failed_count(), 1);
    assert_eq!(h.gateway.queries_issued(), 1);
}

#[tokio::test]
async fn test_poll_stops_without_querying_when_already_reconciled() {
    let h = harness(ScriptedGateway::accepting(), 5).await;

    // Callback arrives before the first poll tick.
    let reconciler = Reconciler::new(h.store.clone(), h.orders.clone());
    reconciler
        .reconcile(
            CHECKOUT_ID,
            PaymentOutcome::Success {
                receipt_number: Some("NLJ7RT61SV".to_string()),
                amount: None,
            },
            json!({"ResultCode": 0}),
        )
        .await
        .unwrap();

    h.poller.spawn(CHECKOUT_ID.to_string()).await.unwrap();

    assert_eq!(h.gateway.queries_issued(), 0);
    assert_eq!(h.orders.paid_count(), 1);
}

#[tokio::test]
async fn test_exhausted_budget_leaves_transaction_pending() {
    // The default script answers every query with Processing.
    let h = harness(ScriptedGateway::accepting(), 4).await;

    h.poller.spawn(CHECKOUT_ID.to_string()).await.unwrap();

    let tx = h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
    assert_eq!(h.gateway.queries_issued(), 4);
    assert_eq!(h.orders.paid_count(), 0);
    assert_eq!(h.orders.failed_count(), 0);
}

#[tokio::test]
async fn test_transient_query_error_is_retried() {
    let gateway = ScriptedGateway::with_queries(vec![
        Err(AppError::auth("Token endpoint returned 503")),
        Ok(StkQueryOutcome::Completed {
            raw: json!({"ResultCode": "0"}),
        }),
    ]);
    let h = harness(gateway, 5).await;

    h.poller.spawn(CHECKOUT_ID.to_string()).await.unwrap();

    let tx = h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "completed");
    assert_eq!(h.gateway.queries_issued(), 2);
}

#[tokio::test]
async fn test_missing_record_stops_polling() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let orders = Arc::new(RecordingNotifier::new());
    let gateway = Arc::new(ScriptedGateway::accepting());
    let reconciler = Reconciler::new(store.clone(), orders.clone());
    let poller = StatusPoller::new(gateway.clone(), store, reconciler, fast_schedule(5));

    poller.spawn("ws_CO_never_recorded".to_string()).await.unwrap();

    assert_eq!(gateway.queries_issued(), 0);
}
