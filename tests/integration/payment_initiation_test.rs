#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{RecordingNotifier, ScriptedGateway};
use pesabridge::config::PollerConfig;
use pesabridge::core::AppError;
use pesabridge::transactions::{
    InMemoryTransactionStore, PaymentService, Reconciler, StatusPoller, TransactionStore,
};
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const CHECKOUT_ID: &str = "ws_CO_191220191020363925";

struct Harness {
    store: Arc<InMemoryTransactionStore>,
    orders: Arc<RecordingNotifier>,
    gateway: Arc<ScriptedGateway>,
    service: PaymentService,
}

fn harness(gateway: ScriptedGateway) -> Harness {
    let store = Arc::new(InMemoryTransactionStore::new());
    let orders = Arc::new(RecordingNotifier::new());
    let gateway = Arc::new(gateway);
    let reconciler = Reconciler::new(store.clone(), orders.clone());
    // One-attempt, zero-delay poller so spawned tasks exit quickly.
    let poller = StatusPoller::new(
        gateway.clone(),
        store.clone(),
        reconciler,
        PollerConfig {
            initial_delay_secs: 0,
            interval_secs: 0,
            max_attempts: 1,
        },
    );
    let service = PaymentService::new(gateway.clone(), store.clone(), orders.clone(), poller);

    Harness {
        store,
        orders,
        gateway,
        service,
    }
}

#[tokio::test]
async fn test_accepted_push_records_pending_transaction() {
    let h = harness(ScriptedGateway::accepting());

    let result = h
        .service
        .initiate("0722123456", dec!(150.50), "ORD-42")
        .await
        .unwrap();

    assert_eq!(result.checkout_request_id, CHECKOUT_ID);
    assert_eq!(result.merchant_request_id, "29115-34620561-1");

    let tx = h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
    assert_eq!(tx.order_ref, "ORD-42");
    assert_eq!(tx.phone, "254722123456");
    assert_eq!(tx.amount, dec!(150.50));

    assert_eq!(h.orders.awaiting_count(), 1);
}

#[tokio::test]
async fn test_rejected_push_leaves_no_record() {
    let h = harness(ScriptedGateway::rejecting());

    let err = h
        .service
        .initiate("0722123456", dec!(100), "ORD-42")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProviderRejected { .. }));

    assert!(h
        .store
        .find_by_checkout_id(CHECKOUT_ID)
        .await
        .unwrap()
        .is_none());
    assert_eq!(h.orders.awaiting_count(), 0);
}

#[tokio::test]
async fn test_invalid_phone_rejected_before_provider_call() {
    let h = harness(ScriptedGateway::accepting());

    let err = h
        .service
        .initiate("12345", dec!(100), "ORD-42")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(h.gateway.initiate_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let h = harness(ScriptedGateway::accepting());

    for amount in [dec!(0), dec!(-5)] {
        let err = h
            .service
            .initiate("0722123456", amount, "ORD-42")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    assert_eq!(h.gateway.initiate_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_status_read_after_initiation() {
    let h = harness(ScriptedGateway::accepting());

    h.service
        .initiate("0722123456", dec!(100), "ORD-42")
        .await
        .unwrap();

    let tx = h.service.get(CHECKOUT_ID).await.unwrap();
    assert_eq!(tx.status, "pending");

    let err = h.service.get("ws_CO_missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
