use crate::modules::daraja::models::CallbackEnvelope;
use crate::modules::transactions::services::{PaymentOutcome, Reconciler};
use actix_web::{post, web, HttpResponse};
use tracing::{error, info, warn};

/// Inbound Daraja callback endpoint.
///
/// The provider does not interpret our application-level result, so every
/// request is acknowledged with the provider-shaped success body — malformed
/// payloads and internal failures included. Acknowledging keeps provider-side
/// retries from piling up; the reconciler's idempotency guard makes genuine
/// retries safe either way.
pub struct CallbackController;

impl CallbackController {
    pub fn configure(cfg: &mut web::ServiceConfig, reconciler: Reconciler) {
        cfg.service(
            web::scope("/callbacks")
                .app_data(web::Data::new(reconciler))
                .service(stk_callback),
        );
    }
}

fn ack() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "ResultCode": 0,
        "ResultDesc": "Success"
    }))
}

/// POST /callbacks/stk
#[post("/stk")]
async fn stk_callback(reconciler: web::Data<Reconciler>, body: web::Bytes) -> HttpResponse {
    let raw: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Malformed callback body, acknowledging");
            return ack();
        }
    };

    let envelope: CallbackEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Unrecognized callback envelope, acknowledging");
            return ack();
        }
    };

    let callback = envelope.body.stk_callback;

    info!(
        checkout_request_id = callback.checkout_request_id.as_str(),
        result_code = callback.result_code,
        "Received STK callback"
    );

    let outcome = if callback.result_code == 0 {
        PaymentOutcome::Success {
            receipt_number: callback.receipt_number(),
            amount: callback.amount(),
        }
    } else {
        PaymentOutcome::Failure {
            result_code: callback.result_code,
            result_desc: callback.result_desc.clone(),
        }
    };

    if let Err(e) = reconciler
        .reconcile(&callback.checkout_request_id, outcome, raw)
        .await
    {
        error!(
            checkout_request_id = callback.checkout_request_id.as_str(),
            error = %e,
            "Callback reconciliation failed"
        );
    }

    ack()
}
