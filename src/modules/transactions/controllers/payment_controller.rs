use crate::core::Result;
use crate::modules::transactions::models::Transaction;
use crate::modules::transactions::services::PaymentService;
use actix_web::{get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment initiation and status endpoints
pub struct PaymentController;

impl PaymentController {
    pub fn configure(cfg: &mut web::ServiceConfig, service: PaymentService) {
        cfg.service(
            web::scope("/payments")
                .app_data(web::Data::new(service))
                .service(initiate_payment)
                .service(get_payment),
        );
    }
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub phone: String,
    pub amount: Decimal,
    pub order_ref: String,
}

/// Status view for UI polling; the raw audit payload stays internal.
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub checkout_request_id: String,
    pub order_ref: String,
    pub status: String,
    pub amount: Decimal,
    pub receipt_number: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Transaction> for PaymentStatusResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            checkout_request_id: tx.checkout_request_id,
            order_ref: tx.order_ref,
            status: tx.status,
            amount: tx.amount,
            receipt_number: tx.receipt_number,
            failure_reason: tx.failure_reason,
            created_at: tx.created_at,
        }
    }
}

/// POST /payments
///
/// Submits the push request and returns the correlation ids once the
/// provider accepts. Rejections surface as errors and leave no record.
#[post("")]
async fn initiate_payment(
    service: web::Data<PaymentService>,
    body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse> {
    let result = service
        .initiate(&body.phone, body.amount, &body.order_ref)
        .await?;

    Ok(HttpResponse::Accepted().json(result))
}

/// GET /payments/{checkout_request_id}
#[get("/{checkout_request_id}")]
async fn get_payment(
    service: web::Data<PaymentService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let tx = service.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PaymentStatusResponse::from(tx)))
}
