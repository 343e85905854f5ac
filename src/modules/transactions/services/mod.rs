pub mod payment_service;
pub mod reconciler;
pub mod status_poller;

pub use payment_service::{InitiationResult, PaymentService};
pub use reconciler::{PaymentOutcome, ReconcileResult, Reconciler};
pub use status_poller::StatusPoller;
