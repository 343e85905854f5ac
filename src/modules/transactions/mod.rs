pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::{CallbackController, PaymentController};
pub use models::{Transaction, TransactionStatus};
pub use repositories::{InMemoryTransactionStore, MySqlTransactionStore, TransactionStore};
pub use services::{
    InitiationResult, PaymentOutcome, PaymentService, ReconcileResult, Reconciler, StatusPoller,
};
