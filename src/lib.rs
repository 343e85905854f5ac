//! M-Pesa STK-push payment bridge
//!
//! Mediates push payments between a merchant order system and the Safaricom
//! Daraja API: initiation, durable recording, and reconciliation of the
//! asynchronous outcome from either the provider callback or an active
//! status poll.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::daraja;
pub use modules::orders;
pub use modules::transactions;
