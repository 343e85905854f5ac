pub mod daraja;
pub mod orders;
pub mod transactions;
