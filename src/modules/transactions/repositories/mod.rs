pub mod memory;
pub mod transaction_store;

pub use memory::InMemoryTransactionStore;
pub use transaction_store::{MySqlTransactionStore, TransactionStore};
