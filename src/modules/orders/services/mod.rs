pub mod notifier;

pub use notifier::{HttpOrderNotifier, OrderNotifier};
