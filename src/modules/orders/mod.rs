pub mod services;

pub use services::{HttpOrderNotifier, OrderNotifier};
