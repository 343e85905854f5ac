pub mod callback_controller;
pub mod payment_controller;

pub use callback_controller::CallbackController;
pub use payment_controller::PaymentController;
