//! Checkout: hand the buyer off to the payment gateway.

mod start;

pub use start::{CheckoutStartError, StartCheckout};
