//! Fulfillment: unlock a paid experience exactly once and dispatch the
//! delivery mail.

mod fulfill;

pub use fulfill::{FulfillPayment, FulfillmentOutcome};
