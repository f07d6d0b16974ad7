//! Use cases - user story orchestration.

pub mod chat;
pub mod checkout;
pub mod experience;
pub mod fulfillment;

pub use chat::ChatTurn;
pub use checkout::StartCheckout;
pub use experience::{CreateExperience, SaveExperience, ViewExperience};
pub use fulfillment::FulfillPayment;
