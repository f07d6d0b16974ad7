//! Infrastructure layer: port traits and their adapters.

pub mod clock;
pub mod llm;
pub mod mailer;
pub mod persistence;
pub mod ports;
pub mod share;
pub mod stripe;
