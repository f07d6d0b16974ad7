//! Entities - objects with identity and a lifecycle

mod experience;

pub use experience::Experience;
