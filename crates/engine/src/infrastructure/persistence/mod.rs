//! SQLite persistence adapters.

mod experience_repository;

pub use experience_repository::SqliteExperienceRepo;
