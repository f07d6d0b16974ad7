//! Experience lifecycle: create, save, view.

mod create;
mod save;
mod view;

pub use create::CreateExperience;
pub use save::{SaveError, SaveExperience, SaveOutcome, SaveRequest};
pub use view::{PlayView, ViewExperience};
