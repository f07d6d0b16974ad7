use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the short identifier minted for new experiences.
pub const EXPERIENCE_ID_LEN: usize = 8;

/// Short opaque identifier for an experience.
///
/// Minted once at creation from a v4 UUID and never changed; every lookup
/// in the store is keyed by this value. Short enough to survive being read
/// aloud or typed from a QR scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperienceId(String);

impl ExperienceId {
    /// Mint a fresh id: the first 8 hex characters of a v4 UUID.
    pub fn new() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..EXPERIENCE_ID_LEN].to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for ExperienceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExperienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExperienceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<ExperienceId> for String {
    fn from(value: ExperienceId) -> Self {
        value.0
    }
}
