//! Player display name validation
//!
//! Players pick their own display name when joining a room. This module
//! trims, length-checks, and filters those names before they are shown to
//! anyone or substituted into round questions.

use std::fmt::Display;

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::constants::names::MAX_LENGTH;

/// A validated display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerName(String);

/// Errors that can occur during name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

impl PlayerName {
    /// Validates a requested display name
    ///
    /// # Errors
    ///
    /// * `Error::TooLong` - Name exceeds the maximum length
    /// * `Error::Empty` - Name is empty after trimming whitespace
    /// * `Error::Sinful` - Name contains inappropriate content
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = rustrict::trim_whitespace(name);
        if name.len() > MAX_LENGTH {
            return Err(Error::TooLong);
        }
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }
        Ok(Self(name.to_owned()))
    }

    /// The name given to whoever creates a room
    pub fn host() -> Self {
        Self(crate::constants::room::DEFAULT_HOST_NAME.to_owned())
    }

    /// Returns the name as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
