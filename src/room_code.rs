//! Room code generation and parsing
//!
//! This module provides the short codes that identify a room. Rooms have no
//! server-side registry, so a code is only a label embedded in shared links;
//! it is generated randomly and kept short and uppercase so players can read
//! it out loud.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants::room::{CODE_ALPHABET, CODE_LENGTH};

/// A room identifier such as `K3Q9ZXA`
///
/// Codes produced by [`RoomCode::new`] are always [`CODE_LENGTH`] uppercase
/// alphanumeric characters. Codes read back from a link are kept verbatim
/// apart from surrounding whitespace, since other clients may have produced
/// them.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct RoomCode(String);

/// Errors that can occur when parsing a room code
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The code is empty or only whitespace
    #[error("room code cannot be empty")]
    Empty,
}

impl RoomCode {
    /// Creates a new random room code
    pub fn new() -> Self {
        Self(
            (0..CODE_LENGTH)
                .map(|_| char::from(CODE_ALPHABET[fastrand::usize(..CODE_ALPHABET.len())]))
                .collect(),
        )
    }

    /// Returns the code as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomCode {
    /// Creates a new random room code (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = Error;

    /// Parses a room code from a link
    ///
    /// # Errors
    ///
    /// Returns `Error::Empty` if the trimmed input is empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self(s.to_owned()))
    }
}
