//! # Bluffgen Game Library
//!
//! This library provides the game logic behind a serverless party game:
//! AI-generated trivia cards for solo play, and personal bluffing rounds
//! where one player's true answer hides among generated fakes. Rooms exist
//! only as codes in shared links, so every piece of shared state travels in
//! the page URL through an injected session context.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod constants;

pub mod app;
pub mod bluff;
pub mod codec;
pub mod content;
pub mod names;
pub mod room_code;
pub mod session;
pub mod ticket;
pub mod trivia;

#[cfg(test)]
mod testing;

pub use app::{App, GameMode, View};
