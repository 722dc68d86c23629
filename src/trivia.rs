//! Classic trivia flow
//!
//! Solo play: request an AI-generated trivia card, show it, and keep every
//! card received in a most-recent-first history the player can browse.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    constants::trivia::GENERATION_FAILED,
    content::{self, ContentService},
    ticket::{Outstanding, Ticket},
};

/// A single generated trivia question with its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TriviaCard {
    /// Funny, relatable category such as "Modern Slang"
    #[garde(length(min = 1))]
    pub category: String,
    /// The question itself
    #[garde(length(min = 1))]
    pub question: String,
    /// The correct, often strange answer
    #[garde(length(min = 1))]
    pub real_answer: String,
}

/// Errors returned by trivia flow operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A card request is already in flight
    #[error("a card is already being generated")]
    Busy,
    /// The result belongs to a request that is no longer outstanding
    #[error("result belongs to an abandoned request")]
    Stale,
    /// No history entry exists at the requested position
    #[error("no card at history position {0}")]
    NoSuchCard(usize),
}

/// State of the trivia view
#[derive(Debug, Clone, Default)]
pub struct TriviaFlow {
    current: Option<TriviaCard>,
    history: Vec<TriviaCard>,
    error: Option<&'static str>,
    outstanding: Outstanding,
}

impl TriviaFlow {
    /// Creates an empty flow
    pub fn new() -> Self {
        Self::default()
    }

    /// The card currently displayed
    pub fn current(&self) -> Option<&TriviaCard> {
        self.current.as_ref()
    }

    /// Every card received, most recent first
    pub fn history(&self) -> &[TriviaCard] {
        &self.history
    }

    /// Whether a card request is in flight
    pub fn is_loading(&self) -> bool {
        self.outstanding.is_pending()
    }

    /// The user-visible error from the last failed request
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Starts a card request
    ///
    /// Clears any previous error. The returned ticket must be handed back to
    /// [`TriviaFlow::resolve_fetch`] with the service's reply.
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if a request is already in flight.
    pub fn begin_fetch(&mut self) -> Result<Ticket, Error> {
        if self.is_loading() {
            return Err(Error::Busy);
        }
        self.error = None;
        debug!("Requesting trivia card");
        Ok(self.outstanding.issue())
    }

    /// Applies the reply to a card request
    ///
    /// On success the card becomes current and is prepended to the history;
    /// on failure the flow shows a retryable error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Stale` if `ticket` is not the outstanding request; the
    /// reply is then dropped without touching any state.
    pub fn resolve_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<TriviaCard, content::Error>,
    ) -> Result<(), Error> {
        if !self.outstanding.redeem(ticket) {
            debug!("Dropping trivia card for abandoned request");
            return Err(Error::Stale);
        }
        match result {
            Ok(card) => {
                self.current = Some(card.clone());
                self.history.insert(0, card);
            }
            Err(e) => {
                warn!(error = %e, "Trivia card generation failed");
                self.error = Some(GENERATION_FAILED);
            }
        }
        Ok(())
    }

    /// Requests a card from `service` and applies the reply
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if a request is already in flight. Service
    /// failures are reported through [`TriviaFlow::error`] instead.
    pub async fn fetch_new_card(&mut self, service: &dyn ContentService) -> Result<(), Error> {
        let ticket = self.begin_fetch()?;
        let result = service.generate_card().await;
        self.resolve_fetch(ticket, result)
    }

    /// Stops waiting for the outstanding request, if any
    pub fn abandon(&mut self) {
        self.outstanding.cancel();
    }

    /// Redisplays a card from the history without reordering it
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchCard` if `index` is out of range.
    pub fn select(&mut self, index: usize) -> Result<&TriviaCard, Error> {
        let card = self.history.get(index).ok_or(Error::NoSuchCard(index))?;
        Ok(self.current.insert(card.clone()))
    }
}
