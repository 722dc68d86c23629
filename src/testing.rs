//! Test doubles shared by the flow tests

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::{
    content::{ContentService, Error},
    session::Clipboard,
    trivia::TriviaCard,
};

pub(crate) fn card(n: usize) -> TriviaCard {
    TriviaCard {
        category: format!("Category {n}"),
        question: format!("Question {n}?"),
        real_answer: format!("Answer {n}"),
    }
}

/// Content service replaying queued replies in order
#[derive(Default)]
pub(crate) struct ScriptedService {
    cards: Mutex<VecDeque<Result<TriviaCard, Error>>>,
    fakes: Mutex<VecDeque<Result<Vec<String>, Error>>>,
    pub(crate) fake_requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedService {
    pub(crate) fn with_cards(cards: impl IntoIterator<Item = Result<TriviaCard, Error>>) -> Self {
        Self {
            cards: Mutex::new(cards.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn with_fakes(
        fakes: impl IntoIterator<Item = Result<Vec<String>, Error>>,
    ) -> Self {
        Self {
            fakes: Mutex::new(fakes.into_iter().collect()),
            ..Self::default()
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ContentService for ScriptedService {
    async fn generate_card(&self) -> Result<TriviaCard, Error> {
        self.cards.lock().unwrap().pop_front().unwrap_or(Err(Error::Empty))
    }

    async fn generate_fakes(
        &self,
        question: &str,
        real_answer: &str,
    ) -> Result<Vec<String>, Error> {
        self.fake_requests
            .lock()
            .unwrap()
            .push((question.to_owned(), real_answer.to_owned()));
        self.fakes.lock().unwrap().pop_front().unwrap_or(Err(Error::Empty))
    }
}

#[derive(Default)]
pub(crate) struct RecordingClipboard(pub(crate) Vec<String>);

impl Clipboard for RecordingClipboard {
    fn write_text(&mut self, text: &str) {
        self.0.push(text.to_owned());
    }
}
