//! Personal bluffing round
//!
//! One player answers a question about themselves, the content service
//! invents bluffs, and everyone else tries to spot the truth among the
//! shuffled options. A round runs through the phases below:
//!
//! ```text
//! Idle -> Input -> Generating -> Voting -> Result
//!           ^          |
//!           +----------+  (generation failed)
//! ```
//!
//! Players who open a shared link skip straight to `Voting` on the host's
//! options.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    codec::{BluffOption, SharedGameData},
    constants::{
        bluff::{NAME_PLACEHOLDER, TEMPLATES},
        content::FAKES_COUNT,
        shared::MAX_OPTION_LENGTH,
    },
    content::{self, ContentService},
    ticket::{Outstanding, Ticket},
};

/// Current phase of a personal round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum Phase {
    /// Waiting for the player to start a round
    #[default]
    Idle,
    /// Waiting for the player's true answer
    Input,
    /// Waiting for the content service to produce bluffs
    Generating,
    /// Options are shown and a guess is expected
    Voting,
    /// The guess was made and the truth is revealed
    Result,
}

/// What the caller should do after a round is reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The flow is back at `Idle`, ready for another round
    Idle,
    /// The round came from a shared link; leave it and clear the link data
    ExitSharedRound,
}

/// Errors returned by round operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The operation is not valid in the current phase
    #[error("cannot do that while in {actual} (expected {expected})")]
    WrongPhase {
        /// Phase the operation needs
        expected: Phase,
        /// Phase the round is in
        actual: Phase,
    },
    /// The submitted answer is blank
    #[error("answer cannot be empty")]
    EmptyAnswer,
    /// The submitted answer does not fit in a shared link
    #[error("answer is too long")]
    AnswerTooLong,
    /// The guessed option does not exist
    #[error("no option at position {0}")]
    NoSuchOption(usize),
    /// The result belongs to a request that is no longer outstanding
    #[error("result belongs to an abandoned request")]
    Stale,
}

/// How one option fared once the truth is revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// The option text
    pub text: String,
    /// Whether this was the true answer
    pub is_real: bool,
    /// Whether this option was the guess
    pub picked: bool,
}

/// Substitutes a player's name into a question template
///
/// Only the first placeholder is replaced.
pub fn fill_template(template: &str, name: &str) -> String {
    template.replacen(NAME_PLACEHOLDER, name, 1)
}

/// Cuts a bluff down to the option length limit on a character boundary
fn clamp_option(text: &str) -> &str {
    let mut end = text.len().min(MAX_OPTION_LENGTH);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].trim_end()
}

/// State of one player's personal bluffing flow
#[derive(Debug, Clone)]
pub struct PersonalGame {
    player_name: String,
    phase: Phase,
    question: String,
    real_answer: String,
    options: Vec<BluffOption>,
    selected: Option<usize>,
    shared_by: Option<String>,
    outstanding: Outstanding,
}

impl PersonalGame {
    /// Creates a flow for the local player, waiting in `Idle`
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            phase: Phase::Idle,
            question: String::new(),
            real_answer: String::new(),
            options: Vec::new(),
            selected: None,
            shared_by: None,
            outstanding: Outstanding::default(),
        }
    }

    /// Creates a flow that votes on a round received through a link
    ///
    /// The flow starts in `Voting` and never produces sharing data itself.
    pub fn from_shared(player_name: impl Into<String>, data: SharedGameData) -> Self {
        let SharedGameData {
            question,
            options,
            host_name,
        } = data;
        info!(host = %host_name, "Joining shared round");
        Self {
            phase: Phase::Voting,
            question,
            options,
            shared_by: Some(host_name),
            ..Self::new(player_name)
        }
    }

    /// The current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The local player's name
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// The round question, empty while `Idle`
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The true answer submitted for this round
    pub fn real_answer(&self) -> &str {
        &self.real_answer
    }

    /// The shuffled options, empty before `Voting`
    pub fn options(&self) -> &[BluffOption] {
        &self.options
    }

    /// Index of the guessed option
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Host of the round if it came from a shared link
    pub fn shared_by(&self) -> Option<&str> {
        self.shared_by.as_deref()
    }

    /// Whether the round came from a shared link
    pub fn is_shared(&self) -> bool {
        self.shared_by.is_some()
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), Error> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Starts a round with a randomly chosen question
    ///
    /// # Errors
    ///
    /// Returns `Error::WrongPhase` unless the flow is `Idle`.
    pub fn start_round(&mut self) -> Result<&str, Error> {
        let template = TEMPLATES[fastrand::usize(..TEMPLATES.len())];
        self.start_round_with(template)
    }

    /// Starts a round with a specific question template
    ///
    /// # Errors
    ///
    /// Returns `Error::WrongPhase` unless the flow is `Idle`.
    pub fn start_round_with(&mut self, template: &str) -> Result<&str, Error> {
        self.expect_phase(Phase::Idle)?;
        self.question = fill_template(template, &self.player_name);
        self.real_answer.clear();
        self.phase = Phase::Input;
        debug!(question = %self.question, "Round started");
        Ok(&self.question)
    }

    /// Submits the player's true answer and starts bluff generation
    ///
    /// The returned ticket must be handed back to
    /// [`PersonalGame::resolve_fakes`] with the service's reply.
    ///
    /// # Errors
    ///
    /// * `Error::WrongPhase` - The flow is not waiting for an answer
    /// * `Error::EmptyAnswer` - The answer is blank
    /// * `Error::AnswerTooLong` - The trimmed answer exceeds the option limit
    pub fn submit_answer(&mut self, answer: &str) -> Result<Ticket, Error> {
        self.expect_phase(Phase::Input)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::EmptyAnswer);
        }
        if answer.len() > MAX_OPTION_LENGTH {
            return Err(Error::AnswerTooLong);
        }
        answer.clone_into(&mut self.real_answer);
        self.phase = Phase::Generating;
        Ok(self.outstanding.issue())
    }

    /// Applies the reply to a bluff request
    ///
    /// On success the real answer and the bluffs are shuffled into the
    /// option list and voting begins. At most [`FAKES_COUNT`] non-blank
    /// bluffs are kept, each cut to the option length limit. On failure, or
    /// when no usable bluff remains, the flow goes back to `Input` and the
    /// submitted answer is discarded.
    ///
    /// # Errors
    ///
    /// Returns `Error::Stale` if `ticket` is not the outstanding request; the
    /// reply is then dropped without touching any state.
    pub fn resolve_fakes(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<String>, content::Error>,
    ) -> Result<(), Error> {
        if self.phase != Phase::Generating || !self.outstanding.redeem(ticket) {
            debug!("Dropping bluffs for abandoned request");
            return Err(Error::Stale);
        }
        let result = result.and_then(|fakes| {
            let fakes: Vec<String> = fakes
                .iter()
                .map(|f| clamp_option(f.trim()))
                .filter(|f| !f.is_empty())
                .take(FAKES_COUNT)
                .map(str::to_owned)
                .collect();
            if fakes.is_empty() {
                Err(content::Error::NoFakes)
            } else {
                Ok(fakes)
            }
        });
        match result {
            Ok(fakes) => {
                let mut options = Vec::with_capacity(fakes.len() + 1);
                options.push(BluffOption::real(self.real_answer.clone()));
                options.extend(fakes.into_iter().map(BluffOption::fake));
                fastrand::shuffle(&mut options);
                self.options = options;
                self.selected = None;
                self.phase = Phase::Voting;
            }
            Err(e) => {
                warn!(error = %e, "Bluff generation failed");
                self.real_answer.clear();
                self.phase = Phase::Input;
            }
        }
        Ok(())
    }

    /// Submits the player's answer and generates bluffs with `service`
    ///
    /// # Errors
    ///
    /// See [`PersonalGame::submit_answer`]. Service failures return the flow
    /// to `Input` rather than producing an error.
    pub async fn submit_and_generate(
        &mut self,
        answer: &str,
        service: &dyn ContentService,
    ) -> Result<(), Error> {
        let ticket = self.submit_answer(answer)?;
        let result = service
            .generate_fakes(&self.question, &self.real_answer)
            .await;
        self.resolve_fakes(ticket, result)
    }

    /// Records a guess and reveals the truth
    ///
    /// Returns whether the guess was the real answer.
    ///
    /// # Errors
    ///
    /// * `Error::WrongPhase` - The flow is not voting
    /// * `Error::NoSuchOption` - `index` is out of range
    pub fn vote(&mut self, index: usize) -> Result<bool, Error> {
        self.expect_phase(Phase::Voting)?;
        let option = self.options.get(index).ok_or(Error::NoSuchOption(index))?;
        let correct = option.is_real;
        self.selected = Some(index);
        self.phase = Phase::Result;
        Ok(correct)
    }

    /// Whether the guess was right, once revealed
    pub fn guessed_right(&self) -> Option<bool> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|o| o.is_real)
    }

    /// Per-option outcome, available in `Result`
    pub fn reveal(&self) -> Option<Vec<Verdict>> {
        (self.phase == Phase::Result).then(|| {
            self.options
                .iter()
                .enumerate()
                .map(|(i, o)| Verdict {
                    text: o.text.clone(),
                    is_real: o.is_real,
                    picked: self.selected == Some(i),
                })
                .collect()
        })
    }

    /// The round to publish in the page URL
    ///
    /// Only a host's own round in `Voting` or `Result` is shareable.
    pub fn share_data(&self) -> Option<SharedGameData> {
        if self.is_shared()
            || !matches!(self.phase, Phase::Voting | Phase::Result)
            || self.options.is_empty()
        {
            return None;
        }
        Some(SharedGameData {
            question: self.question.clone(),
            options: self.options.clone(),
            host_name: self.player_name.clone(),
        })
    }

    /// Ends the round
    ///
    /// Any outstanding request is abandoned. A local round goes back to
    /// `Idle`; a round from a shared link asks the caller to leave it.
    pub fn reset(&mut self) -> ResetOutcome {
        self.outstanding.cancel();
        self.phase = Phase::Idle;
        self.selected = None;
        self.options.clear();
        if self.is_shared() {
            ResetOutcome::ExitSharedRound
        } else {
            ResetOutcome::Idle
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::testing::ScriptedService;

    const SEARCH_TEMPLATE: &str =
        "What is the weirdest thing [Name] has in their search history right now?";

    fn fakes() -> Vec<String> {
        vec!["Socks".into(), "Lamps".into(), "Owls".into()]
    }

    fn voting_game() -> PersonalGame {
        let mut game = PersonalGame::new("Ari");
        game.start_round_with(SEARCH_TEMPLATE).unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        game.resolve_fakes(ticket, Ok(fakes())).unwrap();
        game
    }

    #[test]
    fn test_fill_template() {
        assert_eq!(
            fill_template(SEARCH_TEMPLATE, "Ari"),
            "What is the weirdest thing Ari has in their search history right now?"
        );
        assert_eq!(fill_template("[Name] and [Name]", "Bo"), "Bo and [Name]");
    }

    #[test]
    fn test_start_round_with_template() {
        let mut game = PersonalGame::new("Ari");
        let question = game.start_round_with(SEARCH_TEMPLATE).unwrap();
        assert_eq!(
            question,
            "What is the weirdest thing Ari has in their search history right now?"
        );
        assert_eq!(game.phase(), Phase::Input);
    }

    #[test]
    fn test_start_round_random() {
        let mut game = PersonalGame::new("Ari");
        let question = game.start_round().unwrap().to_owned();
        assert!(question.contains("Ari"));
        assert!(!question.contains(NAME_PLACEHOLDER));
        assert!(
            TEMPLATES
                .iter()
                .any(|t| fill_template(t, "Ari") == question)
        );
    }

    #[test]
    fn test_start_round_only_from_idle() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        assert_eq!(
            game.start_round(),
            Err(Error::WrongPhase {
                expected: Phase::Idle,
                actual: Phase::Input
            })
        );
    }

    #[test]
    fn test_empty_answer_rejected() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        assert_eq!(game.submit_answer("   "), Err(Error::EmptyAnswer));
        assert_eq!(game.phase(), Phase::Input);
    }

    #[test]
    fn test_submit_moves_to_generating() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        game.submit_answer(" Cheese ").unwrap();
        assert_eq!(game.phase(), Phase::Generating);
        assert_eq!(game.real_answer(), "Cheese");
        assert!(matches!(
            game.submit_answer("again"),
            Err(Error::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_options_have_exactly_one_real() {
        for _ in 0..50 {
            let game = voting_game();
            assert_eq!(game.phase(), Phase::Voting);
            assert_eq!(game.options().len(), 4);
            let real = game.options().iter().filter(|o| o.is_real).collect_vec();
            assert_eq!(real.len(), 1);
            assert_eq!(real[0].text, "Cheese");
            for fake in fakes() {
                assert!(game.options().iter().any(|o| o.text == fake && !o.is_real));
            }
        }
    }

    #[test]
    fn test_fake_may_equal_real_text() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let ticket = game.submit_answer("Pizza").unwrap();
        game.resolve_fakes(ticket, Ok(vec!["Pizza".into()])).unwrap();
        assert_eq!(game.options().len(), 2);
        assert_eq!(game.options().iter().filter(|o| o.is_real).count(), 1);
    }

    #[test]
    fn test_generation_failure_returns_to_input() {
        let mut game = PersonalGame::new("Ari");
        game.start_round_with("Q").unwrap();
        let ticket = game.submit_answer("A").unwrap();
        game.resolve_fakes(ticket, Err(content::Error::Empty))
            .unwrap();

        assert_eq!(game.phase(), Phase::Input);
        assert_eq!(game.real_answer(), "");
        assert_eq!(game.question(), "Q");
        assert!(game.options().is_empty());
    }

    #[test]
    fn test_answer_length_limit() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let long = "a".repeat(MAX_OPTION_LENGTH + 1);
        assert_eq!(game.submit_answer(&long), Err(Error::AnswerTooLong));
        assert_eq!(game.phase(), Phase::Input);

        let padded = format!("  {}  ", "a".repeat(MAX_OPTION_LENGTH));
        game.submit_answer(&padded).unwrap();
        assert_eq!(game.real_answer().len(), MAX_OPTION_LENGTH);
    }

    #[test]
    fn test_extra_fakes_are_dropped() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        let many = (0..8).map(|i| format!("Fake {i}")).collect();
        game.resolve_fakes(ticket, Ok(many)).unwrap();

        assert_eq!(game.options().len(), FAKES_COUNT + 1);
        for i in 0..FAKES_COUNT {
            let text = format!("Fake {i}");
            assert!(game.options().iter().any(|o| o.text == text));
        }
    }

    #[test]
    fn test_long_fakes_are_cut() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        let euros = format!("a{}", "€".repeat(150));
        game.resolve_fakes(ticket, Ok(vec!["b".repeat(400), euros]))
            .unwrap();

        let fakes = game.options().iter().filter(|o| !o.is_real).collect_vec();
        assert_eq!(fakes.len(), 2);
        assert!(fakes.iter().all(|o| o.text.len() <= MAX_OPTION_LENGTH));
        assert!(fakes.iter().any(|o| o.text == "b".repeat(MAX_OPTION_LENGTH)));
        assert!(fakes.iter().any(|o| o.text.len() == 298 && o.text.starts_with('a')));
    }

    #[test]
    fn test_blank_fakes_count_as_failure() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        game.resolve_fakes(ticket, Ok(vec![" ".into(), String::new()]))
            .unwrap();
        assert_eq!(game.phase(), Phase::Input);
        assert!(game.options().is_empty());
    }

    #[test]
    fn test_stale_reply_dropped() {
        let mut game = PersonalGame::new("Ari");
        game.start_round().unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        assert_eq!(game.reset(), ResetOutcome::Idle);

        assert_eq!(game.resolve_fakes(ticket, Ok(fakes())), Err(Error::Stale));
        assert_eq!(game.phase(), Phase::Idle);
        assert!(game.options().is_empty());
    }

    #[test]
    fn test_vote_reveals_result() {
        let mut game = voting_game();
        let real = game.options().iter().position(|o| o.is_real).unwrap();
        assert_eq!(game.vote(real), Ok(true));
        assert_eq!(game.phase(), Phase::Result);
        assert_eq!(game.selected(), Some(real));
        assert_eq!(game.guessed_right(), Some(true));

        let verdicts = game.reveal().unwrap();
        assert_eq!(verdicts.len(), 4);
        assert!(verdicts[real].picked && verdicts[real].is_real);
        assert_eq!(verdicts.iter().filter(|v| v.picked).count(), 1);
    }

    #[test]
    fn test_vote_wrong_and_out_of_range() {
        let mut game = voting_game();
        assert_eq!(game.vote(4), Err(Error::NoSuchOption(4)));
        assert_eq!(game.phase(), Phase::Voting);
        assert_eq!(game.reveal(), None);

        let fake = game.options().iter().position(|o| !o.is_real).unwrap();
        assert_eq!(game.vote(fake), Ok(false));
        assert_eq!(game.guessed_right(), Some(false));
        assert!(matches!(game.vote(fake), Err(Error::WrongPhase { .. })));
    }

    #[test]
    fn test_share_data_for_host() {
        let mut game = PersonalGame::new("Ari");
        assert_eq!(game.share_data(), None);

        game.start_round_with(SEARCH_TEMPLATE).unwrap();
        let ticket = game.submit_answer("Cheese").unwrap();
        assert_eq!(game.share_data(), None);

        game.resolve_fakes(ticket, Ok(fakes())).unwrap();
        let data = game.share_data().unwrap();
        assert_eq!(data.question, game.question());
        assert_eq!(data.options, game.options());
        assert_eq!(data.host_name, "Ari");
    }

    #[test]
    fn test_reset_local_round() {
        let mut game = voting_game();
        game.vote(0).unwrap();
        assert_eq!(game.reset(), ResetOutcome::Idle);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.selected(), None);
        assert!(game.options().is_empty());
        game.start_round().unwrap();
    }

    #[test]
    fn test_from_shared_starts_voting() {
        let data = voting_game().share_data().unwrap();
        let mut game = PersonalGame::from_shared("Bo", data.clone());
        assert_eq!(game.phase(), Phase::Voting);
        assert_eq!(game.question(), data.question);
        assert_eq!(game.options(), data.options.as_slice());
        assert_eq!(game.shared_by(), Some("Ari"));
        assert_eq!(game.share_data(), None);

        game.vote(data.real_index().unwrap()).unwrap();
        assert_eq!(game.share_data(), None);
        assert_eq!(game.reset(), ResetOutcome::ExitSharedRound);
    }

    #[tokio::test]
    async fn test_submit_and_generate() {
        let service = ScriptedService::with_fakes([Ok(fakes())]);
        let mut game = PersonalGame::new("Ari");
        game.start_round_with(SEARCH_TEMPLATE).unwrap();
        game.submit_and_generate("Cheese", &service).await.unwrap();

        assert_eq!(game.phase(), Phase::Voting);
        let requests = service.fake_requests.lock().unwrap();
        assert_eq!(
            requests.as_slice(),
            &[(
                "What is the weirdest thing Ari has in their search history right now?"
                    .to_string(),
                "Cheese".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_submit_and_generate_failure() {
        let service = ScriptedService::with_fakes([Err(content::Error::NoFakes)]);
        let mut game = PersonalGame::new("Ari");
        game.start_round_with("Q").unwrap();
        game.submit_and_generate("A", &service).await.unwrap();
        assert_eq!(game.phase(), Phase::Input);
        assert_eq!(game.real_answer(), "");
    }
}
