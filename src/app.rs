//! View routing and room state
//!
//! [`App`] is the top of the game: it decides which view is shown, holds
//! the room code, the local player's name and the selected game mode, and
//! owns the trivia and personal flows. All shareable state lives in the
//! injected [`SessionContext`], read once at startup and rewritten as the
//! host's round changes.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    bluff::{self, PersonalGame, ResetOutcome},
    codec::{self, SharedGameData},
    constants::params,
    content::ContentService,
    names::{self, PlayerName},
    room_code::RoomCode,
    session::{Clipboard, HistoryMode, SessionContext},
    ticket::Ticket,
    trivia::{self, TriviaCard, TriviaFlow},
};

/// The screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum View {
    /// Solo trivia with a button to create a room
    Home,
    /// Display name prompt for a room opened from a link
    Join,
    /// Inside a room
    Room,
}

/// The game played inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum GameMode {
    /// Classic AI-generated trivia cards
    Trivia,
    /// Personal bluffing rounds
    Personal,
}

/// Errors returned by view-level actions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The action belongs to a different view
    #[error("not available in the {actual} view (expected {expected})")]
    WrongView {
        /// View the action needs
        expected: View,
        /// View currently shown
        actual: View,
    },
    /// The mode cannot change while playing a round from a shared link
    #[error("game mode is locked by a shared round")]
    ModeLocked,
    /// The personal flow is not active
    #[error("no personal round is active")]
    NoPersonalRound,
    /// The trivia flow is not shown
    #[error("trivia is not shown")]
    TriviaHidden,
    /// The display name was rejected
    #[error(transparent)]
    Name(#[from] names::Error),
    /// A personal round operation failed
    #[error(transparent)]
    Bluff(#[from] bluff::Error),
    /// A trivia operation failed
    #[error(transparent)]
    Trivia(#[from] trivia::Error),
}

/// Game state for one browser tab
#[derive(Debug)]
pub struct App<S> {
    session: S,
    view: View,
    mode: GameMode,
    room: Option<RoomCode>,
    player_name: Option<PlayerName>,
    shared: Option<SharedGameData>,
    trivia: TriviaFlow,
    personal: Option<PersonalGame>,
    home_fetch_due: bool,
}

impl<S: SessionContext> App<S> {
    /// Reads the session's parameters and picks the initial view
    ///
    /// A `room` parameter opens the join view. A `data` parameter that
    /// decodes to a valid round also switches to personal mode and keeps the
    /// round for the joining player; one that does not is logged and
    /// ignored.
    pub fn start(session: S) -> Self {
        let room = session
            .get(params::ROOM)
            .and_then(|raw| match RoomCode::from_str(&raw) {
                Ok(code) => Some(code),
                Err(e) => {
                    warn!(error = %e, room = %raw, "Ignoring blank room parameter");
                    None
                }
            });

        let mut app = Self {
            session,
            view: View::Home,
            mode: GameMode::Trivia,
            room: None,
            player_name: None,
            shared: None,
            trivia: TriviaFlow::new(),
            personal: None,
            home_fetch_due: true,
        };

        if let Some(room) = room {
            info!(%room, "Opened room link");
            app.view = View::Join;
            app.home_fetch_due = false;
            app.shared = app
                .session
                .get(params::DATA)
                .and_then(|data| codec::decode_or_none(&data));
            if app.shared.is_some() {
                app.mode = GameMode::Personal;
            }
            app.room = Some(room);
        }

        app
    }

    /// The current view
    pub fn view(&self) -> View {
        self.view
    }

    /// The selected game mode
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The room code, if in or joining a room
    pub fn room(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    /// The local player's name, once known
    pub fn player_name(&self) -> Option<&PlayerName> {
        self.player_name.as_ref()
    }

    /// The round received through a link, if any
    pub fn shared(&self) -> Option<&SharedGameData> {
        self.shared.as_ref()
    }

    /// The trivia flow
    pub fn trivia(&self) -> &TriviaFlow {
        &self.trivia
    }

    /// The personal flow, while in a room
    pub fn personal(&self) -> Option<&PersonalGame> {
        self.personal.as_ref()
    }

    /// The personal flow, for phase changes with no URL side effects
    pub fn personal_mut(&mut self) -> Option<&mut PersonalGame> {
        self.personal.as_mut()
    }

    /// The session context
    pub fn session(&self) -> &S {
        &self.session
    }

    fn expect_view(&self, expected: View) -> Result<(), Error> {
        if self.view == expected {
            Ok(())
        } else {
            Err(Error::WrongView {
                expected,
                actual: self.view,
            })
        }
    }

    /// Whether the mode switcher is offered
    pub fn can_switch_mode(&self) -> bool {
        self.view == View::Room && self.shared.is_none()
    }

    /// Whether the trivia card area is shown
    pub fn trivia_visible(&self) -> bool {
        match self.view {
            View::Home => true,
            View::Room => self.mode == GameMode::Trivia,
            View::Join => false,
        }
    }

    /// Whether the home view is waiting for its first card
    pub fn needs_initial_card(&self) -> bool {
        self.view == View::Home && self.home_fetch_due
    }

    /// Creates a room hosted by the local player
    ///
    /// The new code is written into the session without navigating and the
    /// player becomes the default host in personal mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::WrongView` unless on the home view.
    pub fn create_room(&mut self) -> Result<&RoomCode, Error> {
        self.expect_view(View::Home)?;
        let room = RoomCode::new();
        self.session.remove(params::DATA, HistoryMode::Replace);
        self.session
            .set(params::ROOM, room.as_str(), HistoryMode::Push);
        info!(%room, "Created room");

        let host = PlayerName::host();
        self.trivia.abandon();
        self.personal = Some(PersonalGame::new(host.as_str()));
        self.player_name = Some(host);
        self.shared = None;
        self.view = View::Room;
        self.mode = GameMode::Personal;
        self.home_fetch_due = false;
        Ok(self.room.insert(room))
    }

    /// Enters the room under a display name
    ///
    /// With a round from a link the player lands directly in its vote.
    ///
    /// # Errors
    ///
    /// * `Error::WrongView` - Not on the join view
    /// * `Error::Name` - The display name was rejected
    pub fn join_room(&mut self, name: &str) -> Result<(), Error> {
        self.expect_view(View::Join)?;
        let name = PlayerName::new(name)?;
        info!(player = %name, "Joined room");

        self.personal = Some(match &self.shared {
            Some(data) => PersonalGame::from_shared(name.as_str(), data.clone()),
            None => PersonalGame::new(name.as_str()),
        });
        self.player_name = Some(name);
        self.view = View::Room;
        self.mode = GameMode::Personal;
        Ok(())
    }

    /// Switches the room between trivia and personal play
    ///
    /// Leaving trivia abandons any card request still in flight.
    ///
    /// # Errors
    ///
    /// * `Error::WrongView` - Not in a room
    /// * `Error::ModeLocked` - A shared round is being played
    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), Error> {
        self.expect_view(View::Room)?;
        if self.shared.is_some() {
            return Err(Error::ModeLocked);
        }
        if mode != GameMode::Trivia {
            self.trivia.abandon();
        }
        debug!(%mode, "Game mode changed");
        self.mode = mode;
        Ok(())
    }

    /// Requests a new trivia card
    ///
    /// # Errors
    ///
    /// * `Error::TriviaHidden` - Trivia is not on screen
    /// * `Error::Trivia` - A request is already in flight
    pub async fn fetch_trivia(&mut self, service: &dyn ContentService) -> Result<(), Error> {
        if !self.trivia_visible() {
            return Err(Error::TriviaHidden);
        }
        self.home_fetch_due = false;
        self.trivia.fetch_new_card(service).await?;
        Ok(())
    }

    /// Redisplays a card from the trivia history
    ///
    /// # Errors
    ///
    /// Returns `Error::Trivia` if `index` is out of range.
    pub fn select_card(&mut self, index: usize) -> Result<&TriviaCard, Error> {
        Ok(self.trivia.select(index)?)
    }

    fn personal_game(&mut self) -> Result<&mut PersonalGame, Error> {
        if self.view != View::Room || self.mode != GameMode::Personal {
            return Err(Error::NoPersonalRound);
        }
        self.personal.as_mut().ok_or(Error::NoPersonalRound)
    }

    /// Applies the reply to a bluff request and publishes the round
    ///
    /// When the local player's own round reaches voting, it is encoded into
    /// the session's `data` parameter so the address can be shared.
    ///
    /// # Errors
    ///
    /// * `Error::NoPersonalRound` - Personal play is not active
    /// * `Error::Bluff` - The reply is stale
    pub fn resolve_fakes(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<String>, crate::content::Error>,
    ) -> Result<(), Error> {
        self.personal_game()?.resolve_fakes(ticket, result)?;
        self.publish_round();
        Ok(())
    }

    /// Submits the player's answer, generates bluffs and publishes the round
    ///
    /// # Errors
    ///
    /// * `Error::NoPersonalRound` - Personal play is not active
    /// * `Error::Bluff` - The answer was rejected
    pub async fn generate_fakes(
        &mut self,
        answer: &str,
        service: &dyn ContentService,
    ) -> Result<(), Error> {
        self.personal_game()?
            .submit_and_generate(answer, service)
            .await?;
        self.publish_round();
        Ok(())
    }

    fn publish_round(&mut self) {
        let Some(data) = self.personal.as_ref().and_then(PersonalGame::share_data) else {
            return;
        };
        match codec::encode(&data) {
            Ok(encoded) => {
                debug!(question = %data.question, "Publishing round link");
                self.session
                    .set(params::DATA, &encoded, HistoryMode::Replace);
            }
            Err(e) => warn!(error = %e, "Round cannot be shared"),
        }
    }

    /// Ends the current personal round
    ///
    /// The `data` parameter is always removed. A round joined through a link
    /// is left entirely: the shared round is dropped, the mode switcher comes
    /// back, and the player gets a fresh flow of their own.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoPersonalRound` if personal play is not active.
    pub fn next_round(&mut self) -> Result<ResetOutcome, Error> {
        let outcome = self.personal_game()?.reset();
        self.session.remove(params::DATA, HistoryMode::Push);
        if outcome == ResetOutcome::ExitSharedRound {
            info!("Leaving shared round");
            self.shared = None;
            self.personal = self
                .player_name
                .as_ref()
                .map(|name| PersonalGame::new(name.as_str()));
        }
        Ok(outcome)
    }

    /// Copies the current shareable address
    pub fn copy_link(&self, clipboard: &mut impl Clipboard) {
        clipboard.write_text(&self.session.href());
    }

    /// Leaves any room and returns to solo trivia
    ///
    /// Home starts over like a fresh page: the trivia history is dropped and
    /// a first card is due again.
    pub fn go_home(&mut self) {
        self.session.remove(params::DATA, HistoryMode::Replace);
        self.session.remove(params::ROOM, HistoryMode::Push);
        self.personal = None;
        self.shared = None;
        self.room = None;
        self.player_name = None;
        self.view = View::Home;
        self.mode = GameMode::Trivia;
        self.trivia = TriviaFlow::new();
        self.home_fetch_due = true;
    }
}
