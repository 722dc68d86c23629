//! Configuration constants for the bluffing game
//!
//! This module contains the fixed limits, defaults, and content pools
//! used throughout the crate so that every component agrees on the same
//! boundaries.

/// Room configuration constants
pub mod room {
    /// Number of characters in a generated room code
    pub const CODE_LENGTH: usize = 7;
    /// Characters a room code is drawn from
    pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    /// Display name given to the player who creates a room
    pub const DEFAULT_HOST_NAME: &str = "Host";
}

/// Page URL parameter names
pub mod params {
    /// Query parameter carrying the room code
    pub const ROOM: &str = "room";
    /// Query parameter carrying an encoded shared round
    pub const DATA: &str = "data";
}

/// Player name configuration constants
pub mod names {
    /// Maximum length of a display name in bytes
    pub const MAX_LENGTH: usize = 30;
}

/// Shared round configuration constants
pub mod shared {
    /// Maximum length of a round question
    pub const MAX_QUESTION_LENGTH: usize = 500;
    /// Maximum length of a single answer option
    pub const MAX_OPTION_LENGTH: usize = 300;
    /// Minimum number of options in a round (the truth and one bluff)
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of options in a round
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of the host name carried in a link
    pub const MAX_HOST_NAME_LENGTH: usize = 100;
}

/// Personal bluffing round configuration
pub mod bluff {
    /// Placeholder replaced with the player's name in question templates
    pub const NAME_PLACEHOLDER: &str = "[Name]";

    /// Question templates a personal round is drawn from
    pub const TEMPLATES: [&str; 8] = [
        "What is the strange, highly specific pet peeve that instantly ruins [Name]'s entire day?",
        "If [Name] started a cult, what would be the main rule?",
        "What is the weirdest thing [Name] has in their search history right now?",
        "What is [Name]'s 'useless talent' that they are secretly proud of?",
        "If [Name] were arrested, what would it be for?",
        "What is the title of [Name]'s autobiography?",
        "What is the one food [Name] would ban from existence if they could?",
        "What does [Name] talk about for way too long at parties?",
    ];

    /// Bluffs handed out when the content service cannot produce any
    pub const FALLBACK_FAKES: [&str; 3] = ["Pizza", "Homework", "A weird cat"];
}

/// Trivia flow configuration
pub mod trivia {
    /// Message shown when a card could not be generated
    pub const GENERATION_FAILED: &str =
        "Failed to generate content. The AI might be taking a nap. Try again!";
}

/// Generative content service configuration
pub mod content {
    /// Model used when none is configured
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
    /// API root used when none is configured
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    /// Request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    /// Sampling temperature for trivia cards
    pub const CARD_TEMPERATURE: f32 = 0.9;
    /// Sampling temperature for bluffs, kept higher for more variety
    pub const FAKES_TEMPERATURE: f32 = 1.0;
    /// Number of bluffs requested per round
    pub const FAKES_COUNT: usize = 3;
}
