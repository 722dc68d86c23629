//! Shared round encoding for links
//!
//! A host shares a bluffing round by embedding it in the page URL. This
//! module defines that payload and converts it to and from a compact
//! URL-safe string. Decoding never trusts its input: anything that fails to
//! parse or violates the round invariants is rejected rather than coerced.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::constants::shared::{
    MAX_HOST_NAME_LENGTH, MAX_OPTION_COUNT, MAX_OPTION_LENGTH, MAX_QUESTION_LENGTH,
    MIN_OPTION_COUNT,
};

/// One answer presented for guessing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BluffOption {
    /// The answer text
    #[garde(length(max = MAX_OPTION_LENGTH))]
    pub text: String,
    /// Whether this is the player's true answer
    #[garde(skip)]
    pub is_real: bool,
}

impl BluffOption {
    /// The player's true answer
    pub fn real(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_real: true,
        }
    }

    /// A generated bluff
    pub fn fake(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_real: false,
        }
    }
}

/// Everything a second browser needs to vote on a host's round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SharedGameData {
    /// The personalized round question
    #[garde(length(min = 1, max = MAX_QUESTION_LENGTH))]
    pub question: String,
    /// Shuffled options, exactly one of them real
    #[garde(
        length(min = MIN_OPTION_COUNT, max = MAX_OPTION_COUNT),
        custom(|v, _| validate_single_real(v)),
        dive
    )]
    pub options: Vec<BluffOption>,
    /// Display name of the player the round is about
    #[garde(length(max = MAX_HOST_NAME_LENGTH))]
    pub host_name: String,
}

impl SharedGameData {
    /// Index of the real option
    pub fn real_index(&self) -> Option<usize> {
        self.options.iter().positions(|o| o.is_real).exactly_one().ok()
    }
}

/// Checks that a set of options carries exactly one truth
fn validate_single_real(options: &[BluffOption]) -> garde::Result {
    match options.iter().filter(|o| o.is_real).count() {
        1 => Ok(()),
        n => Err(garde::Error::new(format!(
            "expected exactly one real option, found {n}"
        ))),
    }
}

/// Errors that can occur while decoding a shared round
#[derive(Error, Debug)]
pub enum Error {
    /// The text is not valid base64
    #[error("shared data is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The decoded bytes are not a round payload
    #[error("shared data is not a valid round: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload parsed but breaks the round invariants
    #[error("shared round is invalid: {0}")]
    Invalid(#[from] garde::Report),
}

/// Encodes a round as URL-safe text
///
/// The round is checked against the same rules [`decode`] applies, so
/// anything this returns can be opened by another browser.
///
/// # Errors
///
/// * `Error::Invalid` - The round breaks the round invariants
/// * `Error::Json` - The round could not be serialized
pub fn encode(data: &SharedGameData) -> Result<String, Error> {
    data.validate()?;
    let json = serde_json::to_vec(data)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a round produced by [`encode`]
///
/// Links made with the standard padded alphabet are accepted as well.
///
/// # Errors
///
/// Returns an [`Error`] if the text is malformed, truncated, not JSON, or
/// describes a round without exactly one real option.
pub fn decode(encoded: &str) -> Result<SharedGameData, Error> {
    let encoded = encoded.trim();
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .or_else(|_| STANDARD.decode(encoded))?;
    let data: SharedGameData = serde_json::from_slice(&bytes)?;
    data.validate()?;
    Ok(data)
}

/// Decodes a round, treating any failure as "no shared round"
pub fn decode_or_none(encoded: &str) -> Option<SharedGameData> {
    decode(encoded)
        .inspect_err(|e| warn!(error = %e, "Failed to parse shared game data"))
        .ok()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn encode_unchecked(data: &SharedGameData) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(data).unwrap())
    }

    fn sample() -> SharedGameData {
        SharedGameData {
            question: "If Ari started a cult, what would be the main rule?".to_string(),
            options: vec![
                BluffOption::fake("No socks indoors"),
                BluffOption::real("Mandatory naps"),
                BluffOption::fake("Only speak in memes"),
                BluffOption::fake("Pineapple on everything"),
            ],
            host_name: "Ari".to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        let encoded = encode(&data).unwrap();
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_round_trip_unicode() {
        let data = SharedGameData {
            question: "¿Qué haría Zoë? 🤔".to_string(),
            options: vec![BluffOption::real("Ñam ñam"), BluffOption::fake("日本語")],
            host_name: "Zoë".to_string(),
        };
        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_encoded_is_url_safe() {
        let encoded = encode(&sample()).unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"hostName\":\"Ari\""));
        assert!(json.contains("\"isReal\":true"));
    }

    #[test]
    fn test_decode_standard_padded() {
        let json = serde_json::to_vec(&sample()).unwrap();
        let encoded = STANDARD.encode(json);
        assert_eq!(decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("!!!not base64!!!"), Err(Error::Encoding(_))));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = encode(&sample()).unwrap();
        let truncated = &encoded[..encoded.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_decode_not_json() {
        let encoded = URL_SAFE_NO_PAD.encode("hello there");
        assert!(matches!(decode(&encoded), Err(Error::Json(_))));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let encoded = URL_SAFE_NO_PAD.encode(r#"{"question":"Q","options":"nope","hostName":"H"}"#);
        assert!(matches!(decode(&encoded), Err(Error::Json(_))));
    }

    #[test]
    fn test_decode_rejects_no_real_option() {
        let mut data = sample();
        for option in &mut data.options {
            option.is_real = false;
        }
        assert!(matches!(decode(&encode_unchecked(&data)), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_decode_rejects_two_real_options() {
        let mut data = sample();
        data.options[0].is_real = true;
        assert!(matches!(decode(&encode_unchecked(&data)), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_decode_rejects_empty_question() {
        let mut data = sample();
        data.question.clear();
        assert!(matches!(decode(&encode_unchecked(&data)), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_decode_rejects_single_option() {
        let data = SharedGameData {
            question: "Q".to_string(),
            options: vec![BluffOption::real("A")],
            host_name: "H".to_string(),
        };
        assert!(matches!(decode(&encode_unchecked(&data)), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_encode_rejects_what_decode_rejects() {
        let mut data = sample();
        data.options[0].is_real = true;
        assert!(matches!(encode(&data), Err(Error::Invalid(_))));

        let mut data = sample();
        data.options[0].text = "a".repeat(MAX_OPTION_LENGTH + 1);
        assert!(matches!(encode(&data), Err(Error::Invalid(_))));

        let mut data = sample();
        data.options.extend((0..5).map(|i| BluffOption::fake(format!("Extra {i}"))));
        assert_eq!(data.options.len(), MAX_OPTION_COUNT + 1);
        assert!(matches!(encode(&data), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_encode_at_limits() {
        let mut data = sample();
        data.options[1].text = "a".repeat(MAX_OPTION_LENGTH);
        data.options.extend((0..4).map(|i| BluffOption::fake(format!("Extra {i}"))));
        assert_eq!(data.options.len(), MAX_OPTION_COUNT);
        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_decode_or_none() {
        assert_eq!(decode_or_none("%%%"), None);
        assert_eq!(decode_or_none(&encode(&sample()).unwrap()), Some(sample()));
    }

    #[test]
    fn test_real_index() {
        assert_eq!(sample().real_index(), Some(1));
    }
}
