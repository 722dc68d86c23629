//! Generative content service
//!
//! Trivia cards and bluff answers are produced by a hosted language model.
//! This module defines the [`ContentService`] contract the game flows call
//! and a [`GeminiService`] implementation that shapes the prompt and
//! response schema, performs the request, and parses the JSON reply.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use async_trait::async_trait;
use garde::Validate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    constants::{
        bluff::FALLBACK_FAKES,
        content::{
            CARD_TEMPERATURE, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
            FAKES_COUNT, FAKES_TEMPERATURE,
        },
    },
    trivia::TriviaCard,
};

/// Errors returned by a content service
#[derive(Debug, Error)]
pub enum Error {
    /// No credential was configured
    #[error("no API key configured")]
    MissingApiKey,
    /// The request could not be sent or its body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status
    #[error("content service returned {status}: {body}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },
    /// The service answered without any generated text
    #[error("no text returned from content service")]
    Empty,
    /// The generated text is not the requested JSON shape
    #[error("invalid response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The generated JSON parsed but is unusable
    #[error("invalid content: {0}")]
    InvalidContent(#[from] garde::Report),
    /// The service returned no bluffs
    #[error("no fake answers returned")]
    NoFakes,
}

/// Source of trivia cards and bluff answers
///
/// Implementations may paper over their own upstream failures (see
/// [`GeminiService::generate_fakes`]), but callers must still handle `Err`.
/// Browser builds use futures that are not `Send`.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ContentService: Send + Sync {
    /// Generates one trivia card
    async fn generate_card(&self) -> Result<TriviaCard, Error>;

    /// Generates bluffs that blend in with a player's real answer
    async fn generate_fakes(
        &self,
        question: &str,
        real_answer: &str,
    ) -> Result<Vec<String>, Error>;
}

/// The bluffs used when generation fails
pub fn fallback_fakes() -> Vec<String> {
    FALLBACK_FAKES.iter().map(ToString::to_string).collect()
}

const SYSTEM_INSTRUCTION: &str = "\
You are a creative game content generator for a trivia and bluffing game designed for a modern college and teen audience. Your task is to provide exactly one set of complete game content per request.

Core Content Requirements:
1. Audience & Tone: The content must be funny, bizarre, and highly relatable to young adults (college students and teenagers).
2. Safety: The content must be strictly SFW (Safe For Work) and contain absolutely no sexually explicit or harmful material.
3. Obscurity: The fact must be obscure or strange enough to encourage players to submit clever, believable fake answers.
4. Topics: Focus on subjects relevant to this audience (e.g., Internet Slang, Modern Digital/Social Norms, Academic Stress, Strange Food/Dorm Life, Obscure Pop Culture).";

const CARD_PROMPT: &str = "Generate a new obscure trivia card.";

fn card_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "category": {
                "type": "STRING",
                "description": "The funny and relatable category of the question (e.g., 'Modern Slang', 'Dorm History')",
            },
            "question": {
                "type": "STRING",
                "description": "The weird question relevant to young adults that requires a specific and strange answer",
            },
            "real_answer": {
                "type": "STRING",
                "description": "The single, correct, and often strange answer",
            },
        },
        "required": ["category", "question", "real_answer"],
    })
}

fn fakes_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fakes": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Three funny, believable fake answers that match the tone and length of the real answer.",
            },
        },
        "required": ["fakes"],
    })
}

/// Builds the prompt asking for bluffs to a player's answer
pub fn fakes_prompt(question: &str, real_answer: &str) -> String {
    format!(
        "Context: A personal bluffing game for teens/young adults.\n\
         Question: \"{question}\"\n\
         Real Answer provided by player: \"{real_answer}\"\n\
         \n\
         Task: Generate {FAKES_COUNT} creative, funny, and plausible fake answers (bluffs) that blend in with the real answer.\n\
         The fakes should be similar in style, length, and tone to the real answer so they are hard to distinguish."
    )
}

/// Gemini service configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Credential sent with every request
    pub api_key: String,
    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,
    /// API root without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds, ignored in browser builds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Creates a configuration with the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for GeminiConfig {
    /// Reads `API_KEY` (or `GEMINI_API_KEY`), `GEMINI_MODEL` and
    /// `GEMINI_BASE_URL` from the environment
    ///
    /// Browser builds have no environment and should use
    /// [`GeminiConfig::new`] instead.
    fn default() -> Self {
        let api_key = std::env::var("API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .unwrap_or_default();
        Self {
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ..Self::new(api_key)
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct FakesPayload {
    fakes: Vec<String>,
}

/// Concatenates the text parts of the first candidate
fn response_text(response: GenerateResponse) -> Result<String, Error> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        Err(Error::Empty)
    } else {
        Ok(text)
    }
}

/// Parses generated text as a trivia card
///
/// # Errors
///
/// Returns an error if the text is not a card object or any field is blank.
pub fn parse_card(text: &str) -> Result<TriviaCard, Error> {
    let card: TriviaCard = serde_json::from_str(text)?;
    card.validate()?;
    Ok(card)
}

/// Parses generated text as a list of bluffs
///
/// Blank entries are dropped.
///
/// # Errors
///
/// Returns an error if the text is not a `fakes` object or holds no bluffs.
pub fn parse_fakes(text: &str) -> Result<Vec<String>, Error> {
    let FakesPayload { fakes } = serde_json::from_str(text)?;
    let fakes: Vec<String> = fakes
        .into_iter()
        .map(|f| f.trim().to_owned())
        .filter(|f| !f.is_empty())
        .collect();
    if fakes.is_empty() {
        return Err(Error::NoFakes);
    }
    Ok(fakes)
}

/// Content service backed by the Gemini `generateContent` endpoint
pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
}

impl GeminiService {
    /// Creates a service from a configuration
    ///
    /// # Errors
    ///
    /// * `Error::MissingApiKey` - The configuration has no credential
    /// * `Error::Http` - The HTTP client could not be built
    pub fn new(config: GeminiConfig) -> Result<Self, Error> {
        if config.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        let client = builder.build()?;

        info!(model = %config.model, base_url = %config.base_url, "GeminiService initialized");

        Ok(Self { client, config })
    }

    /// Creates a service configured from the environment
    ///
    /// # Errors
    ///
    /// See [`GeminiService::new`].
    pub fn from_env() -> Result<Self, Error> {
        Self::new(GeminiConfig::default())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Runs one schema-constrained generation and returns the raw JSON text
    async fn generate(
        &self,
        prompt: &str,
        schema: Value,
        temperature: f32,
    ) -> Result<String, Error> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature,
            },
        };

        let url = self.endpoint();
        debug!(%url, temperature, "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Gemini API error");
            return Err(Error::Status { status, body });
        }

        let text = response_text(response.json().await?)?;
        debug!(chars = text.len(), "Gemini response received");
        Ok(text)
    }

    async fn request_fakes(&self, question: &str, real_answer: &str) -> Result<Vec<String>, Error> {
        let text = self
            .generate(
                &fakes_prompt(question, real_answer),
                fakes_schema(),
                FAKES_TEMPERATURE,
            )
            .await?;
        parse_fakes(&text)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ContentService for GeminiService {
    async fn generate_card(&self) -> Result<TriviaCard, Error> {
        let text = self
            .generate(CARD_PROMPT, card_schema(), CARD_TEMPERATURE)
            .await
            .inspect_err(|e| error!(error = %e, "Error generating trivia"))?;
        parse_card(&text).inspect_err(|e| error!(error = %e, "Error generating trivia"))
    }

    /// Requests bluffs, substituting [`fallback_fakes`] for any failure
    async fn generate_fakes(
        &self,
        question: &str,
        real_answer: &str,
    ) -> Result<Vec<String>, Error> {
        match self.request_fakes(question, real_answer).await {
            Ok(fakes) => Ok(fakes),
            Err(e) => {
                error!(error = %e, "Error generating fakes, using fallback");
                Ok(fallback_fakes())
            }
        }
    }
}
