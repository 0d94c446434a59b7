//! The secure line: relays a question to Gemini's `generateContent` API in
//! the assistant persona and keeps the transient chat transcript.

use std::fmt;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::Config;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const PERSONA: &str = "You are Vito Corelli's digital assistant. You are helpful, precise, and understated. \
You speak in a professional, slightly 'Noir' tone.";

pub const LINE_DOWN: &str = "Connection failed. Check your API Key and Server Console.";

/// Why a relay produced no reply. `Display` gives the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFailure {
    MissingKey,
    Severed(String),
}

impl fmt::Display for RelayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayFailure::MissingKey => f.write_str(
                "Error: API Key is missing in the safe (set relay.api_key or GEMINI_API_KEY)",
            ),
            RelayFailure::Severed(reason) => write!(f, "Connection severed: {reason}"),
        }
    }
}

impl std::error::Error for RelayFailure {}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

pub fn build_prompt(message: &str) -> String {
    format!("{PERSONA}\n\nThe Boss asks: {message}")
}

#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatRelay {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed building HTTP client for the chat relay")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Key from `relay.api_key`, else the `GEMINI_API_KEY` environment variable.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let api_key = cfg
            .get("relay.api_key")
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        let endpoint = cfg
            .get("relay.endpoint")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let model = cfg
            .get("relay.model")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(&endpoint, &model, api_key)
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Sends `message` wrapped in the persona prompt. Nothing is dispatched
    /// when no API key is configured.
    #[instrument(skip(self, message), fields(model = %self.model, chars = message.len()))]
    pub async fn relay(&self, message: &str) -> Result<String, RelayFailure> {
        let Some(key) = self.api_key.as_deref() else {
            error!("relay called without an API key");
            return Err(RelayFailure::MissingKey);
        };

        match self.dispatch(key, &build_prompt(message)).await {
            Ok(text) => {
                info!(chars = text.len(), "relay answered");
                Ok(text)
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "secure line failure");
                Err(RelayFailure::Severed(format!("{err:#}")))
            }
        }
    }

    async fn dispatch(&self, key: &str, prompt: &str) -> anyhow::Result<String> {
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };
        let url = self.url();
        debug!(url = %url, "dispatching generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed requesting {url}"))?
            .error_for_status()?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed decoding generateContent response")?;
        parsed
            .text()
            .ok_or_else(|| anyhow!("response carried no text"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Boss,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// Client-side transcript. Lives only as long as the widget.
#[derive(Debug, Clone, Default)]
pub struct SecureLine {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl SecureLine {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Appends the question and the reply. Blank input is ignored; any relay
    /// failure shows up as [`LINE_DOWN`].
    pub async fn send(&mut self, relay: &ChatRelay, input: &str) -> bool {
        if input.trim().is_empty() || self.pending {
            return false;
        }
        self.messages.push(ChatMessage {
            speaker: Speaker::Boss,
            text: input.to_string(),
        });

        self.pending = true;
        let reply = relay
            .relay(input)
            .await
            .unwrap_or_else(|_| LINE_DOWN.to_string());
        self.pending = false;

        self.messages.push(ChatMessage {
            speaker: Speaker::Assistant,
            text: reply,
        });
        true
    }
}
