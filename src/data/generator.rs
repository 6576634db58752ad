use serde::Serialize;
use std::fmt;

use super::ConversationTurn;

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Sampling settings passed along with every generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Errors that can occur while asking the collaborator for a response
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    Network(String),
    Authentication(String),
    RateLimit(String),
    Api(String),
    Parse(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenerationError::Network(msg) => write!(f, "Network error: {}", msg),
            GenerationError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            GenerationError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            GenerationError::Api(msg) => write!(f, "API error: {}", msg),
            GenerationError::Parse(msg) => write!(f, "Failed to parse response: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<serde_json::Error> for GenerationError {
    fn from(e: serde_json::Error) -> Self {
        GenerationError::Parse(e.to_string())
    }
}

/// The text generation collaborator.
///
/// Receives the whole transcript (ending with the pending user turn) and
/// returns the assistant's reply. Calls are blocking.
pub trait Generator {
    fn generate(
        &mut self,
        transcript: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}
