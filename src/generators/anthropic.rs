use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::data::{ConversationTurn, GenerationConfig, GenerationError, Generator};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Blocking client for the Anthropic Messages API
pub struct AnthropicGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    api_url: String,
}

impl AnthropicGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| GenerationError::Authentication(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl Generator for AnthropicGenerator {
    fn generate(
        &mut self,
        transcript: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.api_url)
            .headers(self.headers()?)
            .json(&request_body(transcript, config))
            .send()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| GenerationError::Network(format!("Failed to read response body: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }

        parse_response(&body)
    }
}

fn request_body(transcript: &[ConversationTurn], config: &GenerationConfig) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = transcript
        .iter()
        .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content }))
        .collect();

    json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "temperature": config.temperature,
        "messages": messages,
    })
}

fn classify_status(status: u16, body: &str) -> GenerationError {
    let detail = format!("HTTP {}: {}", status, body.trim());
    match status {
        401 | 403 => GenerationError::Authentication(detail),
        429 => GenerationError::RateLimit(detail),
        _ => GenerationError::Api(detail),
    }
}

fn parse_response(body: &str) -> Result<String, GenerationError> {
    let parsed: MessagesResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(GenerationError::Parse("response contained no text".to_string()));
    }
    Ok(text)
}
