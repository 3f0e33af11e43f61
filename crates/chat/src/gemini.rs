use crate::conversation::{build_contents, load_system_instruction};
use crate::{ChatError, Result};
use codedesk_protocol::{ChatRequest, ContentPart, ConversationTurn};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(600);

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    /// Text file holding the system instruction, re-read on every request.
    pub prompt_file: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            prompt_file: PathBuf::from("prompt.txt"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<ConversationTurn>,
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

/// Forwards one conversation per call to the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct ChatBridge {
    client: Client,
    config: ChatConfig,
}

impl ChatBridge {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    pub async fn build_request(&self, request: ChatRequest) -> GenerateContentRequest {
        let system_text = load_system_instruction(&self.config.prompt_file).await;
        GenerateContentRequest {
            contents: build_contents(request),
            system_instruction: SystemInstruction {
                parts: vec![ContentPart::text(system_text)],
            },
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        }
    }

    /// Send the conversation and return the first text part of the first candidate.
    ///
    /// No retries: a non-success status surfaces as [`ChatError::Provider`] with the raw body.
    pub async fn chat(&self, request: ChatRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ChatError::MissingApiKey)?;

        let payload = self.build_request(request).await;
        let body = serde_json::to_vec(&payload)?;
        log::debug!(
            "Sending {} turns to {} ({} bytes)",
            payload.contents.len(),
            self.config.model,
            body.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("Provider returned HTTP {status}");
            return Err(ChatError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_reply(&text)
    }
}

/// Pull `candidates[0].content.parts[*].text` out of a provider response body.
pub fn extract_reply(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::MalformedResponse("no candidates".to_string()))?;
    let content = candidate
        .content
        .ok_or_else(|| ChatError::MalformedResponse("candidate has no content".to_string()))?;

    content
        .parts
        .iter()
        .find_map(ContentPart::as_text)
        .map(str::to_string)
        .ok_or_else(|| ChatError::MalformedResponse("candidate has no text part".to_string()))
}
