use crate::error::FixError;
use crate::http_client::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
use crate::request::GenerationParams;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Overrides [`GEMINI_API_BASE`], e.g. for a proxy.
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

pub const MOCK_ENV: &str = "FK_USE_MOCK";
pub const MOCK_RESPONSE_ENV: &str = "FK_MOCK_RESPONSE";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<TransportError> for GenerationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(limit) => GenerationError::Timeout(limit),
            TransportError::Other(message) => GenerationError::Transport(message),
        }
    }
}

impl From<GenerationError> for FixError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(limit) => FixError::ServiceTimeout(limit),
            other => FixError::Service(other.to_string()),
        }
    }
}

/// A text generation capability: given a prompt and parameters, returns the
/// generated text or fails. Called at most once per fix request.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Generator backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiGenerator<H = ReqwestHttpClient> {
    http: H,
    api_key: String,
    base_url: String,
}

impl GeminiGenerator<ReqwestHttpClient> {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        let base_url = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| GEMINI_API_BASE.to_string());
        Self::with_client(ReqwestHttpClient::new(timeout), api_key, &base_url)
    }
}

impl<H: HttpClient> GeminiGenerator<H> {
    pub fn with_client(http: H, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn request_body(prompt: &str, params: &GenerationParams) -> serde_json::Value {
        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": params.temperature(),
                "maxOutputTokens": params.max_output_tokens()
            }
        })
    }

    /// Turns a completed exchange into generated text.
    ///
    /// A successful response without candidate text (for example a blocked
    /// prompt) yields an empty string rather than an error.
    fn read_response(response: HttpResponse) -> Result<String, GenerationError> {
        if !response.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
                .map(|envelope| {
                    if envelope.error.status.is_empty() {
                        envelope.error.message
                    } else {
                        format!("{} ({})", envelope.error.message, envelope.error.status)
                    }
                })
                .unwrap_or_else(|_| response.body.trim().to_string());
            warn!("Gemini API returned HTTP {}", response.status);
            return Err(GenerationError::Status {
                status: response.status,
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            warn!("Gemini response contained no candidate text");
        }
        Ok(text)
    }
}

#[async_trait]
impl<H: HttpClient> TextGenerator for GeminiGenerator<H> {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let url = self.endpoint(params.model());
        info!(
            "Requesting fix from {} (temperature={}, max_output_tokens={})",
            params.model(),
            params.temperature(),
            params.max_output_tokens()
        );

        let headers = [
            ("x-goog-api-key", self.api_key.as_str()),
            ("content-type", "application/json"),
        ];
        let response = self
            .http
            .post_json(&url, &headers, &Self::request_body(prompt, params))
            .await?;

        let text = Self::read_response(response)?;
        debug!("Gemini returned {} bytes of text", text.len());
        Ok(text)
    }
}

/// What a [`MockGenerator`] answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Pattern-matched responses keyed on the failed command.
    Canned,
    /// Always return this text.
    Fixed(String),
    /// Always fail as if the service were unreachable.
    Fail,
}

/// Offline generator used when `FK_USE_MOCK` is set.
pub struct MockGenerator {
    behavior: MockBehavior,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self { behavior }
    }

    /// Builds a mock from `FK_USE_MOCK` / `FK_MOCK_RESPONSE`, or `None` when
    /// mock mode is off.
    pub fn from_env() -> Option<Self> {
        let mode = std::env::var(MOCK_ENV).ok()?;
        let behavior = if mode.eq_ignore_ascii_case("fail") {
            MockBehavior::Fail
        } else if let Ok(text) = std::env::var(MOCK_RESPONSE_ENV) {
            MockBehavior::Fixed(text)
        } else {
            MockBehavior::Canned
        };
        info!("Using mock generator ({}={})", MOCK_ENV, mode);
        Some(Self::new(behavior))
    }

    fn fenced_last_command(prompt: &str) -> &str {
        prompt
            .split_once("last_command: ```")
            .and_then(|(_, rest)| rest.split_once("```\nerror_output"))
            .map(|(command, _)| command.trim())
            .unwrap_or("")
    }

    pub fn canned_response(prompt: &str) -> String {
        let last_command = Self::fenced_last_command(prompt);
        let program = last_command.split_whitespace().next().unwrap_or("");

        let (command, reason) = match program {
            "ls" => ("dir".to_string(), "ls is not a Windows command".to_string()),
            "cat" => (
                last_command.replacen("cat", "Get-Content", 1),
                "Use Get-Content to print files in PowerShell".to_string(),
            ),
            "gti" => (
                last_command.replacen("gti", "git", 1),
                "Typo in git".to_string(),
            ),
            "sudo" => (
                last_command.trim_start_matches("sudo").trim().to_string(),
                "sudo is not available; run the command in an elevated shell instead".to_string(),
            ),
            "" => (String::new(), "Nothing to fix".to_string()),
            _ => {
                return format!(
                    "I am not sure how to fix `{}` without more context.",
                    last_command
                );
            }
        };

        format!(
            "Here is the fix:\n{}\nHope that helps!",
            json!({ "command": command, "reason": reason })
        )
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        match &self.behavior {
            MockBehavior::Canned => Ok(Self::canned_response(prompt)),
            MockBehavior::Fixed(text) => Ok(text.clone()),
            MockBehavior::Fail => Err(GenerationError::Transport(
                "mock generator configured to fail".to_string(),
            )),
        }
    }
}
