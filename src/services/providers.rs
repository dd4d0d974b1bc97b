// Inference Provider Service
// Opaque request/response boundary to the multimodal model (Gemini REST API)

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use super::config_store::{AppConfig, ConfigStore};

pub const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Environment variables checked for the credential, in order
const API_KEY_ENV_VARS: [&str; 3] = ["VERITEXT_API_KEY", "GEMINI_API_KEY", "API_KEY"];
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
}

// ============ Provider-agnostic Call ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A model identifier, ordered content parts and the schema the structured
/// response must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceCall {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub response_schema: Value,
}

/// The external inference capability. Implementations return the model's
/// structured payload as raw text; validating it is the caller's job.
pub trait InferenceBoundary: Send + Sync {
    fn generate(
        &self,
        call: &InferenceCall,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

// ============ Gemini Wire Format ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text { text: &'a str },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineBlob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineBlob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

fn build_request(call: &InferenceCall) -> GenerateContentRequest<'_> {
    let parts = call
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => WirePart::Text {
                text: text.as_str(),
            },
            ContentPart::InlineData { mime_type, data } => WirePart::Inline {
                inline_data: InlineBlob {
                    mime_type: mime_type.as_str(),
                    data: STANDARD.encode(data),
                },
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![WireContent { role: "user", parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: &call.response_schema,
        },
    }
}

/// Pull the model's text out of a `generateContent` envelope:
/// `{"candidates":[{"content":{"parts":[{"text":"..."}]}}]}`.
/// Thought parts are skipped; remaining text parts are concatenated.
pub fn extract_payload(envelope: &Value) -> Result<String, ProviderError> {
    let parts = envelope["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(ProviderError::MissingContent)?;

    let text: String = parts
        .iter()
        .filter(|p| p.get("thought").and_then(Value::as_bool) != Some(true))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::MissingContent);
    }
    Ok(text)
}

fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    if body.chars().count() > ERROR_BODY_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

// ============ Gemini Client ============

pub struct GeminiBoundary {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiBoundary {
    pub fn new(api_key: impl Into<String>, config: &AppConfig) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        match &config.proxy {
            Some(proxy) if proxy.enabled => {
                if let Some(url) = proxy.url.as_deref().filter(|u| !u.trim().is_empty()) {
                    builder = builder.proxy(reqwest::Proxy::all(url)?);
                }
            }
            Some(_) => builder = builder.no_proxy(),
            None => {}
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn map_transport(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::HttpError(e)
        }
    }
}

impl InferenceBoundary for GeminiBoundary {
    async fn generate(&self, call: &InferenceCall) -> Result<String, ProviderError> {
        let request = build_request(call);
        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint(&call.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                latency_ms,
                "[PROVIDER] generateContent returned non-success status"
            );
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let envelope: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::JsonError(e.to_string())
            }
        })?;

        debug!(model = %call.model, latency_ms, "[PROVIDER] generateContent ok");
        extract_payload(&envelope)
    }
}

/// First non-empty credential from the environment
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|name| {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Get API key from environment or config file
pub fn get_api_key(store: Option<&ConfigStore>) -> Option<String> {
    if let Some(key) = api_key_from_env() {
        return Some(key);
    }

    match store {
        Some(store) => store.get_api_key().ok().flatten(),
        None => ConfigStore::default_config_dir()
            .map(ConfigStore::new)
            .and_then(|s| s.get_api_key().ok().flatten()),
    }
}
