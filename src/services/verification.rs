// Verification Client
// Turns a validated AnalysisRequest into one provider call and returns either
// a normalized AnalysisResult or a typed failure.

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::AnalysisResult;

use super::config_store::AppConfig;
use super::providers::{GeminiBoundary, InferenceBoundary, ProviderError, DEFAULT_MODEL};
use super::request_spec::{AnalysisRequest, PreconditionError, DEFAULT_MIN_TEXT_CHARS};
use super::validation::parse_analysis;

const DEFAULT_TIMEOUT_SECS: u64 = 80;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("{0}")]
    PreconditionFailed(#[from] PreconditionError),
    #[error("Verification service unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),
    #[error("The verification service returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("The verification service response is missing or has an invalid `{path}`: {reason}")]
    SchemaViolation { path: String, reason: String },
    #[error("Verification cancelled")]
    Cancelled,
}

impl VerificationError {
    /// Short category name for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            VerificationError::PreconditionFailed(_) => "precondition_failed",
            VerificationError::ProviderUnavailable(_) => "provider_unavailable",
            VerificationError::MalformedResponse(_) => "malformed_response",
            VerificationError::SchemaViolation { .. } => "schema_violation",
            VerificationError::Cancelled => "cancelled",
        }
    }
}

pub struct VerificationClient<B> {
    boundary: B,
    model: String,
    timeout: Duration,
    min_text_chars: usize,
}

impl<B: InferenceBoundary> VerificationClient<B> {
    pub fn new(boundary: B) -> Self {
        Self {
            boundary,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }

    pub fn with_config(boundary: B, config: &AppConfig) -> Self {
        Self::new(boundary)
            .with_model(config.model.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_min_text_chars(config.min_text_chars)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn min_text_chars(&self) -> usize {
        self.min_text_chars
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    /// Submit one request. Preconditions are checked before any network
    /// activity; failures are terminal and never retried here.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisResult, VerificationError> {
        let request_id = Uuid::new_v4();
        let kind = request.kind();
        let payload_size = request.payload_size();

        if let Err(e) = request.check_preconditions(self.min_text_chars) {
            warn!(%request_id, %kind, error = %e, "[VERIFY] precondition failed");
            return Err(e.into());
        }

        info!(%request_id, %kind, payload_size, model = %self.model, "[VERIFY] submitting");
        let call = request.into_call(&self.model);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.boundary.generate(&call)).await {
            Ok(Ok(raw)) => parse_analysis(&raw),
            Ok(Err(e)) => Err(VerificationError::ProviderUnavailable(e)),
            Err(_) => Err(VerificationError::ProviderUnavailable(ProviderError::Timeout(
                self.timeout.as_secs(),
            ))),
        };
        let latency_ms = started.elapsed().as_millis() as i64;

        match &outcome {
            Ok(result) => info!(
                %request_id,
                %kind,
                latency_ms,
                score = result.score,
                highlights = result.highlights.len(),
                "[VERIFY] analysis complete"
            ),
            Err(e) => warn!(
                %request_id,
                %kind,
                latency_ms,
                category = e.category(),
                error = %e,
                "[VERIFY] analysis failed"
            ),
        }

        outcome
    }

    /// Same as `submit`, but abandons the call as soon as `cancel` resolves.
    pub async fn submit_with_cancel<F>(
        &self,
        request: AnalysisRequest,
        cancel: F,
    ) -> Result<AnalysisResult, VerificationError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            outcome = self.submit(request) => outcome,
            _ = cancel => {
                info!("[VERIFY] submission cancelled by caller");
                Err(VerificationError::Cancelled)
            }
        }
    }
}

impl VerificationClient<GeminiBoundary> {
    /// Client backed by the Gemini REST boundary with an injected credential
    pub fn gemini(api_key: impl Into<String>, config: &AppConfig) -> Result<Self, ProviderError> {
        let boundary = GeminiBoundary::new(api_key, config)?;
        Ok(Self::with_config(boundary, config))
    }
}
