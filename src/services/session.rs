// Detector Session
// Transient state behind the interactive surface: the active content kind,
// the draft input, and the outcome of the last submission.

use std::mem;

use crate::models::{AnalysisResult, ContentKind, DetectorStatus};

use super::media::MediaPayload;
use super::providers::InferenceBoundary;
use super::report::render_report;
use super::request_spec::{AnalysisRequest, PreconditionError, DEFAULT_MIN_TEXT_CHARS};
use super::verification::{VerificationClient, VerificationError};

/// One user's scan session. Holds at most one outstanding submission: `analyze`
/// borrows the session mutably for the whole call, so overlapping submissions
/// cannot be expressed and results are applied in call order.
#[derive(Debug, Clone)]
pub struct DetectorSession {
    kind: ContentKind,
    text: String,
    media: Option<MediaPayload>,
    status: DetectorStatus,
    result: Option<AnalysisResult>,
    error: Option<String>,
    min_text_chars: usize,
}

impl Default for DetectorSession {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TEXT_CHARS)
    }
}

/// Marks the session as analyzing and puts the previous status back if the
/// submission future is dropped before `finish`.
struct InFlight<'a> {
    status: &'a mut DetectorStatus,
    previous: Option<DetectorStatus>,
}

impl<'a> InFlight<'a> {
    fn begin(status: &'a mut DetectorStatus) -> Self {
        let previous = mem::replace(status, DetectorStatus::Analyzing);
        Self {
            status,
            previous: Some(previous),
        }
    }

    fn finish(mut self) {
        self.previous = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.status = previous;
        }
    }
}

impl DetectorSession {
    pub fn new(min_text_chars: usize) -> Self {
        Self {
            kind: ContentKind::Text,
            text: String::new(),
            media: None,
            status: DetectorStatus::Idle,
            result: None,
            error: None,
            min_text_chars,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn status(&self) -> DetectorStatus {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn media(&self) -> Option<&MediaPayload> {
        self.media.as_ref()
    }

    /// The displayed result; only present after a successful submission.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self.status {
            DetectorStatus::Success => self.result.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self.status {
            DetectorStatus::Error => self.error.as_deref(),
            _ => None,
        }
    }

    /// Switch input tab. Any displayed outcome is cleared; drafts are kept.
    pub fn set_kind(&mut self, kind: ContentKind) {
        self.kind = kind;
        self.clear_outcome();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_media(&mut self, media: Option<MediaPayload>) {
        self.media = media;
        self.clear_outcome();
    }

    /// Whether the submit action is enabled for the active kind.
    pub fn can_submit(&self) -> bool {
        self.status != DetectorStatus::Analyzing && self.build_request().is_ok()
    }

    /// Request for the active kind, with its client-side input rules applied.
    pub fn build_request(&self) -> Result<AnalysisRequest, PreconditionError> {
        let request = match self.kind {
            ContentKind::Text => AnalysisRequest::text(self.text.clone()),
            ContentKind::Image => {
                AnalysisRequest::image(self.media.clone().ok_or(PreconditionError::MissingPayload)?)
            }
            ContentKind::Video => {
                AnalysisRequest::video(self.media.clone().ok_or(PreconditionError::MissingPayload)?)
            }
        };
        request.check_preconditions(self.min_text_chars)?;
        Ok(request)
    }

    /// Submit the current input. A rejected precondition leaves the session
    /// untouched (the submit action is disabled); every other outcome moves
    /// the session to `Success` or `Error` and replaces the previous outcome.
    pub async fn analyze<B: InferenceBoundary>(
        &mut self,
        client: &VerificationClient<B>,
    ) -> Result<&AnalysisResult, VerificationError> {
        let request = self.build_request()?;

        let outcome = {
            let in_flight = InFlight::begin(&mut self.status);
            let outcome = client.submit(request).await;
            in_flight.finish();
            outcome
        };

        match outcome {
            Ok(result) => {
                self.error = None;
                self.status = DetectorStatus::Success;
                Ok(&*self.result.insert(result))
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e.to_string());
                self.status = DetectorStatus::Error;
                Err(e)
            }
        }
    }

    /// Clear all transient state back to idle.
    pub fn reset(&mut self) {
        self.text.clear();
        self.media = None;
        self.clear_outcome();
    }

    /// Plain-text export of the displayed result.
    pub fn report(&self) -> Option<String> {
        self.result().map(render_report)
    }

    /// One-line description of the pending input.
    pub fn input_summary(&self) -> String {
        match (self.kind, &self.media) {
            (ContentKind::Text, _) => format!("{} characters analyzed", self.text.chars().count()),
            (_, Some(media)) => format!(
                "File: {} ({} bytes)",
                media.name.as_deref().unwrap_or("unnamed"),
                media.len()
            ),
            (_, None) => "Awaiting secure upload".to_string(),
        }
    }

    fn clear_outcome(&mut self) {
        self.result = None;
        self.error = None;
        self.status = DetectorStatus::Idle;
    }
}
