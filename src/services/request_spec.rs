// Request Specs
// Maps each content kind to its forensic checklist and builds the
// provider-agnostic inference call for a submission.

use thiserror::Error;

use crate::models::ContentKind;

use super::media::{mime_essence, MediaPayload};
use super::providers::{ContentPart, InferenceCall};
use super::schema::analysis_schema;

/// Minimum text length (Unicode scalar count) before a text submission is allowed
pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;

const OUTPUT_INSTRUCTIONS: &str = "Return only JSON matching the provided response schema. \
`score` is the probability that the content is AI-generated, from 0 (fully human) to 100 (fully AI). \
`verdict` is a short label, `summary` explains the judgment, `details.structure` describes the overall \
structure you observed, and each highlight cites an excerpt or visual region with a reason and a type of ai, human or mixed.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Please enter some text to analyze")]
    EmptyText,
    #[error("Text is too short to analyze: {actual} characters, at least {min} required")]
    TextTooShort { min: usize, actual: usize },
    #[error("Please upload a file first")]
    MissingPayload,
    #[error("The uploaded file has no recognizable media type")]
    MissingMimeType,
    #[error("Unsupported media type `{mime}` for {kind} analysis")]
    UnsupportedMimeType { kind: ContentKind, mime: String },
}

// ============ Forensic Checklists ============

/// Static, per-kind instruction set sent to the inference provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpec {
    pub kind: ContentKind,
    pub role: &'static str,
    pub task: &'static str,
    pub checklist: &'static [&'static str],
}

const TEXT_SPEC: RequestSpec = RequestSpec {
    kind: ContentKind::Text,
    role: "Act as a forensic linguist.",
    task: "Analyze whether the following text was generated by an AI model.",
    checklist: &[
        "Low burstiness: little variation in sentence length and rhythm.",
        "Repetitive sentence structures and phrasing patterns.",
        "Stock transition phrases and other typical LLM markers.",
    ],
};

const IMAGE_SPEC: RequestSpec = RequestSpec {
    kind: ContentKind::Image,
    role: "Act as a digital forensics expert.",
    task: "Analyze this image for signs of AI generation:",
    checklist: &[
        "Inconsistent lighting or shadows.",
        "Anatomical errors (fingers, eyes, teeth).",
        "Strange textures in hair or backgrounds.",
        "Nonsensical embedded text or signage.",
        "Unnatural smoothness instead of natural camera sensor noise.",
    ],
};

const VIDEO_SPEC: RequestSpec = RequestSpec {
    kind: ContentKind::Video,
    role: "Act as a video forensics specialist.",
    task: "Based on this frame or clip, detect signs of AI synthesis (deepfakes, text-to-video models):",
    checklist: &[
        "Temporal flickering or morphing of objects.",
        "Unnatural physics or motion blur.",
        "Background consistency issues and drift.",
        "Synthetic facial expressions.",
    ],
};

pub fn request_spec(kind: ContentKind) -> &'static RequestSpec {
    match kind {
        ContentKind::Text => &TEXT_SPEC,
        ContentKind::Image => &IMAGE_SPEC,
        ContentKind::Video => &VIDEO_SPEC,
    }
}

impl RequestSpec {
    /// Full instruction block: role, task, checklist, then output rules.
    pub fn instructions(&self) -> String {
        let mut out = format!("{} {}\n", self.role, self.task);
        for item in self.checklist {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(OUTPUT_INSTRUCTIONS);
        out
    }
}

// ============ Analysis Request ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisPayload {
    Text(String),
    Media(MediaPayload),
}

/// One user submission. Built fresh per action and consumed by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    kind: ContentKind,
    payload: AnalysisPayload,
}

impl AnalysisRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            payload: AnalysisPayload::Text(text.into()),
        }
    }

    pub fn image(media: MediaPayload) -> Self {
        Self {
            kind: ContentKind::Image,
            payload: AnalysisPayload::Media(media),
        }
    }

    pub fn video(media: MediaPayload) -> Self {
        Self {
            kind: ContentKind::Video,
            payload: AnalysisPayload::Media(media),
        }
    }

    pub fn new(kind: ContentKind, payload: AnalysisPayload) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn payload(&self) -> &AnalysisPayload {
        &self.payload
    }

    /// Payload size for logging: characters for text, bytes for media.
    pub fn payload_size(&self) -> usize {
        match &self.payload {
            AnalysisPayload::Text(t) => t.chars().count(),
            AnalysisPayload::Media(m) => m.len(),
        }
    }

    /// Client-side input rules, checked before any network activity.
    pub fn check_preconditions(&self, min_text_chars: usize) -> Result<(), PreconditionError> {
        match (&self.payload, self.kind.mime_family()) {
            (AnalysisPayload::Text(text), None) => {
                if text.trim().is_empty() {
                    return Err(PreconditionError::EmptyText);
                }
                let actual = text.chars().count();
                if actual < min_text_chars {
                    return Err(PreconditionError::TextTooShort {
                        min: min_text_chars,
                        actual,
                    });
                }
                Ok(())
            }
            (AnalysisPayload::Media(media), Some(family)) => {
                if media.is_empty() {
                    return Err(PreconditionError::MissingPayload);
                }
                let mime = media
                    .mime_type
                    .as_deref()
                    .map(mime_essence)
                    .filter(|m| !m.is_empty())
                    .ok_or(PreconditionError::MissingMimeType)?;
                if !mime.starts_with(family) || mime.len() == family.len() {
                    return Err(PreconditionError::UnsupportedMimeType {
                        kind: self.kind,
                        mime,
                    });
                }
                Ok(())
            }
            // Payload shape disagrees with the declared kind
            (AnalysisPayload::Text(_), Some(_)) => Err(PreconditionError::MissingPayload),
            (AnalysisPayload::Media(_), None) => Err(PreconditionError::EmptyText),
        }
    }

    /// Turn the request into an inference call. Media parts precede the
    /// instruction block; text input follows its instructions in one part.
    pub fn into_call(self, model: &str) -> InferenceCall {
        let instructions = request_spec(self.kind).instructions();
        let parts = match self.payload {
            AnalysisPayload::Text(text) => {
                vec![ContentPart::Text(format!("{}\n\nInput:\n{}", instructions, text))]
            }
            AnalysisPayload::Media(media) => {
                let mime_type = media
                    .mime_type
                    .as_deref()
                    .map(mime_essence)
                    .unwrap_or_default();
                vec![
                    ContentPart::InlineData {
                        mime_type,
                        data: media.data,
                    },
                    ContentPart::Text(instructions),
                ]
            }
        };

        InferenceCall {
            model: model.to_string(),
            parts,
            response_schema: analysis_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text() -> String {
        "The quick brown fox jumps over the lazy dog near the riverbank today.".to_string()
    }

    #[test]
    fn test_each_kind_has_its_own_checklist() {
        let text = request_spec(ContentKind::Text).instructions();
        let image = request_spec(ContentKind::Image).instructions();
        let video = request_spec(ContentKind::Video).instructions();

        assert!(text.contains("burstiness"));
        assert!(image.contains("lighting or shadows"));
        assert!(image.contains("camera sensor noise"));
        assert!(video.contains("flickering"));
        assert!(video.contains("facial expressions"));
        assert!(!text.contains("shadows"));
        for block in [&text, &image, &video] {
            assert!(block.contains("response schema"));
        }
    }

    #[test]
    fn test_request_spec_kind_matches() {
        for kind in ContentKind::ALL {
            assert_eq!(request_spec(kind).kind, kind);
        }
    }

    #[test]
    fn test_short_text_rejected() {
        let req = AnalysisRequest::text("x".repeat(49));
        assert_eq!(
            req.check_preconditions(DEFAULT_MIN_TEXT_CHARS),
            Err(PreconditionError::TextTooShort { min: 50, actual: 49 })
        );
        let ok = AnalysisRequest::text("x".repeat(50));
        assert!(ok.check_preconditions(DEFAULT_MIN_TEXT_CHARS).is_ok());
    }

    #[test]
    fn test_text_length_counts_chars_not_bytes() {
        // 30 CJK characters are 90 bytes
        let req = AnalysisRequest::text("中".repeat(30));
        assert_eq!(
            req.check_preconditions(DEFAULT_MIN_TEXT_CHARS),
            Err(PreconditionError::TextTooShort { min: 50, actual: 30 })
        );
    }

    #[test]
    fn test_blank_text_rejected() {
        let req = AnalysisRequest::text("   \n\t ");
        assert_eq!(req.check_preconditions(1), Err(PreconditionError::EmptyText));
    }

    #[test]
    fn test_media_preconditions() {
        let empty = AnalysisRequest::image(MediaPayload::new(vec![], "image/png"));
        assert_eq!(empty.check_preconditions(50), Err(PreconditionError::MissingPayload));

        let no_mime = AnalysisRequest::video(MediaPayload::new(vec![1, 2], ""));
        assert_eq!(no_mime.check_preconditions(50), Err(PreconditionError::MissingMimeType));

        let wrong = AnalysisRequest::video(MediaPayload::new(vec![1, 2], "image/jpeg"));
        assert_eq!(
            wrong.check_preconditions(50),
            Err(PreconditionError::UnsupportedMimeType {
                kind: ContentKind::Video,
                mime: "image/jpeg".to_string()
            })
        );

        let bare_family = AnalysisRequest::image(MediaPayload::new(vec![1], "image/"));
        assert!(bare_family.check_preconditions(50).is_err());

        let ok = AnalysisRequest::image(MediaPayload::new(vec![1, 2], "Image/PNG"));
        assert!(ok.check_preconditions(50).is_ok());
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let req = AnalysisRequest::new(ContentKind::Image, AnalysisPayload::Text(long_text()));
        assert_eq!(req.check_preconditions(50), Err(PreconditionError::MissingPayload));
    }

    #[test]
    fn test_text_call_single_part() {
        let call = AnalysisRequest::text(long_text()).into_call("model-x");
        assert_eq!(call.model, "model-x");
        assert_eq!(call.parts.len(), 1);
        match &call.parts[0] {
            ContentPart::Text(t) => {
                assert!(t.starts_with("Act as a forensic linguist."));
                assert!(t.ends_with(&long_text()));
            }
            other => panic!("unexpected part: {:?}", other),
        }
        assert_eq!(call.response_schema["type"], "OBJECT");
    }

    #[test]
    fn test_media_call_puts_inline_data_first() {
        let media = MediaPayload::new(vec![9, 8, 7], "video/mp4; codecs=avc1");
        let call = AnalysisRequest::video(media).into_call("model-x");
        assert_eq!(call.parts.len(), 2);
        assert_eq!(
            call.parts[0],
            ContentPart::InlineData {
                mime_type: "video/mp4".to_string(),
                data: vec![9, 8, 7]
            }
        );
        match &call.parts[1] {
            ContentPart::Text(t) => assert!(t.contains("video forensics specialist")),
            other => panic!("unexpected part: {:?}", other),
        }
    }
}
