// VeriText Data Models
// Shapes shared by the verification client, the session and the report export

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============ Content Kinds ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Video,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Text, ContentKind::Image, ContentKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
        }
    }

    /// MIME family prefix a media payload must carry for this kind.
    /// Text has no binary payload and therefore no family.
    pub fn mime_family(&self) -> Option<&'static str> {
        match self {
            ContentKind::Text => None,
            ContentKind::Image => Some("image/"),
            ContentKind::Video => Some("video/"),
        }
    }

    pub fn is_media(&self) -> bool {
        self.mime_family().is_some()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "image" => Ok(ContentKind::Image),
            "video" => Ok(ContentKind::Video),
            other => Err(format!("unknown content kind: {}", other)),
        }
    }
}

// ============ Highlights ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Ai,
    Human,
    Mixed,
}

impl HighlightKind {
    /// Case-insensitive parse of the wire label (`ai`, `human`, `mixed`).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "ai" => Some(HighlightKind::Ai),
            "human" => Some(HighlightKind::Human),
            "mixed" => Some(HighlightKind::Mixed),
            _ => None,
        }
    }

    /// Upper-case label used by the report export.
    pub fn label(&self) -> &'static str {
        match self {
            HighlightKind::Ai => "AI",
            HighlightKind::Human => "HUMAN",
            HighlightKind::Mixed => "MIXED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    /// Quoted excerpt for text, or a description of the visual region
    pub text: String,
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

// ============ Analysis Result ============

/// Forensic sub-metrics. Every numeric metric is optional: an absent metric
/// was not measured, which is not the same as a measured zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<f64>,
    pub structure: String,
}

/// A validated, normalized verdict.
///
/// Only produced by `services::validation::parse_analysis`. There is no
/// `Deserialize` impl: raw provider payloads must pass the response contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// 0 = fully human, 100 = fully AI
    pub score: u8,
    pub verdict: String,
    pub summary: String,
    pub details: AnalysisDetails,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    LikelyHuman,
    Inconclusive,
    LikelyAi,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score < 30 {
            ScoreBand::LikelyHuman
        } else if score < 70 {
            ScoreBand::Inconclusive
        } else {
            ScoreBand::LikelyAi
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::LikelyHuman => "likely human",
            ScoreBand::Inconclusive => "inconclusive",
            ScoreBand::LikelyAi => "likely AI",
        }
    }
}

impl AnalysisResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

// ============ Detector Status ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectorStatus {
    #[default]
    Idle,
    Analyzing,
    Success,
    Error,
}
