// Response Contract
// Strict validation and normalization of the provider's structured payload.
// Nothing reaches a caller unless every required field passed.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::models::{AnalysisDetails, AnalysisResult, Highlight, HighlightKind};

use super::verification::VerificationError;

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

fn code_fence() -> &'static Regex {
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
    })
}

/// Remove a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match code_fence().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Clamp a model score into 0..=100 (rounded to the nearest integer).
pub fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Clamp an optional detail metric into 0..=100.
pub fn clamp_metric(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

/// Parse, validate and normalize a raw payload into an `AnalysisResult`.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, VerificationError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(VerificationError::MalformedResponse(
            "empty payload".to_string(),
        ));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| VerificationError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    let root = value.as_object().ok_or_else(|| {
        VerificationError::MalformedResponse("top-level payload is not a JSON object".to_string())
    })?;

    let score = clamp_score(required_number(root, "score", "score")?);
    let verdict = required_text(root, "verdict", "verdict", true)?;
    let summary = required_text(root, "summary", "summary", false)?;
    let details = parse_details(root)?;
    let highlights = parse_highlights(root)?;

    Ok(AnalysisResult {
        score,
        verdict,
        summary,
        details,
        highlights,
    })
}

fn violation(path: impl Into<String>, reason: impl Into<String>) -> VerificationError {
    VerificationError::SchemaViolation {
        path: path.into(),
        reason: reason.into(),
    }
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, VerificationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(violation(path, "missing required field")),
        Some(v) => Ok(v),
    }
}

fn required_number(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<f64, VerificationError> {
    field(obj, key, path)?
        .as_f64()
        .ok_or_else(|| violation(path, "expected a number"))
}

fn required_text(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    non_empty: bool,
) -> Result<String, VerificationError> {
    let text = field(obj, key, path)?
        .as_str()
        .ok_or_else(|| violation(path, "expected a string"))?
        .trim();
    if non_empty && text.is_empty() {
        return Err(violation(path, "must not be empty"));
    }
    Ok(text.to_string())
}

fn optional_metric(obj: &Map<String, Value>, key: &str) -> Result<Option<f64>, VerificationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(|n| Some(clamp_metric(n)))
            .ok_or_else(|| violation(format!("details.{}", key), "expected a number")),
    }
}

fn parse_details(root: &Map<String, Value>) -> Result<AnalysisDetails, VerificationError> {
    let details = match root.get("details") {
        None | Some(Value::Null) => {
            return Err(violation("details.structure", "missing required field"))
        }
        Some(Value::Object(map)) => map,
        Some(_) => return Err(violation("details", "expected an object")),
    };

    let structure = required_text(details, "structure", "details.structure", true)?;

    Ok(AnalysisDetails {
        complexity: optional_metric(details, "complexity")?,
        predictability: optional_metric(details, "predictability")?,
        artifact_rating: optional_metric(details, "artifactRating")?,
        consistency_score: optional_metric(details, "consistencyScore")?,
        structure,
    })
}

fn parse_highlights(root: &Map<String, Value>) -> Result<Vec<Highlight>, VerificationError> {
    let items = match field(root, "highlights", "highlights")? {
        Value::Array(items) => items,
        _ => return Err(violation("highlights", "expected an array")),
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| parse_highlight(idx, item))
        .collect()
}

fn parse_highlight(idx: usize, item: &Value) -> Result<Highlight, VerificationError> {
    let path = format!("highlights[{}]", idx);
    let obj = item
        .as_object()
        .ok_or_else(|| violation(&path, "expected an object"))?;

    let text = required_text(obj, "text", &format!("{}.text", path), true)?;
    let reason = required_text(obj, "reason", &format!("{}.reason", path), true)?;
    let type_path = format!("{}.type", path);
    let label = required_text(obj, "type", &type_path, true)?;
    let kind = HighlightKind::parse(&label).ok_or_else(|| {
        violation(&type_path, format!("unknown highlight type `{}`", label))
    })?;

    Ok(Highlight { text, reason, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload(overrides: Value) -> String {
        let mut base = json!({
            "score": 72,
            "verdict": "Likely AI",
            "summary": "Uniform rhythm and stock transitions.",
            "details": {"structure": "linear", "complexity": 35},
            "highlights": [
                {"text": "In conclusion, it is important to note", "reason": "Stock transition", "type": "ai"}
            ]
        });
        if let (Some(base_map), Some(over)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in over {
                base_map.insert(k.clone(), v.clone());
            }
        }
        base.to_string()
    }

    fn schema_path(err: VerificationError) -> String {
        match err {
            VerificationError::SchemaViolation { path, .. } => path,
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_payload() {
        let result = parse_analysis(&payload(json!({}))).unwrap();
        assert_eq!(result.score, 72);
        assert_eq!(result.verdict, "Likely AI");
        assert_eq!(result.details.structure, "linear");
        assert_eq!(result.details.complexity, Some(35.0));
        assert_eq!(result.details.predictability, None);
        assert_eq!(result.highlights.len(), 1);
        assert_eq!(result.highlights[0].kind, HighlightKind::Ai);
    }

    #[test]
    fn test_score_above_range_clamps() {
        let raw = json!({
            "score": 145,
            "verdict": "AI",
            "summary": "...",
            "details": {"structure": "linear"},
            "highlights": []
        })
        .to_string();
        let result = parse_analysis(&raw).unwrap();
        assert_eq!(result.score, 100);
        assert!(result.highlights.is_empty());
    }

    #[test]
    fn test_negative_and_fractional_scores() {
        assert_eq!(parse_analysis(&payload(json!({"score": -12}))).unwrap().score, 0);
        assert_eq!(parse_analysis(&payload(json!({"score": 42.6}))).unwrap().score, 43);
    }

    #[test]
    fn test_missing_details_names_structure() {
        let raw = json!({
            "score": 10,
            "verdict": "Human",
            "summary": "Natural sensor noise.",
            "highlights": []
        })
        .to_string();
        let err = parse_analysis(&raw).unwrap_err();
        assert_eq!(schema_path(err), "details.structure");
    }

    #[test]
    fn test_empty_structure_rejected() {
        let err = parse_analysis(&payload(json!({"details": {"structure": "  "}}))).unwrap_err();
        assert_eq!(schema_path(err), "details.structure");
    }

    #[test]
    fn test_details_wrong_type() {
        let err = parse_analysis(&payload(json!({"details": "linear"}))).unwrap_err();
        assert_eq!(schema_path(err), "details");
    }

    #[test]
    fn test_optional_metrics_absent_stay_absent() {
        let result = parse_analysis(&payload(json!({
            "details": {"structure": "grid", "predictability": null}
        })))
        .unwrap();
        assert_eq!(result.details.complexity, None);
        assert_eq!(result.details.predictability, None);
        assert_eq!(result.details.artifact_rating, None);
        assert_eq!(result.details.consistency_score, None);
    }

    #[test]
    fn test_optional_metrics_clamped() {
        let result = parse_analysis(&payload(json!({
            "details": {"structure": "grid", "artifactRating": 180, "consistencyScore": -3, "complexity": 0}
        })))
        .unwrap();
        assert_eq!(result.details.artifact_rating, Some(100.0));
        assert_eq!(result.details.consistency_score, Some(0.0));
        assert_eq!(result.details.complexity, Some(0.0));
    }

    #[test]
    fn test_optional_metric_wrong_type() {
        let err = parse_analysis(&payload(json!({
            "details": {"structure": "grid", "complexity": "high"}
        })))
        .unwrap_err();
        assert_eq!(schema_path(err), "details.complexity");
    }

    #[test]
    fn test_missing_top_level_fields() {
        for key in ["score", "verdict", "summary", "highlights"] {
            let mut value: Value = serde_json::from_str(&payload(json!({}))).unwrap();
            value.as_object_mut().unwrap().remove(key);
            let err = parse_analysis(&value.to_string()).unwrap_err();
            assert_eq!(schema_path(err), key);
        }
    }

    #[test]
    fn test_score_wrong_type() {
        let err = parse_analysis(&payload(json!({"score": "high"}))).unwrap_err();
        assert_eq!(schema_path(err), "score");
    }

    #[test]
    fn test_highlight_missing_reason() {
        let err = parse_analysis(&payload(json!({
            "highlights": [
                {"text": "a", "reason": "b", "type": "human"},
                {"text": "c", "type": "ai"}
            ]
        })))
        .unwrap_err();
        assert_eq!(schema_path(err), "highlights[1].reason");
    }

    #[test]
    fn test_highlight_unknown_type() {
        let err = parse_analysis(&payload(json!({
            "highlights": [{"text": "a", "reason": "b", "type": "robot"}]
        })))
        .unwrap_err();
        assert_eq!(schema_path(err), "highlights[0].type");
    }

    #[test]
    fn test_highlight_type_case_insensitive() {
        let result = parse_analysis(&payload(json!({
            "highlights": [{"text": "a", "reason": "b", "type": "MIXED"}]
        })))
        .unwrap();
        assert_eq!(result.highlights[0].kind, HighlightKind::Mixed);
    }

    #[test]
    fn test_highlights_not_array() {
        let err = parse_analysis(&payload(json!({"highlights": {"text": "a"}}))).unwrap_err();
        assert_eq!(schema_path(err), "highlights");
    }

    #[test]
    fn test_malformed_payloads() {
        for raw in ["", "   ", "{\"score\": 5", "not json at all", "[1, 2, 3]", "42"] {
            let err = parse_analysis(raw).unwrap_err();
            assert!(
                matches!(err, VerificationError::MalformedResponse(_)),
                "{:?} gave {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_code_fence_stripped() {
        let fenced = format!("```json\n{}\n```", payload(json!({})));
        assert_eq!(parse_analysis(&fenced).unwrap().score, 72);
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let result = parse_analysis(&payload(json!({"confidence": 0.9}))).unwrap();
        assert_eq!(result.score, 72);
    }

    proptest! {
        #[test]
        fn prop_score_always_in_range(score in -1.0e6f64..1.0e6f64) {
            let result = parse_analysis(&payload(json!({"score": score}))).unwrap();
            prop_assert!(result.score <= 100);
        }

        #[test]
        fn prop_metric_clamped_or_absent(metric in proptest::option::of(-500.0f64..500.0f64)) {
            let details = match metric {
                Some(m) => json!({"structure": "s", "predictability": m}),
                None => json!({"structure": "s"}),
            };
            let result = parse_analysis(&payload(json!({"details": details}))).unwrap();
            match metric {
                Some(_) => {
                    let v = result.details.predictability.unwrap();
                    prop_assert!((0.0..=100.0).contains(&v));
                }
                None => {
                    prop_assert!(result.details.predictability.is_none());
                }
            }
        }
    }
}
