// Output Schema
// Structured-output schema requested of the inference provider. The same
// contract is enforced on receipt by `validation`.

use serde_json::{json, Value};

/// Top-level fields every analysis payload must carry
pub const REQUIRED_FIELDS: [&str; 5] = ["score", "verdict", "summary", "details", "highlights"];

/// Optional 0-100 metrics inside `details`
pub const DETAIL_METRICS: [&str; 4] = [
    "complexity",
    "predictability",
    "artifactRating",
    "consistencyScore",
];

/// Allowed highlight classifications on the wire
pub const HIGHLIGHT_TYPES: [&str; 3] = ["ai", "human", "mixed"];

pub fn analysis_schema() -> Value {
    let mut detail_properties = serde_json::Map::new();
    for metric in DETAIL_METRICS {
        detail_properties.insert(metric.to_string(), json!({ "type": "NUMBER" }));
    }
    detail_properties.insert("structure".to_string(), json!({ "type": "STRING" }));

    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER", "description": "AI probability (0-100)" },
            "verdict": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "details": {
                "type": "OBJECT",
                "properties": detail_properties,
                "required": ["structure"]
            },
            "highlights": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": { "type": "STRING", "description": "Visual description or text snippet" },
                        "reason": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": HIGHLIGHT_TYPES }
                    },
                    "required": ["text", "reason", "type"]
                }
            }
        },
        "required": REQUIRED_FIELDS
    })
}
