// Report Export
// Fixed-layout plain-text report for a validated result

use crate::models::AnalysisResult;

const REPORT_TITLE: &str = "VeriText AI Detection Report";

/// Render the shareable report: verdict, score, summary, then one
/// `- [TYPE] text: reason` line per highlight in order.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "-".repeat(REPORT_TITLE.len()),
        format!("Verdict: {}", result.verdict),
        format!("AI Probability: {}%", result.score),
        format!("Summary: {}", result.summary),
        String::new(),
        "Key Findings:".to_string(),
    ];

    lines.extend(
        result
            .highlights
            .iter()
            .map(|h| format!("- [{}] {}: {}", h.kind.label(), h.text, h.reason)),
    );

    lines.join("\n").trim().to_string()
}
