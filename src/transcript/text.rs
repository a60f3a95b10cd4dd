//! Transcript text normalization shared by C5 and C6.

use crate::utils::text::strip_html;

/// Normalize raw transcript text: strip markup, collapse whitespace.
pub fn normalize(raw: &str) -> String {
    strip_html(raw).trim().to_string()
}

/// Concatenate a JSON transcript's ordered `text` fields, as produced by
/// some advertised-transcript-URL formats (spec §4.5 step 2: "if JSON
/// transcript, concatenate `text` fields in order").
pub fn concatenate_json_transcript(json: &serde_json::Value) -> Option<String> {
    let segments = json.as_array().or_else(|| json.get("segments").and_then(|v| v.as_array()))?;

    let mut parts = Vec::new();
    for segment in segments {
        if let Some(text) = segment.get("text").and_then(|v| v.as_str()) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Render utterance-level speaker labels as `Speaker X: ...` blocks
/// separated by blank lines (spec §4.6 step 4).
pub fn format_utterances(utterances: &[(String, String)]) -> String {
    utterances
        .iter()
        .map(|(speaker, text)| format!("Speaker {speaker}: {}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
