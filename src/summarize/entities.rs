//! Entity correction pre-pass and cache-staleness validation (spec §4.7
//! "Entity correction pre-pass", "Cache validation").

use regex::Regex;

/// A deterministic, high-confidence phonetic/formatting correction.
struct CorrectionRule {
    pattern: &'static str,
    replacement: &'static str,
}

/// Curated `incorrect -> correct` patterns for names and terms that ASR
/// commonly mangles on these podcasts.
const CORRECTION_RULES: &[CorrectionRule] = &[
    CorrectionRule {
        pattern: r"(?i)\b(Heath|Hieth)\s+(Raboy|Rabois|Raboys)\b",
        replacement: "Keith Rabois",
    },
    CorrectionRule {
        pattern: r"(?i)\b(Jason|Jayson)\s+(Kalkanis|Kalakanis|Calicanis)\b",
        replacement: "Jason Calacanis",
    },
    CorrectionRule {
        pattern: r"(?i)\bChamath\s+(Palihapatiya|Palihapitiya)\b",
        replacement: "Chamath Palihapitiya",
    },
    CorrectionRule {
        pattern: r"(?i)\bDavid\s+Sachs\b",
        replacement: "David Sacks",
    },
    CorrectionRule {
        pattern: r"(?i)\bPeter\s+(Teal|Theil)\b",
        replacement: "Peter Thiel",
    },
    CorrectionRule {
        pattern: r"(?i)\bElon\s+Must\b",
        replacement: "Elon Musk",
    },
    CorrectionRule {
        pattern: r"(?i)\bOpen\s*AI\b",
        replacement: "OpenAI",
    },
    CorrectionRule {
        pattern: r"(?i)\b(Founder's|Founders')\s+Fund\b",
        replacement: "Founders Fund",
    },
    CorrectionRule {
        pattern: r"(?i)\bAndreessen\s+Horovitz\b",
        replacement: "Andreessen Horowitz",
    },
    CorrectionRule {
        pattern: r"\bL\.L\.M\.\b",
        replacement: "LLM",
    },
    CorrectionRule {
        pattern: r"\bA\.I\.\b",
        replacement: "AI",
    },
    CorrectionRule {
        pattern: r"\bI\.P\.O\.\b",
        replacement: "IPO",
    },
];

/// Known-fixed errors that, if present in a cached summary but absent from
/// the current transcript, mark that summary stale (spec §4.7 "Cache
/// validation"; the Python original's `invalidating_errors` list).
const INVALIDATING_ERRORS: &[&str] = &[
    "Heath Raboy",
    "Heath Rabois",
    "Keith Raboy",
    "David Sachs",
    "David Sax",
    "Open AI",
    "Space X",
    "Founder's Fund",
    "Founders' Fund",
];

/// An LLM-proposed correction, accepted only if its confidence clears the
/// threshold (spec: "apply only those >= 0.8").
#[derive(Debug, Clone)]
pub struct ProposedCorrection {
    pub incorrect: String,
    pub correct: String,
    pub confidence: f64,
}

/// Apply the deterministic correction rules to `transcript`.
pub fn apply_corrections(transcript: &str) -> String {
    let mut text = transcript.to_string();
    for rule in CORRECTION_RULES {
        let re = Regex::new(rule.pattern).expect("static correction pattern is valid");
        text = re.replace_all(&text, rule.replacement).into_owned();
    }
    text
}

/// Apply only the LLM-proposed corrections whose confidence meets the
/// threshold.
pub fn apply_proposed_corrections(transcript: &str, proposals: &[ProposedCorrection]) -> String {
    let mut text = transcript.to_string();
    for proposal in proposals {
        if proposal.confidence >= crate::constants::summarize::CORRECTION_CONFIDENCE_THRESHOLD {
            text = text.replace(&proposal.incorrect, &proposal.correct);
        }
    }
    text
}

/// True if a cached summary should be regenerated: it contains a
/// known-fixed error that the current transcript does not (spec §4.7 "Cache
/// validation").
pub fn should_regenerate(transcript: &str, summary: &str, paragraph_summary: &str) -> bool {
    if summary.is_empty() || paragraph_summary.is_empty() {
        return true;
    }
    INVALIDATING_ERRORS
        .iter()
        .any(|error| (summary.contains(error) || paragraph_summary.contains(error)) && !transcript.contains(error))
}
