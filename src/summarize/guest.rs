//! Guest-name extraction heuristic (spec §4.7: `"Ep N: Name on ..."`,
//! `"Name: ..."`, `"... with Name"`).

use regex::Regex;

/// Extract a plausible guest name from an episode title, trying patterns in
/// order of specificity.
pub fn extract_guest_name(title: &str) -> Option<String> {
    let ep_prefix = Regex::new(r"(?i)^#?\d+:?\s*(.+?)\s+on\s+.+$").unwrap();
    if let Some(caps) = ep_prefix.captures(title) {
        return Some(clean(&caps[1]));
    }

    let colon_prefix = Regex::new(r"^(.+?):\s*.+$").unwrap();
    if let Some(caps) = colon_prefix.captures(title) {
        let candidate = clean(&caps[1]);
        if looks_like_name(&candidate) {
            return Some(candidate);
        }
    }

    let with_suffix = Regex::new(r"(?i)\bwith\s+([A-Z][\w.'-]+(?:\s+[A-Z][\w.'-]+){0,2})\s*$").unwrap();
    if let Some(caps) = with_suffix.captures(title) {
        return Some(clean(&caps[1]));
    }

    None
}

fn clean(s: &str) -> String {
    s.trim().trim_start_matches('#').trim().to_string()
}

/// Common non-name words that show up as title prefixes before a colon;
/// their presence disqualifies the colon-prefix heuristic.
const GENERIC_PREFIX_WORDS: &[&str] = &[
    "breaking", "weekly", "special", "update", "review", "recap", "news", "today", "episode", "part", "live",
];

/// A loose heuristic: looks like a personal name if it's exactly 2-3 words,
/// each starting with a capital letter, none a digit or a generic title word.
fn looks_like_name(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.len() < 2 || words.len() > 3 {
        return false;
    }
    words.iter().all(|w| {
        w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
            && !w.chars().any(|c| c.is_ascii_digit())
            && !GENERIC_PREFIX_WORDS.contains(&w.to_lowercase().as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_episode_number_on_pattern() {
        assert_eq!(extract_guest_name("Ep 42: Marc Andreessen on the future of AI"), Some("Marc Andreessen".to_string()));
    }

    #[test]
    fn extracts_from_colon_prefix_when_name_shaped() {
        assert_eq!(extract_guest_name("Naval Ravikant: How to Get Rich"), Some("Naval Ravikant".to_string()));
    }

    #[test]
    fn ignores_colon_prefix_when_not_name_shaped() {
        assert_eq!(extract_guest_name("Breaking News: markets rally today"), None);
    }

    #[test]
    fn extracts_from_with_suffix() {
        assert_eq!(
            extract_guest_name("A deep dive into venture capital with Bill Gurley"),
            Some("Bill Gurley".to_string())
        );
    }

    #[test]
    fn returns_none_when_no_pattern_matches() {
        assert_eq!(extract_guest_name("Weekly market roundup"), None);
    }
}
