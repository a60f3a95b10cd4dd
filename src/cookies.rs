//! Netscape-format cookie file handling for video-platform downloads
//! (spec §6 "Cookie file formats").
//!
//! Some download strategies (YouTube, platform players behind a login wall)
//! shell out to an external tool that accepts a cookie jar in the Netscape
//! `cookies.txt` format. Before handing a cookie file to such a strategy we
//! check it looks usable, rather than discovering a stale jar mid-download.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEntry {
    pub domain: String,
    pub name: String,
    pub value: String,
    /// Unix timestamp; `0` means a session cookie (no fixed expiry).
    pub expires: i64,
}

/// Parse a Netscape-format cookie file.
///
/// Lines are tab-separated: `domain, include_subdomains, path, secure,
/// expires, name, value`. Blank lines and lines starting with `#` (except
/// the `#HttpOnly_` prefix marker) are skipped.
pub fn parse(content: &str) -> Vec<CookieEntry> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            let expires: i64 = fields[4].parse().unwrap_or(0);
            Some(CookieEntry {
                domain: fields[0].to_string(),
                name: fields[5].to_string(),
                value: fields[6].to_string(),
                expires,
            })
        })
        .collect()
}

/// Load and parse a cookie file from disk.
pub fn load(path: &Path) -> std::io::Result<Vec<CookieEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse(&content))
}

/// A cookie file is usable if it has at least one entry that is either a
/// session cookie or not yet expired.
pub fn is_valid(entries: &[CookieEntry]) -> bool {
    if entries.is_empty() {
        return false;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    entries.iter().any(|c| c.expires == 0 || c.expires > now)
}

/// Check whether the cookie file at `path` exists and is still usable.
pub fn check_file(path: &Path) -> bool {
    match load(path) {
        Ok(entries) => is_valid(&entries),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Netscape HTTP Cookie File\n\
.youtube.com\tTRUE\t/\tTRUE\t9999999999\tSID\tabc123\n\
.youtube.com\tTRUE\t/\tTRUE\t0\tSESSION\txyz\n";

    #[test]
    fn parses_entries_and_skips_comments() {
        let entries = parse(SAMPLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "SID");
        assert_eq!(entries[0].expires, 9999999999);
        assert_eq!(entries[1].expires, 0);
    }

    #[test]
    fn valid_when_unexpired_or_session_cookie_present() {
        let entries = parse(SAMPLE);
        assert!(is_valid(&entries));
    }

    #[test]
    fn invalid_when_all_expired() {
        let expired = "# comment\n.x.com\tTRUE\t/\tTRUE\t1\tSID\tabc\n";
        let entries = parse(expired);
        assert!(!is_valid(&entries));
    }

    #[test]
    fn invalid_when_empty() {
        assert!(!is_valid(&[]));
    }
}
