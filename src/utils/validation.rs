use url::Url;

/// Validate if a string is a valid URL.
pub fn is_valid_url(url_str: &str) -> bool {
    Url::parse(url_str).is_ok()
}

/// Check if a URL is a plausible feed URL (RSS/Atom).
pub fn is_valid_feed_url(url: &str) -> bool {
    is_valid_url(url) && (url.starts_with("http://") || url.starts_with("https://"))
}

/// Validate a feed URL, returning a human-readable error on failure.
pub fn validate_feed_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("Feed URL cannot be empty".to_string());
    }
    if !is_valid_feed_url(url) {
        return Err("Invalid feed URL format".to_string());
    }
    Ok(())
}

/// Sanitize a string for safe filesystem usage (filenames, directory names).
pub fn sanitize_filename(filename: &str) -> String {
    let invalid_chars = ['<', '>', ':', '"', '|', '?', '*', '/', '\\'];
    let mut sanitized = filename.to_string();

    for invalid_char in invalid_chars {
        sanitized = sanitized.replace(invalid_char, "_");
    }

    sanitized.trim().chars().take(200).collect()
}

/// Check whether a filename has a recognized audio extension.
pub fn is_supported_audio_format(filename: &str) -> bool {
    let supported_extensions = ["mp3", "m4a", "aac", "ogg", "wav", "flac", "opus"];

    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| supported_extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/feed.xml"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_feed_url_validation() {
        assert!(is_valid_feed_url("https://example.com/feed.xml"));
        assert!(is_valid_feed_url("http://example.com/rss"));
        assert!(!is_valid_feed_url("ftp://example.com/feed.xml"));
        assert!(!is_valid_feed_url("not a url"));
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(
            sanitize_filename("Normal Filename.mp3"),
            "Normal Filename.mp3"
        );
        assert_eq!(sanitize_filename("File<>:Name|?.mp3"), "File___Name__.mp3");
        assert_eq!(sanitize_filename("  Trimmed  "), "Trimmed");
    }

    #[test]
    fn test_audio_format_validation() {
        assert!(is_supported_audio_format("episode.mp3"));
        assert!(is_supported_audio_format("episode.M4A"));
        assert!(is_supported_audio_format("episode.ogg"));
        assert!(!is_supported_audio_format("episode.txt"));
        assert!(!is_supported_audio_format("no_extension"));
    }
}
