//! RSS/Atom feed fetching and episode extraction (spec §4.2, steps 2-3).

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::podcast::models::{Episode, EpisodeMetadata};
use crate::utils::text::strip_html;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid feed url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("feed parsing failed: {0}")]
    ParseError(String),
}

pub struct FeedClient {
    http: Client,
}

impl FeedClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent(crate::constants::network::USER_AGENT)
            .timeout(crate::constants::network::REQUEST_TIMEOUT)
            .connect_timeout(crate::constants::network::CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(crate::constants::network::MAX_REDIRECTS))
            .build()
            .expect("failed to build feed HTTP client");
        Self { http }
    }

    /// Fetch and parse a single feed into episodes, tagged with `podcast`.
    /// Per spec §4.2 step 2, a fetch/parse failure here is reported to the
    /// caller (who records it and continues with other sources) rather than
    /// aborting the whole run.
    pub async fn fetch_episodes(&self, podcast: &str, feed_url: &str) -> Result<Vec<Episode>, FeedError> {
        if crate::utils::validation::validate_feed_url(feed_url).is_err() {
            return Err(FeedError::InvalidUrl(feed_url.to_string()));
        }

        let response = self
            .http
            .get(feed_url)
            .header(
                "Accept",
                "application/rss+xml, application/atom+xml, application/xml, text/xml, */*",
            )
            .send()
            .await?
            .error_for_status()?;
        let content = response.text().await?;

        let feed = parser::parse(content.as_bytes()).map_err(|e| FeedError::ParseError(e.to_string()))?;

        let episodes = feed
            .entries
            .iter()
            .filter_map(|entry| extract_episode(podcast, entry))
            .collect();
        Ok(episodes)
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_episode(podcast: &str, entry: &feed_rs::model::Entry) -> Option<Episode> {
    let title = entry.title.as_ref().map(|t| t.content.clone())?;
    let published = entry_published(entry)?;

    let description = entry
        .summary
        .as_ref()
        .map(|t| strip_html(&t.content))
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_ref().map(|b| strip_html(b))))
        .filter(|s| !s.is_empty());

    let audio_url = extract_audio_url(entry);
    let transcript_url = extract_transcript_url(entry);
    let duration = extract_duration(entry);

    Some(Episode {
        podcast: podcast.to_string(),
        title,
        published,
        audio_url,
        transcript_url,
        description,
        link: entry.links.first().map(|l| l.href.clone()),
        guid: if entry.id.is_empty() { None } else { Some(entry.id.clone()) },
        duration,
        apple_podcast_id: None,
        metadata: EpisodeMetadata::default(),
    })
}

fn entry_published(entry: &feed_rs::model::Entry) -> Option<i64> {
    entry
        .published
        .or(entry.updated)
        .map(|dt: DateTime<Utc>| dt.timestamp())
}

/// Prefer an enclosure whose MIME type starts with `audio/` (spec §4.2 step
/// 3: "prefer `audio/*` MIME"), falling back to extension sniffing for feeds
/// that omit a content type.
fn extract_audio_url(entry: &feed_rs::model::Entry) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            if let Some(url) = &content.url {
                let is_audio_mime = content
                    .content_type
                    .as_ref()
                    .map(|ct| ct.to_string().starts_with("audio/"))
                    .unwrap_or(false);
                if is_audio_mime {
                    return Some(url.to_string());
                }
            }
        }
    }
    for media in &entry.media {
        for content in &media.content {
            if let Some(url) = &content.url {
                if has_audio_extension(url.as_str()) {
                    return Some(url.to_string());
                }
            }
        }
    }
    if let Some(link) = entry.links.iter().find(|l| {
        l.media_type.as_ref().map(|mt| mt.starts_with("audio/")).unwrap_or(false)
            || l.rel.as_deref() == Some("enclosure")
    }) {
        return Some(link.href.clone());
    }
    entry.links.iter().find(|l| has_audio_extension(&l.href)).map(|l| l.href.clone())
}

fn has_audio_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower.split('?').next().unwrap_or(&lower);
    [".mp3", ".m4a", ".mp4", ".ogg", ".wav", ".aac", ".flac", ".opus"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// `<podcast:transcript>`-style tags aren't modeled by feed-rs, so scan raw
/// extension links for a transcript-typed relation (spec §4.2 step 3).
fn extract_transcript_url(entry: &feed_rs::model::Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| {
            l.rel.as_deref() == Some("transcript")
                || l.media_type.as_deref() == Some("application/srt")
                || l.media_type.as_deref() == Some("text/vtt")
        })
        .map(|l| l.href.clone())
}

fn extract_duration(entry: &feed_rs::model::Entry) -> Option<i64> {
    entry
        .media
        .iter()
        .find_map(|m| m.duration)
        .map(|d| d.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>Sample Podcast</title>
  <item>
    <title>Episode One</title>
    <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    <guid>ep-1-guid</guid>
    <link>https://example.com/ep1</link>
    <enclosure url="https://cdn.example.com/ep1.mp3" type="audio/mpeg" length="123" />
  </item>
  <item>
    <title>Episode Two, No Audio</title>
    <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
    <guid>ep-2-guid</guid>
  </item>
</channel>
</rss>"#;

    #[test]
    fn extracts_audio_url_title_and_guid() {
        let feed = parser::parse(SAMPLE_FEED.as_bytes()).unwrap();
        let ep = extract_episode("Sample Podcast", &feed.entries[0]).unwrap();
        assert_eq!(ep.title, "Episode One");
        assert_eq!(ep.audio_url.as_deref(), Some("https://cdn.example.com/ep1.mp3"));
        assert_eq!(ep.guid.as_deref(), Some("ep-1-guid"));
        assert_eq!(ep.link.as_deref(), Some("https://example.com/ep1"));
    }

    #[test]
    fn episode_without_enclosure_has_no_audio_url() {
        let feed = parser::parse(SAMPLE_FEED.as_bytes()).unwrap();
        let ep = extract_episode("Sample Podcast", &feed.entries[1]).unwrap();
        assert!(ep.audio_url.is_none());
        assert!(!ep.has_any_media());
    }

    #[test]
    fn has_audio_extension_matches_known_extensions() {
        assert!(has_audio_extension("https://example.com/ep.mp3?x=1"));
        assert!(has_audio_extension("https://example.com/EP.M4A"));
        assert!(!has_audio_extension("https://example.com/ep.html"));
    }
}
