//! C5 — the transcript finder (spec §4.5).
//!
//! Tries, in order: the store cache, the episode's advertised transcript
//! URL, an optional credentialed directory lookup, and a matching
//! video-host's caption track. Returns as soon as one source clears the
//! minimum acceptance length.

use std::process::Stdio;

use reqwest::Client;
use thiserror::Error;
use tokio::process::Command;

use crate::config::Mode;
use crate::constants::transcribe::MIN_TRANSCRIPT_LEN;
use crate::podcast::discovery::PodcastIndexClient;
use crate::podcast::models::Episode;
use crate::store::{Store, TranscriptSource};
use crate::transcript::text::{concatenate_json_transcript, normalize};

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

pub struct TranscriptFinder {
    http: Client,
    store: Store,
    discovery: Option<PodcastIndexClient>,
}

impl TranscriptFinder {
    pub fn new(store: Store, discovery: Option<PodcastIndexClient>) -> Self {
        Self {
            http: Client::builder()
                .user_agent(crate::constants::network::USER_AGENT)
                .connect_timeout(crate::constants::network::CONNECT_TIMEOUT)
                .build()
                .expect("failed to build transcript-finder HTTP client"),
            store,
            discovery,
        }
    }

    /// Returns `(text, source)` or `None` if no source yields an acceptable
    /// transcript (spec: "Minimum acceptance: text length >= 1,000
    /// characters after normalization").
    pub async fn find(&self, episode: &Episode, mode: Mode) -> Result<Option<(String, TranscriptSource)>, TranscriptError> {
        if let Some(cached) = self
            .store
            .get_transcript(&episode.podcast, &episode.title, episode.published, mode)
            .await?
        {
            return Ok(Some((cached.text, cached.source)));
        }

        if let Some(url) = &episode.transcript_url {
            if let Some(text) = self.fetch_advertised(url).await {
                if accept(&text) {
                    return Ok(Some((text, TranscriptSource::ApiDirect)));
                }
            }
        }

        if let Some(text) = self.directory_lookup(episode).await {
            if accept(&text) {
                return Ok(Some((text, TranscriptSource::Scraped)));
            }
        }

        if let Some(text) = self.video_host_captions(episode).await {
            if accept(&text) {
                return Ok(Some((text, TranscriptSource::Scraped)));
            }
        }

        Ok(None)
    }

    async fn fetch_advertised(&self, url: &str) -> Option<String> {
        let resp = self.http.get(url).send().await.ok()?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await.ok()?;

        if content_type.contains("json") || body.trim_start().starts_with('[') || body.trim_start().starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
                if let Some(joined) = concatenate_json_transcript(&json) {
                    return Some(normalize(&joined));
                }
            }
        }

        Some(normalize(&body))
    }

    /// Credentialed external-directory lookup by podcast + episode title,
    /// against the PodcastIndex directory: resolve the podcast's feed id by
    /// name, then search that podcast's episodes for one whose title
    /// matches and that carries a `transcriptUrl` (spec §4.5 step 3).
    /// Returns `None` when no directory client is configured or nothing
    /// matches.
    async fn directory_lookup(&self, episode: &Episode) -> Option<String> {
        let client = self.discovery.as_ref()?;
        let feeds = client.search(&episode.podcast).await.ok()?;
        let podcast_id = feeds
            .into_iter()
            .find(|f| f.title.eq_ignore_ascii_case(&episode.podcast))
            .map(|f| f.id)?;
        let transcript_url = client.find_episode_transcript_url(podcast_id, &episode.title).await.ok().flatten()?;
        self.fetch_advertised(&transcript_url).await
    }

    /// Resolve a matching video URL, then retrieve its caption track,
    /// preferring manually created captions over auto-generated ones (spec
    /// §4.5 step 4).
    async fn video_host_captions(&self, episode: &Episode) -> Option<String> {
        let strategy = crate::audio::strategies::youtube::YoutubeStrategy::new(None);
        let video_url = strategy.resolve_video_url(episode).await?;

        for sub_flag in ["--write-subs", "--write-auto-sub"] {
            if let Some(text) = fetch_captions(&video_url, sub_flag).await {
                return Some(text);
            }
        }
        None
    }
}

async fn fetch_captions(video_url: &str, sub_flag: &str) -> Option<String> {
    let temp_dir = std::env::temp_dir();
    let output_template = temp_dir.join("podcast-digest-captions-%(id)s.%(ext)s");
    let output = Command::new("yt-dlp")
        .args([
            "--skip-download",
            sub_flag,
            "--sub-lang",
            "en",
            "--sub-format",
            "vtt",
            "-o",
            output_template.to_str()?,
            video_url,
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let mut entries = tokio::fs::read_dir(&temp_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("podcast-digest-captions-") && name.ends_with(".vtt") {
            let content = tokio::fs::read_to_string(entry.path()).await.ok()?;
            let _ = tokio::fs::remove_file(entry.path()).await;
            return Some(normalize(&strip_vtt_markup(&content)));
        }
    }
    None
}

/// Strip WebVTT cue headers and timestamps, leaving only spoken text.
fn strip_vtt_markup(vtt: &str) -> String {
    vtt.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && trimmed != "WEBVTT" && !trimmed.contains("-->") && !trimmed.chars().all(|c| c.is_ascii_digit())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn accept(text: &str) -> bool {
    text.chars().count() >= MIN_TRANSCRIPT_LEN
}
