//! Podcast configuration and episode types (spec §3 data model).

use serde::{Deserialize, Serialize};

/// How a podcast's episodes should be located and downloaded (spec §3
/// "Podcast configuration: retry_strategy").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryStrategy {
    Direct,
    ApplePodcasts,
    YoutubeSearch,
}

impl Default for PrimaryStrategy {
    fn default() -> Self {
        PrimaryStrategy::Direct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    Direct,
    ApplePodcasts,
    YoutubeSearch,
    BrowserAutomation,
    CdnAlternatives,
}

impl Default for FallbackStrategy {
    fn default() -> Self {
        FallbackStrategy::YoutubeSearch
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryStrategy {
    #[serde(default)]
    pub primary: PrimaryStrategy,
    #[serde(default)]
    pub fallback: FallbackStrategy,
    #[serde(default)]
    pub skip_rss: bool,
    #[serde(default)]
    pub force_apple: bool,
    pub youtube_channel: Option<String>,
    pub youtube_channel_name: Option<String>,
}

/// One entry in the on-disk podcast catalog (spec §3 "Podcast configuration").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastConfig {
    pub name: String,
    pub apple_id: Option<String>,
    #[serde(default)]
    pub rss_feeds: Vec<String>,
    pub search_term: Option<String>,
    #[serde(default)]
    pub retry_strategy: RetryStrategy,
}

/// Metadata extracted from title/description text rather than structured
/// feed fields (spec §3 "Episode: metadata").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeMetadata {
    pub episode_number: Option<u32>,
    pub guest_name: Option<String>,
    pub file_extension: Option<String>,
}

/// An episode produced by C2 and threaded through every later stage.
///
/// Identity is the `(podcast, title, published)` triple (spec §3, invariant
/// 2): it is fixed once C2 returns the episode and is used as the store key
/// for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub podcast: String,
    pub title: String,
    /// Unix timestamp, UTC.
    pub published: i64,
    pub audio_url: Option<String>,
    pub transcript_url: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub duration: Option<i64>,
    pub apple_podcast_id: Option<String>,
    pub metadata: EpisodeMetadata,
}

impl Episode {
    pub fn identity_key(&self) -> crate::store::models::EpisodeKey {
        crate::store::models::EpisodeKey::new(self.podcast.clone(), self.title.clone(), self.published)
    }

    /// Spec §4.2 edge case: an episode with neither advertised audio nor a
    /// transcript URL cannot be processed and must be dropped.
    pub fn has_any_media(&self) -> bool {
        self.audio_url.is_some() || self.transcript_url.is_some()
    }
}
