//! Process configuration: the on-disk layout + environment variables (spec
//! §6) and the podcast catalog file (spec §3 "Podcast configuration").

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::podcast::models::PodcastConfig;

/// Which transcription mode a run operates under (spec glossary: "Mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Test,
    Full,
}

impl Mode {
    /// Column/key suffix used when this mode's data is distinguished from
    /// the other mode's (e.g. `transcript` vs `transcript_test`).
    pub fn column_suffix(self) -> &'static str {
        match self {
            Mode::Test => "_test",
            Mode::Full => "",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Test => "test",
            Mode::Full => "full",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-wide settings sourced from environment variables and the on-disk
/// base directory layout (spec §6).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub assemblyai_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub podcastindex_api_key: Option<String>,
    pub podcastindex_api_secret: Option<String>,
    pub default_mode: Mode,
    pub max_transcription_minutes: u32,
    pub verify_apple_podcasts: bool,
    pub fetch_missing_episodes: bool,
    pub dry_run: bool,
    /// Cap on the audio directory's total size in bytes; `None` disables eviction.
    pub audio_cache_cap_bytes: Option<u64>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env(base_dir: impl Into<PathBuf>) -> Self {
        let testing_mode = env_bool("TESTING_MODE", false);
        Self {
            base_dir: base_dir.into(),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            assemblyai_api_key: env_opt("ASSEMBLYAI_API_KEY"),
            sendgrid_api_key: env_opt("SENDGRID_API_KEY"),
            youtube_api_key: env_opt("YOUTUBE_API_KEY"),
            spotify_client_id: env_opt("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: env_opt("SPOTIFY_CLIENT_SECRET"),
            podcastindex_api_key: env_opt("PODCASTINDEX_API_KEY"),
            podcastindex_api_secret: env_opt("PODCASTINDEX_API_SECRET"),
            default_mode: if testing_mode { Mode::Test } else { Mode::Full },
            max_transcription_minutes: std::env::var("MAX_TRANSCRIPTION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::constants::transcribe::DEFAULT_MAX_TEST_MINUTES),
            verify_apple_podcasts: env_bool("VERIFY_APPLE_PODCASTS", false),
            fetch_missing_episodes: env_bool("FETCH_MISSING_EPISODES", false),
            dry_run: env_bool("DRY_RUN", false),
            audio_cache_cap_bytes: None,
        }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.base_dir.join("audio")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.base_dir.join("transcripts")
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.base_dir.join("summaries")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.base_dir.join("cache")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.base_dir.join("temp")
    }

    pub fn db_path(&self) -> PathBuf {
        self.base_dir.join("podcast_data.db")
    }

    /// Create every directory in the on-disk layout (spec §6), if missing.
    pub async fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [
            self.audio_dir(),
            self.transcripts_dir(),
            self.summaries_dir(),
            self.cache_dir(),
            self.temp_dir(),
        ] {
            crate::utils::fs::ensure_dir(&dir).await?;
        }
        Ok(())
    }

    /// Location of the cookie file for a given video platform (spec §6
    /// "Cookie file formats").
    pub fn cookie_file_path(&self, platform: &str) -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "podcast-digest")
            .ok_or_else(|| anyhow::anyhow!("Unable to determine config directory"))?;
        Ok(dirs
            .config_dir()
            .join("cookies")
            .join(format!("{platform}_cookies.txt")))
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// The on-disk catalog of podcasts (spec §6 "Configuration file").
///
/// A TOML document; `[[podcast]]` tables list each entry. Missing optional
/// fields take the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PodcastCatalog {
    #[serde(rename = "podcast", default)]
    pub podcasts: Vec<PodcastConfig>,
}

impl PodcastCatalog {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let catalog: PodcastCatalog = toml::from_str(content)?;
        Ok(catalog)
    }

    pub fn find(&self, name: &str) -> Option<&PodcastConfig> {
        self.podcasts.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_column_suffix() {
        assert_eq!(Mode::Test.column_suffix(), "_test");
        assert_eq!(Mode::Full.column_suffix(), "");
    }

    #[test]
    fn parses_minimal_catalog() {
        let toml = r#"
[[podcast]]
name = "Lex Fridman"
rss_feeds = ["https://example.com/feed.xml"]
"#;
        let catalog = PodcastCatalog::parse(toml).unwrap();
        assert_eq!(catalog.podcasts.len(), 1);
        assert_eq!(catalog.podcasts[0].name, "Lex Fridman");
        assert_eq!(catalog.find("Lex Fridman").unwrap().rss_feeds.len(), 1);
        assert!(catalog.find("Missing").is_none());
    }

    #[test]
    fn parses_full_retry_strategy() {
        let toml = r#"
[[podcast]]
name = "Dwarkesh Podcast"
rss_feeds = []
search_term = "Dwarkesh Patel"

[podcast.retry_strategy]
primary = "youtube_search"
fallback = "browser_automation"
skip_rss = true
force_apple = false
"#;
        let catalog = PodcastCatalog::parse(toml).unwrap();
        let pod = catalog.find("Dwarkesh Podcast").unwrap();
        assert!(pod.retry_strategy.skip_rss);
        assert_eq!(
            pod.retry_strategy.primary,
            crate::podcast::models::PrimaryStrategy::YoutubeSearch
        );
    }
}
