//! Application-wide constants, grouped by the component that owns them.

use std::time::Duration;

/// Network-related constants shared by feed fetching, downloads, and API clients.
pub mod network {
    use super::*;

    /// Connect timeout for short metadata requests (feeds, lookups).
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Total timeout for short metadata requests.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Maximum number of redirects to follow.
    pub const MAX_REDIRECTS: usize = 10;

    /// User agent string for HTTP requests.
    pub const USER_AGENT: &str = concat!("podcast-digest/", env!("CARGO_PKG_VERSION"));
}

/// C2 — episode discovery constants.
pub mod fetcher {
    /// Default lookback window when no override is configured.
    pub const DEFAULT_DAYS_BACK: i64 = 7;

    /// Minimum word-overlap ratio (0.0-1.0) for fuzzy title matching.
    pub const TITLE_OVERLAP_THRESHOLD: f64 = 0.6;

    /// Window (in days) for matching episodes by publish date when titles
    /// aren't an exact match.
    pub const DATE_MATCH_WINDOW_DAYS: i64 = 1;
}

/// C3/C4 — download constants.
pub mod download {
    use super::*;

    /// Stage timeout for a single strategy attempt.
    pub const STAGE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

    /// Global per-episode wall-clock budget across all strategy attempts.
    pub const EPISODE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

    /// Minimum backoff between failed strategy attempts.
    pub const STRATEGY_BACKOFF: Duration = Duration::from_secs(1);

    /// Streaming chunk size.
    pub const CHUNK_SIZE: usize = 32 * 1024;

    /// Progress-based timeout defaults (spec §4.4).
    pub const STALL_TIMEOUT: Duration = Duration::from_secs(60);
    pub const MAX_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
    pub const MIN_SPEED_BYTES_PER_SEC: u64 = 1024;

    /// Minimum file size (bytes) to be considered a plausible audio file.
    pub const MIN_VALID_FILE_SIZE: u64 = 1_000;

    /// Bounded length of the per-podcast MRU success-history list.
    pub const SUCCESS_HISTORY_LEN: usize = 5;
}

/// C6 — transcription constants.
pub mod transcribe {
    use super::*;

    /// Local concurrency limit for ASR jobs in `test` mode.
    pub const TEST_MODE_CONCURRENCY: usize = 10;

    /// Local concurrency limit for ASR jobs in `full` mode.
    pub const FULL_MODE_CONCURRENCY: usize = 4;

    /// Default clip length (minutes) applied in `test` mode.
    pub const DEFAULT_MAX_TEST_MINUTES: u32 = 15;

    /// ASR job poll cadence: starting interval, backoff factor, cap, and overall deadline.
    pub const POLL_INITIAL_INTERVAL: Duration = Duration::from_secs(2);
    pub const POLL_BACKOFF_FACTOR: f64 = 1.5;
    pub const POLL_MAX_INTERVAL: Duration = Duration::from_secs(30);
    pub const POLL_OVERALL_TIMEOUT: Duration = Duration::from_secs(8 * 60);

    /// Minimum transcript length (chars, after normalization) to be accepted.
    pub const MIN_TRANSCRIPT_LEN: usize = 1_000;

    /// Circuit breaker: consecutive failures before tripping, and cooldown.
    pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 5;
    pub const CIRCUIT_BREAKER_COOLDOWN: Duration = Duration::from_secs(5 * 60);
}

/// C7 — summarization constants.
pub mod summarize {
    /// Target word count for the short paragraph summary.
    pub const PARAGRAPH_TARGET_WORDS: usize = 150;

    /// Sampling temperature used for both summary products.
    pub const TEMPERATURE: f32 = 0.2;

    /// Confidence threshold above which an LLM-proposed entity correction is applied.
    pub const CORRECTION_CONFIDENCE_THRESHOLD: f64 = 0.8;

    /// Local retry budget for a failing summarization call.
    pub const MAX_RETRIES: u32 = 2;
}

/// C8 — orchestration constants.
pub mod pipeline {
    pub const DOWNLOAD_CONCURRENCY: usize = 10;
    pub const TRANSCRIPTION_CONCURRENCY: usize = 10;
    pub const SUMMARIZATION_CONCURRENCY: usize = 20;

    /// Retries applied by the orchestrator around transcription/summarization
    /// (download retries are internal to C4's strategy fallback).
    pub const STAGE_RETRIES: u32 = 2;
}

/// Global LLM rate limiter defaults.
pub mod rate_limit {
    /// Default vendor quota (calls/minute) absent explicit configuration.
    pub const DEFAULT_CALLS_PER_MINUTE: u32 = 50;

    /// Safety fraction withheld from the vendor quota.
    pub const SAFETY_FRACTION: f64 = 0.1;
}

/// Failure-log retention.
pub mod failures {
    pub const MAX_RETAINED: usize = 1_000;
}

/// Optional podcast-directory API (PodcastIndex.org), used by C2 as a
/// supplementary episode source.
pub mod discovery {
    use super::*;

    pub const PODCASTINDEX_API_BASE_URL: &str = "https://api.podcastindex.org/api/1.0";
    pub const DISCOVERY_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const MAX_SEARCH_RESULTS: u32 = 10;
    pub const DEFAULT_TRENDING_COUNT: u32 = 20;
}
