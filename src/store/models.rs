//! Row-level types for the embedded store (spec §3 data model, §4.1 schema).

use crate::config::Mode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The `(podcast, title, published_timestamp)` identity triple (spec §3
/// "Episode: Identity triple"). Stable once C2 returns an episode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeKey {
    pub podcast: String,
    pub title: String,
    pub published: i64,
}

impl EpisodeKey {
    pub fn new(podcast: impl Into<String>, title: impl Into<String>, published: i64) -> Self {
        Self {
            podcast: podcast.into(),
            title: title.into(),
            published,
        }
    }
}

/// Which component produced a cached transcript (spec §3 "Transcript record").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptSource {
    ApiDirect,
    Scraped,
    Generated,
}

impl TranscriptSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptSource::ApiDirect => "api_direct",
            TranscriptSource::Scraped => "scraped",
            TranscriptSource::Generated => "generated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "api_direct" => Some(TranscriptSource::ApiDirect),
            "scraped" => Some(TranscriptSource::Scraped),
            "generated" => Some(TranscriptSource::Generated),
            _ => None,
        }
    }

    /// A transcript found by C5 (not produced by running the transcriber)
    /// takes precedence over C4→C6 even if audio already exists (invariant 4).
    pub fn is_found_not_generated(self) -> bool {
        !matches!(self, TranscriptSource::Generated)
    }
}

#[derive(Debug, Clone)]
pub struct TranscriptRecord {
    pub text: String,
    pub source: TranscriptSource,
    pub mode: Mode,
}

#[derive(Debug, Clone, Default)]
pub struct SummaryRecord {
    pub paragraph: Option<String>,
    pub long: Option<String>,
}

impl SummaryRecord {
    pub fn is_complete(&self) -> bool {
        self.paragraph.is_some() && self.long.is_some()
    }
}

/// An append-only observability record (spec §3 "Failure record").
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub ts: i64,
    pub component: String,
    pub podcast: String,
    pub title: String,
    pub error_kind: String,
    pub error_msg: String,
    pub retries: u32,
    pub mode: Mode,
}

impl From<&crate::error::PipelineError> for FailureRecord {
    fn from(err: &crate::error::PipelineError) -> Self {
        Self {
            ts: 0,
            component: err.component.to_string(),
            podcast: err.podcast.clone(),
            title: err.episode_title.clone(),
            error_kind: err.kind.to_string(),
            error_msg: err.message.clone(),
            retries: 0,
            mode: Mode::Full,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] rusqlite::Error),

    #[error("store schema error: {0}")]
    Schema(String),

    #[error("row already present")]
    UniqueViolation,
}

impl StoreError {
    /// `UniqueViolation` is the one outcome spec §4.1 says is "already
    /// present", not an error. Every other DB failure is fatal to the
    /// owning stage and retryable at the orchestrator.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation)
    }
}

pub(super) fn classify_sqlite_error(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return StoreError::UniqueViolation;
        }
    }
    StoreError::Io(e)
}
