//! Crate-wide error taxonomy (spec §7).
//!
//! Individual components define their own `thiserror` enums for the errors
//! they can produce locally (see `store::models::StoreError`,
//! `podcast::fetcher::FeedError`, `audio::router::DownloadError`,
//! `transcript::finder::TranscriptError`, `transcript::transcriber::AsrError`,
//! `summarize::summarizer::SummarizeError`). Once a component has exhausted
//! its own local retry policy it reports failure to the orchestrator as a
//! [`PipelineError`], which is the shape recorded in the failure log and
//! surfaced through progress events.

use std::fmt;

/// Which component produced a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Store,
    Fetcher,
    SourceFinder,
    Downloader,
    TranscriptFinder,
    Transcriber,
    Summarizer,
    Orchestrator,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::Store => "store",
            Component::Fetcher => "fetcher",
            Component::SourceFinder => "source_finder",
            Component::Downloader => "downloader",
            Component::TranscriptFinder => "transcript_finder",
            Component::Transcriber => "transcriber",
            Component::Summarizer => "summarizer",
            Component::Orchestrator => "orchestrator",
        };
        write!(f, "{s}")
    }
}

/// The specific kind of failure, matching spec §7's taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    FeedError,
    NoMedia,
    DownloadHttp(u16),
    DownloadStalled,
    DownloadMaxTimeout,
    DownloadValidationFailed,
    DownloadAllStrategiesFailed,
    TranscriptNotFound,
    AsrUpload,
    AsrJobFailed,
    AsrTimeout,
    AsrQuota,
    SummarizationLlm,
    SummarizationRateLimited,
    SummarizationInvalidOutput,
    StoreIo,
    StoreSchema,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An error surfaced to the [`crate::pipeline::orchestrator::Orchestrator`]
/// after a component has exhausted its own local retry policy.
#[derive(Debug, Clone)]
pub struct PipelineError {
    pub component: Component,
    pub podcast: String,
    pub episode_title: String,
    pub kind: ErrorKind,
    pub retryable: bool,
    pub message: String,
}

impl PipelineError {
    pub fn new(
        component: Component,
        podcast: impl Into<String>,
        episode_title: impl Into<String>,
        kind: ErrorKind,
        retryable: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component,
            podcast: podcast.into(),
            episode_title: episode_title.into(),
            kind,
            retryable,
            message: message.into(),
        }
    }

    /// A [`PipelineError`] representing a clean, non-error cancellation.
    pub fn cancelled(component: Component, podcast: impl Into<String>, episode_title: impl Into<String>) -> Self {
        Self::new(
            component,
            podcast,
            episode_title,
            ErrorKind::Cancelled,
            false,
            "cancelled",
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} / {}: {} ({})",
            self.component, self.podcast, self.episode_title, self.message, self.kind
        )
    }
}

impl std::error::Error for PipelineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_errors_are_not_retryable_and_flagged() {
        let err = PipelineError::cancelled(Component::Downloader, "Pod", "Ep 1");
        assert!(err.is_cancellation());
        assert!(!err.retryable);
    }

    #[test]
    fn display_includes_component_and_kind() {
        let err = PipelineError::new(
            Component::Downloader,
            "Pod",
            "Ep 1",
            ErrorKind::DownloadHttp(503),
            true,
            "service unavailable",
        );
        let s = err.to_string();
        assert!(s.contains("downloader"));
        assert!(s.contains("Pod"));
        assert!(s.contains("service unavailable"));
    }
}
