//! C8 — the pipeline orchestrator (spec §4.8).
//!
//! Drives `C5.find -> if miss: C3.find_candidates -> C4.download ->
//! C6.transcribe -> store transcript -> C7.summarize -> store summary` for a
//! batch of episodes with per-stage bounded concurrency, a cache-first
//! discipline, cooperative cancellation, and bounded retries around
//! transcription and summarization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Semaphore;

use crate::audio::source_finder::SourceFinder;
use crate::audio::Router;
use crate::config::Mode;
use crate::constants::pipeline::{DOWNLOAD_CONCURRENCY, STAGE_RETRIES, SUMMARIZATION_CONCURRENCY, TRANSCRIPTION_CONCURRENCY};
use crate::error::{Component, ErrorKind};
use crate::pipeline::events::{ProgressEvent, ProgressSender, Stage, State};
use crate::podcast::discovery::PodcastIndexClient;
use crate::podcast::models::{Episode, RetryStrategy};
use crate::store::{FailureRecord, Store, TranscriptSource};
use crate::summarize::Summarizer;
use crate::transcript::finder::TranscriptFinder;
use crate::transcript::transcriber::Transcriber;

/// One-shot, process-wide cancellation flag (spec §5 "Cancellation
/// semantics"): checked at each suspension point, never reset.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Orchestrator {
    store: Store,
    transcript_finder: TranscriptFinder,
    source_finder: SourceFinder,
    router: Router,
    transcriber: Option<Transcriber>,
    summarizer: Option<Summarizer>,
    download_sem: Arc<Semaphore>,
    transcribe_sem: Arc<Semaphore>,
    summarize_sem: Arc<Semaphore>,
    cancellation: CancellationFlag,
    max_test_minutes: u32,
}

impl Orchestrator {
    pub fn new(
        store: Store,
        router: Router,
        transcriber: Option<Transcriber>,
        summarizer: Option<Summarizer>,
        discovery: Option<PodcastIndexClient>,
        cancellation: CancellationFlag,
        max_test_minutes: u32,
    ) -> Self {
        Self {
            transcript_finder: TranscriptFinder::new(store.clone(), discovery),
            source_finder: SourceFinder::new(),
            store,
            router,
            transcriber,
            summarizer,
            download_sem: Arc::new(Semaphore::new(DOWNLOAD_CONCURRENCY)),
            transcribe_sem: Arc::new(Semaphore::new(TRANSCRIPTION_CONCURRENCY)),
            summarize_sem: Arc::new(Semaphore::new(SUMMARIZATION_CONCURRENCY)),
            cancellation,
            max_test_minutes,
        }
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Run the full pipeline for one episode, emitting progress events.
    /// Never panics: every stage failure is reported and the episode simply
    /// stops short of the stages that depended on it.
    pub async fn process_episode(
        &self,
        episode: &Episode,
        apple_id: Option<&str>,
        retry: &RetryStrategy,
        mode: Mode,
        audio_path: &std::path::Path,
        events: &ProgressSender,
    ) {
        if self.cancellation.is_cancelled() {
            self.emit(events, Stage::TranscriptFind, episode, State::Cancelled, 1, None);
            return;
        }
        let _ = self.store.upsert_episode(episode).await;

        // Cache-first: the store is consulted before any network work.
        self.emit(events, Stage::TranscriptFind, episode, State::Started, 1, None);
        let transcript = match self.transcript_finder.find(episode, mode).await {
            Ok(Some((text, source))) => {
                self.emit(events, Stage::TranscriptFind, episode, State::Succeeded, 1, None);
                let _ = self.store.save_transcript(&episode.podcast, &episode.title, episode.published, mode, &text, source).await;
                Some((text, source))
            }
            Ok(None) => {
                self.emit(events, Stage::TranscriptFind, episode, State::Skipped, 1, None);
                None
            }
            Err(e) => {
                self.emit(events, Stage::TranscriptFind, episode, State::Failed, 1, Some(e.to_string()));
                self.record_failure(Component::TranscriptFinder, episode, ErrorKind::StoreIo, e.to_string(), 1, mode)
                    .await;
                None
            }
        };

        // Invariant 4: a transcript with source != generated is preferred
        // over running the download/transcribe path, even if audio exists.
        let transcript_text = match transcript {
            Some((text, source)) if source.is_found_not_generated() => text,
            _ => {
                if self.cancellation.is_cancelled() {
                    self.emit(events, Stage::Download, episode, State::Cancelled, 1, None);
                    return;
                }
                match self.download_and_transcribe(episode, apple_id, retry, mode, audio_path, events).await {
                    Some(text) => text,
                    None => return,
                }
            }
        };

        if self.cancellation.is_cancelled() {
            self.emit(events, Stage::Summarize, episode, State::Cancelled, 1, None);
            return;
        }
        self.summarize(episode, mode, &transcript_text, events).await;
    }

    async fn download_and_transcribe(
        &self,
        episode: &Episode,
        apple_id: Option<&str>,
        retry: &RetryStrategy,
        mode: Mode,
        audio_path: &std::path::Path,
        events: &ProgressSender,
    ) -> Option<String> {
        let already_present = tokio::fs::metadata(audio_path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        if !already_present {
            let _permit = self.download_sem.acquire().await.ok()?;
            self.emit(events, Stage::Download, episode, State::Started, 1, None);

            let candidates = self.source_finder.find_candidates(episode, apple_id, retry).await;

            let mut last_error = String::from("no audio candidates available");
            let mut downloaded = false;
            for candidate in &candidates {
                if self.cancellation.is_cancelled() {
                    self.emit(events, Stage::Download, episode, State::Cancelled, 1, None);
                    return None;
                }
                match self.router.download(episode, candidate, audio_path).await {
                    Ok(_strategy) => {
                        downloaded = true;
                        break;
                    }
                    Err(e) => last_error = e.to_string(),
                }
            }

            if !downloaded {
                self.emit(events, Stage::Download, episode, State::Failed, 1, Some(last_error.clone()));
                self.record_failure(Component::Downloader, episode, ErrorKind::DownloadAllStrategiesFailed, last_error, 1, mode)
                    .await;
                return None;
            }
            self.emit(events, Stage::Download, episode, State::Succeeded, 1, None);
        }

        let transcriber = self.transcriber.as_ref()?;
        let text = self.transcribe_with_retries(transcriber, episode, mode, audio_path, events).await?;

        let _ = self
            .store
            .save_transcript(&episode.podcast, &episode.title, episode.published, mode, &text, TranscriptSource::Generated)
            .await;
        Some(text)
    }

    async fn transcribe_with_retries(
        &self,
        transcriber: &Transcriber,
        episode: &Episode,
        mode: Mode,
        audio_path: &std::path::Path,
        events: &ProgressSender,
    ) -> Option<String> {
        let _permit = self.transcribe_sem.acquire().await.ok()?;
        let mut backoff = Duration::from_secs(1);

        for attempt in 1..=(STAGE_RETRIES + 1) {
            if self.cancellation.is_cancelled() {
                self.emit(events, Stage::Transcribe, episode, State::Cancelled, attempt, None);
                return None;
            }
            self.emit(events, Stage::Transcribe, episode, State::Started, attempt, None);
            match transcriber.transcribe(audio_path, mode, self.max_test_minutes).await {
                Ok(text) => {
                    self.emit(events, Stage::Transcribe, episode, State::Succeeded, attempt, None);
                    return Some(text);
                }
                Err(e) if attempt <= STAGE_RETRIES => {
                    self.emit(events, Stage::Transcribe, episode, State::Retrying, attempt, Some(e.to_string()));
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    self.emit(events, Stage::Transcribe, episode, State::Failed, attempt, Some(e.to_string()));
                    self.record_failure(Component::Transcriber, episode, ErrorKind::AsrJobFailed, e.to_string(), attempt, mode)
                        .await;
                    return None;
                }
            }
        }
        None
    }

    async fn summarize(&self, episode: &Episode, mode: Mode, transcript_text: &str, events: &ProgressSender) {
        let existing = self.store.get_summary(&episode.podcast, &episode.title, episode.published, mode).await.ok();
        if let Some(summary) = &existing {
            if summary.is_complete()
                && !crate::summarize::entities::should_regenerate(
                    transcript_text,
                    summary.long.as_deref().unwrap_or_default(),
                    summary.paragraph.as_deref().unwrap_or_default(),
                )
            {
                self.emit(events, Stage::Summarize, episode, State::Skipped, 1, None);
                return;
            }
        }

        let Some(summarizer) = &self.summarizer else {
            self.emit(events, Stage::Summarize, episode, State::Skipped, 1, Some("no summarizer configured".into()));
            return;
        };

        let _permit = match self.summarize_sem.acquire().await {
            Ok(p) => p,
            Err(_) => return,
        };
        self.emit(events, Stage::Summarize, episode, State::Started, 1, None);

        let products = summarizer.summarize(&episode.podcast, &episode.title, transcript_text).await;
        match (&products.paragraph, &products.long) {
            (Some(p), Some(l)) => {
                let _ = self.store.save_summary(&episode.podcast, &episode.title, episode.published, mode, p, l).await;
                self.emit(events, Stage::Summarize, episode, State::Succeeded, 1, None);
            }
            (None, None) => {
                self.emit(events, Stage::Summarize, episode, State::Failed, 1, Some("both summary calls failed".into()));
                self.record_failure(Component::Summarizer, episode, ErrorKind::SummarizationLlm, "both summary calls failed", 1, mode)
                    .await;
            }
            _ => {
                // Keep whichever product succeeded (spec: "keep the
                // successful product if any"); store a partial record using
                // empty string for the missing half.
                let p = products.paragraph.clone().unwrap_or_default();
                let l = products.long.clone().unwrap_or_default();
                let _ = self.store.save_summary(&episode.podcast, &episode.title, episode.published, mode, &p, &l).await;
                self.emit(events, Stage::Summarize, episode, State::Succeeded, 1, Some("partial: one product failed".into()));
            }
        }
    }

    fn emit(&self, events: &ProgressSender, stage: Stage, episode: &Episode, state: State, attempt: u32, error: Option<String>) {
        let mut event = ProgressEvent::new(stage, episode.podcast.clone(), episode.title.clone(), state, attempt);
        if let Some(e) = error {
            event = event.with_error(e);
        }
        let _ = events.send(event);
    }

    /// Persist a stage failure to the append-only failure log (spec §3/§4.1).
    /// `attempt` is the 1-based attempt count at which the stage gave up;
    /// `retries` recorded is the number of retries that preceded it.
    async fn record_failure(&self, component: Component, episode: &Episode, kind: ErrorKind, message: impl Into<String>, attempt: u32, mode: Mode) {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
        let record = FailureRecord {
            ts,
            component: component.to_string(),
            podcast: episode.podcast.clone(),
            title: episode.title.clone(),
            error_kind: kind.to_string(),
            error_msg: message.into(),
            retries: attempt.saturating_sub(1),
            mode,
        };
        if let Err(e) = self.store.append_failure(&record).await {
            log::warn!("failed to append failure record for {}/{}: {e}", episode.podcast, episode.title);
        }
    }
}
