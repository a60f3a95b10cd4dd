//! C6 — the transcriber (spec §4.6).
//!
//! Uploads a local audio file to an external ASR service, polls with
//! exponential backoff, and formats the result. Test-mode trims the file to
//! a configurable clip length first, preferring a stream-copy external tool
//! over re-encoding.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{Mutex, Semaphore};

use crate::config::Mode;
use crate::constants::transcribe::{
    CIRCUIT_BREAKER_COOLDOWN, CIRCUIT_BREAKER_THRESHOLD, POLL_BACKOFF_FACTOR, POLL_INITIAL_INTERVAL, POLL_MAX_INTERVAL,
    POLL_OVERALL_TIMEOUT,
};
use crate::transcript::text::format_utterances;

#[derive(Debug, Error)]
pub enum AsrError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("job failed: {0}")]
    JobFailed(String),
    #[error("polling timed out after {0:?}")]
    Timeout(Duration),
    #[error("circuit breaker open, cooling down")]
    CircuitOpen,
    #[error("audio file not found at {0}")]
    MissingFile(PathBuf),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    id: String,
    status: String,
    error: Option<String>,
    text: Option<String>,
    utterances: Option<Vec<Utterance>>,
}

#[derive(Debug, Deserialize)]
struct Utterance {
    speaker: String,
    text: String,
}

struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    fn new() -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
        }
    }

    async fn is_open(&self) -> bool {
        let mut guard = self.opened_at.lock().await;
        if let Some(opened) = *guard {
            if opened.elapsed() < CIRCUIT_BREAKER_COOLDOWN {
                return true;
            }
            *guard = None;
            self.consecutive_failures.store(0, Ordering::SeqCst);
        }
        false
    }

    async fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= CIRCUIT_BREAKER_THRESHOLD {
            let mut guard = self.opened_at.lock().await;
            if guard.is_none() {
                *guard = Some(Instant::now());
            }
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }
}

pub struct Transcriber {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    semaphore: Arc<Semaphore>,
    breaker: CircuitBreaker,
}

impl Transcriber {
    pub fn new(api_key: String, mode: Mode) -> Self {
        let concurrency = match mode {
            Mode::Test => crate::constants::transcribe::TEST_MODE_CONCURRENCY,
            Mode::Full => crate::constants::transcribe::FULL_MODE_CONCURRENCY,
        };
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_base: "https://api.assemblyai.com/v2".to_string(),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            breaker: CircuitBreaker::new(),
        }
    }

    pub async fn transcribe(&self, audio_path: &Path, mode: Mode, max_test_minutes: u32) -> Result<String, AsrError> {
        if self.breaker.is_open().await {
            return Err(AsrError::CircuitOpen);
        }
        if !tokio::fs::try_exists(audio_path).await.unwrap_or(false) {
            return Err(AsrError::MissingFile(audio_path.to_path_buf()));
        }

        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        let trimmed_path = if mode == Mode::Test {
            trim_audio(audio_path, max_test_minutes).await
        } else {
            None
        };
        let upload_source = trimmed_path.as_deref().unwrap_or(audio_path);

        let result = self.run_job(upload_source).await;

        if let Some(trimmed) = &trimmed_path {
            let _ = crate::utils::fs::remove_if_exists(trimmed).await;
        }

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure().await,
        }

        result
    }

    async fn run_job(&self, audio_path: &Path) -> Result<String, AsrError> {
        let bytes = tokio::fs::read(audio_path).await.map_err(|e| AsrError::Upload(e.to_string()))?;
        let upload_url = self.upload(bytes).await?;
        let job_id = self.create_job(&upload_url).await?;
        let job = self.poll(&job_id).await?;
        Ok(format_job(&job))
    }

    async fn upload(&self, bytes: Vec<u8>) -> Result<String, AsrError> {
        let part = multipart::Part::bytes(bytes);
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(format!("{}/upload", self.api_base))
            .header("authorization", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let parsed: UploadResponse = resp.json().await.map_err(|e| AsrError::Upload(e.to_string()))?;
        Ok(parsed.upload_url)
    }

    async fn create_job(&self, upload_url: &str) -> Result<String, AsrError> {
        let body = serde_json::json!({
            "audio_url": upload_url,
            "speaker_labels": true,
            "punctuate": true,
            "language_detection": true,
        });
        let resp = self
            .http
            .post(format!("{}/transcript", self.api_base))
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: CreateJobResponse = resp.json().await.map_err(|e| AsrError::Upload(e.to_string()))?;
        Ok(parsed.id)
    }

    /// Poll with exponential backoff: initial 2s, factor 1.5, cap 30s,
    /// overall deadline 8 min (spec §4.6 step 3).
    async fn poll(&self, job_id: &str) -> Result<JobStatusResponse, AsrError> {
        let deadline = Instant::now() + POLL_OVERALL_TIMEOUT;
        let mut interval = POLL_INITIAL_INTERVAL;

        loop {
            let resp = self
                .http
                .get(format!("{}/transcript/{job_id}", self.api_base))
                .header("authorization", &self.api_key)
                .send()
                .await?;
            let job: JobStatusResponse = resp.json().await.map_err(|e| AsrError::JobFailed(e.to_string()))?;

            match job.status.as_str() {
                "completed" => return Ok(job),
                "error" => return Err(AsrError::JobFailed(job.error.unwrap_or_default())),
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(AsrError::Timeout(POLL_OVERALL_TIMEOUT));
            }

            let sleep_for = interval.min(deadline.saturating_duration_since(Instant::now()));
            tokio::time::sleep(sleep_for).await;
            interval = Duration::from_secs_f64((interval.as_secs_f64() * POLL_BACKOFF_FACTOR).min(POLL_MAX_INTERVAL.as_secs_f64()));
        }
    }
}

fn format_job(job: &JobStatusResponse) -> String {
    if let Some(utterances) = &job.utterances {
        if !utterances.is_empty() {
            let pairs: Vec<(String, String)> = utterances.iter().map(|u| (u.speaker.clone(), u.text.clone())).collect();
            return format_utterances(&pairs);
        }
    }
    job.text.clone().unwrap_or_default()
}

/// Trim audio to `max_minutes` via an external audio tool with stream-copy
/// (no re-encode), leaving the original file untouched (spec §4.6 step 1).
async fn trim_audio(audio_path: &Path, max_minutes: u32) -> Option<PathBuf> {
    let temp_dir = std::env::temp_dir();
    let file_name = audio_path.file_name()?.to_string_lossy();
    let trimmed_path = temp_dir.join(format!("trimmed_{file_name}"));
    let max_seconds = (max_minutes as u64) * 60;

    let output = Command::new("ffmpeg")
        .args([
            "-i",
            audio_path.to_str()?,
            "-t",
            &max_seconds.to_string(),
            "-c",
            "copy",
            "-y",
            trimmed_path.to_str()?,
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;

    if output.status.success() && tokio::fs::try_exists(&trimmed_path).await.unwrap_or(false) {
        Some(trimmed_path)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn circuit_breaker_opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new();
        for _ in 0..CIRCUIT_BREAKER_THRESHOLD {
            breaker.record_failure().await;
        }
        assert!(breaker.is_open().await);
    }

    #[tokio::test]
    async fn circuit_breaker_resets_on_success() {
        let breaker = CircuitBreaker::new();
        breaker.record_failure().await;
        breaker.record_success();
        assert_eq!(breaker.consecutive_failures.load(Ordering::SeqCst), 0);
        assert!(!breaker.is_open().await);
    }

    #[tokio::test]
    async fn transcribe_missing_file_fails_fast() {
        let transcriber = Transcriber::new("test-key".to_string(), Mode::Full);
        let path = std::env::temp_dir().join("podcast-digest-definitely-missing.mp3");
        let err = transcriber.transcribe(&path, Mode::Full, 15).await.unwrap_err();
        assert!(matches!(err, AsrError::MissingFile(_)));
    }

    #[test]
    fn formats_utterances_when_present() {
        let job = JobStatusResponse {
            id: "1".into(),
            status: "completed".into(),
            error: None,
            text: Some("fallback text".into()),
            utterances: Some(vec![Utterance {
                speaker: "A".into(),
                text: "Hi.".into(),
            }]),
        };
        assert_eq!(format_job(&job), "Speaker A: Hi.");
    }

    #[test]
    fn falls_back_to_plain_text_without_utterances() {
        let job = JobStatusResponse {
            id: "1".into(),
            status: "completed".into(),
            error: None,
            text: Some("plain text".into()),
            utterances: None,
        };
        assert_eq!(format_job(&job), "plain text");
    }
}
