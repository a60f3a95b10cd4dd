//! Progress-based timeout streaming downloader (spec §4.4 "Progress-based
//! timeout").

use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::constants::download::{CHUNK_SIZE, MAX_DOWNLOAD_TIMEOUT, MIN_SPEED_BYTES_PER_SEC, STALL_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFailure {
    Stalled,
    MaxTimeout,
    Http(u16),
    Io,
}

impl std::fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFailure::Stalled => write!(f, "stalled"),
            StreamFailure::MaxTimeout => write!(f, "max_timeout"),
            StreamFailure::Http(code) => write!(f, "http {code}"),
            StreamFailure::Io => write!(f, "io error"),
        }
    }
}

pub struct ProgressParams {
    pub stall_timeout: Duration,
    pub max_timeout: Duration,
    pub min_speed_bytes_per_sec: u64,
}

impl Default for ProgressParams {
    fn default() -> Self {
        Self {
            stall_timeout: STALL_TIMEOUT,
            max_timeout: MAX_DOWNLOAD_TIMEOUT,
            min_speed_bytes_per_sec: MIN_SPEED_BYTES_PER_SEC,
        }
    }
}

/// Stream `url` to `output_path`, aborting on stall or overall timeout.
///
/// "Progress" only resets the stall clock when the rate observed over the
/// interval since the last update reached `min_speed_bytes_per_sec` (spec
/// §4.4: "'Progress' is updated only when the observed per-second rate is
/// >= min_speed").
pub async fn download_with_progress_timeout(
    client: &Client,
    url: &str,
    output_path: &Path,
    params: &ProgressParams,
) -> Result<u64, StreamFailure> {
    let response = client.get(url).send().await.map_err(|_| StreamFailure::Io)?;
    let status = response.status();
    if !status.is_success() {
        return Err(StreamFailure::Http(status.as_u16()));
    }

    let mut file = tokio::fs::File::create(output_path).await.map_err(|_| StreamFailure::Io)?;
    let mut stream = response.bytes_stream();

    let started = Instant::now();
    let mut last_progress = Instant::now();
    let mut total_bytes: u64 = 0;
    let mut bytes_since_check: u64 = 0;
    let mut last_check = Instant::now();
    let mut buffer: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);

    loop {
        let remaining_stall = params.stall_timeout.saturating_sub(last_progress.elapsed());
        let chunk = tokio::select! {
            chunk = stream.next() => chunk,
            _ = tokio::time::sleep(remaining_stall) => {
                return Err(StreamFailure::Stalled);
            }
        };

        let Some(chunk) = chunk else { break };
        let chunk = chunk.map_err(|_| StreamFailure::Io)?;

        if started.elapsed() > params.max_timeout {
            return Err(StreamFailure::MaxTimeout);
        }

        total_bytes += chunk.len() as u64;
        bytes_since_check += chunk.len() as u64;
        buffer.extend_from_slice(&chunk);

        while buffer.len() >= CHUNK_SIZE {
            let rest = buffer.split_off(CHUNK_SIZE);
            file.write_all(&buffer).await.map_err(|_| StreamFailure::Io)?;
            buffer = rest;
        }

        let elapsed = last_check.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let rate = bytes_since_check as f64 / elapsed.as_secs_f64();
            if rate >= params.min_speed_bytes_per_sec as f64 {
                last_progress = Instant::now();
            }
            bytes_since_check = 0;
            last_check = Instant::now();
        }
    }

    if !buffer.is_empty() {
        file.write_all(&buffer).await.map_err(|_| StreamFailure::Io)?;
    }
    file.flush().await.map_err(|_| StreamFailure::Io)?;
    Ok(total_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_spec_constants() {
        let params = ProgressParams::default();
        assert_eq!(params.stall_timeout, Duration::from_secs(60));
        assert_eq!(params.max_timeout, Duration::from_secs(30 * 60));
        assert_eq!(params.min_speed_bytes_per_sec, 1024);
    }

    #[test]
    fn stream_failure_display() {
        assert_eq!(StreamFailure::Stalled.to_string(), "stalled");
        assert_eq!(StreamFailure::Http(503).to_string(), "http 503");
    }
}
