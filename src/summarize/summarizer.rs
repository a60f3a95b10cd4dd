//! C7 — the summarizer (spec §4.7).
//!
//! Produces a short paragraph summary and a long structured summary from a
//! transcript, each via a separate rate-limited LLM call with bounded local
//! retries.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::summarize::{MAX_RETRIES, PARAGRAPH_TARGET_WORDS, TEMPERATURE};
use crate::rate_limiter::RateLimiter;
use crate::summarize::entities::{apply_corrections, apply_proposed_corrections, ProposedCorrection};
use crate::summarize::guest::extract_guest_name;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm returned no content")]
    EmptyResponse,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Shape of one LLM-proposed correction, before confidence gating.
#[derive(Debug, Deserialize)]
struct RawCorrection {
    incorrect: String,
    correct: String,
    confidence: f64,
}

/// Both products of a completed summarization pass. Either may be absent if
/// its call failed after local retries (spec: "keep the successful product
/// if any").
#[derive(Debug, Clone, Default)]
pub struct SummaryProducts {
    pub paragraph: Option<String>,
    pub long: Option<String>,
}

pub struct Summarizer {
    http: Client,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl Summarizer {
    pub fn new(api_key: String, rate_limiter: RateLimiter) -> Self {
        Self {
            http: Client::new(),
            api_key,
            rate_limiter,
        }
    }

    /// Run both LLM calls, applying the entity correction pre-pass to the
    /// transcript first (spec §4.7 "Entity correction pre-pass"): the
    /// deterministic rules, then any LLM-proposed corrections that clear the
    /// confidence threshold.
    pub async fn summarize(&self, podcast: &str, episode_title: &str, transcript: &str) -> SummaryProducts {
        let deterministic = apply_corrections(transcript);
        let proposals = self.propose_corrections(&deterministic).await;
        let corrected = apply_proposed_corrections(&deterministic, &proposals);
        let guest = extract_guest_name(episode_title);

        let paragraph = self
            .call_with_retries(&paragraph_prompt(podcast, episode_title, guest.as_deref(), &corrected))
            .await
            .ok();
        let long = self
            .call_with_retries(&long_prompt(podcast, episode_title, guest.as_deref(), &corrected))
            .await
            .ok();

        SummaryProducts { paragraph, long }
    }

    /// Ask the LLM to flag likely ASR mistranscriptions it notices beyond
    /// the deterministic rule set, returning only the ones worth acting on.
    /// A failed or unparseable response yields no proposals rather than
    /// failing the summarization pass.
    async fn propose_corrections(&self, transcript: &str) -> Vec<ProposedCorrection> {
        let raw = match self.call_with_retries(&correction_proposal_prompt(transcript)).await {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };

        let Some(start) = raw.find('[') else { return Vec::new() };
        let Some(end) = raw.rfind(']') else { return Vec::new() };
        if end < start {
            return Vec::new();
        }

        serde_json::from_str::<Vec<RawCorrection>>(&raw[start..=end])
            .unwrap_or_default()
            .into_iter()
            .map(|r| ProposedCorrection {
                incorrect: r.incorrect,
                correct: r.correct,
                confidence: r.confidence,
            })
            .collect()
    }

    async fn call_with_retries(&self, prompt: &str) -> Result<String, SummarizeError> {
        let mut attempt = 0;
        let mut backoff = Duration::from_secs(1);
        loop {
            self.rate_limiter.acquire().await;
            match self.call_llm(prompt).await {
                Ok(text) => return Ok(text),
                Err(_) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_llm(&self, prompt: &str) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are an expert podcast summarizer."},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
        });

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(SummarizeError::EmptyResponse)
    }
}

fn correction_proposal_prompt(transcript: &str) -> String {
    format!(
        "Read this podcast transcript and list any names, companies, or terms you believe \
         an automated transcription mangled. Respond with ONLY a JSON array, no prose, where \
         each element is {{\"incorrect\": \"...\", \"correct\": \"...\", \"confidence\": 0.0-1.0}}. \
         Respond with an empty array if nothing looks wrong.\n\nTRANSCRIPT:\n{transcript}"
    )
}

fn paragraph_prompt(podcast: &str, title: &str, guest: Option<&str>, transcript: &str) -> String {
    let guest_line = guest.map(|g| format!("The guest is {g}. ")).unwrap_or_default();
    format!(
        "Summarize this episode of \"{podcast}\" titled \"{title}\" in about {PARAGRAPH_TARGET_WORDS} words. \
         {guest_line}Write a single flowing paragraph, no headings.\n\nTRANSCRIPT:\n{transcript}"
    )
}

fn long_prompt(podcast: &str, title: &str, guest: Option<&str>, transcript: &str) -> String {
    let guest_line = guest.map(|g| format!("The guest is {g}. ")).unwrap_or_default();
    format!(
        "Write a structured long-form summary of this episode of \"{podcast}\" titled \"{title}\", \
         using markdown-style headings for major topics discussed. {guest_line}\n\nTRANSCRIPT:\n{transcript}"
    )
}
