//! C7 — summarization: LLM-driven paragraph and long-form summaries, entity
//! correction, and guest-name extraction (spec §4.7).

pub mod entities;
pub mod guest;
pub mod summarizer;

pub use summarizer::{SummaryProducts, Summarizer};
