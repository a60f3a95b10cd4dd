//! C8 — the pipeline orchestrator and its progress-reporting channel (spec
//! §4.8).

pub mod events;
pub mod orchestrator;

pub use orchestrator::{CancellationFlag, Orchestrator};
