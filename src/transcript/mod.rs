//! C5/C6 — transcript discovery and ASR transcription (spec §4.5, §4.6).

pub mod finder;
pub mod text;
pub mod transcriber;

pub use finder::TranscriptFinder;
pub use transcriber::Transcriber;
