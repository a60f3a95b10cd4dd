//! C3/C4 — audio source discovery and download (spec §4.3, §4.4).

pub mod progress;
pub mod router;
pub mod source_finder;
pub mod strategies;
pub mod validation;

pub use router::{DownloadError, Router};
pub use source_finder::SourceFinder;
