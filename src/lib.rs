pub mod audio;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod error;
pub mod pipeline;
pub mod podcast;
pub mod rate_limiter;
pub mod store;
pub mod summarize;
pub mod transcript;
pub mod utils;

pub use config::{AppConfig, PodcastCatalog};
pub use store::Store;
