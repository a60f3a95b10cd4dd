//! Download strategies (spec §4.4 "Strategies").
//!
//! Each strategy is a small, independent unit that knows whether it can
//! handle a given URL/podcast and how to produce a validated audio file.

pub mod apple_podcasts;
pub mod browser;
pub mod direct;
pub mod youtube;

use std::path::Path;

use async_trait::async_trait;

use crate::podcast::models::Episode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyName {
    Direct,
    ApplePodcasts,
    Youtube,
    Browser,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::Direct => "direct",
            StrategyName::ApplePodcasts => "apple_podcasts",
            StrategyName::Youtube => "youtube",
            StrategyName::Browser => "browser",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(StrategyName::Direct),
            "apple_podcasts" => Some(StrategyName::ApplePodcasts),
            "youtube" => Some(StrategyName::Youtube),
            "browser" => Some(StrategyName::Browser),
            _ => None,
        }
    }
}

impl std::fmt::Display for StrategyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub retryable: bool,
    pub message: String,
}

impl StrategyFailure {
    pub fn new(retryable: bool, message: impl Into<String>) -> Self {
        Self {
            retryable,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    fn name(&self) -> StrategyName;

    /// Whether this strategy is capable of handling `url` for `podcast`.
    fn can_handle(&self, url: &str, podcast: &str) -> bool;

    /// Attempt to produce a validated audio file at `output_path`.
    async fn download(&self, url: &str, output_path: &Path, episode: &Episode) -> Result<(), StrategyFailure>;
}
