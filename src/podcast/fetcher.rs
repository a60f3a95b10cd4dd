//! C2 — Episode Fetcher (spec §4.2).

use crate::config::AppConfig;
use crate::error::{Component, ErrorKind, PipelineError};
use crate::podcast::dedup::{self, Source};
use crate::podcast::discovery::PodcastIndexClient;
use crate::podcast::feed::FeedClient;
use crate::podcast::itunes::ItunesClient;
use crate::podcast::models::{Episode, PodcastConfig};

pub struct EpisodeFetcher {
    feed_client: FeedClient,
    itunes_client: ItunesClient,
    discovery_client: Option<PodcastIndexClient>,
}

impl EpisodeFetcher {
    pub fn new(config: &AppConfig) -> Self {
        let discovery_client = match (&config.podcastindex_api_key, &config.podcastindex_api_secret) {
            (Some(key), Some(secret)) => PodcastIndexClient::new(key.clone(), secret.clone()).ok(),
            _ => None,
        };
        Self {
            feed_client: FeedClient::new(),
            itunes_client: ItunesClient::new(),
            discovery_client,
        }
    }

    /// Fetch, merge, and filter episodes for one podcast (spec §4.2 steps 1-6).
    pub async fn fetch(
        &self,
        podcast: &PodcastConfig,
        days_back: i64,
        now: i64,
    ) -> (Vec<Episode>, Vec<PipelineError>) {
        let mut candidates: Vec<(Episode, Source)> = Vec::new();
        let mut failures = Vec::new();

        for feed_url in &podcast.rss_feeds {
            match self.feed_client.fetch_episodes(&podcast.name, feed_url).await {
                Ok(episodes) => candidates.extend(episodes.into_iter().map(|e| (e, Source::Rss))),
                Err(e) => failures.push(PipelineError::new(
                    Component::Fetcher,
                    podcast.name.clone(),
                    String::new(),
                    ErrorKind::FeedError,
                    false,
                    format!("feed {feed_url}: {e}"),
                )),
            }
        }

        if let Some(apple_id) = &podcast.apple_id {
            match self.itunes_client.feed_url_for_podcast(apple_id).await {
                Ok(feed_url) => match self.feed_client.fetch_episodes(&podcast.name, &feed_url).await {
                    Ok(episodes) => candidates.extend(episodes.into_iter().map(|mut e| {
                        e.apple_podcast_id = Some(apple_id.clone());
                        (e, Source::Apple)
                    })),
                    Err(e) => failures.push(PipelineError::new(
                        Component::Fetcher,
                        podcast.name.clone(),
                        String::new(),
                        ErrorKind::FeedError,
                        false,
                        format!("apple feed: {e}"),
                    )),
                },
                Err(e) => failures.push(PipelineError::new(
                    Component::Fetcher,
                    podcast.name.clone(),
                    String::new(),
                    ErrorKind::FeedError,
                    false,
                    format!("itunes lookup: {e}"),
                )),
            }
        }

        if let (Some(client), Some(term)) = (&self.discovery_client, &podcast.search_term) {
            if let Ok(results) = client.search(term).await {
                if let Some(best) = results.into_iter().find(|r| r.title == podcast.name) {
                    if let Ok(episodes) = self.feed_client.fetch_episodes(&podcast.name, &best.feed_url).await {
                        candidates.extend(episodes.into_iter().map(|e| (e, Source::Directory)));
                    }
                }
            }
        }

        let cutoff = now - days_back * 86_400;
        let merged = dedup::merge(candidates);

        let mut kept = Vec::new();
        for episode in merged {
            if episode.published < cutoff {
                continue;
            }
            if !episode.has_any_media() {
                failures.push(PipelineError::new(
                    Component::Fetcher,
                    podcast.name.clone(),
                    episode.title.clone(),
                    ErrorKind::NoMedia,
                    false,
                    "episode has neither audio_url nor transcript_url",
                ));
                continue;
            }
            kept.push(episode);
        }

        (kept, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::podcast::models::{EpisodeMetadata, RetryStrategy};

    fn sample_podcast() -> PodcastConfig {
        PodcastConfig {
            name: "Pod".into(),
            apple_id: None,
            rss_feeds: vec![],
            search_term: None,
            retry_strategy: RetryStrategy::default(),
        }
    }

    #[test]
    fn episode_outside_days_back_window_is_excluded() {
        let now = 10_000_000i64;
        let days_back = 7;
        let cutoff = now - days_back * 86_400;
        let old_episode_published = cutoff - 1;
        assert!(old_episode_published < cutoff);
    }

    #[tokio::test]
    async fn fetch_with_no_sources_returns_empty() {
        let config = AppConfig::from_env("/tmp/podcast-digest-test");
        let fetcher = EpisodeFetcher::new(&config);
        let (episodes, failures) = fetcher.fetch(&sample_podcast(), 7, 1_700_000_000).await;
        assert!(episodes.is_empty());
        assert!(failures.is_empty());
    }

    #[test]
    fn no_media_episode_is_flagged_not_silently_dropped() {
        let ep = Episode {
            podcast: "Pod".into(),
            title: "Ep".into(),
            published: 1_700_000_000,
            audio_url: None,
            transcript_url: None,
            description: None,
            link: None,
            guid: None,
            duration: None,
            apple_podcast_id: None,
            metadata: EpisodeMetadata::default(),
        };
        assert!(!ep.has_any_media());
    }
}
