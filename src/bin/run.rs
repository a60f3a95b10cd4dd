//! Thin demo binary: wires configuration, the podcast catalog, the store,
//! and the orchestrator together for a single manual run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Arg, Command};
use podcast_digest::audio::Router;
use podcast_digest::config::{AppConfig, PodcastCatalog};
use podcast_digest::constants::fetcher::DEFAULT_DAYS_BACK;
use podcast_digest::pipeline::events::channel;
use podcast_digest::pipeline::{CancellationFlag, Orchestrator};
use podcast_digest::podcast::discovery::PodcastIndexClient;
use podcast_digest::podcast::EpisodeFetcher;
use podcast_digest::rate_limiter::RateLimiter;
use podcast_digest::store::Store;
use podcast_digest::summarize::Summarizer;
use podcast_digest::transcript::Transcriber;
use podcast_digest::utils::validation::sanitize_filename;
use tokio::sync::Semaphore;

const FETCH_CONCURRENCY: usize = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("podcast-digest")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ingests recent podcast episodes, transcribes and summarizes them")
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("FILE")
                .help("Path to the podcast catalog TOML file")
                .default_value("podcasts.toml"),
        )
        .arg(
            Arg::new("base-dir")
                .long("base-dir")
                .value_name("DIR")
                .help("Base directory for the on-disk layout (audio, transcripts, summaries, cache, db)")
                .default_value("./podcast-digest-data"),
        )
        .arg(
            Arg::new("days-back")
                .long("days-back")
                .value_name("N")
                .help("How many days back to look for new episodes"),
        )
        .get_matches();

    let base_dir = PathBuf::from(matches.get_one::<String>("base-dir").unwrap());
    let config = AppConfig::from_env(base_dir);
    config.ensure_layout().await?;

    let days_back: i64 = matches
        .get_one::<String>("days-back")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DAYS_BACK);

    let catalog_path = PathBuf::from(matches.get_one::<String>("catalog").unwrap());
    let catalog = if catalog_path.exists() {
        PodcastCatalog::load(&catalog_path)?
    } else {
        log::warn!("catalog file {} not found, running with an empty catalog", catalog_path.display());
        PodcastCatalog::default()
    };

    let store = Store::open(&config.db_path())?;
    let router = Router::new(store.clone(), None);

    let transcriber = config.assemblyai_api_key.clone().map(|key| Transcriber::new(key, config.default_mode));
    let summarizer = config
        .openai_api_key
        .clone()
        .map(|key| Summarizer::new(key, RateLimiter::from_defaults()));
    let discovery = match (&config.podcastindex_api_key, &config.podcastindex_api_secret) {
        (Some(key), Some(secret)) => PodcastIndexClient::new(key.clone(), secret.clone()).ok(),
        _ => None,
    };

    let cancellation = CancellationFlag::new();
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        router,
        transcriber,
        summarizer,
        discovery,
        cancellation.clone(),
        config.max_transcription_minutes,
    ));

    let (events_tx, mut events_rx) = channel();
    let event_logger = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            log::info!(
                "[{}] {} / {} -> {:?} (attempt {}){}",
                event.stage.as_str(),
                event.podcast,
                event.episode_title,
                event.state,
                event.attempt,
                event.error.map(|e| format!(": {e}")).unwrap_or_default(),
            );
        }
    });

    ctrlc_handler(cancellation.clone());

    let fetcher = EpisodeFetcher::new(&config);
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
    let audio_dir = config.audio_dir();
    let mode = config.default_mode;
    let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
    let mut joins = Vec::new();

    for podcast in &catalog.podcasts {
        if cancellation.is_cancelled() {
            break;
        }
        log::info!("fetching episodes for {}", podcast.name);
        let (episodes, failures) = fetcher.fetch(podcast, days_back, now).await;
        for failure in &failures {
            log::warn!("fetch failure for {}: {}", podcast.name, failure);
        }

        let apple_id = podcast.apple_id.clone();
        let retry_strategy = podcast.retry_strategy.clone();
        for episode in episodes {
            let orchestrator = Arc::clone(&orchestrator);
            let events_tx = events_tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let apple_id = apple_id.clone();
            let retry_strategy = retry_strategy.clone();
            let file_name = format!(
                "{}_{}.mp3",
                sanitize_filename(&episode.podcast),
                sanitize_filename(&episode.title)
            );
            let audio_path = audio_dir.join(file_name);

            joins.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                orchestrator
                    .process_episode(&episode, apple_id.as_deref(), &retry_strategy, mode, &audio_path, &events_tx)
                    .await;
            }));
        }
    }

    for join in joins {
        let _ = join.await;
    }

    drop(events_tx);
    let _ = event_logger.await;

    Ok(())
}

/// Wire the cancellation flag to Ctrl-C so a running batch winds down
/// cleanly at its next suspension point (spec §5 "Cancellation semantics").
fn ctrlc_handler(cancellation: CancellationFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("cancellation requested, finishing in-flight stages");
            cancellation.cancel();
        }
    });
}
