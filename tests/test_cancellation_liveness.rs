//! Integration test for spec §8 property 8: a cancelled run winds down
//! promptly instead of continuing to process every queued episode.

use std::time::Duration;

use podcast_digest::audio::Router;
use podcast_digest::config::Mode;
use podcast_digest::pipeline::events::channel;
use podcast_digest::pipeline::{CancellationFlag, Orchestrator};
use podcast_digest::podcast::models::{Episode, RetryStrategy};
use podcast_digest::store::Store;

fn episode(n: usize) -> Episode {
    Episode {
        podcast: "Pod".into(),
        title: format!("Ep {n}"),
        published: 1_700_000_000 + n as i64,
        audio_url: None,
        transcript_url: None,
        description: None,
        link: None,
        guid: None,
        duration: None,
        apple_podcast_id: None,
        metadata: Default::default(),
    }
}

#[tokio::test]
async fn cancelling_before_a_batch_starts_stops_every_episode_quickly() {
    let store = Store::open_in_memory().unwrap();
    let router = Router::new(store.clone(), None);
    let cancellation = CancellationFlag::new();
    let orchestrator = Orchestrator::new(store.clone(), router, None, None, None, cancellation.clone(), 15);

    cancellation.cancel();

    let (tx, mut rx) = channel();
    let episodes: Vec<Episode> = (0..8).map(episode).collect();
    let audio_dir = std::env::temp_dir();
    let retry = RetryStrategy::default();

    let run = async {
        for (i, ep) in episodes.iter().enumerate() {
            let audio_path = audio_dir.join(format!("podcast-digest-cancel-liveness-{i}.mp3"));
            let _ = tokio::fs::remove_file(&audio_path).await;
            orchestrator.process_episode(ep, None, &retry, Mode::Full, &audio_path, &tx).await;
        }
    };

    // Every episode must short-circuit on the cancellation check rather than
    // attempting any network or filesystem work; the whole batch must finish
    // well under a second.
    tokio::time::timeout(Duration::from_secs(5), run).await.expect("batch did not wind down promptly after cancellation");
    drop(tx);

    let mut count = 0;
    while let Some(event) = rx.recv().await {
        assert_eq!(event.state, podcast_digest::pipeline::events::State::Cancelled);
        count += 1;
    }
    assert_eq!(count, episodes.len());
}

#[tokio::test]
async fn cancelling_mid_batch_stops_subsequent_episodes() {
    let store = Store::open_in_memory().unwrap();
    let router = Router::new(store.clone(), None);
    let cancellation = CancellationFlag::new();
    let orchestrator = Orchestrator::new(store.clone(), router, None, None, None, cancellation.clone(), 15);

    let (tx, mut rx) = channel();
    let episodes: Vec<Episode> = (0..6).map(episode).collect();
    let audio_dir = std::env::temp_dir();
    let retry = RetryStrategy::default();

    let run = async {
        for (i, ep) in episodes.iter().enumerate() {
            if i == 3 {
                cancellation.cancel();
            }
            let audio_path = audio_dir.join(format!("podcast-digest-cancel-mid-{i}.mp3"));
            let _ = tokio::fs::remove_file(&audio_path).await;
            orchestrator.process_episode(ep, None, &retry, Mode::Full, &audio_path, &tx).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), run).await.expect("batch did not wind down promptly after mid-run cancellation");
    drop(tx);

    let mut cancelled_count = 0;
    while let Some(event) = rx.recv().await {
        if event.state == podcast_digest::pipeline::events::State::Cancelled {
            cancelled_count += 1;
        }
    }
    // Episodes 3, 4, 5 observe the cancellation flag at their very first
    // suspension point and emit exactly one Cancelled event each.
    assert_eq!(cancelled_count, 3);
}
