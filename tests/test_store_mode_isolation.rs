//! Integration test for spec §8 property 1: mode isolation.

use podcast_digest::config::Mode;
use podcast_digest::podcast::models::Episode;
use podcast_digest::store::{Store, TranscriptSource};

fn sample_episode() -> Episode {
    Episode {
        podcast: "Lex Fridman".into(),
        title: "Ep 1: A Guest".into(),
        published: 1_700_000_000,
        audio_url: Some("https://cdn.example.com/ep1.mp3".into()),
        transcript_url: None,
        description: None,
        link: None,
        guid: Some("guid-1".into()),
        duration: Some(3600),
        apple_podcast_id: None,
        metadata: Default::default(),
    }
}

#[tokio::test]
async fn writing_under_one_mode_never_mutates_the_other() {
    let store = Store::open_in_memory().unwrap();
    let episode = sample_episode();
    store.upsert_episode(&episode).await.unwrap();

    store
        .save_transcript(&episode.podcast, &episode.title, episode.published, Mode::Test, "test transcript", TranscriptSource::Generated)
        .await
        .unwrap();
    store
        .save_summary(&episode.podcast, &episode.title, episode.published, Mode::Test, "test paragraph", "test long")
        .await
        .unwrap();

    // Full mode must still see nothing.
    let full_transcript = store.get_transcript(&episode.podcast, &episode.title, episode.published, Mode::Full).await.unwrap();
    assert!(full_transcript.is_none());
    let full_summary = store.get_summary(&episode.podcast, &episode.title, episode.published, Mode::Full).await.unwrap();
    assert!(!full_summary.is_complete());

    // Now write full mode with different content.
    store
        .save_transcript(&episode.podcast, &episode.title, episode.published, Mode::Full, "full transcript", TranscriptSource::ApiDirect)
        .await
        .unwrap();
    store
        .save_summary(&episode.podcast, &episode.title, episode.published, Mode::Full, "full paragraph", "full long")
        .await
        .unwrap();

    // Test-mode data must be unchanged by the full-mode write.
    let test_transcript = store.get_transcript(&episode.podcast, &episode.title, episode.published, Mode::Test).await.unwrap();
    assert_eq!(test_transcript.unwrap().text, "test transcript");
    let test_summary = store.get_summary(&episode.podcast, &episode.title, episode.published, Mode::Test).await.unwrap();
    assert_eq!(test_summary.paragraph.as_deref(), Some("test paragraph"));

    let full_transcript = store.get_transcript(&episode.podcast, &episode.title, episode.published, Mode::Full).await.unwrap();
    assert_eq!(full_transcript.unwrap().text, "full transcript");
}
