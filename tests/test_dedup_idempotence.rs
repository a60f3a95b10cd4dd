//! Integration test for spec §8 property 6: dedup idempotence and
//! source-preference stability.

use podcast_digest::podcast::dedup::{merge, Source};
use podcast_digest::podcast::models::Episode;

fn episode(title: &str, published: i64, guid: Option<&str>, audio_url: Option<&str>) -> Episode {
    Episode {
        podcast: "Pod".into(),
        title: title.into(),
        published,
        audio_url: audio_url.map(|s| s.to_string()),
        transcript_url: None,
        description: None,
        link: None,
        guid: guid.map(|s| s.to_string()),
        duration: None,
        apple_podcast_id: None,
        metadata: Default::default(),
    }
}

#[test]
fn merging_twice_produces_the_same_result() {
    let candidates = vec![
        (episode("Episode One", 1_700_000_000, Some("g1"), Some("https://rss.example.com/e1.mp3")), Source::Rss),
        (episode("Episode One", 1_700_000_100, Some("g1"), Some("https://apple.example.com/e1.mp3")), Source::Apple),
        (episode("Episode Two", 1_700_100_000, None, None), Source::Directory),
    ];

    let once = merge(candidates);
    assert_eq!(once.len(), 2);

    // Re-merging the already-deduplicated output (re-tagged at the same
    // preference each came from) must not change anything further.
    let retagged: Vec<(Episode, Source)> = once.clone().into_iter().map(|e| (e, Source::Rss)).collect();
    let twice = merge(retagged);

    assert_eq!(once.len(), twice.len());
    for ep in &once {
        assert!(twice.iter().any(|e| e.title == ep.title && e.audio_url == ep.audio_url));
    }
}

#[test]
fn rss_fields_win_over_apple_and_directory_on_conflict() {
    let candidates = vec![
        (episode("Episode One", 1_700_000_000, Some("g1"), None), Source::Rss),
        (
            episode("Episode One", 1_700_000_000, Some("g1"), Some("https://apple.example.com/e1.mp3")),
            Source::Apple,
        ),
    ];

    let merged = merge(candidates);
    assert_eq!(merged.len(), 1);
    // RSS had no audio_url; Apple's fills the gap, but RSS source still wins
    // identity — only the empty field was filled.
    assert_eq!(merged[0].audio_url.as_deref(), Some("https://apple.example.com/e1.mp3"));
}
