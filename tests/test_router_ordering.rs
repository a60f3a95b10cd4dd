//! Integration tests for spec §8 properties 2 and 3: router strategy
//! ordering and the YouTube-URL override.

use podcast_digest::audio::Router;
use podcast_digest::audio::strategies::StrategyName;
use podcast_digest::store::Store;

#[tokio::test]
async fn history_then_default_chain_with_no_duplicates() {
    let store = Store::open_in_memory().unwrap();
    store.record_download_strategy("Some New Show", "apple_podcasts").await.unwrap();
    store.record_download_strategy("Some New Show", "youtube").await.unwrap();
    // Most recent success (youtube) should be at the head, then the earlier
    // success (apple_podcasts), then the remainder of the default chain with
    // no duplicates.
    let router = Router::new(store, None);
    let order = router.strategy_order("Some New Show", "https://cdn.example.com/ep.mp3").await;

    assert_eq!(order[0], StrategyName::Youtube);
    assert_eq!(order[1], StrategyName::ApplePodcasts);
    assert_eq!(order.iter().filter(|s| **s == StrategyName::Direct).count(), 1);
    let mut seen = std::collections::HashSet::new();
    assert!(order.iter().all(|s| seen.insert(*s)), "router produced duplicate strategies: {order:?}");
}

#[tokio::test]
async fn youtube_hosted_url_always_starts_with_youtube_then_browser() {
    let store = Store::open_in_memory().unwrap();
    store.record_download_strategy("Lex Fridman", "direct").await.unwrap();
    let router = Router::new(store, None);

    let order = router.strategy_order("Lex Fridman", "https://youtu.be/abc123").await;
    assert_eq!(order, vec![StrategyName::Youtube, StrategyName::Browser]);
}
