//! C3 — the audio source finder (spec §4.3).
//!
//! Given an episode and its retry strategy, produces an ordered,
//! de-duplicated list of candidate audio URLs. Candidates are generated,
//! never downloaded in full; validation here is limited to `HEAD`/range
//! probes that confirm a URL is reachable and audio-shaped.

use regex::Regex;
use reqwest::Client;

use crate::constants::fetcher::TITLE_OVERLAP_THRESHOLD;
use crate::podcast::itunes::{title_overlap, ItunesClient};
use crate::podcast::models::{Episode, FallbackStrategy, PrimaryStrategy, RetryStrategy};

/// CDN hostname patterns tried when `fallback == cdn_alternatives` (spec
/// §4.3 step 5).
const CDN_HOST_TEMPLATES: &[&str] = &["d1.cloudfront.net", "d2.cloudfront.net", "d3.cloudfront.net", "d4.cloudfront.net"];
const CDN_REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1"];

pub struct SourceFinder {
    http: Client,
    itunes: ItunesClient,
}

impl SourceFinder {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .user_agent(crate::constants::network::USER_AGENT)
                .connect_timeout(crate::constants::network::CONNECT_TIMEOUT)
                .build()
                .expect("failed to build source-finder HTTP client"),
            itunes: ItunesClient::new(),
        }
    }

    /// Build the ordered candidate list per the spec's 7-step policy.
    pub async fn find_candidates(&self, episode: &Episode, apple_id: Option<&str>, retry: &RetryStrategy) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();
        let mut youtube_tried = false;

        // Step 1: force_apple or primary == apple_podcasts.
        if retry.force_apple || retry.primary == PrimaryStrategy::ApplePodcasts {
            if let Some(id) = apple_id {
                if let Some(url) = self.resolve_apple_url(id, episode).await {
                    push_unique(&mut candidates, url);
                }
            }
        }

        // Step 2: platform rewrites on the advertised audio URL.
        if let Some(audio_url) = &episode.audio_url {
            if let Some(rewritten) = self.platform_rewrite(audio_url).await {
                push_unique(&mut candidates, rewritten);
            }
        }

        // Step 3: primary == youtube_search tried immediately; otherwise
        // deferred to step 6.
        if retry.primary == PrimaryStrategy::YoutubeSearch {
            if let Some(url) = self.youtube_candidate(episode, retry).await {
                push_unique(&mut candidates, url);
            }
            youtube_tried = true;
        }

        // Step 4: scrape the episode webpage for embedded audio.
        if let Some(link) = &episode.link {
            for url in self.scrape_webpage(link).await {
                push_unique(&mut candidates, url);
            }
        }

        // Step 5: cdn_alternatives — redirect chain + hostname synthesis.
        if retry.fallback == FallbackStrategy::CdnAlternatives {
            if let Some(audio_url) = &episode.audio_url {
                for url in self.cdn_alternatives(audio_url).await {
                    push_unique(&mut candidates, url);
                }
            }
        }

        // Step 6: fallback == youtube_search, if not already tried.
        if retry.fallback == FallbackStrategy::YoutubeSearch && !youtube_tried {
            if let Some(url) = self.youtube_candidate(episode, retry).await {
                push_unique(&mut candidates, url);
            }
        }

        // Step 7: the RSS-advertised URL, last resort, unless skip_rss.
        if !retry.skip_rss {
            if let Some(audio_url) = &episode.audio_url {
                push_unique(&mut candidates, audio_url.clone());
            }
        }

        candidates
    }

    async fn resolve_apple_url(&self, apple_id: &str, episode: &Episode) -> Option<String> {
        let entries = self.itunes.episodes_for_podcast(apple_id).await.ok()?;
        entries
            .into_iter()
            .filter_map(|e| {
                let track = e.track_name.clone()?;
                let score = title_overlap(&track, &episode.title);
                Some((score, e))
            })
            .filter(|(score, _)| *score >= TITLE_OVERLAP_THRESHOLD)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .and_then(|(_, entry)| entry.feed_url)
    }

    /// Probe known CDN-fronted podcast hosts with host-specific headers,
    /// returning a rewritten URL only if the probe succeeds (spec §4.3 step
    /// 2: "MegaphoneHandler ... LibsynHandler ...").
    async fn platform_rewrite(&self, url: &str) -> Option<String> {
        if url.contains("megaphone.fm") {
            return self
                .probe_ok(url, &[("User-Agent", "Megaphone/1.0 (compatible; podcast-digest)")])
                .await
                .then(|| url.to_string());
        }
        if url.contains("libsyn.com") {
            return self.probe_ok(url, &[("Referer", "https://libsyn.com/")]).await.then(|| url.to_string());
        }
        None
    }

    async fn probe_ok(&self, url: &str, headers: &[(&str, &str)]) -> bool {
        let mut req = self.http.head(url);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        matches!(req.send().await, Ok(resp) if resp.status().is_success() || resp.status().is_redirection())
    }

    async fn youtube_candidate(&self, episode: &Episode, retry: &RetryStrategy) -> Option<String> {
        let strategy = crate::audio::strategies::youtube::YoutubeStrategy::new(None);
        if let Some(channel) = &retry.youtube_channel_name {
            let _ = channel;
        }
        strategy.resolve_video_url(episode).await
    }

    /// Scrape the episode webpage for `<audio>`/`<source>` tags, known-embed
    /// iframes, and JSON-embedded audio URLs (spec §4.3 step 4).
    async fn scrape_webpage(&self, link: &str) -> Vec<String> {
        let body = match self.http.get(link).send().await {
            Ok(resp) => match resp.text().await {
                Ok(text) => text,
                Err(_) => return Vec::new(),
            },
            Err(_) => return Vec::new(),
        };
        extract_embedded_audio_urls(&body)
    }

    async fn cdn_alternatives(&self, original: &str) -> Vec<String> {
        let resolved = self.follow_redirects(original).await.unwrap_or_else(|| original.to_string());
        let mut alternatives = Vec::new();
        if let Some(path_and_query) = strip_to_path(&resolved) {
            for host in CDN_HOST_TEMPLATES {
                alternatives.push(format!("https://{host}{path_and_query}"));
            }
            for region in CDN_REGIONS {
                alternatives.push(format!("https://s3-{region}.amazonaws.com{path_and_query}"));
            }
        }
        alternatives
    }

    async fn follow_redirects(&self, url: &str) -> Option<String> {
        let resp = self.http.head(url).send().await.ok()?;
        Some(resp.url().to_string())
    }
}

impl Default for SourceFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_to_path(url: &str) -> Option<String> {
    let without_scheme = url.splitn(2, "://").nth(1)?;
    let slash = without_scheme.find('/')?;
    Some(without_scheme[slash..].to_string())
}

fn extract_embedded_audio_urls(html: &str) -> Vec<String> {
    let mut found = Vec::new();
    let src_re = Regex::new(r#"(?i)<(?:audio|source)[^>]*\ssrc=["']([^"']+)["']"#).unwrap();
    for caps in src_re.captures_iter(html) {
        found.push(caps[1].to_string());
    }

    let json_re = Regex::new(r#""(?:audioUrl|audio_url|mp3|enclosureUrl)"\s*:\s*"([^"]+\.(?:mp3|m4a)[^"]*)""#).unwrap();
    for caps in json_re.captures_iter(html) {
        found.push(caps[1].replace("\\/", "/"));
    }

    found
}

fn push_unique(list: &mut Vec<String>, url: String) {
    if !list.contains(&url) {
        list.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_audio_tag_src() {
        let html = r#"<div><audio controls src="https://cdn.example.com/ep.mp3"></audio></div>"#;
        let urls = extract_embedded_audio_urls(html);
        assert_eq!(urls, vec!["https://cdn.example.com/ep.mp3".to_string()]);
    }

    #[test]
    fn extracts_source_tag_and_json_field() {
        let html = r#"
            <video><source src="https://cdn.example.com/ep.m4a" type="audio/mp4"></video>
            <script>var data = {"audioUrl": "https:\/\/cdn.example.com\/ep2.mp3"};</script>
        "#;
        let urls = extract_embedded_audio_urls(html);
        assert!(urls.contains(&"https://cdn.example.com/ep.m4a".to_string()));
        assert!(urls.contains(&"https://cdn.example.com/ep2.mp3".to_string()));
    }

    #[test]
    fn strip_to_path_drops_scheme_and_host() {
        assert_eq!(
            strip_to_path("https://cdn.example.com/a/b/ep.mp3?x=1"),
            Some("/a/b/ep.mp3?x=1".to_string())
        );
        assert_eq!(strip_to_path("not-a-url"), None);
    }

    #[test]
    fn push_unique_skips_duplicates() {
        let mut list = Vec::new();
        push_unique(&mut list, "a".to_string());
        push_unique(&mut list, "a".to_string());
        push_unique(&mut list, "b".to_string());
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }
}
