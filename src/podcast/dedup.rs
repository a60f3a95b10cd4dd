//! Cross-source episode deduplication (spec §4.2 step 5).

use crate::podcast::models::Episode;

/// Which source an episode candidate came from, in merge-preference order
/// (spec §4.2 step 5: "RSS feed -> Apple lookup -> directory API").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Rss,
    Apple,
    Directory,
}

struct Candidate {
    episode: Episode,
    source: Source,
}

/// Merge candidate episodes from multiple sources into a deduplicated list.
///
/// Matching order: (a) equal non-empty `guid`; (b) normalized title plus a
/// published timestamp within one day. On a match, non-empty fields from the
/// lower-preference candidate fill gaps in the higher-preference one; the
/// higher-preference candidate's own fields always win.
pub fn merge(candidates: Vec<(Episode, Source)>) -> Vec<Episode> {
    let mut merged: Vec<Candidate> = Vec::new();

    for (episode, source) in candidates {
        let existing_idx = merged.iter().position(|c| matches(&c.episode, &episode));
        match existing_idx {
            Some(idx) => {
                if source < merged[idx].source {
                    let incoming = Candidate { episode, source };
                    let winner_fields = take_non_empty_fields(incoming.episode.clone(), merged[idx].episode.clone());
                    merged[idx] = Candidate {
                        episode: winner_fields,
                        source,
                    };
                } else {
                    let filled = take_non_empty_fields(merged[idx].episode.clone(), episode);
                    merged[idx].episode = filled;
                }
            }
            None => merged.push(Candidate { episode, source }),
        }
    }

    merged.into_iter().map(|c| c.episode).collect()
}

fn matches(a: &Episode, b: &Episode) -> bool {
    if let (Some(ga), Some(gb)) = (&a.guid, &b.guid) {
        if !ga.is_empty() && ga == gb {
            return true;
        }
    }
    let same_title = normalize_title(&a.title) == normalize_title(&b.title);
    let close_date = (a.published - b.published).abs() <= 86_400;
    same_title && close_date
}

fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `primary` wins on every field it has; `secondary` only fills gaps.
fn take_non_empty_fields(primary: Episode, secondary: Episode) -> Episode {
    Episode {
        podcast: primary.podcast,
        title: primary.title,
        published: primary.published,
        audio_url: primary.audio_url.or(secondary.audio_url),
        transcript_url: primary.transcript_url.or(secondary.transcript_url),
        description: primary.description.or(secondary.description),
        link: primary.link.or(secondary.link),
        guid: primary.guid.or(secondary.guid),
        duration: primary.duration.or(secondary.duration),
        apple_podcast_id: primary.apple_podcast_id.or(secondary.apple_podcast_id),
        metadata: primary.metadata,
    }
}
