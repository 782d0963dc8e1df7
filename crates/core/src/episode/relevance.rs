//! Episode relevance classification.
//!
//! Decides, from the title alone, whether a release can satisfy an
//! episode-scoped request. This runs before any probe call, so irrelevant
//! releases never cost a request against the cache service.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::types::EpisodeInfo;

// Markers sit between separators; `_` counts as one, so `\b` is not used.

/// `S02E05`, `S02.E05`, `S02E05E06`, `S02E05-E07`, `S02E04-06`.
static SXXEYY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-z0-9])s(\d{1,2})[ ._-]?e(\d{1,3})(?:(?:-e?|e)(\d{1,3})(?:$|[^a-z0-9]))?")
        .unwrap()
});
/// `2x05`.
static NXEE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^a-z0-9])(\d{1,2})x(\d{2,3})(?:$|[^a-z0-9])").unwrap());
/// `Season 2 Episode 5`.
static VERBOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|[^a-z0-9])(?:season|saison)[ ._-]?(\d{1,2})",
        r"[ ._-]?(?:episode|ep)[ ._-]?(\d{1,3})(?:$|[^a-z0-9])",
    ))
    .unwrap()
});
/// `S01-S03`, `Season 1-3`, `Seasons 1 to 4`.
///
/// Group 3 catches `S02 - 10 Episodes`, where the second number is a count.
static SEASON_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|[^a-z0-9])(?:(?:seasons?|saison)[ ._-]?|s)(\d{1,2})",
        r"[ ._]?(?:-|to|~)[ ._]?(?:(?:seasons?|saison)[ ._-]?|s)?(\d{1,2})",
        r"(?:$|[^a-z0-9]((?:episodes?|eps?)(?:$|[^a-z]))?)",
    ))
    .unwrap()
});
/// `Season 02`, `Saison 2`, `S02`. A bare `s` must touch its digits.
static SEASON_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-z0-9])(?:(?:season|saison)[ ._-]?|s)(\d{1,3})").unwrap()
});
static COMPLETE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^a-z0-9])complete(?:$|[^a-z0-9])").unwrap());

/// How a release relates to a requested episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeRelevance {
    /// The release is (or contains, as a marked range) the requested episode.
    SpecificEpisode,
    /// A full-season archive for the requested season.
    SeasonPack,
    /// A multi-season or "complete" archive covering the requested season.
    RelevantMultiSeasonPack,
    Irrelevant,
}

impl EpisodeRelevance {
    /// Archive classes are verified by pack inspection, never per-file.
    pub fn is_pack(&self) -> bool {
        matches!(
            self,
            EpisodeRelevance::SeasonPack | EpisodeRelevance::RelevantMultiSeasonPack
        )
    }
}

/// Classify a title against the requested episode.
pub fn classify_relevance(title: &str, episode: &EpisodeInfo) -> EpisodeRelevance {
    let title = title.to_lowercase();

    match episode_markers(&title, episode) {
        Markers::Requested => return EpisodeRelevance::SpecificEpisode,
        Markers::Conflicting => return EpisodeRelevance::Irrelevant,
        Markers::None => {}
    }

    let mut saw_range = false;
    for caps in SEASON_RANGE.captures_iter(&title) {
        if caps.get(3).is_some() {
            continue;
        }
        saw_range = true;
        if let (Some(lo), Some(hi)) = (parse(caps.get(1)), parse(caps.get(2))) {
            if (lo.min(hi)..=lo.max(hi)).contains(&episode.season) {
                return EpisodeRelevance::RelevantMultiSeasonPack;
            }
        }
    }

    let mut saw_season = false;
    for caps in SEASON_TOKEN.captures_iter(&title) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // A trailing episode marker means this is not a bare season token.
        if matches!(title[whole.end()..].chars().next(), Some('e') | Some('x')) {
            continue;
        }
        saw_season = true;
        if number.as_str().parse::<u32>().ok() == Some(episode.season) {
            return EpisodeRelevance::SeasonPack;
        }
    }

    if saw_range || saw_season {
        return EpisodeRelevance::Irrelevant;
    }

    if COMPLETE.is_match(&title) {
        return EpisodeRelevance::RelevantMultiSeasonPack;
    }

    EpisodeRelevance::Irrelevant
}

enum Markers {
    None,
    Requested,
    Conflicting,
}

fn episode_markers(title: &str, episode: &EpisodeInfo) -> Markers {
    let mut found_any = false;

    for caps in SXXEYY.captures_iter(title) {
        found_any = true;
        let (Some(season), Some(first)) = (parse(caps.get(1)), parse(caps.get(2))) else {
            continue;
        };
        let last = parse(caps.get(3)).unwrap_or(first);
        let covered = (first.min(last)..=first.max(last)).contains(&episode.episode);
        if season == episode.season && covered {
            return Markers::Requested;
        }
    }

    for caps in NXEE.captures_iter(title).chain(VERBOSE.captures_iter(title)) {
        found_any = true;
        if parse(caps.get(1)) == Some(episode.season) && parse(caps.get(2)) == Some(episode.episode)
        {
            return Markers::Requested;
        }
    }

    if found_any {
        Markers::Conflicting
    } else {
        Markers::None
    }
}

fn parse(m: Option<regex_lite::Match<'_>>) -> Option<u32> {
    m.and_then(|m| m.as_str().parse().ok())
}
