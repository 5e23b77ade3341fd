use super::intent::{is_place_phrase_vocabulary, is_query_vocabulary, LOCATIVE_PREPOSITIONS};
use crate::datasources::Geocoder;
use crate::models::{Coordinates, Location};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Turns free text into the ordered list of places it mentions.
pub struct RegionResolver {
    geocoder: Arc<dyn Geocoder>,
    timeout: Duration,
}

/// Drops vocabulary words from both ends of a candidate; None when nothing remains.
fn trim_vocabulary(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate
        .split(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | ';' | ':'))
        .filter(|w| !w.is_empty())
        .collect();

    let start = words.iter().position(|w| !is_place_phrase_vocabulary(w))?;
    let end = words.iter().rposition(|w| !is_place_phrase_vocabulary(w))?;
    Some(words[start..=end].join(" "))
}

/// Every stretch of text that follows a locative preposition, ending at the
/// next preposition or at the end of the sentence.
fn locative_phrases(text: &str) -> Vec<&str> {
    let mut phrases = Vec::new();

    for sentence in text.split(['?', '.', '!']) {
        let mut open: Option<usize> = None;
        let mut offset = 0;

        for word in sentence.split_inclusive(|c: char| !c.is_alphanumeric()) {
            let bare = word.trim_end_matches(|c: char| !c.is_alphanumeric());
            let is_preposition = bare.len() < word.len()
                && LOCATIVE_PREPOSITIONS
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(bare));
            if is_preposition {
                if let Some(start) = open {
                    phrases.push(&sentence[start..offset]);
                }
                open = Some(offset + word.len());
            }
            offset += word.len();
        }

        if let Some(start) = open {
            phrases.push(&sentence[start..]);
        }
    }
    phrases
}

fn split_places(phrase: &str) -> Vec<String> {
    phrase
        .split([',', '&'])
        .flat_map(|part| {
            let mut pieces = Vec::new();
            let mut current = Vec::new();
            for word in part.split_whitespace() {
                if word.eq_ignore_ascii_case("and") {
                    pieces.push(current.join(" "));
                    current.clear();
                } else {
                    current.push(word);
                }
            }
            pieces.push(current.join(" "));
            pieces
        })
        .filter_map(|piece| trim_vocabulary(&piece))
        .collect()
}

/// Runs of capitalised words, broken by punctuation.
fn capitalised_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in text.split_whitespace() {
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalised = word.chars().next().is_some_and(|c| c.is_uppercase());
        let breaks_after = token.ends_with([',', '.', '?', '!', ';', ':']);

        if capitalised && !is_query_vocabulary(word) {
            current.push(word);
        } else if !current.is_empty() {
            runs.push(current.join(" "));
            current.clear();
        }

        if breaks_after && !current.is_empty() {
            runs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        runs.push(current.join(" "));
    }
    runs
}

/// Candidate place names in the order they appear, case-insensitively unique.
pub fn extract_candidates(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = locative_phrases(text)
        .into_iter()
        .flat_map(split_places)
        .collect();

    if candidates.is_empty() {
        candidates = capitalised_runs(text);
    }
    dedupe_ignoring_case(candidates)
}

fn dedupe_ignoring_case(mut candidates: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    candidates.retain(|c| {
        let key = c.to_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    candidates
}

impl RegionResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, timeout: Duration) -> Self {
        Self { geocoder, timeout }
    }

    async fn geocode(&self, place: &str) -> Option<Location> {
        match tokio::time::timeout(self.timeout, self.geocoder.forward(place)).await {
            Ok(Ok(found)) => {
                if found.is_none() {
                    tracing::debug!("No geocoding match for '{}'", place);
                }
                found
            }
            Ok(Err(e)) => {
                tracing::warn!("Geocoding '{}' failed: {}", place, e);
                None
            }
            Err(_) => {
                tracing::warn!("Geocoding '{}' timed out after {:?}", place, self.timeout);
                None
            }
        }
    }

    /// Every place the text names, geocoded, in mention order. May be empty.
    /// When no candidate geocodes, capitalised runs elsewhere in the text get
    /// one more try.
    pub async fn resolve(&self, text: &str) -> Vec<Location> {
        let candidates = extract_candidates(text);
        tracing::debug!("Place candidates for '{}': {:?}", text, candidates);

        let mut found = self.geocode_all(&candidates).await;
        if found.iter().all(Option::is_none) {
            let untried: Vec<String> = capitalised_runs(text)
                .into_iter()
                .filter(|run| !candidates.iter().any(|c| c.eq_ignore_ascii_case(run)))
                .collect();
            if !untried.is_empty() {
                tracing::debug!("Retrying with capitalised words: {:?}", untried);
                found = self.geocode_all(&dedupe_ignoring_case(untried)).await;
            }
        }

        let mut resolved: Vec<Location> = Vec::new();
        for location in found.into_iter().flatten() {
            if resolved.iter().any(|r| r.same_region(&location)) {
                tracing::debug!("Dropping duplicate region {}", location);
                continue;
            }
            resolved.push(location);
        }
        resolved
    }

    async fn geocode_all(&self, candidates: &[String]) -> Vec<Option<Location>> {
        match candidates {
            [] => Vec::new(),
            [single] => vec![self.geocode(single).await],
            many => join_all(many.iter().map(|c| self.geocode(c))).await,
        }
    }

    /// Like [`resolve`](Self::resolve), but when the text names nowhere and
    /// coordinates were supplied, answers with a single location at the hint.
    pub async fn resolve_with_hint(&self, text: &str, hint: Option<Coordinates>) -> Vec<Location> {
        let resolved = self.resolve(text).await;
        if !resolved.is_empty() {
            return resolved;
        }
        match hint {
            Some(coords) => vec![self.locate(coords).await],
            None => Vec::new(),
        }
    }

    /// Names a point by reverse geocoding, or by its coordinates when that fails.
    pub async fn locate(&self, coords: Coordinates) -> Location {
        let name = match tokio::time::timeout(self.timeout, self.geocoder.reverse(coords)).await {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("Reverse geocoding timed out after {:?}", self.timeout);
                None
            }
        };

        match name {
            Some(name) => Location::new(name, coords.lat, coords.lon),
            None => Location::unnamed(coords),
        }
    }
}
