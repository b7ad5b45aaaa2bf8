//! Ranked word suggestions and the merge rules shared by every source.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One ranked output candidate.
///
/// Weights are on a relative scale; higher is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub word: String,
    pub weight: i64,
    /// Unix timestamp of the learned word this suggestion derives from.
    /// `None` for purely rule-derived suggestions.
    pub learned_on: Option<u64>,
}

impl Suggestion {
    pub fn new<T: Into<String>>(word: T, weight: i64) -> Self {
        Suggestion {
            word: word.into(),
            weight,
            learned_on: None,
        }
    }

    pub fn learned<T: Into<String>>(word: T, weight: i64, learned_on: u64) -> Self {
        Suggestion {
            word: word.into(),
            weight,
            learned_on: Some(learned_on),
        }
    }
}

/// Collapse entries with the same word, keeping the higher weight.
///
/// Weights are never summed. The survivor keeps the position of the word's
/// first occurrence, and inherits `learned_on` from a dropped duplicate if it
/// has none of its own.
pub fn dedup_keep_max(suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut slot: AHashMap<String, usize> = AHashMap::with_capacity(suggestions.len());
    let mut out: Vec<Suggestion> = Vec::with_capacity(suggestions.len());

    for sug in suggestions {
        match slot.get(&sug.word) {
            Some(&i) => {
                let kept = &mut out[i];
                let learned_on = kept.learned_on.or(sug.learned_on);
                if sug.weight > kept.weight {
                    *kept = sug;
                }
                kept.learned_on = kept.learned_on.or(learned_on);
            }
            None => {
                slot.insert(sug.word.clone(), out.len());
                out.push(sug);
            }
        }
    }
    out
}

/// Sort by weight descending; equal weights keep their current order.
pub fn sort_by_weight(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| b.weight.cmp(&a.weight));
}

/// Merge several suggestion lists in priority order, dedup, sort and truncate.
pub fn merge_suggestions<I>(lists: I, limit: usize) -> Vec<Suggestion>
where
    I: IntoIterator<Item = Vec<Suggestion>>,
{
    let mut all = dedup_keep_max(lists.into_iter().flatten().collect());
    sort_by_weight(&mut all);
    all.truncate(limit);
    all
}
