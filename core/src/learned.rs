//! Learned-word collaborator.
//!
//! Learning itself lives outside this crate. The engine only asks a
//! `LearnedSource` for words already learned against an input pattern, and
//! merges them with the rule-derived suggestions.
//!
//! `InMemoryLearnings` is a small thread-safe implementation, enough for tests
//! and for feeding a word list to the command line tool.

use crate::error::{Result, VarnamError};
use crate::suggestion::Suggestion;
use ahash::AHashMap;
use std::sync::{Arc, RwLock};

/// A learned word whose pattern covers the first `consumed` chars of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    pub suggestion: Suggestion,
    pub consumed: usize,
}

pub trait LearnedSource: Send + Sync {
    /// Learned words whose pattern equals `input`.
    fn exact_words(&self, input: &str) -> Result<Vec<Suggestion>>;

    /// Learned words whose pattern is a proper, non-empty prefix of `input`.
    fn prefix_words(&self, input: &str) -> Result<Vec<PrefixMatch>>;
}

/// Thread-safe in-memory pattern -> learned words map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLearnings {
    inner: Arc<RwLock<AHashMap<String, Vec<Suggestion>>>>,
}

impl InMemoryLearnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `word` as learned for `pattern`. Re-learning a word keeps the
    /// higher weight and the later timestamp.
    pub fn learn(&self, pattern: &str, word: &str, weight: i64, learned_on: u64) {
        let Ok(mut map) = self.inner.write() else {
            return;
        };
        let words = map.entry(pattern.to_string()).or_default();
        match words.iter_mut().find(|s| s.word == word) {
            Some(existing) => {
                existing.weight = existing.weight.max(weight);
                existing.learned_on = existing.learned_on.max(Some(learned_on));
            }
            None => words.push(Suggestion::learned(word, weight, learned_on)),
        }
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse tab-separated `pattern<TAB>word[<TAB>weight[<TAB>learned_on]]`
    /// lines. Blank lines and lines starting with `#` are skipped.
    pub fn from_tsv_str(content: &str) -> Result<Self> {
        let learnings = Self::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(pattern), Some(word)) = (fields.next(), fields.next()) else {
                return Err(VarnamError::WordList {
                    line: lineno + 1,
                    reason: "expected pattern and word separated by a tab".into(),
                });
            };
            let weight = parse_field(fields.next(), lineno)?.unwrap_or(0);
            let learned_on = parse_field(fields.next(), lineno)?.unwrap_or(0);
            learnings.learn(pattern, word, weight, learned_on.max(0) as u64);
        }
        Ok(learnings)
    }
}

fn parse_field(field: Option<&str>, lineno: usize) -> Result<Option<i64>> {
    match field.map(str::trim).filter(|f| !f.is_empty()) {
        None => Ok(None),
        Some(f) => f
            .parse()
            .map(Some)
            .map_err(|_| VarnamError::WordList {
                line: lineno + 1,
                reason: format!("{:?} is not a number", f),
            }),
    }
}

impl LearnedSource for InMemoryLearnings {
    fn exact_words(&self, input: &str) -> Result<Vec<Suggestion>> {
        let map = self
            .inner
            .read()
            .map_err(|_| VarnamError::QueryFailure("learnings lock poisoned".into()))?;
        Ok(map.get(input).cloned().unwrap_or_default())
    }

    fn prefix_words(&self, input: &str) -> Result<Vec<PrefixMatch>> {
        let map = self
            .inner
            .read()
            .map_err(|_| VarnamError::QueryFailure("learnings lock poisoned".into()))?;

        let mut out = Vec::new();
        for (consumed, (end, _)) in input.char_indices().enumerate().skip(1) {
            if let Some(words) = map.get(&input[..end]) {
                out.extend(words.iter().map(|s| PrefixMatch {
                    suggestion: s.clone(),
                    consumed,
                }));
            }
        }
        // Longest prefix first.
        out.sort_by(|a, b| b.consumed.cmp(&a.consumed));
        Ok(out)
    }
}
