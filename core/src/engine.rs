// core/src/engine.rs
//
// Transliteration session: owns the symbol store, the language rules derived
// from it at open time and the configuration. Every caller-facing operation
// goes through here; there is no process-wide state.

use crate::cancel::CancelToken;
use crate::composer::Composer;
use crate::error::{Result, VarnamError};
use crate::learned::LearnedSource;
use crate::scheme::SchemeDetails;
use crate::splitter::Splitter;
use crate::store::SymbolStore;
use crate::suggestion::{merge_suggestions, Suggestion};
use crate::symbol::{AcceptCondition, GeneralType, MatchFilter, Token};
use crate::tokenizer::Tokenizer;
use crate::{utils, Config, LangRules};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Pattern of the virama symbol in a scheme.
const VIRAMA_PATTERN: &str = "~";

/// Rendering of the scheme's virama, whatever position it is accepted at.
fn find_virama<S: SymbolStore>(store: &S) -> Result<Option<String>> {
    for accept in [
        AcceptCondition::All,
        AcceptCondition::InBetween,
        AcceptCondition::EndsWith,
        AcceptCondition::StartsWith,
    ] {
        let found = store
            .lookup_exact(VIRAMA_PATTERN, MatchFilter::Any, accept)?
            .into_iter()
            .find(|s| s.general_type == GeneralType::Virama);
        if let Some(sym) = found {
            return Ok(Some(sym.value1));
        }
    }
    Ok(None)
}

/// Everything one transliteration request produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransliterationResult {
    /// Learned words whose pattern is exactly the input.
    pub exact_words: Vec<Suggestion>,
    /// Learned continuations, exact learned words and (depending on
    /// configuration) tokenizer suggestions, merged.
    pub suggestions: Vec<Suggestion>,
    /// Rule-derived suggestions for the whole input.
    pub tokenizer_suggestions: Vec<Suggestion>,
    /// Rule-derived suggestions using exact symbols only.
    pub greedy_tokenized: Vec<Suggestion>,
}

/// Rule-derived part of a result; this is what the cache holds.
#[derive(Debug, Clone, Default)]
struct RuleSuggestions {
    tokenizer: Vec<Suggestion>,
    greedy: Vec<Suggestion>,
}

/// A transliteration session over a symbol store.
pub struct Engine<S: SymbolStore> {
    store: S,
    rules: LangRules,
    config: Config,
    cache: Mutex<LruCache<String, RuleSuggestions>>,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl<S: SymbolStore> Engine<S> {
    /// Open a session. Fails with `StoreUnavailable` if the store has no
    /// symbols or cannot be queried.
    pub fn open(store: S, config: Config) -> Result<Self> {
        let pattern_longest_length = store.max_pattern_length();
        if pattern_longest_length == 0 {
            return Err(VarnamError::StoreUnavailable(format!(
                "scheme {:?} has no symbols",
                store.scheme().identifier
            )));
        }

        let virama = find_virama(&store).map_err(|e| VarnamError::StoreUnavailable(e.to_string()))?;

        let rules = LangRules {
            pattern_longest_length,
            indic_digits: config.indic_digits,
            virama,
        };
        let capacity = NonZeroUsize::new(config.max_cache_size).unwrap_or(NonZeroUsize::MIN);

        tracing::info!(
            scheme = %store.scheme().identifier,
            longest = rules.pattern_longest_length,
            indic_digits = rules.indic_digits,
            "engine opened"
        );

        Ok(Self {
            store,
            rules,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
        })
    }

    pub fn scheme(&self) -> &SchemeDetails {
        self.store.scheme()
    }

    pub fn rules(&self) -> &LangRules {
        &self.rules
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn composer(&self) -> Composer<'_, S> {
        Composer::new(&self.store, &self.rules, self.config.expansion_budget)
    }

    pub fn tokenize(&self, input: &str, filter: MatchFilter, partial: bool, cancel: &CancelToken) -> Vec<Token> {
        Tokenizer::new(&self.store, &self.rules).tokenize(input, filter, partial, cancel)
    }

    pub fn compose(&self, tokens: &[Token], partial: bool, limit: usize, cancel: &CancelToken) -> Vec<Suggestion> {
        self.composer().compose(tokens, partial, limit, cancel)
    }

    pub fn compose_greedy(
        &self,
        tokens: &[Token],
        partial: bool,
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        self.composer().compose_greedy(tokens, partial, limit, cancel)
    }

    pub fn continue_suggestions(
        &self,
        prefixes: &[Suggestion],
        residual: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        self.composer().continue_suggestions(prefixes, residual, limit, cancel)
    }

    pub fn split_by_conjunct(&self, word: &str) -> Result<Vec<String>> {
        Splitter::new(&self.store).split_by_conjunct(word)
    }

    pub fn split_text_by_conjunct(&self, word: &str) -> Result<Vec<Token>> {
        Splitter::new(&self.store).split_text_by_conjunct(word)
    }

    /// Transliterate `input` using the symbol rules only.
    pub fn transliterate(&self, input: &str, cancel: &CancelToken) -> TransliterationResult {
        self.run(input, None, cancel)
    }

    /// Transliterate `input`, blending in words from `learned`.
    pub fn transliterate_with(
        &self,
        input: &str,
        learned: &dyn LearnedSource,
        cancel: &CancelToken,
    ) -> TransliterationResult {
        self.run(input, Some(learned), cancel)
    }

    fn run(&self, input: &str, learned: Option<&dyn LearnedSource>, cancel: &CancelToken) -> TransliterationResult {
        let input = utils::normalize(input);
        if input.is_empty() {
            return TransliterationResult::default();
        }

        let exact_words = learned
            .map(|l| {
                l.exact_words(&input).unwrap_or_else(|e| {
                    tracing::warn!(input = %input, error = %e, "learned word lookup failed");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        let prefix_groups = learned.map(|l| self.prefix_groups(l, &input)).unwrap_or_default();

        // The forward path and every continuation run side by side and are
        // all joined before anything is merged.
        let (rule, continued) = std::thread::scope(|scope| {
            let forward = scope.spawn(|| self.rule_suggestions(&input, cancel));

            let continuations: Vec<_> = prefix_groups
                .iter()
                .map(|(&consumed, prefixes)| {
                    let residual: String = input.chars().skip(consumed).collect();
                    scope.spawn(move || {
                        self.continue_suggestions(
                            prefixes,
                            &residual,
                            self.config.dictionary_suggestions_limit,
                            cancel,
                        )
                    })
                })
                .collect();

            let continued: Vec<Suggestion> = continuations
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect();
            let rule = forward.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            (rule, continued)
        });

        let found_learned = !exact_words.is_empty() || !continued.is_empty();
        let mut lists = vec![continued, exact_words.clone()];
        if self.config.tokenizer_suggestions_always || !found_learned {
            lists.push(rule.tokenizer.clone());
        }
        let limit = self.config.dictionary_suggestions_limit + self.config.tokenizer_suggestions_limit;
        let suggestions = merge_suggestions(lists, limit);

        tracing::debug!(
            input = %input,
            exact = exact_words.len(),
            suggestions = suggestions.len(),
            "transliterated"
        );

        TransliterationResult {
            exact_words,
            suggestions,
            tokenizer_suggestions: rule.tokenizer,
            greedy_tokenized: rule.greedy,
        }
    }

    /// Learned prefixes of `input`, grouped by how many chars they cover.
    fn prefix_groups(&self, learned: &dyn LearnedSource, input: &str) -> BTreeMap<usize, Vec<Suggestion>> {
        let mut groups: BTreeMap<usize, Vec<Suggestion>> = BTreeMap::new();
        match learned.prefix_words(input) {
            Ok(found) => {
                for m in found {
                    groups.entry(m.consumed).or_default().push(m.suggestion);
                }
            }
            Err(e) => tracing::warn!(input, error = %e, "learned prefix lookup failed"),
        }
        groups
    }

    /// Rule-derived suggestions for a normalized input, memoized.
    fn rule_suggestions(&self, input: &str, cancel: &CancelToken) -> RuleSuggestions {
        if let Some(hit) = self.cache.lock().ok().and_then(|mut c| c.get(input).cloned()) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let tokens = self.tokenize(input, MatchFilter::Any, false, cancel);
        let limit = self.config.tokenizer_suggestions_limit;
        let composer = self.composer();
        let result = RuleSuggestions {
            tokenizer: composer.compose(&tokens, false, limit, cancel),
            greedy: composer.compose_greedy(&tokens, false, limit, cancel),
        };

        // A cancelled run may be incomplete.
        if !cancel.is_cancelled() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(input.to_string(), result.clone());
            }
        }
        result
    }

    /// Cache statistics as (hits, misses).
    pub fn cache_stats(&self) -> (usize, usize) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Cache hit rate as a percentage, or `None` before the first lookup.
    pub fn cache_hit_rate(&self) -> Option<f32> {
        let (hits, misses) = self.cache_stats();
        let total = hits + misses;
        if total == 0 {
            None
        } else {
            Some((hits as f32 / total as f32) * 100.0)
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop all cached results and reset the statistics.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}
