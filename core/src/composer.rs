//! Suggestion composition over tokenized input.
//!
//! Every token contributes a slot of rendered choices. Words are drawn from
//! the cross product of the slots in best-first order: a max-heap of index
//! vectors keyed by accumulated weight, seeded with the best choice of every
//! slot. Combinations made only of exact matches are drawn in a first pass;
//! the full product is only explored when that pass leaves room under the
//! limit.

use crate::cancel::CancelToken;
use crate::store::SymbolStore;
use crate::suggestion::{dedup_keep_max, sort_by_weight, Suggestion};
use crate::symbol::{MatchFilter, Symbol, Token};
use crate::tokenizer::Tokenizer;
use crate::LangRules;
use ahash::AHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// How alternatives are pruned before expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refinement {
    /// Weight floor only.
    Normal,
    /// Exact alternatives only, or the single best possibility.
    Greedy,
}

/// One rendered alternative of a slot.
#[derive(Debug, Clone)]
struct Choice {
    text: String,
    weight: i64,
    exact: bool,
}

/// Composer bound to a store and the session's language rules.
pub struct Composer<'a, S: SymbolStore + ?Sized> {
    store: &'a S,
    rules: &'a LangRules,
    expansion_budget: usize,
}

impl<'a, S: SymbolStore + ?Sized> Composer<'a, S> {
    pub fn new(store: &'a S, rules: &'a LangRules, expansion_budget: usize) -> Self {
        Self {
            store,
            rules,
            expansion_budget: expansion_budget.max(1),
        }
    }

    /// Rank words for `tokens`, at most `limit` of them.
    ///
    /// `partial` marks the tokens as continuing an earlier word, so their
    /// rendering positions start at 1 rather than 0.
    pub fn compose(
        &self,
        tokens: &[Token],
        partial: bool,
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        self.compose_refined(tokens, partial, limit, Refinement::Normal, cancel)
    }

    /// Like [`compose`](Self::compose) but keeps only exact alternatives
    /// (or the single best possibility when a token has no exact one).
    pub fn compose_greedy(
        &self,
        tokens: &[Token],
        partial: bool,
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        self.compose_refined(tokens, partial, limit, Refinement::Greedy, cancel)
    }

    /// Extend each of `prefixes` with the compositions of `residual`.
    ///
    /// A trailing virama on the prefix is dropped before joining. Weights add
    /// up and the prefix's `learned_on` is carried over.
    pub fn continue_suggestions(
        &self,
        prefixes: &[Suggestion],
        residual: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        if prefixes.is_empty() || limit == 0 {
            return Vec::new();
        }

        let tokens = Tokenizer::new(self.store, self.rules).tokenize(residual, MatchFilter::Any, true, cancel);
        let tails = self.compose(&tokens, true, limit, cancel);
        if tails.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(prefixes.len() * tails.len());
        'outer: for prefix in prefixes {
            let head = self.strip_trailing_virama(&prefix.word);
            for tail in &tails {
                if cancel.is_cancelled() {
                    break 'outer;
                }
                out.push(Suggestion {
                    word: format!("{}{}", head, tail.word),
                    weight: prefix.weight + tail.weight,
                    learned_on: prefix.learned_on,
                });
            }
        }

        let mut out = dedup_keep_max(out);
        sort_by_weight(&mut out);
        out.truncate(limit);
        tracing::debug!(residual, prefixes = prefixes.len(), produced = out.len(), "continued");
        out
    }

    fn strip_trailing_virama<'w>(&self, word: &'w str) -> &'w str {
        match self.rules.virama.as_deref() {
            Some(v) if !v.is_empty() => word.strip_suffix(v).unwrap_or(word),
            _ => word,
        }
    }

    fn compose_refined(
        &self,
        tokens: &[Token],
        partial: bool,
        limit: usize,
        mode: Refinement,
        cancel: &CancelToken,
    ) -> Vec<Suggestion> {
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let offset = usize::from(partial);
        let slots: Vec<Vec<Choice>> = tokens.iter().map(|t| slot_for(t, offset, mode)).collect();
        let budget = limit.saturating_mul(self.expansion_budget);

        let mut out = Vec::new();
        let mut words: AHashSet<String> = AHashSet::new();

        // Exact-only pass. Slots without an exact choice leave it empty.
        let exact_slots: Vec<Vec<Choice>> = slots
            .iter()
            .map(|s| s.iter().filter(|c| c.exact).cloned().collect())
            .collect();
        if exact_slots.iter().all(|s| !s.is_empty()) {
            expand(&exact_slots, limit, budget, false, &mut words, &mut out, cancel);
        }

        if out.len() < limit {
            expand(&slots, limit, budget, true, &mut words, &mut out, cancel);
        }

        let mut out = dedup_keep_max(out);
        sort_by_weight(&mut out);
        out.truncate(limit);
        tracing::debug!(tokens = tokens.len(), produced = out.len(), ?mode, "composed");
        out
    }
}

/// Render the surviving alternatives of one token, best first.
fn slot_for(token: &Token, offset: usize, mode: Refinement) -> Vec<Choice> {
    let alternatives = refine(token.alternatives(), mode);
    if alternatives.is_empty() {
        return vec![Choice {
            text: token.text().to_string(),
            weight: 0,
            exact: true,
        }];
    }

    let position = token.position() + offset;
    let mut choices: Vec<Choice> = Vec::with_capacity(alternatives.len());
    for sym in alternatives {
        let text = sym.render(position);
        // Store order puts exact first, so the exact rendering survives.
        if choices.iter().any(|c| c.text == text) {
            continue;
        }
        choices.push(Choice {
            text: text.to_string(),
            weight: sym.effective_weight(),
            exact: sym.is_exact(),
        });
    }
    choices.sort_by(|a, b| b.weight.cmp(&a.weight));
    choices
}

fn refine(alternatives: &[Symbol], mode: Refinement) -> Vec<&Symbol> {
    let mut kept: Vec<&Symbol> = Vec::with_capacity(alternatives.len());
    for sym in alternatives {
        // Only zero-weight possibilities trailing a better alternative are cut.
        if sym.effective_weight() == 0 && kept.iter().any(|k| k.effective_weight() > 0) {
            break;
        }
        kept.push(sym);
    }

    if mode == Refinement::Greedy {
        if kept.iter().any(|s| s.is_exact()) {
            kept.retain(|s| s.is_exact());
        } else {
            kept.truncate(1);
        }
    }
    kept
}

/// Best-first walk over the product of `slots`.
///
/// Appends up to `limit` new distinct words to `out`. With `skip_exact_only`
/// set, combinations made only of exact choices are walked through but not
/// emitted, since the exact pass already produced them.
fn expand(
    slots: &[Vec<Choice>],
    limit: usize,
    budget: usize,
    skip_exact_only: bool,
    words: &mut AHashSet<String>,
    out: &mut Vec<Suggestion>,
    cancel: &CancelToken,
) {
    let start = vec![0usize; slots.len()];
    let start_weight: i64 = slots.iter().map(|s| s[0].weight).sum();

    let mut heap: BinaryHeap<(i64, Reverse<Vec<usize>>)> = BinaryHeap::new();
    let mut seen: AHashSet<Vec<usize>> = AHashSet::new();
    seen.insert(start.clone());
    heap.push((start_weight, Reverse(start)));

    let mut visited = 0usize;
    while let Some((weight, Reverse(index))) = heap.pop() {
        if cancel.is_cancelled() || visited >= budget || out.len() >= limit {
            break;
        }
        visited += 1;

        let exact_only = index.iter().zip(slots).all(|(&j, s)| s[j].exact);
        if !(skip_exact_only && exact_only) {
            let word: String = index.iter().zip(slots).map(|(&j, s)| s[j].text.as_str()).collect();
            if words.insert(word.clone()) {
                out.push(Suggestion::new(word, weight));
            }
        }

        for k in 0..slots.len() {
            let j = index[k];
            if j + 1 >= slots[k].len() {
                continue;
            }
            let mut next = index.clone();
            next[k] = j + 1;
            if seen.insert(next.clone()) {
                let w = weight - slots[k][j].weight + slots[k][j + 1].weight;
                heap.push((w, Reverse(next)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeDetails;
    use crate::store::SymbolTable;
    use crate::symbol::{GeneralType, MatchType, EXACT_MATCH_BONUS};

    fn table(symbols: Vec<Symbol>) -> SymbolTable {
        SymbolTable::from_symbols(SchemeDetails::new("test"), symbols).unwrap()
    }

    fn rules_for(t: &SymbolTable) -> LangRules {
        LangRules {
            pattern_longest_length: t.max_pattern_length(),
            indic_digits: false,
            virama: Some("്".to_string()),
        }
    }

    fn run(t: &SymbolTable, input: &str, limit: usize) -> Vec<Suggestion> {
        let r = rules_for(t);
        let cancel = CancelToken::new();
        let tokens = Tokenizer::new(t, &r).tokenize(input, MatchFilter::Any, false, &cancel);
        Composer::new(t, &r, 64).compose(&tokens, false, limit, &cancel)
    }

    fn words(s: &[Suggestion]) -> Vec<&str> {
        s.iter().map(|s| s.word.as_str()).collect()
    }

    #[test]
    fn basic_exact_match() {
        let t = table(vec![Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 100)]);
        assert_eq!(run(&t, "ka", 10), vec![Suggestion::new("ക", 100 + EXACT_MATCH_BONUS)]);
    }

    #[test]
    fn unmatched_literal_has_zero_weight() {
        let t = table(vec![Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 100)]);
        assert_eq!(run(&t, "z", 10), vec![Suggestion::new("z", 0)]);
    }

    #[test]
    fn exact_combinations_come_first() {
        let t = table(vec![
            Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 10),
            Symbol::new("ka", "ഖ", GeneralType::Consonant, MatchType::Possibility, 900),
            Symbol::new("la", "ല", GeneralType::Consonant, MatchType::Exact, 10),
            Symbol::new("la", "ള", GeneralType::Consonant, MatchType::Possibility, 900),
        ]);
        let out = run(&t, "kala", 10);
        assert_eq!(out[0].word, "കല");
        assert_eq!(out[3].word, "ഖള");
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn exact_pass_can_fill_the_limit() {
        let t = table(vec![
            Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 10),
            Symbol::new("ka", "ഖ", GeneralType::Consonant, MatchType::Possibility, 900),
        ]);
        assert_eq!(words(&run(&t, "ka", 1)), vec!["ക"]);
    }

    #[test]
    fn duplicates_keep_the_max_weight() {
        let t = table(vec![
            Symbol::new("t", "ട", GeneralType::Consonant, MatchType::Exact, 50),
            Symbol::new("t", "ട", GeneralType::Consonant, MatchType::Possibility, 20),
            Symbol::new("t", "ത", GeneralType::Consonant, MatchType::Possibility, 10),
        ]);
        let out = run(&t, "t", 10);
        assert_eq!(words(&out), vec!["ട", "ത"]);
        assert_eq!(out[0].weight, 50 + EXACT_MATCH_BONUS);
    }

    #[test]
    fn weight_floor_drops_zero_fallbacks() {
        let t = table(vec![
            Symbol::new("n", "ന", GeneralType::Consonant, MatchType::Exact, 20),
            Symbol::new("n", "ണ", GeneralType::Consonant, MatchType::Possibility, 0),
        ]);
        assert_eq!(words(&run(&t, "n", 10)), vec!["ന"]);
    }

    #[test]
    fn weight_floor_keeps_zero_weight_exact_alternatives() {
        let t = table(vec![
            Symbol::new("n", "ന", GeneralType::Consonant, MatchType::Exact, 0),
            Symbol::new("n", "ണ", GeneralType::Consonant, MatchType::Exact, 0),
        ]);
        assert_eq!(words(&run(&t, "n", 10)), vec!["ന", "ണ"]);
    }

    #[test]
    fn weight_floor_keeps_tied_zero_possibilities() {
        let t = table(vec![
            Symbol::new("zh", "ഴ", GeneralType::Consonant, MatchType::Possibility, 0),
            Symbol::new("zh", "ശ", GeneralType::Consonant, MatchType::Possibility, 0),
        ]);
        assert_eq!(run(&t, "zh", 10).len(), 2);
    }

    #[test]
    fn greedy_keeps_single_possibility() {
        let t = table(vec![
            Symbol::new("zh", "ഴ", GeneralType::Consonant, MatchType::Possibility, 30),
            Symbol::new("zh", "ശ", GeneralType::Consonant, MatchType::Possibility, 20),
        ]);
        let r = rules_for(&t);
        let cancel = CancelToken::new();
        let tokens = Tokenizer::new(&t, &r).tokenize("zh", MatchFilter::Any, false, &cancel);
        let out = Composer::new(&t, &r, 64).compose_greedy(&tokens, false, 10, &cancel);
        assert_eq!(out, vec![Suggestion::new("ഴ", 30)]);
    }

    #[test]
    fn vowel_after_consonant_uses_sign() {
        let t = table(vec![
            Symbol::new("k", "ക", GeneralType::Consonant, MatchType::Exact, 10),
            Symbol::new("aa", "ആ", GeneralType::Vowel, MatchType::Exact, 10).with_value2("ാ"),
        ]);
        assert_eq!(words(&run(&t, "kaa", 10)), vec!["കാ"]);
        assert_eq!(words(&run(&t, "aa", 10)), vec!["ആ"]);
    }

    #[test]
    fn continuation_adds_weights() {
        let t = table(vec![Symbol::new("ta", "ത", GeneralType::Consonant, MatchType::Possibility, 90)]);
        let r = rules_for(&t);
        let prefixes = vec![Suggestion::new("ക", 100)];
        let out = Composer::new(&t, &r, 64).continue_suggestions(&prefixes, "ta", 10, &CancelToken::new());
        assert_eq!(out, vec![Suggestion::new("കത", 190)]);
    }

    #[test]
    fn continuation_strips_virama_and_keeps_provenance() {
        let t = table(vec![Symbol::new("a", "അ", GeneralType::Vowel, MatchType::Exact, 5).with_value2("")]);
        let r = rules_for(&t);
        let prefixes = vec![Suggestion::learned("ക്", 7, 42)];
        let out = Composer::new(&t, &r, 64).continue_suggestions(&prefixes, "a", 10, &CancelToken::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].word, "കഅ");
        assert_eq!(out[0].learned_on, Some(42));
    }

    #[test]
    fn cancelled_composition_is_empty_not_error() {
        let t = table(vec![Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 100)]);
        let r = rules_for(&t);
        let tokens = Tokenizer::new(&t, &r).tokenize("ka", MatchFilter::Any, false, &CancelToken::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(Composer::new(&t, &r, 64).compose(&tokens, false, 10, &cancel).is_empty());
    }
}
