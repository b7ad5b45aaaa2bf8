//! Sliding-window longest-prefix tokenizer.
//!
//! The input is scanned left to right over chars. At each cursor the window
//! of up to `pattern_longest_length` chars is offered to the store as the set
//! of all its prefixes; the longest matching pattern wins and every symbol
//! tied on that length becomes an alternative of the emitted token.
//!
//! Spans nothing matches become single-char `Token::Character`s, so the
//! concatenated token texts always reproduce the input.

use crate::cancel::CancelToken;
use crate::store::SymbolStore;
use crate::symbol::{AcceptCondition, GeneralType, MatchFilter, Symbol, Token};
use crate::LangRules;

/// Tokenizer bound to a store and the session's language rules.
pub struct Tokenizer<'a, S: SymbolStore + ?Sized> {
    store: &'a S,
    rules: &'a LangRules,
}

impl<'a, S: SymbolStore + ?Sized> Tokenizer<'a, S> {
    pub fn new(store: &'a S, rules: &'a LangRules) -> Self {
        Self { store, rules }
    }

    /// Convert `input` into tokens.
    ///
    /// With `partial` set the input continues an earlier word, so the first
    /// token is not asked for word-start symbols. Cancellation returns the
    /// tokens formed so far.
    pub fn tokenize(
        &self,
        input: &str,
        filter: MatchFilter,
        partial: bool,
        cancel: &CancelToken,
    ) -> Vec<Token> {
        let chars: Vec<char> = input.chars().collect();
        let window = self.rules.pattern_longest_length.max(1);
        let mut tokens = Vec::new();

        let mut i = 0;
        while i < chars.len() {
            if cancel.is_cancelled() {
                tracing::debug!(input, formed = tokens.len(), "tokenization cancelled");
                break;
            }

            let end = (i + window).min(chars.len());
            let spans: Vec<String> = (i + 1..=end).map(|j| chars[i..j].iter().collect()).collect();

            let accept = if tokens.is_empty() && !partial {
                AcceptCondition::StartsWith
            } else if i == chars.len() - 1 {
                AcceptCondition::EndsWith
            } else {
                AcceptCondition::InBetween
            };

            let matches = match self.store.lookup_longest_prefix(&spans, filter, accept) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(span = %spans[spans.len() - 1], error = %e, "symbol lookup failed");
                    Vec::new()
                }
            };

            let Some(best) = matches.first() else {
                tokens.push(Token::Character {
                    position: i,
                    text: chars[i].to_string(),
                });
                i += 1;
                continue;
            };

            let matched_len = best.pattern_len().clamp(1, end - i);
            let text: String = chars[i..i + matched_len].iter().collect();

            if best.general_type == GeneralType::Number && !self.rules.indic_digits {
                tokens.push(Token::Character { position: i, text });
            } else {
                let alternatives: Vec<Symbol> = matches
                    .iter()
                    .take_while(|s| s.pattern_len() == best.pattern_len())
                    .cloned()
                    .collect();
                tokens.push(Token::Symbol {
                    alternatives,
                    position: i,
                    text,
                });
            }
            i += matched_len;
        }

        tracing::debug!(input, tokens = tokens.len(), "tokenized");
        tokens
    }
}
