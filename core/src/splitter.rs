//! Conjunct splitting of target-script words.
//!
//! The inverse direction of the tokenizer: a word already written in the
//! target script is cut into the symbol values it is made of. Only exact
//! value equality is consulted.

use crate::error::{Result, VarnamError};
use crate::store::SymbolStore;
use crate::symbol::{AcceptCondition, MatchFilter, Symbol, Token};

pub struct Splitter<'a, S: SymbolStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SymbolStore + ?Sized> Splitter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Split `word` into its conjuncts.
    ///
    /// Digits and punctuation are dropped from the result.
    pub fn split_by_conjunct(&self, word: &str) -> Result<Vec<String>> {
        Ok(self
            .split_text_by_conjunct(word)?
            .into_iter()
            .map(|t| match t {
                Token::Symbol { text, .. } | Token::Character { text, .. } => text,
            })
            .collect())
    }

    /// Split `word` and return the matched symbol tokens.
    ///
    /// A span is grown one char at a time while its value still matches a
    /// symbol. On the first miss the last matching span becomes a conjunct
    /// and scanning resumes right after it. A single char that matches
    /// nothing fails with [`VarnamError::Undecomposable`].
    pub fn split_text_by_conjunct(&self, word: &str) -> Result<Vec<Token>> {
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        let mut tokens = Vec::new();

        let mut start = 0;
        while start < n {
            let mut last: Option<(usize, Vec<Symbol>)> = None;
            let mut end = start + 1;
            while end <= n {
                let span: String = chars[start..end].iter().collect();
                let accept = if start == 0 {
                    AcceptCondition::StartsWith
                } else if end == n {
                    AcceptCondition::EndsWith
                } else {
                    AcceptCondition::InBetween
                };
                let found = self.store.lookup_value(&span, MatchFilter::Any, accept)?;
                if found.is_empty() {
                    break;
                }
                last = Some((end, found));
                end += 1;
            }

            let Some((end, symbols)) = last else {
                return Err(VarnamError::Undecomposable {
                    word: word.to_string(),
                    character: chars[start].to_string(),
                });
            };

            if !symbols.iter().any(|s| s.general_type.is_non_phonetic()) {
                tokens.push(Token::Symbol {
                    alternatives: symbols,
                    position: start,
                    text: chars[start..end].iter().collect(),
                });
            }
            start = end;
        }

        tracing::debug!(word, conjuncts = tokens.len(), "split");
        Ok(tokens)
    }
}
