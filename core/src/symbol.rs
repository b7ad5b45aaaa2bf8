//! Symbol and token types.
//!
//! A `Symbol` is one row of the symbol table (VST): a romanized `pattern`
//! and its renderings in the target script. Symbols are read-only facts; the
//! tokenizer and composer only borrow or clone them.
//!
//! A `Token` is what the tokenizer produces for one contiguous span of input.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tag forcing the alternate (`value2`) rendering of a symbol.
pub const RENDER_VALUE2_TAG: &str = "_render_value2";

/// Offset added to the weight of EXACT matches.
///
/// Raw weights are clamped to `0..=MAX_SYMBOL_WEIGHT` first, so a token
/// resolved through an exact match always outweighs any possibility match.
pub const EXACT_MATCH_BONUS: i64 = 1000;

/// Ceiling applied to raw symbol weights before they are accumulated.
pub const MAX_SYMBOL_WEIGHT: i64 = 999;

/// Categorical kind of a symbol. Discriminants match the scheme file codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneralType {
    Vowel = 1,
    Consonant = 2,
    DeadConsonant = 3,
    ConsonantVowel = 4,
    Number = 5,
    Symbol = 6,
    Anusvara = 7,
    Visarga = 8,
    Virama = 9,
    Other = 10,
    NonJoiner = 11,
    Joiner = 12,
    Period = 13,
}

impl GeneralType {
    /// Parse the scheme-file name of a type (e.g. `"consonant"`, `"dead_consonant"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "vowel" => GeneralType::Vowel,
            "consonant" => GeneralType::Consonant,
            "dead_consonant" => GeneralType::DeadConsonant,
            "consonant_vowel" => GeneralType::ConsonantVowel,
            "number" => GeneralType::Number,
            "symbol" => GeneralType::Symbol,
            "anusvara" => GeneralType::Anusvara,
            "visarga" => GeneralType::Visarga,
            "virama" => GeneralType::Virama,
            "other" => GeneralType::Other,
            "non_joiner" => GeneralType::NonJoiner,
            "joiner" => GeneralType::Joiner,
            "period" => GeneralType::Period,
            _ => return None,
        };
        Some(t)
    }

    /// Script furniture rather than a phonetic unit.
    pub fn is_non_phonetic(self) -> bool {
        matches!(self, GeneralType::Number | GeneralType::Symbol)
    }
}

/// How canonical a symbol is for its pattern. Lower ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Exact = 1,
    Possibility = 2,
}

/// Match-type filter for store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchFilter {
    #[default]
    Any,
    Only(MatchType),
}

impl MatchFilter {
    pub fn accepts(self, match_type: MatchType) -> bool {
        match self {
            MatchFilter::Any => true,
            MatchFilter::Only(t) => t == match_type,
        }
    }
}

/// Positional legality of a symbol within a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AcceptCondition {
    /// Unconstrained; satisfies every requested condition.
    #[default]
    All = 0,
    StartsWith = 1,
    InBetween = 2,
    EndsWith = 3,
}

impl AcceptCondition {
    /// Whether a symbol carrying `self` may be used where `requested` is asked for.
    pub fn satisfies(self, requested: AcceptCondition) -> bool {
        self == AcceptCondition::All || self == requested
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "all" | "any" => Some(AcceptCondition::All),
            "starts_with" | "start" => Some(AcceptCondition::StartsWith),
            "in_between" | "between" => Some(AcceptCondition::InBetween),
            "ends_with" | "end" => Some(AcceptCondition::EndsWith),
            _ => None,
        }
    }
}

/// One phonetic mapping rule from the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: u32,
    pub general_type: GeneralType,
    pub match_type: MatchType,
    pub pattern: String,
    /// Primary rendering (standalone form).
    pub value1: String,
    /// Alternate rendering (vowel sign form).
    pub value2: String,
    pub value3: String,
    pub tag: String,
    pub weight: i32,
    pub priority: i32,
    pub accept_condition: AcceptCondition,
    pub flags: u32,
}

impl Symbol {
    /// Minimal constructor; remaining fields take neutral values.
    pub fn new<P: Into<String>, V: Into<String>>(
        pattern: P,
        value1: V,
        general_type: GeneralType,
        match_type: MatchType,
        weight: i32,
    ) -> Self {
        Self {
            id: 0,
            general_type,
            match_type,
            pattern: pattern.into(),
            value1: value1.into(),
            value2: String::new(),
            value3: String::new(),
            tag: String::new(),
            weight,
            priority: 0,
            accept_condition: AcceptCondition::All,
            flags: 0,
        }
    }

    pub fn with_value2<V: Into<String>>(mut self, value2: V) -> Self {
        self.value2 = value2.into();
        self
    }

    pub fn with_tag<T: Into<String>>(mut self, tag: T) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_accept(mut self, accept: AcceptCondition) -> Self {
        self.accept_condition = accept;
        self
    }

    /// Pattern length in chars (not bytes).
    pub fn pattern_len(&self) -> usize {
        self.pattern.chars().count()
    }

    pub fn is_exact(&self) -> bool {
        self.match_type == MatchType::Exact
    }

    /// Weight used when accumulating a suggestion.
    pub fn effective_weight(&self) -> i64 {
        let base = i64::from(self.weight).clamp(0, MAX_SYMBOL_WEIGHT);
        match self.match_type {
            MatchType::Exact => base + EXACT_MATCH_BONUS,
            MatchType::Possibility => base,
        }
    }

    /// Rendering of this symbol at a char `position` within the word.
    ///
    /// Vowels after the first position take their sign form. A symbol tagged
    /// `_render_value2` always uses `value2`. Empty `value2` falls back to
    /// `value1`.
    pub fn render(&self, position: usize) -> &str {
        let alternate = self.tag == RENDER_VALUE2_TAG
            || (self.general_type == GeneralType::Vowel && position > 0);
        if alternate && !self.value2.is_empty() {
            &self.value2
        } else {
            &self.value1
        }
    }
}

/// One tokenized span of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// One or more tied symbol alternatives matched `text`.
    Symbol {
        alternatives: Vec<Symbol>,
        position: usize,
        text: String,
    },
    /// Literal passthrough: no symbol matched, or a numeral left unrendered.
    Character { position: usize, text: String },
}

impl Token {
    /// Char index of the span start in the tokenized input.
    pub fn position(&self) -> usize {
        match self {
            Token::Symbol { position, .. } | Token::Character { position, .. } => *position,
        }
    }

    /// The input span covered by this token.
    pub fn text(&self) -> &str {
        match self {
            Token::Symbol { text, .. } | Token::Character { text, .. } => text,
        }
    }

    pub fn alternatives(&self) -> &[Symbol] {
        match self {
            Token::Symbol { alternatives, .. } => alternatives,
            Token::Character { .. } => &[],
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Token::Symbol { .. })
    }
}

/// The store ordering contract for symbols sharing a key:
/// match type ascending, weight descending, priority descending.
pub fn rank_order(a: &Symbol, b: &Symbol) -> Ordering {
    a.match_type
        .cmp(&b.match_type)
        .then_with(|| b.weight.cmp(&a.weight))
        .then_with(|| b.priority.cmp(&a.priority))
}
