//! varnam-core
//!
//! Transliteration core: turns romanized input into target-script word
//! suggestions by matching it against a phonetic symbol table.
//!
//! The symbol table is an fst-indexed, read-only store persisted as
//! fst + bincode artifacts and built from TOML scheme files.
//!
//! Public API:
//! - `Symbol`, `Token` - symbol rows and tokenizer output
//! - `SymbolStore` / `SymbolTable` - lookup surface and its shipped implementation
//! - `Tokenizer` - longest-prefix tokenization
//! - `Composer` - ranked suggestions and incremental continuation
//! - `Splitter` - conjunct splitting of target-script words
//! - `Engine` - session handle tying the above together
//! - `Config` - configuration
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Result, VarnamError};

pub mod symbol;
pub use symbol::{
    AcceptCondition, GeneralType, MatchFilter, MatchType, Symbol, Token, EXACT_MATCH_BONUS,
    MAX_SYMBOL_WEIGHT, RENDER_VALUE2_TAG,
};

pub mod scheme;
pub use scheme::{SchemeDefinition, SchemeDetails, SymbolEntry};

pub mod store;
pub use store::{artifact_paths, SymbolStore, SymbolTable};

pub mod cancel;
pub use cancel::CancelToken;

pub mod suggestion;
pub use suggestion::{merge_suggestions, Suggestion};

pub mod tokenizer;
pub use tokenizer::Tokenizer;

pub mod composer;
pub use composer::Composer;

pub mod splitter;
pub use splitter::Splitter;

pub mod learned;
pub use learned::{InMemoryLearnings, LearnedSource, PrefixMatch};

pub mod engine;
pub use engine::{Engine, TransliterationResult};

/// Session configuration.
///
/// Missing fields in a TOML file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Render numerals in the target script instead of passing them through.
    pub indic_digits: bool,

    // Suggestion limits
    /// Maximum suggestions composed from the symbol table.
    pub tokenizer_suggestions_limit: usize,
    /// Maximum suggestions derived from learned words.
    pub dictionary_suggestions_limit: usize,
    /// Include tokenizer suggestions in the merged list even when learned
    /// words were found.
    pub tokenizer_suggestions_always: bool,

    // Cache Management
    /// Maximum number of entries in the input -> suggestions cache
    pub max_cache_size: usize,

    /// Multiplier of the suggestion limit bounding how many combinations the
    /// composer may visit for one request.
    pub expansion_budget: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indic_digits: false,
            tokenizer_suggestions_limit: 10,
            dictionary_suggestions_limit: 10,
            tokenizer_suggestions_always: true,
            max_cache_size: 1000,
            expansion_budget: 64,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Language rules derived from the store when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LangRules {
    /// Longest symbol pattern in chars; the tokenizer's window size.
    pub pattern_longest_length: usize,
    pub indic_digits: bool,
    /// Rendering of the scheme's virama, if it has one.
    pub virama: Option<String>,
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
