//! Error type shared by the symbol store, scheme loader, splitter and engine.

use std::io;

/// Errors surfaced by `varnam-core`.
///
/// There is no cancellation variant: a cancelled operation returns whatever
/// it accumulated so far.
#[derive(Debug, thiserror::Error)]
pub enum VarnamError {
    /// The symbol store could not be opened, loaded or is empty.
    #[error("symbol store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single lookup against the store failed.
    #[error("symbol query failed: {0}")]
    QueryFailure(String),

    /// The conjunct splitter met a character no symbol renders to.
    #[error("cannot decompose {word:?}: non-symbol character {character:?} encountered")]
    Undecomposable { word: String, character: String },

    /// A scheme definition is malformed.
    #[error("invalid scheme: {0}")]
    Scheme(String),

    /// A learned-words list could not be parsed.
    #[error("invalid word list at line {line}: {reason}")]
    WordList { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("fst error: {0}")]
    Fst(#[from] fst::Error),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl From<bincode::Error> for VarnamError {
    fn from(e: bincode::Error) -> Self {
        VarnamError::Serialize(e)
    }
}

pub type Result<T> = std::result::Result<T, VarnamError>;
