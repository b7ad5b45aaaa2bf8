//! Scheme metadata and the TOML scheme source format.
//!
//! A scheme file describes one transliteration scheme:
//!
//! ```toml
//! [scheme]
//! identifier = "ml"
//! lang_code = "ml"
//! display_name = "Malayalam"
//!
//! [[symbols]]
//! pattern = "ka"
//! value1 = "ക"
//! type = "consonant"
//! match = "exact"
//! weight = 100
//! ```
//!
//! `SchemeDefinition::into_table` turns it into a `SymbolTable`.

use crate::error::{Result, VarnamError};
use crate::store::SymbolTable;
use crate::symbol::{AcceptCondition, GeneralType, MatchType, Symbol};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Descriptive metadata of a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeDetails {
    pub identifier: String,
    pub lang_code: String,
    pub display_name: String,
    pub author: String,
    pub compiled_date: String,
    pub stable: bool,
}

impl SchemeDetails {
    pub fn new<T: Into<String>>(identifier: T) -> Self {
        let identifier = identifier.into();
        Self {
            lang_code: identifier.clone(),
            display_name: identifier.clone(),
            identifier,
            ..Default::default()
        }
    }
}

/// One `[[symbols]]` entry as written in a scheme file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub pattern: String,
    pub value1: String,
    #[serde(default)]
    pub value2: String,
    #[serde(default)]
    pub value3: String,
    #[serde(rename = "type")]
    pub general_type: String,
    #[serde(rename = "match", default = "default_match")]
    pub match_type: String,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub accept: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub flags: u32,
}

fn default_match() -> String {
    "exact".to_string()
}

impl SymbolEntry {
    fn to_symbol(&self, id: u32) -> Result<Symbol> {
        if self.pattern.is_empty() {
            return Err(VarnamError::Scheme(format!("symbol {} has an empty pattern", id)));
        }
        let general_type = GeneralType::from_name(&self.general_type).ok_or_else(|| {
            VarnamError::Scheme(format!(
                "unknown type {:?} for pattern {:?}",
                self.general_type, self.pattern
            ))
        })?;
        let match_type = match self.match_type.trim().to_ascii_lowercase().as_str() {
            "exact" => MatchType::Exact,
            "possibility" => MatchType::Possibility,
            other => {
                return Err(VarnamError::Scheme(format!(
                    "unknown match type {:?} for pattern {:?}",
                    other, self.pattern
                )))
            }
        };
        let accept_condition = AcceptCondition::from_name(&self.accept).ok_or_else(|| {
            VarnamError::Scheme(format!(
                "unknown accept condition {:?} for pattern {:?}",
                self.accept, self.pattern
            ))
        })?;

        Ok(Symbol {
            id,
            general_type,
            match_type,
            pattern: self.pattern.clone(),
            value1: self.value1.clone(),
            value2: self.value2.clone(),
            value3: self.value3.clone(),
            tag: self.tag.clone(),
            weight: self.weight,
            priority: self.priority,
            accept_condition,
            flags: self.flags,
        })
    }
}

/// A parsed scheme file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeDefinition {
    pub scheme: SchemeDetails,
    #[serde(default)]
    pub symbols: Vec<SymbolEntry>,
}

impl SchemeDefinition {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every entry and build the symbol table.
    pub fn into_table(self) -> Result<SymbolTable> {
        let symbols = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, e)| e.to_symbol(i as u32 + 1))
            .collect::<Result<Vec<_>>>()?;
        SymbolTable::from_symbols(self.scheme, symbols)
    }
}
