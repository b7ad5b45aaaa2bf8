//! Symbol store abstraction and the fst-backed symbol table.
//!
//! `SymbolStore` is the query surface the tokenizer, composer and splitter
//! depend on. `SymbolTable` is the shipped implementation: symbols are
//! grouped per pattern into buckets that are pre-sorted by the ordering
//! contract, and an `fst::Map` maps each pattern to its bucket index.
//!
//! On disk a table is two artifacts sharing a prefix:
//! - `<prefix>.fst`: pattern -> bucket index
//! - `<prefix>.bincode`: scheme details, symbols and buckets
//!
//! The value index (target-script rendering -> bucket) is rebuilt in memory
//! when a table is opened.

use crate::error::{Result, VarnamError};
use crate::scheme::SchemeDetails;
use crate::symbol::{rank_order, AcceptCondition, MatchFilter, Symbol};
use fst::{Map, Streamer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

/// Read-only query surface over symbol records.
///
/// Every lookup is case-sensitive exact string equality. Results are ordered
/// by match type ascending, weight descending, priority descending;
/// `lookup_longest_prefix` additionally orders by pattern length descending
/// first. A symbol whose accept condition is `All` satisfies any request.
pub trait SymbolStore: Send + Sync {
    /// Symbols whose pattern equals `pattern`.
    fn lookup_exact(
        &self,
        pattern: &str,
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>>;

    /// Symbols matching any of `spans` (all prefixes of a window, shortest
    /// first), longest pattern first.
    fn lookup_longest_prefix(
        &self,
        spans: &[String],
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>>;

    /// Symbols whose primary rendering (`value1`) equals `value`.
    fn lookup_value(
        &self,
        value: &str,
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>>;

    /// Longest pattern length in chars.
    fn max_pattern_length(&self) -> usize;

    /// Metadata of the scheme this store was built from.
    fn scheme(&self) -> &SchemeDetails;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TablePayload {
    details: SchemeDetails,
    symbols: Vec<Symbol>,
    /// Indexed by the value stored in the pattern fst.
    pattern_buckets: Vec<Vec<u32>>,
}

/// Immutable, fst-indexed symbol table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    details: SchemeDetails,
    symbols: Vec<Symbol>,
    pattern_index: Map<Vec<u8>>,
    pattern_buckets: Vec<Vec<u32>>,
    value_index: Map<Vec<u8>>,
    value_buckets: Vec<Vec<u32>>,
    max_pattern_length: usize,
}

/// Group symbol indices by a key, rank each group, and build the fst.
fn build_index<F>(symbols: &[Symbol], key: F) -> Result<(Map<Vec<u8>>, Vec<Vec<u32>>)>
where
    F: Fn(&Symbol) -> &str,
{
    let mut grouped: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for (i, s) in symbols.iter().enumerate() {
        let k = key(s);
        if k.is_empty() {
            continue;
        }
        grouped.entry(k).or_default().push(i as u32);
    }

    let mut buckets = Vec::with_capacity(grouped.len());
    let mut keys = Vec::with_capacity(grouped.len());
    for (i, (k, mut ids)) in grouped.into_iter().enumerate() {
        ids.sort_by(|&a, &b| rank_order(&symbols[a as usize], &symbols[b as usize]));
        keys.push((k, i as u64));
        buckets.push(ids);
    }
    let map = Map::from_iter(keys)?;
    Ok((map, buckets))
}

/// `<prefix>.fst` and `<prefix>.bincode`; dots already in the prefix are kept.
pub fn artifact_paths(prefix: &Path) -> (PathBuf, PathBuf) {
    let with = |ext: &str| {
        let mut name = prefix.as_os_str().to_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    };
    (with("fst"), with("bincode"))
}

/// Every fst value must name a bucket and every bucket entry a symbol.
fn validate_payload(index: &Map<Vec<u8>>, payload: &TablePayload) -> Result<()> {
    let buckets = payload.pattern_buckets.len() as u64;
    let mut stream = index.stream();
    while let Some((key, value)) = stream.next() {
        if value >= buckets {
            return Err(VarnamError::StoreUnavailable(format!(
                "pattern {:?} points at bucket {} of {}",
                String::from_utf8_lossy(key),
                value,
                buckets
            )));
        }
    }

    let symbols = payload.symbols.len();
    for (b, bucket) in payload.pattern_buckets.iter().enumerate() {
        if let Some(&bad) = bucket.iter().find(|&&i| i as usize >= symbols) {
            return Err(VarnamError::StoreUnavailable(format!(
                "bucket {} points at symbol {} of {}",
                b, bad, symbols
            )));
        }
    }
    Ok(())
}

impl SymbolTable {
    /// Build a table from symbol rows. Ids of zero are renumbered by position.
    pub fn from_symbols(details: SchemeDetails, mut symbols: Vec<Symbol>) -> Result<Self> {
        for (i, s) in symbols.iter_mut().enumerate() {
            if s.id == 0 {
                s.id = i as u32 + 1;
            }
        }
        let (pattern_index, pattern_buckets) = build_index(&symbols, |s| s.pattern.as_str())?;
        Self::assemble(details, symbols, pattern_index, pattern_buckets)
    }

    fn assemble(
        details: SchemeDetails,
        symbols: Vec<Symbol>,
        pattern_index: Map<Vec<u8>>,
        pattern_buckets: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let (value_index, value_buckets) = build_index(&symbols, |s| s.value1.as_str())?;
        let max_pattern_length = symbols.iter().map(Symbol::pattern_len).max().unwrap_or(0);
        Ok(Self {
            details,
            symbols,
            pattern_index,
            pattern_buckets,
            value_index,
            value_buckets,
            max_pattern_length,
        })
    }

    /// Persist the table as `<prefix>.fst` + `<prefix>.bincode`.
    pub fn save<P: AsRef<Path>>(&self, prefix: P) -> Result<()> {
        let (fst_path, bin_path) = artifact_paths(prefix.as_ref());
        std::fs::write(&fst_path, self.pattern_index.as_fst().as_bytes())?;

        let payload = TablePayload {
            details: self.details.clone(),
            symbols: self.symbols.clone(),
            pattern_buckets: self.pattern_buckets.clone(),
        };
        let writer = BufWriter::new(File::create(&bin_path)?);
        bincode::serialize_into(writer, &payload)?;
        Ok(())
    }

    /// Open artifacts written by `save`.
    ///
    /// Any failure (missing file, corrupt fst, bincode mismatch) is reported
    /// as `StoreUnavailable`.
    pub fn open<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        let prefix = prefix.as_ref();
        Self::open_inner(prefix).map_err(|e| match e {
            VarnamError::StoreUnavailable(_) => e,
            other => VarnamError::StoreUnavailable(format!("{}: {}", prefix.display(), other)),
        })
    }

    fn open_inner(prefix: &Path) -> Result<Self> {
        let (fst_path, bin_path) = artifact_paths(prefix);

        let mut buf = Vec::new();
        File::open(&fst_path)?.read_to_end(&mut buf)?;
        let pattern_index = Map::new(buf)?;

        let reader = BufReader::new(File::open(&bin_path)?);
        let payload: TablePayload = bincode::deserialize_from(reader)?;

        if pattern_index.len() != payload.pattern_buckets.len() {
            return Err(VarnamError::StoreUnavailable(format!(
                "index has {} keys but payload has {} buckets",
                pattern_index.len(),
                payload.pattern_buckets.len()
            )));
        }

        validate_payload(&pattern_index, &payload)?;

        let table = Self::assemble(
            payload.details,
            payload.symbols,
            pattern_index,
            payload.pattern_buckets,
        )?;
        tracing::info!(
            scheme = %table.details.identifier,
            symbols = table.symbols.len(),
            longest = table.max_pattern_length,
            "opened symbol table"
        );
        Ok(table)
    }

    /// Number of symbol rows.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbol rows in insertion order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    fn collect(
        &self,
        index: &Map<Vec<u8>>,
        buckets: &[Vec<u32>],
        key: &str,
        filter: MatchFilter,
        accept: AcceptCondition,
        out: &mut Vec<Symbol>,
    ) {
        let Some(bucket) = index.get(key).and_then(|i| buckets.get(i as usize)) else {
            return;
        };
        out.extend(
            bucket
                .iter()
                .map(|&i| &self.symbols[i as usize])
                .filter(|s| filter.accepts(s.match_type) && s.accept_condition.satisfies(accept))
                .cloned(),
        );
    }
}

impl SymbolStore for SymbolTable {
    fn lookup_exact(
        &self,
        pattern: &str,
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>> {
        let mut out = Vec::new();
        self.collect(&self.pattern_index, &self.pattern_buckets, pattern, filter, accept, &mut out);
        Ok(out)
    }

    fn lookup_longest_prefix(
        &self,
        spans: &[String],
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>> {
        let mut ordered: Vec<&String> = spans.iter().collect();
        // Stable: equal-length spans keep their given order.
        ordered.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));

        let mut out = Vec::new();
        for span in ordered {
            self.collect(&self.pattern_index, &self.pattern_buckets, span, filter, accept, &mut out);
        }
        Ok(out)
    }

    fn lookup_value(
        &self,
        value: &str,
        filter: MatchFilter,
        accept: AcceptCondition,
    ) -> Result<Vec<Symbol>> {
        let mut out = Vec::new();
        self.collect(&self.value_index, &self.value_buckets, value, filter, accept, &mut out);
        Ok(out)
    }

    fn max_pattern_length(&self) -> usize {
        self.max_pattern_length
    }

    fn scheme(&self) -> &SchemeDetails {
        &self.details
    }
}
