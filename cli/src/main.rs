use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Duration;
use varnam_core::{
    CancelToken, Config, Engine, InMemoryLearnings, MatchFilter, SchemeDefinition, Suggestion, SymbolTable, Token,
    TransliterationResult,
};

#[derive(Parser)]
#[command(name = "varnam", about = "Transliterate romanized input into a target script")]
struct Args {
    /// Scheme file (`.toml`) or prefix of built `.fst` + `.bincode` artifacts
    #[arg(long)]
    scheme: PathBuf,

    /// Configuration file (TOML); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render numerals in the target script
    #[arg(long)]
    digits: bool,

    /// Show only exactly matched suggestions
    #[arg(long)]
    greedy: bool,

    /// Maximum number of suggestions per section
    #[arg(long)]
    limit: Option<usize>,

    /// Learned words, one `pattern<TAB>word[<TAB>weight[<TAB>timestamp]]` per line
    #[arg(long)]
    words: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debugging output
    #[arg(long)]
    debug: bool,

    /// Give up on a request after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Split a target-script word into conjuncts
    #[arg(long, conflicts_with_all = ["tokens", "input"])]
    split: Option<String>,

    /// Print the raw tokens of an input
    #[arg(long, conflicts_with = "input")]
    tokens: Option<String>,

    /// Input to transliterate; reads lines from stdin when absent
    input: Option<String>,
}

fn init_tracing(debug: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if debug { "varnam_core=debug,varnam=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn load_table(path: &Path) -> Result<SymbolTable> {
    if path.extension().is_some_and(|e| e == "toml") {
        let def = SchemeDefinition::load_toml(path)
            .with_context(|| format!("failed to read scheme {}", path.display()))?;
        Ok(def.into_table()?)
    } else {
        SymbolTable::open(path).with_context(|| format!("failed to open symbol table {}", path.display()))
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(p) => Config::load_toml(p).with_context(|| format!("failed to read config {}", p.display()))?,
        None => Config::default(),
    };
    if args.digits {
        config.indic_digits = true;
    }
    if let Some(limit) = args.limit {
        config.tokenizer_suggestions_limit = limit;
        config.dictionary_suggestions_limit = limit;
    }
    Ok(config)
}

#[derive(Serialize)]
struct TokenView<'a> {
    text: &'a str,
    position: usize,
    alternatives: Vec<&'a str>,
}

fn token_views(tokens: &[Token]) -> Vec<TokenView<'_>> {
    tokens
        .iter()
        .map(|t| TokenView {
            text: t.text(),
            position: t.position(),
            alternatives: t.alternatives().iter().map(|s| s.value1.as_str()).collect(),
        })
        .collect()
}

fn push_section(out: &mut String, title: &str, items: &[Suggestion]) {
    out.push_str(title);
    out.push('\n');
    for sug in items {
        out.push_str(&format!("{} {}\n", sug.word, sug.weight));
    }
}

/// Plain-text rendering of a result, one section per source.
fn format_result(result: &TransliterationResult, greedy: bool) -> String {
    let mut out = String::new();
    if !greedy {
        if !result.exact_words.is_empty() {
            push_section(&mut out, "Exact Matches", &result.exact_words);
        }
        push_section(&mut out, "Suggestions", &result.suggestions);
    }
    push_section(&mut out, "Greedy Tokenized", &result.greedy_tokenized);
    out
}

struct Session {
    engine: Engine<SymbolTable>,
    learned: Option<InMemoryLearnings>,
    json: bool,
    greedy: bool,
    timeout: Option<Duration>,
}

impl Session {
    fn cancel_token(&self) -> CancelToken {
        self.timeout.map_or_else(CancelToken::new, CancelToken::with_timeout)
    }

    fn transliterate(&self, input: &str) -> Result<()> {
        let cancel = self.cancel_token();
        let result = match &self.learned {
            Some(l) => self.engine.transliterate_with(input, l, &cancel),
            None => self.engine.transliterate(input, &cancel),
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{}", format_result(&result, self.greedy));
        }
        Ok(())
    }

    fn split(&self, word: &str) -> Result<()> {
        let parts = self.engine.split_by_conjunct(word)?;
        if self.json {
            println!("{}", serde_json::to_string(&parts)?);
        } else {
            println!("{}", parts.join(" "));
        }
        Ok(())
    }

    fn tokens(&self, input: &str) -> Result<()> {
        let tokens = self.engine.tokenize(input, MatchFilter::Any, false, &self.cancel_token());
        let views = token_views(&tokens);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&views)?);
        } else {
            for v in views {
                if v.alternatives.is_empty() {
                    println!("{:>3}  {}  (literal)", v.position, v.text);
                } else {
                    println!("{:>3}  {}  {}", v.position, v.text, v.alternatives.join(" | "));
                }
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.debug || std::env::var_os("RUST_LOG").is_some() {
        init_tracing(args.debug);
    }

    let table = load_table(&args.scheme)?;
    let config = build_config(&args)?;
    let engine = Engine::open(table, config)?;

    let learned = match &args.words {
        Some(p) => {
            let content = std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))?;
            Some(InMemoryLearnings::from_tsv_str(&content)?)
        }
        None => None,
    };

    let session = Session {
        engine,
        learned,
        json: args.json,
        greedy: args.greedy,
        timeout: args.timeout_ms.map(Duration::from_millis),
    };

    if let Some(word) = &args.split {
        return session.split(word);
    }
    if let Some(input) = &args.tokens {
        return session.tokens(input);
    }
    if let Some(input) = &args.input {
        return session.transliterate(input);
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let raw = line?;
        let input = raw.trim();
        if input.is_empty() {
            continue;
        }
        if let Err(e) = session.transliterate(input) {
            eprintln!("Error: {:#}", e);
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEME: &str = r#"
[scheme]
identifier = "ml"

[[symbols]]
pattern = "ka"
value1 = "ക"
type = "consonant"
weight = 100
"#;

    #[test]
    fn loads_scheme_toml_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("ml.toml");
        std::fs::write(&toml_path, SCHEME).unwrap();

        let table = load_table(&toml_path).unwrap();
        assert_eq!(table.len(), 1);

        let prefix = dir.path().join("ml");
        table.save(&prefix).unwrap();
        assert_eq!(load_table(&prefix).unwrap().len(), 1);
    }

    #[test]
    fn greedy_output_has_single_section() {
        let result = TransliterationResult {
            exact_words: vec![],
            suggestions: vec![Suggestion::new("ക", 1100)],
            tokenizer_suggestions: vec![Suggestion::new("ക", 1100)],
            greedy_tokenized: vec![Suggestion::new("ക", 1100)],
        };
        assert_eq!(format_result(&result, true), "Greedy Tokenized\nക 1100\n");
        assert_eq!(
            format_result(&result, false),
            "Suggestions\nക 1100\nGreedy Tokenized\nക 1100\n"
        );
    }

    #[test]
    fn limit_flag_overrides_config() {
        let args = Args::parse_from(["varnam", "--scheme", "x.toml", "--limit", "3", "--digits", "ka"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.tokenizer_suggestions_limit, 3);
        assert!(config.indic_digits);
    }
}
