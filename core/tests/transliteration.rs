// core/tests/transliteration.rs
//
// End-to-end tests against the Malayalam fixture scheme in tests/data.
//
// Tests cover:
// - Exact matches, literal passthrough and numerals
// - Positional (word-final) symbol forms
// - Learned prefixes continued with the residual input
// - Conjunct splitting
// - Artifact save/open producing the same results

use varnam_core::{
    CancelToken, Config, Engine, InMemoryLearnings, MatchFilter, SchemeDefinition, Suggestion, SymbolTable, Token,
    VarnamError, EXACT_MATCH_BONUS,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/ml.toml");

fn fixture_table() -> SymbolTable {
    SchemeDefinition::load_toml(FIXTURE).unwrap().into_table().unwrap()
}

fn engine_with(config: Config) -> Engine<SymbolTable> {
    Engine::open(fixture_table(), config).unwrap()
}

fn engine() -> Engine<SymbolTable> {
    engine_with(Config::default())
}

fn words(s: &[Suggestion]) -> Vec<&str> {
    s.iter().map(|s| s.word.as_str()).collect()
}

#[test]
fn scheme_metadata_is_loaded() {
    let e = engine();
    assert_eq!(e.scheme().display_name, "Malayalam");
    assert_eq!(e.rules().pattern_longest_length, 3);
    assert_eq!(e.rules().virama.as_deref(), Some("്"));
}

#[test]
fn basic_exact_match() {
    let e = engine();
    let cancel = CancelToken::new();
    let tokens = e.tokenize("ka", MatchFilter::Any, false, &cancel);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].alternatives().len(), 1);

    let out = e.compose(&tokens, false, 10, &cancel);
    assert_eq!(out, vec![Suggestion::new("ക", 100 + EXACT_MATCH_BONUS)]);
}

#[test]
fn unmatched_literal_passes_through() {
    let e = engine();
    let cancel = CancelToken::new();
    let tokens = e.tokenize("z", MatchFilter::Any, false, &cancel);
    assert_eq!(
        tokens,
        vec![Token::Character {
            position: 0,
            text: "z".into()
        }]
    );
    assert_eq!(e.compose(&tokens, false, 10, &cancel), vec![Suggestion::new("z", 0)]);
}

#[test]
fn numerals_follow_the_digits_setting() {
    let r = engine().transliterate("ka12", &CancelToken::new());
    assert_eq!(words(&r.tokenizer_suggestions), vec!["ക12"]);

    let indic = engine_with(Config {
        indic_digits: true,
        ..Config::default()
    });
    let r = indic.transliterate("ka12", &CancelToken::new());
    assert_eq!(words(&r.tokenizer_suggestions), vec!["ക൧൨"]);
}

#[test]
fn word_final_forms_rank_first() {
    let r = engine().transliterate("malayaaLam", &CancelToken::new());
    assert_eq!(words(&r.tokenizer_suggestions), vec!["മലയാളം", "മലയാളമ്"]);

    let r = engine().transliterate("nan", &CancelToken::new());
    assert_eq!(words(&r.tokenizer_suggestions), vec!["നൻ", "നന്", "ണൻ", "ണന്"]);
    assert_eq!(words(&r.greedy_tokenized), vec!["നൻ", "നന്"]);
}

#[test]
fn learned_prefix_is_continued() {
    let learned = InMemoryLearnings::new();
    learned.learn("ka", "ക", 100, 1_700_000_000);

    let r = engine().transliterate_with("kata", &learned, &CancelToken::new());
    assert!(r.exact_words.is_empty());
    assert_eq!(
        r.suggestions,
        vec![
            Suggestion::learned("കട", 2200, 1_700_000_000),
            Suggestion::learned("കത", 1190, 1_700_000_000),
        ]
    );
}

#[test]
fn continuation_drops_the_prefix_virama() {
    let learned = InMemoryLearnings::new();
    learned.learn("k", "ക്", 100, 1);

    let r = engine().transliterate_with("kta", &learned, &CancelToken::new());
    let found = r.suggestions.iter().find(|s| s.word == "കട").unwrap();
    assert_eq!(found.weight, 100 + 100 + EXACT_MATCH_BONUS);
    assert!(r.suggestions.iter().any(|s| s.word == "ക്ട"));
}

#[test]
fn exact_learned_words_are_reported() {
    let learned = InMemoryLearnings::new();
    learned.learn("kata", "കത", 5000, 1);

    let r = engine().transliterate_with("kata", &learned, &CancelToken::new());
    assert_eq!(r.exact_words, vec![Suggestion::learned("കത", 5000, 1)]);
    assert_eq!(r.suggestions[0], Suggestion::learned("കത", 5000, 1));
}

#[test]
fn splits_into_conjuncts() {
    let e = engine();
    assert_eq!(e.split_by_conjunct("മലയാളം").unwrap(), vec!["മ", "ല", "യാ", "ള", "ം"]);
    assert_eq!(e.split_by_conjunct("ക.").unwrap(), vec!["ക"]);

    let tokens = e.split_text_by_conjunct("കട").unwrap();
    assert_eq!(tokens[1].position(), 1);
    assert_eq!(tokens[1].alternatives()[0].pattern, "ta");
}

#[test]
fn foreign_characters_cannot_be_split() {
    match engine().split_by_conjunct("കx") {
        Err(VarnamError::Undecomposable { character, .. }) => assert_eq!(character, "x"),
        other => panic!("expected Undecomposable, got {:?}", other),
    }
}

#[test]
fn saved_artifacts_behave_like_the_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("ml");
    fixture_table().save(&prefix).unwrap();

    let reopened = Engine::open(SymbolTable::open(&prefix).unwrap(), Config::default()).unwrap();
    let cancel = CancelToken::new();
    for input in ["malayaaLam", "kata", "nan", "ka12", "zz"] {
        assert_eq!(
            reopened.transliterate(input, &cancel),
            engine().transliterate(input, &cancel),
            "input {input}"
        );
    }
}
