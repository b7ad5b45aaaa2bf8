// core/tests/cache_management.rs
//
// Integration tests for Engine cache management and concurrent use.
//
// Tests cover:
// - LRU eviction respects Config.max_cache_size
// - Hit/miss tracking statistics
// - Cancelled requests never populate the cache
// - One engine shared by several threads

use std::time::Duration;
use varnam_core::{CancelToken, Config, Engine, GeneralType, MatchType, SchemeDetails, Symbol, SymbolTable};

fn table() -> SymbolTable {
    SymbolTable::from_symbols(
        SchemeDetails::new("test"),
        vec![
            Symbol::new("a", "അ", GeneralType::Vowel, MatchType::Exact, 10),
            Symbol::new("ka", "ക", GeneralType::Consonant, MatchType::Exact, 100),
            Symbol::new("ka", "ഗ", GeneralType::Consonant, MatchType::Possibility, 40),
            Symbol::new("ta", "ട", GeneralType::Consonant, MatchType::Exact, 100),
            Symbol::new("ta", "ത", GeneralType::Consonant, MatchType::Possibility, 90),
        ],
    )
    .unwrap()
}

fn engine(cache_size: usize) -> Engine<SymbolTable> {
    let config = Config {
        max_cache_size: cache_size,
        ..Config::default()
    };
    Engine::open(table(), config).unwrap()
}

#[test]
fn lru_evicts_least_recently_used() {
    let e = engine(2);
    let cancel = CancelToken::new();

    e.transliterate("ka", &cancel);
    e.transliterate("ta", &cancel);
    e.transliterate("kata", &cancel);
    assert_eq!(e.cache_size(), 2);
    assert_eq!(e.cache_stats(), (0, 3));

    // "ka" was evicted, "kata" is still there.
    e.transliterate("kata", &cancel);
    e.transliterate("ka", &cancel);
    assert_eq!(e.cache_stats(), (1, 4));
    assert!(e.cache_hit_rate().is_some());
}

#[test]
fn cached_results_match_fresh_ones() {
    let e = engine(10);
    let cancel = CancelToken::new();
    let first = e.transliterate("kata", &cancel);
    let second = e.transliterate("kata", &cancel);
    assert_eq!(first, second);
    assert_eq!(e.cache_stats(), (1, 1));
}

#[test]
fn zero_capacity_still_works() {
    let e = engine(0);
    let cancel = CancelToken::new();
    e.transliterate("ka", &cancel);
    e.transliterate("ta", &cancel);
    assert_eq!(e.cache_size(), 1);
}

#[test]
fn expired_requests_are_not_cached() {
    let e = engine(10);
    let r = e.transliterate("kata", &CancelToken::with_timeout(Duration::ZERO));
    assert!(r.tokenizer_suggestions.is_empty());
    assert_eq!(e.cache_size(), 0);

    let r = e.transliterate("kata", &CancelToken::new());
    assert_eq!(r.tokenizer_suggestions[0].word, "കട");
}

#[test]
fn engine_is_shared_across_threads() {
    let e = engine(100);
    let inputs = ["ka", "ta", "kata", "taka", "a", "kaa"];
    let expected: Vec<_> = inputs
        .iter()
        .map(|i| e.transliterate(i, &CancelToken::new()))
        .collect();
    e.clear_cache();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    inputs
                        .iter()
                        .map(|i| e.transliterate(i, &CancelToken::new()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });

    let (hits, misses) = e.cache_stats();
    assert_eq!(hits + misses, 4 * inputs.len());
}
