//! Facet evaluator tests: text search, key filtering and normalization,
//! date ranges, and cancel-on-supersede.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use datasquare::{MemoryStore, RowStore, Selection};
use datasquare::facet::{DateRange, KeySet, TextQuery};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

async fn seed_history() -> (Arc<MemoryStore>, Vec<u64>) {
    let store = MemoryStore::new();
    store.create_table("browsinghistory");
    let rows = [
        (1, 9, json!({"url": "https://news.example.com/a", "title": "Morning News", "domain": "news.example.com"})),
        (2, 14, json!({"url": "https://shop.example.com/b", "title": "Buy Things", "domain": "shop.example.com"})),
        (3, 20, json!({"url": "https://rust-lang.org/learn", "title": "Learn Rust", "domain": "rust-lang.org"})),
        (5, 11, json!({"url": "https://example.com/c", "title": "Front Page", "domain": "example.com"})),
    ];
    let mut ids = Vec::new();
    for (day, hour, data) in rows {
        ids.push(
            store
                .insert("browsinghistory", at(day, hour), data)
                .await
                .unwrap(),
        );
    }
    (Arc::new(store), ids)
}

#[tokio::test]
async fn text_query_is_case_insensitive_substring() {
    let (store, ids) = seed_history().await;
    let mut text = TextQuery::new(vec!["url".to_string(), "title".to_string()]);

    let gen = text.set_query("RUST");
    let out = text
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .expect("current generation must commit");
    assert_eq!(out, Selection::Ids(vec![ids[2]]));
}

#[tokio::test]
async fn text_query_searches_all_configured_fields() {
    let (store, ids) = seed_history().await;
    let mut text = TextQuery::new(vec!["url".to_string(), "title".to_string()]);

    // "news" appears in one url and one title of the same row, and
    // nowhere else.
    let gen = text.set_query("news");
    let out = text
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::Ids(vec![ids[0]]));
}

#[tokio::test]
async fn empty_query_is_unfiltered() {
    let (store, _) = seed_history().await;
    let mut text = TextQuery::new(vec!["url".to_string()]);
    let gen = text.set_query("   ");
    let out = text
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::All);
}

#[tokio::test]
async fn superseded_text_scan_is_discarded() {
    let (store, _) = seed_history().await;
    let mut text = TextQuery::new(vec!["url".to_string()]);

    let stale = text.set_query("example");
    let current = text.set_query("rust");

    // The older scan completes after the newer query exists: its result
    // must never commit.
    let stale_result = text
        .evaluate(store.as_ref(), "browsinghistory", stale)
        .await
        .unwrap();
    assert!(stale_result.is_none());

    let fresh = text
        .evaluate(store.as_ref(), "browsinghistory", current)
        .await
        .unwrap();
    assert!(fresh.is_some());
}

#[tokio::test]
async fn missing_table_yields_empty_not_error() {
    let store = MemoryStore::new();
    let mut text = TextQuery::new(vec!["url".to_string()]);
    let gen = text.set_query("anything");
    let out = text
        .evaluate(&store, "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::empty());
}

#[tokio::test]
async fn key_facet_matches_normalized_domains() {
    let (store, ids) = seed_history().await;
    let mut keys = KeySet::new("domain");

    // news.example.com, shop.example.com, and example.com all normalize
    // to example.com.
    let gen = keys.set_chosen(["example.com"]);
    let out = keys
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::Ids(vec![ids[0], ids[1], ids[3]]));
}

#[tokio::test]
async fn key_counts_merge_subdomains() {
    let (store, _) = seed_history().await;
    let keys = KeySet::new("domain");
    let counts = keys
        .key_counts(store.as_ref(), "browsinghistory", &Selection::All)
        .await
        .unwrap();
    assert_eq!(counts.get("example.com").unwrap().count, 3);
    assert_eq!(counts.get("rust-lang.org").unwrap().count, 1);
    assert!(counts.get("news.example.com").is_none());
}

#[tokio::test]
async fn key_counts_cover_full_candidate_set_not_only_chosen() {
    let (store, ids) = seed_history().await;
    let mut keys = KeySet::new("domain");
    keys.set_chosen(["rust-lang.org"]);

    // The picker still needs every distinct key of the candidates.
    let candidates = Selection::Ids(ids.clone());
    let counts = keys
        .key_counts(store.as_ref(), "browsinghistory", &candidates)
        .await
        .unwrap();
    assert_eq!(counts.len(), 2);
}

#[tokio::test]
async fn multi_valued_keys_count_once_per_element() {
    let store = MemoryStore::new();
    store.create_table("searchhistory");
    store
        .insert(
            "searchhistory",
            at(1, 10),
            json!({"query": "rust async streams", "word": ["rust", "async", "streams"]}),
        )
        .await
        .unwrap();
    store
        .insert(
            "searchhistory",
            at(2, 10),
            json!({"query": "rust errors", "word": ["rust", "errors"]}),
        )
        .await
        .unwrap();

    let keys = KeySet::new("word");
    let counts = keys
        .key_counts(&store, "searchhistory", &Selection::All)
        .await
        .unwrap();
    assert_eq!(counts.get("rust").unwrap().count, 2);
    assert_eq!(counts.get("async").unwrap().count, 1);
}

#[tokio::test]
async fn empty_chosen_set_is_unfiltered() {
    let (store, _) = seed_history().await;
    let mut keys = KeySet::new("domain");
    let gen = keys.set_chosen(Vec::<String>::new());
    let out = keys
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::All);
}

#[tokio::test]
async fn date_range_is_inclusive_of_both_bounds() {
    let (store, ids) = seed_history().await;
    let mut range = DateRange::new();
    range.set_start(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    let gen = range.set_end(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

    let out = range
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::Ids(vec![ids[1], ids[2]]));
}

#[tokio::test]
async fn unbounded_range_is_unfiltered() {
    let (store, _) = seed_history().await;
    let range = DateRange::new();
    let gen = range.generation.current();
    let out = range
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out, Selection::All);
}

#[tokio::test]
async fn delete_then_stale_commit_is_discarded() {
    let (store, ids) = seed_history().await;
    let mut range = DateRange::new();
    let gen = range.set_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    // A delete invalidates every in-flight scan; the explorer models this
    // by bumping the generation before the store mutation.
    range.generation.bump();
    store
        .delete_by_ids("browsinghistory", &[ids[0]])
        .await
        .unwrap();

    let out = range
        .evaluate(store.as_ref(), "browsinghistory", gen)
        .await
        .unwrap();
    assert!(out.is_none());
}
