//! Paginator tests: selection-order resolution, past-the-end batches,
//! native paging when unfiltered, and infinite-scroll accumulation.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use datasquare::page::page;
use datasquare::{explorer_for, DeleteConfig, ExploreConfig, MemoryStore, RowStore, Selection};

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

async fn store_with_rows(n: u32) -> (Arc<MemoryStore>, Vec<u64>) {
    let store = MemoryStore::new();
    store.create_table("browsinghistory");
    let mut ids = Vec::new();
    for i in 1..=n {
        ids.push(
            store
                .insert(
                    "browsinghistory",
                    at(i),
                    json!({"url": format!("https://site{i}.com"), "domain": format!("site{i}.com")}),
                )
                .await
                .unwrap(),
        );
    }
    (Arc::new(store), ids)
}

#[tokio::test]
async fn page_preserves_selection_order_not_id_order() {
    let (store, _) = store_with_rows(10).await;

    // Selection order is the caller's order, not ascending ids.
    let selection = Selection::Ids(vec![5, 9, 2, 7]);
    let rows = page(store.as_ref(), "browsinghistory", &selection, 1, 2)
        .await
        .unwrap();
    let got: Vec<u64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(got, vec![9, 2]);
}

#[tokio::test]
async fn past_the_end_returns_empty_batch() {
    let (store, ids) = store_with_rows(3).await;

    let selection = Selection::Ids(ids.clone());
    let rows = page(store.as_ref(), "browsinghistory", &selection, 3, 5)
        .await
        .unwrap();
    assert!(rows.is_empty());

    let rows = page(store.as_ref(), "browsinghistory", &selection, 100, 5)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn unfiltered_selection_uses_native_paging() {
    let (store, ids) = store_with_rows(7).await;

    let rows = page(store.as_ref(), "browsinghistory", &Selection::All, 2, 3)
        .await
        .unwrap();
    let got: Vec<u64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(got, ids[2..5].to_vec());
}

#[tokio::test]
async fn missing_table_pages_as_empty() {
    let store = MemoryStore::new();
    let rows = page(&store, "browsinghistory", &Selection::All, 0, 10)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn monotone_offsets_accumulate_the_whole_selection() {
    let (store, ids) = store_with_rows(5).await;
    let config = ExploreConfig::default();
    store.create_table("searchhistory");
    store.create_table("youtube");
    let mut explorer = explorer_for(store.clone(), &config, "browsinghistory").unwrap();
    explorer.refresh_all().await.unwrap();

    // Infinite scroll: the caller keeps the accumulator and walks the
    // offset forward until a batch comes back short.
    let mut accumulated = Vec::new();
    loop {
        let batch = explorer.page(accumulated.len(), 2).await.unwrap();
        if batch.is_empty() {
            break;
        }
        accumulated.extend(batch);
    }
    let got: Vec<u64> = accumulated.iter().map(|r| r.id).collect();
    assert_eq!(got, ids);
}

#[tokio::test]
async fn delete_invalidates_the_accumulated_list() {
    let (store, ids) = store_with_rows(4).await;
    let config = ExploreConfig::default();
    store.create_table("searchhistory");
    store.create_table("youtube");
    let mut explorer = explorer_for(store.clone(), &config, "browsinghistory").unwrap();
    explorer.refresh_all().await.unwrap();

    let before = explorer.page(0, 10).await.unwrap();
    assert_eq!(before.len(), 4);

    explorer
        .request_delete(vec![ids[1]], DeleteConfig { confirm: false })
        .await
        .unwrap();

    // Refetching from offset 0 reflects the mutated store.
    let after = explorer.page(0, 10).await.unwrap();
    let got: Vec<u64> = after.iter().map(|r| r.id).collect();
    assert_eq!(got, vec![ids[0], ids[2], ids[3]]);
}
