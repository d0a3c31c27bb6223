//! End-to-end coverage of the store facade: CRUD, queries, indexing, and
//! cache behavior.

use docvault::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.into(),
        age,
    }
}

async fn fresh_store() -> Store<Person> {
    Store::<Person>::builder().build().await.unwrap()
}

#[tokio::test]
async fn created_documents_round_trip_by_id() {
    let store = fresh_store().await;
    let created = store.create_one(person("milad", 30)).await.unwrap();

    assert!(Id::is_valid(created.id.as_str()));
    let fetched = store.get_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.data, person("milad", 30));
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_any_state_change() {
    let store = Store::<Value>::builder().build().await.unwrap();

    for payload in [json!(null), json!({}), json!([1, 2]), json!("milad"), json!(7)] {
        let err = store.create_one(payload).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
    // Reserved field: the store assigns ids itself.
    let err = store
        .create_one(json!({"id": "mine", "name": "milad"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(store.count_documents(None).await.unwrap(), 0);
}

#[tokio::test]
async fn create_update_delete_lifecycle() {
    let store = fresh_store().await;

    let created = store.create_one(person("milad", 30)).await.unwrap();
    assert_eq!(store.count_documents(None).await.unwrap(), 1);

    let updated = store
        .update_by_id(&created.id, json!({ "age": 31 }))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);

    let fetched = store.get_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.data.age, 31);
    assert_eq!(fetched.data.name, "milad");

    let deleted = store.delete_by_id(&created.id).await.unwrap();
    assert_eq!(deleted.id, created.id);
    assert_eq!(store.count_documents(None).await.unwrap(), 0);
}

#[tokio::test]
async fn create_many_then_delete_many() {
    let store = fresh_store().await;
    let created = store
        .create_many(vec![person("a", 1), person("b", 2), person("a", 3)])
        .await
        .unwrap();
    assert_eq!(created.len(), 3);

    let result = store.delete_many(&Condition::eq("name", "a")).await.unwrap();
    assert_eq!(result, DeleteResult { deleted: true, n: 2 });

    let remaining = store.get_many(Condition::eq("name", "a")).await.unwrap();
    assert!(remaining.is_empty());
    assert_eq!(store.count_documents(None).await.unwrap(), 1);
}

#[tokio::test]
async fn create_many_validates_every_payload_up_front() {
    let store = Store::<Value>::builder().build().await.unwrap();
    let err = store
        .create_many(vec![json!({"name": "ok"}), json!(null)])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.count_documents(None).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_all_is_idempotent() {
    let store = fresh_store().await;
    store
        .create_many(vec![person("milad", 30), person("medo", 25)])
        .await
        .unwrap();

    let first = store.delete_all().await.unwrap();
    assert_eq!(first, DeleteResult { deleted: true, n: 2 });

    let second = store.delete_all().await.unwrap();
    assert_eq!(second, DeleteResult { deleted: true, n: 0 });
}

#[tokio::test]
async fn missing_targets_surface_not_found() {
    let store = fresh_store().await;
    let nobody = Condition::eq("name", "nobody");
    let absent = Id::generate();

    let err = store.update_by_id(&absent, json!({"age": 1})).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = store.update_one(&nobody, json!({"age": 1})).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = store.delete_by_id(&absent).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = store.delete_one(&nobody).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    // The many-variants report zero matches instead of failing.
    let deleted = store.delete_many(&nobody).await.unwrap();
    assert_eq!(deleted.n, 0);
    let updated = store.update_many(&nobody, json!({"age": 1})).await.unwrap();
    assert_eq!(updated.n, 0);
}

#[tokio::test]
async fn update_many_reports_the_updated_documents() {
    let store = fresh_store().await;
    store
        .create_many(vec![person("a", 1), person("a", 2), person("b", 3)])
        .await
        .unwrap();

    let result = store
        .update_many(&Condition::eq("name", "a"), json!({ "age": 40 }))
        .await
        .unwrap();
    assert!(result.updated);
    assert_eq!(result.n, 2);
    assert!(result.documents.iter().all(|doc| doc.data.age == 40));

    let forty = store.get_many(Condition::eq("age", 40)).await.unwrap();
    assert_eq!(forty.len(), 2);
}

#[tokio::test]
async fn queries_compose_and_paginate() {
    let store = fresh_store().await;
    store
        .create_many(vec![
            person("alice", 30),
            person("bob", 25),
            person("carol", 35),
            person("dave", 25),
        ])
        .await
        .unwrap();

    let young_or_carol = store
        .get_many(Condition::lte("age", 25).or(Condition::eq("name", "carol")))
        .await
        .unwrap();
    assert_eq!(young_or_carol.len(), 3);

    let by_age_then_name = store
        .get_all()
        .sort("age", SortOrder::Asc)
        .sort("name", SortOrder::Asc)
        .exec()
        .await
        .unwrap();
    let names: Vec<&str> = by_age_then_name
        .iter()
        .map(|doc| doc.data.name.as_str())
        .collect();
    assert_eq!(names, ["bob", "dave", "alice", "carol"]);

    let page = store
        .get_all()
        .sort("age", SortOrder::Desc)
        .skip(1)
        .limit(2)
        .await
        .unwrap();
    let names: Vec<&str> = page.iter().map(|doc| doc.data.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
}

#[tokio::test]
async fn count_documents_honors_the_query() {
    let store = fresh_store().await;
    store
        .create_many(vec![person("a", 1), person("a", 2), person("b", 3)])
        .await
        .unwrap();

    assert_eq!(store.count_documents(None).await.unwrap(), 3);
    assert_eq!(
        store
            .count_documents(Some(&Condition::eq("name", "a")))
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn indexed_and_unindexed_queries_agree() {
    let indexed = fresh_store().await;
    let plain = fresh_store().await;
    for store in [&indexed, &plain] {
        store
            .create_many(vec![person("a", 1), person("b", 2), person("a", 3)])
            .await
            .unwrap();
    }
    // Registration after the fact must backfill existing documents.
    indexed.register_index(&["name"]).await.unwrap();

    let query = Condition::eq("name", "a");
    let mut from_index: Vec<Person> = indexed
        .get_many(query.clone())
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.data)
        .collect();
    let mut from_scan: Vec<Person> = plain
        .get_many(query)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.data)
        .collect();
    from_index.sort_by_key(|p| p.age);
    from_scan.sort_by_key(|p| p.age);
    assert_eq!(from_index, from_scan);
}

#[tokio::test]
async fn indexes_track_updates_and_deletes() {
    let store = fresh_store().await;
    store.register_index(&["name"]).await.unwrap();
    let doc = store.create_one(person("milad", 30)).await.unwrap();

    store
        .update_by_id(&doc.id, json!({ "name": "medo" }))
        .await
        .unwrap();
    assert!(store.get_many(Condition::eq("name", "milad")).await.unwrap().is_empty());
    assert_eq!(store.get_many(Condition::eq("name", "medo")).await.unwrap().len(), 1);

    store.delete_by_id(&doc.id).await.unwrap();
    assert!(store.get_many(Condition::eq("name", "medo")).await.unwrap().is_empty());
}

#[tokio::test]
async fn mutations_invalidate_cached_results() {
    let store = fresh_store().await;
    store.create_one(person("milad", 30)).await.unwrap();
    let query = Condition::eq("name", "milad");

    store.get_many(query.clone()).exec().await.unwrap();
    let cold = store.cache_stats().await;
    assert_eq!(cold.hits, 0);

    store.get_many(query.clone()).exec().await.unwrap();
    let warm = store.cache_stats().await;
    assert_eq!(warm.hits, cold.hits + 1);

    // An unrelated mutation must invalidate the entry, not merely happen to
    // produce the same result.
    store.create_one(person("medo", 25)).await.unwrap();
    store.get_many(query).exec().await.unwrap();
    let after = store.cache_stats().await;
    assert_eq!(after.hits, warm.hits);
    assert_eq!(after.misses, warm.misses + 1);
}

#[tokio::test]
async fn custom_comparator_queries_bypass_the_cache() {
    let store = fresh_store().await;
    store.create_one(person("milad", 30)).await.unwrap();

    let query = Condition::custom("age", 29, |field, value| {
        match (field.and_then(Value::as_u64), value.as_u64()) {
            (Some(field), Some(value)) => field > value,
            _ => false,
        }
    });
    let matched = store.get_many(query).await.unwrap();
    assert_eq!(matched.len(), 1);

    let stats = store.cache_stats().await;
    assert_eq!(stats.hits + stats.misses, 0);
    assert_eq!(stats.len, 0);
}

#[tokio::test]
async fn regex_and_set_queries() {
    let store = fresh_store().await;
    store
        .create_many(vec![person("Milad", 30), person("medo", 25), person("bob", 40)])
        .await
        .unwrap();

    let m_names = store
        .get_many(Condition::regex_with_flags("name", "^m", "i"))
        .await
        .unwrap();
    assert_eq!(m_names.len(), 2);

    let chosen = store
        .get_many(Condition::is_in("age", [25, 40]))
        .await
        .unwrap();
    assert_eq!(chosen.len(), 2);

    let excluded = store
        .get_many(Condition::not_in("age", [25, 40]))
        .await
        .unwrap();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].data.name, "Milad");
}

#[tokio::test]
async fn serialized_writes_keep_concurrent_mutations_consistent() {
    let store = Store::<Person>::builder()
        .serialize_writes(true)
        .build()
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_one(person("worker", i)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.count_documents(None).await.unwrap(), 16);
}

#[tokio::test]
async fn fuzzy_search_scores_a_snapshot() {
    let store = fresh_store().await;
    store
        .create_many(vec![person("milad", 30), person("milan", 28), person("bob", 40)])
        .await
        .unwrap();

    let snapshot = store.documents().await;
    let hits = FuzzySearch::new(2).search(&snapshot, "milad", &["name"]);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].document.data.name, "milad");
}
