use fieldvault_crypto::{generate_random_key, EnvelopeCipher, LocalKeyProvider};
use fieldvault_engine::{CollectionRule, EncryptionConfig, EngineSettings, FieldEngine};
use fieldvault_store::DocumentStore;
use serde_json::{json, Value};
use std::sync::Arc;

/// A store whose "users" collection encrypts ssn and email; other
/// collections are unconfigured.
async fn test_store() -> DocumentStore {
    let cipher = Arc::new(EnvelopeCipher::new(Arc::new(LocalKeyProvider::new(
        generate_random_key(),
    ))));
    let config = EncryptionConfig::new().with_collection(
        "users",
        CollectionRule::auto().with_include_fields(["ssn", "email"]),
    );
    cipher.provision(config.collection_names()).await.unwrap();

    let engine = Arc::new(FieldEngine::new(
        EngineSettings::default(),
        config,
        cipher,
    ));
    DocumentStore::open_in_memory(engine).unwrap()
}

#[tokio::test]
async fn insert_assigns_an_id() {
    let store = test_store().await;
    let id = store
        .insert_one("users", json!({"name": "alice"}))
        .await
        .unwrap();
    assert!(!id.is_empty());

    let found = store.find_one("users", &id).unwrap().unwrap();
    assert_eq!(found["_id"], json!(id));
}

#[tokio::test]
async fn explicit_ids_are_kept() {
    let store = test_store().await;
    let id = store
        .insert_one("users", json!({"_id": "user-1", "name": "alice"}))
        .await
        .unwrap();
    assert_eq!(id, "user-1");
}

#[tokio::test]
async fn configured_fields_are_encrypted_at_rest() {
    let store = test_store().await;
    let id = store
        .insert_one(
            "users",
            json!({"name": "alice", "ssn": "111-11-1111", "email": "a@b.com"}),
        )
        .await
        .unwrap();

    let stored = store.find_one("users", &id).unwrap().unwrap();
    assert_eq!(stored["name"], json!("alice"));
    assert_ne!(stored["ssn"], json!("111-11-1111"));
    assert_ne!(stored["email"], json!("a@b.com"));

    // The raw row never contains the configured plaintext.
    let raw = serde_json::to_string(&stored).unwrap();
    assert!(!raw.contains("111-11-1111"));
}

#[tokio::test]
async fn explicit_decrypt_restores_plaintext() {
    let store = test_store().await;
    let id = store
        .insert_one(
            "users",
            json!({"name": "alice", "ssn": "111-11-1111", "email": "a@b.com"}),
        )
        .await
        .unwrap();

    let decrypted = store.find_one_decrypted("users", &id).await.unwrap().unwrap();
    assert_eq!(decrypted["ssn"], json!("111-11-1111"));
    assert_eq!(decrypted["email"], json!("a@b.com"));
}

#[tokio::test]
async fn unconfigured_collections_store_plaintext() {
    let store = test_store().await;
    let id = store
        .insert_one("notes", json!({"title": "hello", "pinned": true}))
        .await
        .unwrap();

    let found = store.find_one("notes", &id).unwrap().unwrap();
    assert_eq!(found["title"], json!("hello"));
    assert_eq!(found["pinned"], json!(true));
}

#[tokio::test]
async fn reads_restore_typed_values() {
    let store = test_store().await;
    let id = store
        .insert_one("notes", json!({"count": 7, "ratio": 0.5, "done": false}))
        .await
        .unwrap();

    let found = store.find_one("notes", &id).unwrap().unwrap();
    assert_eq!(found["count"], json!(7));
    assert_eq!(found["ratio"], json!(0.5));
    assert_eq!(found["done"], json!(false));
}

#[tokio::test]
async fn find_one_missing_returns_none() {
    let store = test_store().await;
    assert!(store.find_one("users", "nope").unwrap().is_none());
    assert!(store
        .find_one_decrypted("users", "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn insert_many_and_paginate() {
    let store = test_store().await;
    let documents: Vec<Value> = (0..5)
        .map(|i| json!({"_id": format!("user-{i}"), "name": format!("u{i}")}))
        .collect();

    let ids = store.insert_many("users", documents).await.unwrap();
    assert_eq!(ids.len(), 5);
    assert_eq!(store.count("users").unwrap(), 5);

    let page = store.find_all("users", 0, 3).unwrap();
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.total_elements, 5);

    let rest = store.find_all("users", 3, 10).unwrap();
    assert_eq!(rest.content.len(), 2);
    assert_eq!(rest.total_elements, 5);
}

#[tokio::test]
async fn update_one_reencrypts() {
    let store = test_store().await;
    let id = store
        .insert_one("users", json!({"ssn": "111-11-1111"}))
        .await
        .unwrap();

    let updated = store
        .update_one("users", &id, json!({"ssn": "999-99-9999"}))
        .await
        .unwrap();
    assert!(updated);

    let stored = store.find_one("users", &id).unwrap().unwrap();
    assert_ne!(stored["ssn"], json!("999-99-9999"));

    let decrypted = store.find_one_decrypted("users", &id).await.unwrap().unwrap();
    assert_eq!(decrypted["ssn"], json!("999-99-9999"));
}

#[tokio::test]
async fn update_missing_row_reports_false() {
    let store = test_store().await;
    let updated = store
        .update_one("users", "missing", json!({"ssn": "x"}))
        .await
        .unwrap();
    assert!(!updated);
}

#[tokio::test]
async fn delete_one_and_many() {
    let store = test_store().await;
    store
        .insert_one("users", json!({"_id": "a", "name": "a"}))
        .await
        .unwrap();
    store
        .insert_one("users", json!({"_id": "b", "name": "b"}))
        .await
        .unwrap();

    assert!(store.delete_one("users", "a").unwrap());
    assert!(!store.delete_one("users", "a").unwrap());
    assert_eq!(store.count("users").unwrap(), 1);

    assert_eq!(store.delete_many("users").unwrap(), 1);
    assert_eq!(store.count("users").unwrap(), 0);
}

#[tokio::test]
async fn non_object_documents_are_rejected() {
    let store = test_store().await;
    assert!(store.insert_one("users", json!([1, 2])).await.is_err());
    assert!(store.insert_one("users", json!("text")).await.is_err());
}

#[tokio::test]
async fn store_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.db");

    let cipher = Arc::new(EnvelopeCipher::new(Arc::new(LocalKeyProvider::new(
        generate_random_key(),
    ))));
    let engine = Arc::new(FieldEngine::new(
        EngineSettings::default(),
        EncryptionConfig::new(),
        cipher,
    ));

    {
        let store = DocumentStore::open(&path, Arc::clone(&engine)).unwrap();
        store
            .insert_one("notes", json!({"_id": "n1", "title": "kept"}))
            .await
            .unwrap();
    }

    let reopened = DocumentStore::open(&path, engine).unwrap();
    let found = reopened.find_one("notes", "n1").unwrap().unwrap();
    assert_eq!(found["title"], json!("kept"));
}
