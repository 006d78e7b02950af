//! Contract tests against MongoDB.
//!
//! These need a running server; point MONGO_URI at it (defaults to
//! mongodb://127.0.0.1:27017) and run with `cargo test -- --ignored`.

use serde_json::json;
use std::sync::Arc;
use strata_store::{
    order_by, page_offset, page_size, prop_filter, Error, KindDef, MongoStore, Object,
    ObjectIdentity, Schema, Store,
};

fn test_schema() -> Arc<Schema> {
    Arc::new(
        Schema::new().with_kind(
            KindDef::new("World")
                .primary_key("external.name")
                .external(json!({"name": "", "description": ""}))
                .internal(json!({"description": ""})),
        ),
    )
}

fn world(schema: &Schema, name: &str) -> Object {
    let mut obj = schema.object_for_kind("World").unwrap();
    obj.external["name"] = json!(name);
    obj
}

fn mongo_store(schema: &Arc<Schema>, db: &str) -> MongoStore {
    let uri =
        std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string());
    MongoStore::new(schema.clone(), uri, db)
}

async fn clear(store: &MongoStore) {
    let scope = ObjectIdentity::kind_scope("World");
    for obj in store.list(&scope, &[]).await.unwrap_or_default() {
        let _ = store.delete(obj.identity(), &[]).await;
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn create_get_update_delete() {
    let schema = test_schema();
    let store = mongo_store(&schema, "strata_test_crud");
    clear(&store).await;

    let created = store.create(&world(&schema, "c137"), &[]).await.unwrap();

    let by_key = store
        .get(&ObjectIdentity::of_kind("World", "c137"), &[])
        .await
        .unwrap();
    assert_eq!(by_key, created);
    assert_eq!(store.get(created.identity(), &[]).await.unwrap(), created);

    let err = store.create(&world(&schema, "c137"), &[]).await.unwrap_err();
    assert_eq!(err, Error::ObjectExists);

    let mut changed = created.clone();
    changed.external["description"] = json!("def");
    let updated = store
        .update(created.identity(), &changed, &[])
        .await
        .unwrap();
    assert_eq!(updated.external["description"], "def");

    store.delete(created.identity(), &[]).await.unwrap();
    assert_eq!(
        store.get(created.identity(), &[]).await.unwrap_err(),
        Error::NoSuchObject
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn list_semantics() {
    let schema = test_schema();
    let store = mongo_store(&schema, "strata_test_list");
    clear(&store).await;

    for name in ["b", "a", "c"] {
        store.create(&world(&schema, name), &[]).await.unwrap();
    }
    let scope = ObjectIdentity::kind_scope("World");

    let asc = store
        .list(&scope, &[order_by("external.name")])
        .await
        .unwrap();
    let names: Vec<_> = asc.iter().map(|o| o.external["name"].clone()).collect();
    assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);

    let page = store
        .list(
            &scope,
            &[order_by("external.name"), page_size(1), page_offset(1)],
        )
        .await
        .unwrap();
    assert_eq!(page[0].external["name"], "b");

    let propd = store
        .list(&scope, &[prop_filter("external.name", "a")])
        .await
        .unwrap();
    assert_eq!(propd.len(), 1);

    assert_eq!(
        store
            .list(&scope, &[prop_filter("external.missing", "x")])
            .await
            .unwrap_err(),
        Error::InvalidFilter
    );
}
