//! Universal contract tests, run against the memory store directly and
//! through each decorator, since decorators must preserve the contract.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use strata_store::{
    key_filter, order_by, order_descending, page_offset, page_size, prop_filter, CachedStore,
    Error, KindDef, MemoryStore, Object, ObjectIdentity, ReactStore, RouterStore, Schema, Store,
};

fn test_schema() -> Arc<Schema> {
    Arc::new(
        Schema::new()
            .with_kind(
                KindDef::new("World")
                    .primary_key("external.name")
                    .external(json!({"name": "", "description": ""}))
                    .internal(json!({"description": ""})),
            )
            .with_kind(
                KindDef::new("SecondWorld")
                    .primary_key("external.name")
                    .external(json!({"name": "", "description": ""})),
            ),
    )
}

fn world(schema: &Schema, name: &str) -> Object {
    let mut obj = schema.object_for_kind("World").unwrap();
    obj.external["name"] = json!(name);
    obj
}

/// Every store stack under test, freshly built.
fn stacks(schema: &Arc<Schema>) -> Vec<(&'static str, Arc<dyn Store>)> {
    let memory: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
    let routed: Arc<dyn Store> = Arc::new(RouterStore::new(Arc::new(MemoryStore::new(
        schema.clone(),
    ))));
    let reactive: Arc<dyn Store> = Arc::new(
        ReactStore::new(
            schema,
            Arc::new(MemoryStore::new(schema.clone())),
            Vec::new(),
        )
        .unwrap(),
    );
    let cached: Arc<dyn Store> = Arc::new(CachedStore::new(
        schema.clone(),
        Arc::new(MemoryStore::new(schema.clone())),
        Duration::from_secs(60),
    ));

    vec![
        ("memory", memory),
        ("router", routed),
        ("react", reactive),
        ("cache", cached),
    ]
}

#[tokio::test]
async fn create_get_roundtrip() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        let created = store.create(&world(&schema, "c137"), &[]).await.unwrap();

        let by_key = store
            .get(&ObjectIdentity::of_kind("World", "c137"), &[])
            .await
            .unwrap();
        assert_eq!(by_key, created, "stack {name}");

        let by_id = store.get(created.identity(), &[]).await.unwrap();
        assert_eq!(by_id, created, "stack {name}");
    }
}

#[tokio::test]
async fn second_create_conflicts() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        store.create(&world(&schema, "abc"), &[]).await.unwrap();
        let err = store.create(&world(&schema, "abc"), &[]).await.unwrap_err();
        assert_eq!(err, Error::ObjectExists, "stack {name}");
    }
}

#[tokio::test]
async fn delete_then_get_fails() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        let created = store.create(&world(&schema, "abc"), &[]).await.unwrap();
        store.delete(created.identity(), &[]).await.unwrap();

        let err = store.get(created.identity(), &[]).await.unwrap_err();
        assert_eq!(err, Error::NoSuchObject, "stack {name}");
    }
}

#[tokio::test]
async fn update_keeps_identity() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        let created = store.create(&world(&schema, "abc"), &[]).await.unwrap();

        let mut change = created.clone();
        change.external["description"] = json!("def");
        let updated = store
            .update(created.identity(), &change, &[])
            .await
            .unwrap();

        assert_eq!(updated.identity(), created.identity(), "stack {name}");
        assert_eq!(updated.external["description"], "def", "stack {name}");
    }
}

#[tokio::test]
async fn update_missing_fails() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        let err = store
            .update(
                &ObjectIdentity::of_kind("World", "ghost"),
                &world(&schema, "ghost"),
                &[],
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::NoSuchObject, "stack {name}");
    }
}

#[tokio::test]
async fn list_is_type_scoped() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        store.create(&world(&schema, "w1"), &[]).await.unwrap();
        let mut second = schema.object_for_kind("SecondWorld").unwrap();
        second.external["name"] = json!("w1");
        store.create(&second, &[]).await.unwrap();

        let worlds = store
            .list(&ObjectIdentity::kind_scope("World"), &[])
            .await
            .unwrap();
        assert_eq!(worlds.len(), 1, "stack {name}");
        assert!(worlds.iter().all(|o| o.kind() == "World"), "stack {name}");

        // unknown kinds list as empty, key-bearing paths are rejected
        assert!(store
            .list(&ObjectIdentity::kind_scope("Nothing"), &[])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .list(&ObjectIdentity::of_kind("World", "w1"), &[])
                .await
                .unwrap_err(),
            Error::InvalidPath,
            "stack {name}"
        );
    }
}

#[tokio::test]
async fn list_order_and_pages() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        for world_name in ["c137zxczx", "j19zeta7 qweqw"] {
            store
                .create(&world(&schema, world_name), &[])
                .await
                .unwrap();
        }
        let scope = ObjectIdentity::kind_scope("World");

        let asc = store
            .list(&scope, &[order_by("external.name")])
            .await
            .unwrap();
        let names: Vec<_> = asc.iter().map(|o| o.external["name"].clone()).collect();
        assert_eq!(
            names,
            vec![json!("c137zxczx"), json!("j19zeta7 qweqw")],
            "stack {name}"
        );

        let desc = store
            .list(&scope, &[order_by("external.name"), order_descending()])
            .await
            .unwrap();
        assert_eq!(desc[0].external["name"], "j19zeta7 qweqw", "stack {name}");

        let page = store
            .list(
                &scope,
                &[order_by("external.name"), page_size(1), page_offset(1)],
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1, "stack {name}");
        assert_eq!(page[0].external["name"], "j19zeta7 qweqw", "stack {name}");

        // offset past the end clamps to empty
        let empty = store
            .list(&scope, &[page_size(5), page_offset(10)])
            .await
            .unwrap();
        assert!(empty.is_empty(), "stack {name}");
    }
}

#[tokio::test]
async fn list_filters() {
    let schema = test_schema();
    for (name, store) in stacks(&schema) {
        for world_name in ["a", "b", "c"] {
            store
                .create(&world(&schema, world_name), &[])
                .await
                .unwrap();
        }
        let scope = ObjectIdentity::kind_scope("World");

        let keyed = store
            .list(&scope, &[key_filter(["a", "c"])])
            .await
            .unwrap();
        assert_eq!(keyed.len(), 2, "stack {name}");

        let propd = store
            .list(&scope, &[prop_filter("external.name", "b")])
            .await
            .unwrap();
        assert_eq!(propd.len(), 1, "stack {name}");

        let err = store
            .list(&scope, &[prop_filter("external.missing", "b")])
            .await
            .unwrap_err();
        assert_eq!(err, Error::InvalidFilter, "stack {name}");
    }
}

#[test]
fn clone_independence() {
    let schema = test_schema();
    let original = world(&schema, "abc");

    let mut copy = original.clone();
    copy.external["name"] = json!("changed");
    copy.internal["description"] = json!("changed");

    assert_eq!(original.external["name"], "abc");
    assert_eq!(original.internal["description"], "");
}
