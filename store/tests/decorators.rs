//! End-to-end decorator scenarios: cache staleness against an
//! authoritative store mutated behind the cache's back, and reactive
//! side effects flowing back through the stack.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use strata_store::{
    expire, subscribe, Action, CachedStore, Error, KindDef, MemoryStore, Object, ObjectIdentity,
    ReactStore, Schema, Store,
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

#[tokio::test]
async fn cache_serves_stale_until_default_ttl_expires() {
    let schema = test_schema();
    let main: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
    let cached = CachedStore::new(schema.clone(), main.clone(), Duration::from_secs(1));

    let created = cached.create(&world(&schema, "abc"), &[]).await.unwrap();

    // update the same object directly in the authoritative store
    let mut changed = created.clone();
    changed.external["description"] = json!("def");
    main.update(created.identity(), &changed, &[])
        .await
        .unwrap();

    // within the TTL the cached (stale) copy is served
    let seen = cached.get(created.identity(), &[]).await.unwrap();
    assert_eq!(seen.external["description"], "");

    tokio::time::sleep(Duration::from_secs(1)).await;

    // expired: the authoritative value comes back and refreshes the cache
    let seen = cached.get(created.identity(), &[]).await.unwrap();
    assert_eq!(seen.external["description"], "def");
}

#[tokio::test]
async fn cache_expire_option_on_update() {
    let schema = test_schema();
    let main: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
    let cached = CachedStore::new(schema.clone(), main.clone(), Duration::from_secs(1));

    let created = cached.create(&world(&schema, "abc"), &[]).await.unwrap();

    let mut long_lived = created.clone();
    long_lived.external["description"] = json!("keep");
    cached
        .update(
            created.identity(),
            &long_lived,
            &[expire(Duration::from_secs(600))],
        )
        .await
        .unwrap();

    // the authoritative copy moves on
    let mut changed = created.clone();
    changed.external["description"] = json!("gone");
    main.update(created.identity(), &changed, &[])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    // the 10-minute per-entry policy outlives the 1 s default
    let seen = cached.get(created.identity(), &[]).await.unwrap();
    assert_eq!(seen.external["description"], "keep");
}

#[tokio::test]
async fn cache_delete_removes_from_both_layers() {
    let schema = test_schema();
    let main: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
    let cached = CachedStore::new(schema.clone(), main.clone(), Duration::from_secs(2));

    let created = cached.create(&world(&schema, "abc"), &[]).await.unwrap();
    cached.delete(created.identity(), &[]).await.unwrap();

    assert_eq!(
        cached.get(created.identity(), &[]).await.unwrap_err(),
        Error::NoSuchObject
    );
    assert_eq!(
        main.get(created.identity(), &[]).await.unwrap_err(),
        Error::NoSuchObject
    );
}

#[tokio::test]
async fn react_update_callback_creates_second_world() {
    let schema = test_schema();
    let inner: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));

    let cb_schema = schema.clone();
    let store = ReactStore::new(
        &schema,
        inner,
        vec![subscribe("World", Action::Update, move |_, stack| {
            let schema = cb_schema.clone();
            Box::pin(async move {
                let mut second = schema.object_for_kind("SecondWorld")?;
                second.external["name"] = json!("def");
                stack.create(&second, &[]).await?;
                Ok(())
            })
        })],
    )
    .unwrap();

    let created = store.create(&world(&schema, "abc"), &[]).await.unwrap();

    let mut changed = created.clone();
    changed.external["description"] = json!("qwe");
    store
        .update(created.identity(), &changed, &[])
        .await
        .unwrap();

    let second = store
        .get(&ObjectIdentity::of_kind("SecondWorld", "def"), &[])
        .await
        .unwrap();
    assert_eq!(second.kind(), "SecondWorld");
}
