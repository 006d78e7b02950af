//! Router decorator: per-kind dispatch to different inner stores.

use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::StoreOption;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches every operation to the store mapped for the object's kind,
/// falling back to a default store. `id/...` identities cannot name a kind
/// and always go to the default.
pub struct RouterStore {
    default: Arc<dyn Store>,
    mapping: HashMap<String, Arc<dyn Store>>,
}

impl RouterStore {
    pub fn new(default: Arc<dyn Store>) -> Self {
        Self {
            default,
            mapping: HashMap::new(),
        }
    }

    /// Route one kind to a dedicated store.
    pub fn with_route(mut self, kind: impl AsRef<str>, store: Arc<dyn Store>) -> Self {
        self.mapping.insert(kind.as_ref().to_lowercase(), store);
        self
    }

    fn store_for_kind(&self, kind: &str) -> &Arc<dyn Store> {
        self.mapping
            .get(&kind.to_lowercase())
            .unwrap_or(&self.default)
    }

    fn store_for_identity(&self, identity: &ObjectIdentity) -> &Arc<dyn Store> {
        match identity.kind().as_str() {
            "id" => &self.default,
            kind => self.store_for_kind(kind),
        }
    }
}

#[async_trait]
impl Store for RouterStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::route", identity = %identity.path(), "get");
        self.store_for_identity(identity).get(identity, opts).await
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        tracing::debug!(target: "strata::route", identity = %identity, "list");
        self.store_for_identity(identity).list(identity, opts).await
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::route", kind = %obj.kind(), "create");
        self.store_for_kind(obj.kind()).create(obj, opts).await
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::route", identity = %identity.path(), "update");
        self.store_for_identity(identity)
            .update(identity, obj, opts)
            .await
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::route", identity = %identity.path(), "delete");
        self.store_for_identity(identity).delete(identity, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::schema::{KindDef, Schema};
    use serde_json::json;

    fn test_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .with_kind(
                    KindDef::new("World")
                        .primary_key("external.name")
                        .external(json!({"name": ""})),
                )
                .with_kind(
                    KindDef::new("SecondWorld")
                        .primary_key("external.name")
                        .external(json!({"name": ""})),
                ),
        )
    }

    #[tokio::test]
    async fn routes_by_kind() {
        let schema = test_schema();
        let default: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
        let second: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));

        let router = RouterStore::new(default.clone()).with_route("SecondWorld", second.clone());

        let mut world = schema.object_for_kind("World").unwrap();
        world.external["name"] = json!("w");
        router.create(&world, &[]).await.unwrap();

        let mut other = schema.object_for_kind("SecondWorld").unwrap();
        other.external["name"] = json!("s");
        router.create(&other, &[]).await.unwrap();

        // each landed only in its own backing store
        assert!(default
            .get(&ObjectIdentity::of_kind("World", "w"), &[])
            .await
            .is_ok());
        assert!(default
            .get(&ObjectIdentity::of_kind("SecondWorld", "s"), &[])
            .await
            .is_err());
        assert!(second
            .get(&ObjectIdentity::of_kind("SecondWorld", "s"), &[])
            .await
            .is_ok());

        // and the router finds both
        assert!(router
            .get(&ObjectIdentity::of_kind("World", "w"), &[])
            .await
            .is_ok());
        assert!(router
            .get(&ObjectIdentity::of_kind("SecondWorld", "s"), &[])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn list_dispatches_to_mapped_store() {
        let schema = test_schema();
        let default: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
        let second: Arc<dyn Store> = Arc::new(MemoryStore::new(schema.clone()));
        let router = RouterStore::new(default).with_route("SecondWorld", second);

        let mut other = schema.object_for_kind("SecondWorld").unwrap();
        other.external["name"] = json!("s");
        router.create(&other, &[]).await.unwrap();

        let listed = router
            .list(&ObjectIdentity::kind_scope("SecondWorld"), &[])
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
