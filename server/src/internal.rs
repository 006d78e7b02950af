//! Server-side metadata discipline.
//!
//! The REST server never trusts client-supplied metadata. This decorator
//! sits between the handlers and the back-end: Create builds a fresh
//! object of the declared kind and copies only the External section in;
//! Update reads the stored object, copies External over it and stamps
//! `updated`. Identity, kind, `created` and Internal always come from the
//! server side.

use async_trait::async_trait;
use std::sync::Arc;
use strata_store::{
    timestamp, Object, ObjectIdentity, ObjectList, Result, Schema, Store, StoreOption,
};

pub struct InternalStore {
    schema: Arc<Schema>,
    inner: Arc<dyn Store>,
}

impl InternalStore {
    pub fn new(schema: Arc<Schema>, inner: Arc<dyn Store>) -> Self {
        Self { schema, inner }
    }
}

#[async_trait]
impl Store for InternalStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        self.inner.get(identity, opts).await
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        self.inner.list(identity, opts).await
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::server", kind = %obj.kind(), "create");

        let mut fresh = self.schema.object_for_kind(obj.kind())?;
        fresh.external = obj.external.clone();
        fresh.metadata.identity = ObjectIdentity::random();
        fresh.metadata.created = timestamp();

        self.inner.create(&fresh, opts).await
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::server", identity = %identity.path(), "update");

        let mut original = self.inner.get(identity, &[]).await?;
        original.external = obj.external.clone();
        original.metadata.updated = timestamp();

        self.inner.update(identity, &original, opts).await
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        self.inner.delete(identity, opts).await
    }
}
