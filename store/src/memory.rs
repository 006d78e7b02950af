//! In-memory store: the authoritative in-process index and the reference
//! implementation of the List semantics.

use crate::error::{Error, Result};
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::{apply_options, CommonOptions, Op, StoreOption};
use crate::path::apply_list_pipeline;
use crate::schema::Schema;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Identity-path index plus per-kind primary-key index. Both are kept
/// consistent under one lock.
#[derive(Default)]
struct Indexes {
    identity: HashMap<String, Object>,
    primary: HashMap<String, HashMap<String, Object>>,
}

impl Indexes {
    fn lookup(&self, identity: &ObjectIdentity) -> Option<&Object> {
        if let Some(obj) = self.identity.get(&identity.path()) {
            return Some(obj);
        }

        let (kind, key) = (identity.kind(), identity.key());
        if key.is_empty() {
            return None;
        }
        self.primary.get(&kind)?.get(&key)
    }
}

/// Authoritative in-process store backed by two maps.
pub struct MemoryStore {
    schema: Arc<Schema>,
    indexes: RwLock<Indexes>,
}

impl MemoryStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            indexes: RwLock::new(Indexes::default()),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::memory", identity = %identity.path(), "get");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Get)?;

        let indexes = self.indexes.read().unwrap();
        indexes
            .lookup(identity)
            .cloned()
            .ok_or(Error::NoSuchObject)
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        tracing::debug!(target: "strata::memory", identity = %identity, "list");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::List)?;

        if !identity.key().is_empty() {
            return Err(Error::InvalidPath);
        }

        let everything: Vec<Object> = {
            let indexes = self.indexes.read().unwrap();
            match indexes.primary.get(&identity.kind()) {
                Some(of_kind) => of_kind.values().cloned().collect(),
                None => return Ok(ObjectList::new()),
            }
        };

        apply_list_pipeline(everything, &copt, &self.schema)
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        let pkey = self.schema.primary_key_of(obj);
        tracing::debug!(target: "strata::memory", pkey = %pkey, "create");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Create)?;

        let kind = obj.kind().to_lowercase();
        let mut indexes = self.indexes.write().unwrap();

        let by_pkey = ObjectIdentity::of_kind(obj.kind(), &pkey);
        if indexes.lookup(&by_pkey).is_some() || indexes.lookup(obj.identity()).is_some() {
            return Err(Error::ObjectExists);
        }

        let clone = obj.clone();
        indexes
            .identity
            .insert(obj.identity().path(), clone.clone());
        indexes
            .primary
            .entry(kind)
            .or_default()
            .insert(pkey, clone.clone());

        Ok(clone)
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::memory", identity = %identity.path(), "update");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Update)?;

        let mut indexes = self.indexes.write().unwrap();
        let existing = indexes.lookup(identity).cloned().ok_or(Error::NoSuchObject)?;

        // Drop the old primary-key slot; it may have moved.
        let old_kind = existing.kind().to_lowercase();
        let old_pkey = self.schema.primary_key_of(&existing);
        if let Some(of_kind) = indexes.primary.get_mut(&old_kind) {
            of_kind.remove(&old_pkey);
        }
        indexes.identity.remove(&existing.identity().path());

        let clone = obj.clone();
        indexes
            .identity
            .insert(obj.identity().path(), clone.clone());
        indexes
            .primary
            .entry(obj.kind().to_lowercase())
            .or_default()
            .insert(self.schema.primary_key_of(obj), clone.clone());

        Ok(clone)
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::memory", identity = %identity.path(), "delete");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Delete)?;

        let mut indexes = self.indexes.write().unwrap();
        let existing = indexes.lookup(identity).cloned().ok_or(Error::NoSuchObject)?;

        indexes.identity.remove(&existing.identity().path());
        if let Some(of_kind) = indexes.primary.get_mut(&existing.kind().to_lowercase()) {
            of_kind.remove(&self.schema.primary_key_of(&existing));
        }

        Ok(())
    }
}
