//! TTL cache decorator.
//!
//! Fronts an authoritative store with a second store (an in-memory one by
//! default). Writes go through to both; reads serve the cached copy while
//! its per-identity TTL holds and fall back to the authoritative store
//! otherwise. List always passes through.

use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::memory::MemoryStore;
use crate::object::Object;
use crate::options::{apply_options, CommonOptions, Op, OptionHolder, StoreOption};
use crate::schema::Schema;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Option holder with the cache's expiration extension.
pub struct CacheOptions {
    pub common: CommonOptions,
    pub expiration: Duration,
}

impl OptionHolder for CacheOptions {
    fn common_mut(&mut self) -> &mut CommonOptions {
        &mut self.common
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Override the entry's TTL for this Create or Update. A zero duration
/// disables expiry for the entry. Applies only when a cache layer
/// processes the call; other layers skip it.
pub fn expire(duration: Duration) -> StoreOption {
    StoreOption::new(&[Op::Create, Op::Update], move |holder| {
        if let Some(opts) = holder.as_any_mut().downcast_mut::<CacheOptions>() {
            opts.expiration = duration;
        }
        Ok(())
    })
}

/// Cache decorator store.
pub struct CachedStore {
    inner: Arc<dyn Store>,
    cache: Arc<dyn Store>,
    default_expiration: Duration,
    policies: DashMap<ObjectIdentity, Duration>,
    modifies: DashMap<ObjectIdentity, Instant>,
}

impl CachedStore {
    /// Cache `inner` behind a fresh in-memory store.
    pub fn new(schema: Arc<Schema>, inner: Arc<dyn Store>, default_expiration: Duration) -> Self {
        Self::with_cache(inner, Arc::new(MemoryStore::new(schema)), default_expiration)
    }

    /// Cache `inner` behind an explicit cache store.
    pub fn with_cache(
        inner: Arc<dyn Store>,
        cache: Arc<dyn Store>,
        default_expiration: Duration,
    ) -> Self {
        Self {
            inner,
            cache,
            default_expiration,
            policies: DashMap::new(),
            modifies: DashMap::new(),
        }
    }

    fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            common: CommonOptions::default(),
            expiration: self.default_expiration,
        }
    }

    fn remember(&self, identity: &ObjectIdentity, expiration: Duration) {
        self.policies.insert(identity.clone(), expiration);
        self.modifies.insert(identity.clone(), Instant::now());
    }

    fn forget(&self, identity: &ObjectIdentity) {
        self.policies.remove(identity);
        self.modifies.remove(identity);
    }

    fn expired(&self, identity: &ObjectIdentity) -> bool {
        let policy = self
            .policies
            .get(identity)
            .map(|p| *p)
            .unwrap_or(self.default_expiration);
        if policy.is_zero() {
            return false;
        }

        match self.modifies.get(identity) {
            Some(modified) => *modified + policy < Instant::now(),
            None => true,
        }
    }
}

#[async_trait]
impl Store for CachedStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::cache", identity = %identity.path(), "get");

        let mut copt = self.cache_options();
        apply_options(&mut copt, opts, Op::Get)?;

        // the authoritative store knows the canonical identity
        let existing = self.inner.get(identity, opts).await?;
        let canonical = existing.identity().clone();

        let cached = self.cache.get(identity, &[]).await.ok();

        if cached.is_none() || self.expired(&canonical) {
            let policy = self
                .policies
                .get(&canonical)
                .map(|p| *p)
                .unwrap_or(self.default_expiration);
            self.remember(&canonical, policy);

            if cached.is_none() {
                let _ = self.cache.create(&existing, &[]).await;
            } else {
                let _ = self.cache.update(identity, &existing, &[]).await;
            }
            return Ok(existing);
        }

        Ok(cached.unwrap())
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        tracing::debug!(target: "strata::cache", identity = %identity, "list");

        self.inner.list(identity, opts).await
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::cache", kind = %obj.kind(), "create");

        let mut copt = self.cache_options();
        apply_options(&mut copt, opts, Op::Create)?;

        if let Ok(cached) = self.cache.create(obj, opts).await {
            if !copt.expiration.is_zero() {
                self.remember(cached.identity(), copt.expiration);
            }
        }

        self.inner.create(obj, opts).await
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::cache", identity = %identity.path(), "update");

        let mut copt = self.cache_options();
        apply_options(&mut copt, opts, Op::Update)?;

        if let Ok(cached) = self.cache.update(identity, obj, opts).await {
            if !copt.expiration.is_zero() {
                self.remember(cached.identity(), copt.expiration);
            }
        }

        self.inner.update(identity, obj, opts).await
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::cache", identity = %identity.path(), "delete");

        if self.cache.delete(identity, opts).await.is_ok() {
            self.forget(identity);
        }

        self.inner.delete(identity, opts).await
    }
}
