//! Reactive decorator: before-operation callbacks per (kind, action).

use crate::error::{Error, Result};
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::StoreOption;
use crate::schema::Schema;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutating operations a callback can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// A before-operation hook. Receives the subject object and the reactive
/// store itself, so side effects pass back through the full stack.
/// For Create the object is the incoming one and may be amended; for
/// Update and Delete it is the existing, pre-change object.
pub type Callback =
    Arc<dyn for<'a> Fn(&'a mut Object, &'a dyn Store) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// A (kind, action, callback) registration.
pub struct Subscription {
    kind: String,
    action: Action,
    callback: Callback,
}

/// Register a callback for one kind and action.
pub fn subscribe<F>(kind: impl Into<String>, action: Action, callback: F) -> Subscription
where
    F: for<'a> Fn(&'a mut Object, &'a dyn Store) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    Subscription {
        kind: kind.into(),
        action,
        callback: Arc::new(callback),
    }
}

/// Decorator that runs registered callbacks before mutating operations.
pub struct ReactStore {
    inner: Arc<dyn Store>,
    registry: HashMap<String, HashMap<Action, Callback>>,
}

impl ReactStore {
    /// Build the decorator. At most one callback per (kind, action);
    /// subscriptions for kinds missing from the schema are skipped.
    pub fn new(
        schema: &Schema,
        inner: Arc<dyn Store>,
        subscriptions: Vec<Subscription>,
    ) -> Result<Self> {
        let mut registry: HashMap<String, HashMap<Action, Callback>> = HashMap::new();

        for sub in subscriptions {
            let Some(def) = schema.kind_def(&sub.kind) else {
                tracing::warn!(target: "strata::react", kind = %sub.kind, "skipping unknown kind");
                continue;
            };

            let of_kind = registry.entry(def.kind.clone()).or_default();
            if of_kind.contains_key(&sub.action) {
                return Err(Error::InvalidOption(format!(
                    "callback for {} {:?} already set",
                    sub.kind, sub.action
                )));
            }
            of_kind.insert(sub.action, sub.callback);
        }

        Ok(Self { inner, registry })
    }

    fn callback(&self, kind: &str, action: Action) -> Option<&Callback> {
        self.registry.get(kind)?.get(&action)
    }

    async fn run_callback(&self, obj: &mut Object, action: Action) -> Result<()> {
        if let Some(callback) = self.callback(obj.kind(), action) {
            callback(obj, self).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for ReactStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        self.inner.get(identity, opts).await
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        self.inner.list(identity, opts).await
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::react", kind = %obj.kind(), "create");

        let mut subject = obj.clone();
        self.run_callback(&mut subject, Action::Create).await?;

        self.inner.create(&subject, opts).await
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::react", identity = %identity.path(), "update");

        let mut existing = self
            .get(identity, &[])
            .await
            .map_err(|_| Error::NoSuchObject)?;
        self.run_callback(&mut existing, Action::Update).await?;

        self.inner.update(identity, obj, opts).await
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::react", identity = %identity.path(), "delete");

        let mut existing = self
            .get(identity, &[])
            .await
            .map_err(|_| Error::NoSuchObject)?;
        self.run_callback(&mut existing, Action::Delete).await?;

        self.inner.delete(identity, opts).await
    }
}
