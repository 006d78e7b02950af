//! The uniform store contract.

use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::StoreOption;
use async_trait::async_trait;

/// A list of objects, as returned by [`Store::list`].
pub type ObjectList = Vec<Object>;

/// The five-operation CRUD/List contract every layer implements.
///
/// Back-end stores are the serialization point; decorators wrap an inner
/// `Store` and preserve its ordering guarantees. Returned objects are never
/// aliased to internal storage. Cancellation is ambient: dropping the
/// returned future abandons the operation.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch one object by identity (`kind/key` or `id/token` form).
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object>;

    /// List objects of a kind. The identity must be a kind scope
    /// (`kind/`); a key-bearing path is invalid. Listing an unknown kind
    /// yields an empty list.
    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList>;

    /// Store a new object. Fails if the (kind, primary-key) pair or the
    /// identity token is already present.
    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object>;

    /// Replace the object at `identity`. The stored identity, kind and
    /// created-timestamp survive the update.
    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object>;

    /// Remove the object at `identity`.
    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()>;
}
