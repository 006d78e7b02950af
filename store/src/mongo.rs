//! Document back-end over MongoDB.
//!
//! Objects live in a single `objects` collection as
//! `{idpath, pkpath, pkey, type, object}` records, indexed on `idpath`,
//! `pkpath` and `type`. The client is established lazily with a 10 s bound
//! and re-validated before each operation. Update is Delete followed by
//! Create; a concurrent Get may observe the gap.

use crate::error::{Error, Result};
use crate::identity::ObjectIdentity;
use crate::object::Object;
use crate::options::{apply_options, CommonOptions, Op, StoreOption};
use crate::path::object_path;
use crate::schema::Schema;
use crate::store::{ObjectList, Store};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const COLLECTION: &str = "objects";
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    idpath: String,
    pkpath: String,
    pkey: String,
    #[serde(rename = "type")]
    kind: String,
    object: Document,
}

/// MongoDB-backed store.
pub struct MongoStore {
    schema: Arc<Schema>,
    uri: String,
    db: String,
    client: Mutex<Option<Client>>,
}

impl MongoStore {
    pub fn new(schema: Arc<Schema>, uri: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            schema,
            uri: uri.into(),
            db: db.into(),
            client: Mutex::new(None),
        }
    }

    /// Ping the cached client, rebuilding it on failure. Secondary indexes
    /// are created when a client is first established.
    async fn collection(&self) -> Result<Collection<StoredRecord>> {
        let mut guard = self.client.lock().await;

        if let Some(client) = guard.as_ref() {
            let db = client.database(&self.db);
            let ping = db.run_command(doc! {"ping": 1});
            if tokio::time::timeout(TIMEOUT, ping).await.is_ok_and(|r| r.is_ok()) {
                return Ok(client.database(&self.db).collection(COLLECTION));
            }
            tracing::warn!(target: "strata::mongo", "connection lost, reconnecting");
        }

        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(Error::from)?;
        options.connect_timeout = Some(TIMEOUT);
        options.server_selection_timeout = Some(TIMEOUT);

        let client = Client::with_options(options)?;
        tokio::time::timeout(TIMEOUT, client.database(&self.db).run_command(doc! {"ping": 1}))
            .await
            .map_err(|_| Error::Mongo("connect timed out".into()))??;

        let collection: Collection<StoredRecord> =
            client.database(&self.db).collection(COLLECTION);
        for field in ["idpath", "pkpath", "type"] {
            let index = IndexModel::builder().keys(doc! { field: 1 }).build();
            let _ = collection.create_index(index).await;
        }

        *guard = Some(client);
        Ok(collection)
    }

    async fn find_record(
        &self,
        collection: &Collection<StoredRecord>,
        path: &str,
    ) -> Result<Option<Object>> {
        for field in ["idpath", "pkpath"] {
            let found = collection.find_one(doc! { field: path }).await?;
            if let Some(record) = found {
                return Ok(Some(self.decode(record)?));
            }
        }
        Ok(None)
    }

    fn decode(&self, record: StoredRecord) -> Result<Object> {
        mongodb::bson::from_document(record.object)
            .map_err(|e| Error::Mongo(format!("malformed record: {e}")))
    }

    fn encode(&self, obj: &Object) -> Result<StoredRecord> {
        let kind = obj.kind().to_lowercase();
        let pkey = self.schema.primary_key_of(obj);

        Ok(StoredRecord {
            idpath: obj.identity().path(),
            pkpath: format!("{kind}/{pkey}"),
            pkey,
            kind,
            object: mongodb::bson::to_document(obj)
                .map_err(|e| Error::Mongo(format!("unencodable object: {e}")))?,
        })
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn get(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<Object> {
        tracing::debug!(target: "strata::mongo", identity = %identity.path(), "get");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Get)?;

        let collection = self.collection().await?;
        self.find_record(&collection, &identity.path())
            .await?
            .ok_or(Error::NoSuchObject)
    }

    async fn list(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<ObjectList> {
        tracing::debug!(target: "strata::mongo", identity = %identity, "list");

        if !identity.key().is_empty() {
            return Err(Error::InvalidPath);
        }

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::List)?;

        let kind = identity.kind();
        let Ok(sample) = self.schema.object_for_kind(&kind) else {
            return Ok(ObjectList::new());
        };

        let mut filter = doc! { "type": &kind };

        if let Some(keys) = &copt.key_filter {
            filter.insert("pkey", doc! { "$in": keys.clone() });
        }

        if let Some(prop) = &copt.prop_filter {
            if object_path(&sample.to_value(), &prop.key).is_none() {
                return Err(Error::InvalidFilter);
            }
            filter.insert(format!("object.{}", prop.key), prop.value.clone());
        }

        let collection = self.collection().await?;
        let mut find = collection.find(filter);

        if let Some(order) = &copt.order_by {
            let direction = if copt.order_incremental { 1 } else { -1 };
            let mut sort = Document::new();
            sort.insert(format!("object.{order}"), direction);
            find = find.sort(sort);
        }
        if copt.page_size > 0 {
            find = find.limit(copt.page_size as i64);
        }
        if copt.page_offset > 0 {
            find = find.skip(copt.page_offset as u64);
        }

        let records: Vec<StoredRecord> = find.await?.try_collect().await?;

        let mut res = ObjectList::with_capacity(records.len());
        for record in records {
            res.push(self.decode(record)?);
        }
        Ok(res)
    }

    async fn create(&self, obj: &Object, opts: &[StoreOption]) -> Result<Object> {
        let pkey = self.schema.primary_key_of(obj);
        tracing::debug!(target: "strata::mongo", pkey = %pkey, "create");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Create)?;

        if self
            .get(&ObjectIdentity::of_kind(obj.kind(), &pkey), &[])
            .await
            .is_ok()
        {
            return Err(Error::ObjectExists);
        }

        let collection = self.collection().await?;
        collection.insert_one(self.encode(obj)?).await?;

        Ok(obj.clone())
    }

    async fn update(
        &self,
        identity: &ObjectIdentity,
        obj: &Object,
        opts: &[StoreOption],
    ) -> Result<Object> {
        tracing::debug!(target: "strata::mongo", identity = %identity.path(), "update");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Update)?;

        // not atomic: replace is delete followed by create
        self.delete(identity, &[]).await?;
        self.create(obj, &[]).await
    }

    async fn delete(&self, identity: &ObjectIdentity, opts: &[StoreOption]) -> Result<()> {
        tracing::debug!(target: "strata::mongo", identity = %identity.path(), "delete");

        let mut copt = CommonOptions::default();
        apply_options(&mut copt, opts, Op::Delete)?;

        let collection = self.collection().await?;
        if self
            .find_record(&collection, &identity.path())
            .await?
            .is_none()
        {
            return Err(Error::NoSuchObject);
        }

        let path = identity.path();
        collection.delete_one(doc! { "idpath": &path }).await?;
        collection.delete_one(doc! { "pkpath": &path }).await?;

        Ok(())
    }
}
