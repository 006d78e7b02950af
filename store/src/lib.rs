//! # Strata Store
//!
//! A stackable object-storage toolkit. Every layer implements one uniform
//! contract — Get, List, Create, Update, Delete — and any layer can wrap
//! any other, so a stack is assembled by composition:
//!
//! - Back-ends: [`MemoryStore`], [`SqlStore`], [`MongoStore`]
//! - Decorators: [`CachedStore`], [`ReactStore`], [`RouterStore`]
//! - The REST boundary: [`RestClient`] here, the server in
//!   `strata-server`
//!
//! ## Objects and schemas
//!
//! Objects carry a metadata envelope (kind, identity token, timestamps),
//! a client-mutable `external` section and a server-only `internal`
//! section. A [`Schema`] declares the known kinds, each with a zero-value
//! template and a primary-key path:
//!
//! ```rust
//! use strata_store::{KindDef, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new().with_kind(
//!     KindDef::new("World")
//!         .primary_key("external.name")
//!         .external(json!({"name": "", "description": ""})),
//! );
//!
//! let mut world = schema.object_for_kind("World").unwrap();
//! world.external["name"] = json!("c137");
//! assert_eq!(schema.primary_key_of(&world), "c137");
//! ```
//!
//! Objects are addressed either by `kind/primary-key` or by their opaque
//! identity token; see [`ObjectIdentity`].
//!
//! ## Stacking stores
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use strata_store::{CachedStore, MemoryStore, Schema};
//!
//! # async fn build(schema: Arc<Schema>) {
//! let backend = Arc::new(MemoryStore::new(schema.clone()));
//! let stack = CachedStore::new(schema, backend, Duration::from_secs(30));
//! # }
//! ```
//!
//! List semantics — filtering, ordering, pagination — behave identically
//! across back-ends; the in-memory store is the reference implementation.

pub mod cache;
pub mod client;
pub mod error;
pub mod identity;
pub mod memory;
pub mod mongo;
pub mod object;
pub mod options;
pub mod path;
pub mod react;
pub mod rest;
pub mod route;
pub mod schema;
pub mod sql;
pub mod store;

// Re-export main types at crate root
pub use cache::{expire, CacheOptions, CachedStore};
pub use client::{header, RestClient, RestOptions};
pub use error::{Error, Result};
pub use identity::ObjectIdentity;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use object::{timestamp, Metadata, Object};
pub use options::{
    apply_options, key_filter, order_by, order_descending, page_offset, page_size, prop_filter,
    CommonOptions, Op, OptionHolder, PropFilter, StoreOption,
};
pub use path::object_path;
pub use react::{subscribe, Action, ReactStore, Subscription};
pub use route::RouterStore;
pub use schema::{KindDef, Schema};
pub use sql::SqlStore;
pub use store::{ObjectList, Store};
