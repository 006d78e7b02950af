//! The object record and its metadata envelope.

use crate::identity::ObjectIdentity;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata envelope carried by every object.
///
/// `created` and `updated` are RFC3339 strings, empty until the server
/// sets them. Neither is writable by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Declared kind of the object, immutable
    pub kind: String,
    /// Identity token, assigned once at server-side Create
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

impl Metadata {
    /// Fresh envelope for a kind. The identity is a client-side placeholder;
    /// a server-side Create replaces it.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity: ObjectIdentity::random(),
            created: String::new(),
            updated: String::new(),
        }
    }
}

/// A stored record: metadata envelope plus client-mutable `external` and
/// server-only `internal` sections.
///
/// Cloning is a deep value copy; mutations of a clone are never observable
/// through the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub metadata: Metadata,
    #[serde(default)]
    pub external: Value,
    #[serde(default)]
    pub internal: Value,
}

impl Object {
    /// Build an object with empty sections. Stores normally construct
    /// objects through [`crate::schema::Schema::object_for_kind`] instead,
    /// which fills in the kind's section templates.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(kind),
            external: Value::Null,
            internal: Value::Null,
        }
    }

    pub fn kind(&self) -> &str {
        &self.metadata.kind
    }

    pub fn identity(&self) -> &ObjectIdentity {
        &self.metadata.identity
    }

    /// The full serialized form, used for dotted-path lookups.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Current time in the RFC3339 second-precision format used for
/// `created`/`updated` stamps.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
