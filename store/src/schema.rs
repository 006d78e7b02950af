//! Schema: the registry of object kinds.
//!
//! A schema maps each kind name to a [`KindDef`] describing its primary-key
//! path and the zero-value templates of its `external`/`internal` sections.
//! Kind lookup is case-insensitive; the canonical casing is whatever the
//! definition declares.

use crate::error::{Error, Result};
use crate::object::{Metadata, Object};
use crate::path::object_path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default primary-key path when a kind does not declare one.
pub const DEFAULT_PRIMARY_KEY: &str = "metadata.identity";

/// Definition of a single object kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindDef {
    /// Canonical kind name, e.g. `World`
    pub kind: String,
    /// Dotted path of the primary key within the serialized object
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Zero-value template of the external section
    #[serde(default)]
    pub external: Value,
    /// Zero-value template of the internal section
    #[serde(default)]
    pub internal: Value,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl KindDef {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            primary_key: default_primary_key(),
            external: Value::Null,
            internal: Value::Null,
        }
    }

    pub fn primary_key(mut self, path: impl Into<String>) -> Self {
        self.primary_key = path.into();
        self
    }

    pub fn external(mut self, template: Value) -> Self {
        self.external = template;
        self
    }

    pub fn internal(mut self, template: Value) -> Self {
        self.internal = template;
        self
    }
}

/// Registry of kinds, fixed after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(deserialize_with = "lowercase_keys")]
    kinds: HashMap<String, KindDef>,
}

/// Schema files may key kinds in any casing; lookups are lowercase.
fn lowercase_keys<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, KindDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = HashMap::<String, KindDef>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, def)| (key.to_lowercase(), def))
        .collect())
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style kind registration.
    pub fn with_kind(mut self, def: KindDef) -> Self {
        self.kinds.insert(def.kind.to_lowercase(), def);
        self
    }

    /// Known kind names, in their canonical casing.
    pub fn kinds(&self) -> Vec<&str> {
        self.kinds.values().map(|d| d.kind.as_str()).collect()
    }

    pub fn kind_def(&self, kind: &str) -> Option<&KindDef> {
        self.kinds.get(&kind.to_lowercase())
    }

    /// Construct a zero-valued object of the given kind: canonical kind
    /// name, fresh placeholder identity, section templates copied in.
    pub fn object_for_kind(&self, kind: &str) -> Result<Object> {
        let def = self
            .kind_def(kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;

        Ok(Object {
            metadata: Metadata::new(def.kind.clone()),
            external: def.external.clone(),
            internal: def.internal.clone(),
        })
    }

    /// Parse a serialized object of a known kind. Starts from the kind's
    /// zero object and overlays whichever sections the payload carries, so
    /// a stripped `{"external": ...}` body parses as well as the full wire
    /// shape.
    pub fn object_from_json(&self, kind: &str, data: &[u8]) -> Result<Object> {
        let mut obj = self.object_for_kind(kind)?;
        let value: Value = serde_json::from_slice(data)?;

        if let Some(meta) = value.get("metadata") {
            let mut meta = meta.clone();
            if let Some(m) = meta.as_object_mut() {
                // the declared kind wins over whatever the payload claims
                m.insert("kind".into(), Value::String(obj.metadata.kind.clone()));
                for field in ["identity", "created", "updated"] {
                    m.entry(field.to_string())
                        .or_insert_with(|| default_meta_field(&obj.metadata, field));
                }
            }
            obj.metadata = serde_json::from_value(meta)?;
        }
        if let Some(external) = value.get("external") {
            obj.external = external.clone();
        }
        if let Some(internal) = value.get("internal") {
            obj.internal = internal.clone();
        }

        Ok(obj)
    }

    /// Extract the primary key of an object via its kind's declared path.
    /// Falls back to the identity token when the path does not resolve.
    pub fn primary_key_of(&self, obj: &Object) -> String {
        let path = self
            .kind_def(obj.kind())
            .map(|d| d.primary_key.as_str())
            .unwrap_or(DEFAULT_PRIMARY_KEY);

        object_path(&obj.to_value(), path)
            .unwrap_or_else(|| obj.identity().as_str().to_string())
    }
}

fn default_meta_field(meta: &Metadata, field: &str) -> Value {
    match field {
        "identity" => Value::String(meta.identity.as_str().to_string()),
        _ => Value::String(String::new()),
    }
}
