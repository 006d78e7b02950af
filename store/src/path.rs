//! Dotted-path evaluation and the shared List pipeline.
//!
//! Every back-end's List must behave as if it ran this pipeline; the
//! in-memory store uses it directly and the SQL/document stores translate
//! it to their query languages.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::options::{CommonOptions, PropFilter};
use crate::schema::Schema;
use serde_json::Value;

/// Resolve a dotted JSON path against a serialized object and stringify
/// the value found there. Returns `None` when the path does not resolve.
///
/// Strings stringify to their raw contents; every other value stringifies
/// to its compact JSON form (`10`, `true`, `null`, ...).
pub fn object_path(value: &Value, path: &str) -> Option<String> {
    let mut cursor = value;
    for segment in path.split('.') {
        cursor = cursor.get(segment)?;
    }

    Some(match cursor {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Apply the full List pipeline to an already type-scoped set of objects:
/// key filter, prop filter, stable order, pagination clamp.
///
/// The prop filter path is validated against the first object of the set;
/// an unresolvable path is an [`Error::InvalidFilter`].
pub fn apply_list_pipeline(
    mut objects: Vec<Object>,
    opts: &CommonOptions,
    schema: &Schema,
) -> Result<Vec<Object>> {
    if let (Some(filter), Some(sample)) = (&opts.prop_filter, objects.first()) {
        if object_path(&sample.to_value(), &filter.key).is_none() {
            return Err(Error::InvalidFilter);
        }
    }

    if let Some(keys) = &opts.key_filter {
        objects = key_filter(objects, keys, schema);
    }
    if let Some(filter) = &opts.prop_filter {
        objects = prop_filter(objects, filter);
    }
    if let Some(path) = &opts.order_by {
        order(&mut objects, path, opts.order_incremental);
    }

    Ok(paginate(objects, opts.page_offset, opts.page_size))
}

fn key_filter(objects: Vec<Object>, keys: &[String], schema: &Schema) -> Vec<Object> {
    objects
        .into_iter()
        .filter(|o| keys.iter().any(|k| *k == schema.primary_key_of(o)))
        .collect()
}

fn prop_filter(objects: Vec<Object>, filter: &PropFilter) -> Vec<Object> {
    objects
        .into_iter()
        .filter(|o| object_path(&o.to_value(), &filter.key).as_deref() == Some(&filter.value))
        .collect()
}

fn order(objects: &mut [Object], path: &str, incremental: bool) {
    objects.sort_by(|a, b| {
        let ka = object_path(&a.to_value(), path).unwrap_or_default();
        let kb = object_path(&b.to_value(), path).unwrap_or_default();
        if incremental {
            ka.cmp(&kb)
        } else {
            kb.cmp(&ka)
        }
    });
}

fn paginate(objects: Vec<Object>, offset: usize, size: usize) -> Vec<Object> {
    let len = objects.len();
    let size = if size == 0 { len } else { size };

    let lo = offset.min(len);
    let hi = (offset + size).min(len);

    objects.into_iter().skip(lo).take(hi - lo).collect()
}
