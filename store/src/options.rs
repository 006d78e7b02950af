//! Options carried by store operations.
//!
//! An option is a value that knows which operations it applies to and how
//! to mutate the option holder of the layer currently processing the call.
//! Layer-specific options (cache TTLs, client headers) downcast the holder
//! and silently no-op when a different layer is applying them; common
//! options fail when applied twice.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The five store operations an option can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    List,
    Create,
    Update,
    Delete,
}

/// Property filter setting: dotted path into the serialized object and the
/// stringified value it must equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropFilter {
    pub key: String,
    pub value: String,
}

/// Options understood by every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonOptions {
    pub prop_filter: Option<PropFilter>,
    pub key_filter: Option<Vec<String>>,
    pub order_by: Option<String>,
    pub order_incremental: bool,
    pub page_size: usize,
    pub page_offset: usize,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            prop_filter: None,
            key_filter: None,
            order_by: None,
            order_incremental: true,
            page_size: 0,
            page_offset: 0,
        }
    }
}

/// A per-call mutable record options apply themselves to. Layers with
/// extra settings embed [`CommonOptions`] and expose themselves through
/// `as_any_mut` so their options can find them.
pub trait OptionHolder: Any {
    fn common_mut(&mut self) -> &mut CommonOptions;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl OptionHolder for CommonOptions {
    fn common_mut(&mut self) -> &mut CommonOptions {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type ApplyFn = dyn Fn(&mut dyn OptionHolder) -> Result<()> + Send + Sync;

/// A typed option value: the operations it is valid for plus its apply
/// function.
#[derive(Clone)]
pub struct StoreOption {
    ops: &'static [Op],
    apply: Arc<ApplyFn>,
}

impl StoreOption {
    pub fn new<F>(ops: &'static [Op], apply: F) -> Self
    where
        F: Fn(&mut dyn OptionHolder) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            ops,
            apply: Arc::new(apply),
        }
    }

    pub fn valid_for(&self, op: Op) -> bool {
        self.ops.contains(&op)
    }

    pub fn apply(&self, holder: &mut dyn OptionHolder) -> Result<()> {
        (self.apply)(holder)
    }
}

impl fmt::Debug for StoreOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOption").field("ops", &self.ops).finish()
    }
}

/// Apply a slice of options to a holder on behalf of one operation.
/// An option that does not cover the operation fails the whole call.
pub fn apply_options(holder: &mut dyn OptionHolder, opts: &[StoreOption], op: Op) -> Result<()> {
    for opt in opts {
        if !opt.valid_for(op) {
            return Err(Error::InvalidOption(format!(
                "option not applicable to {op:?}"
            )));
        }
        opt.apply(holder)?;
    }
    Ok(())
}

/// Keep only objects whose value at `key` equals `value`.
pub fn prop_filter(key: impl Into<String>, value: impl Into<String>) -> StoreOption {
    let setting = PropFilter {
        key: key.into(),
        value: value.into(),
    };
    StoreOption::new(&[Op::List], move |holder| {
        let common = holder.common_mut();
        if common.prop_filter.is_some() {
            return Err(Error::InvalidOption("prop filter already set".into()));
        }
        common.prop_filter = Some(setting.clone());
        Ok(())
    })
}

/// Keep only objects whose primary key is in the set. An empty set is
/// ignored.
pub fn key_filter<I, S>(keys: I) -> StoreOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    StoreOption::new(&[Op::List], move |holder| {
        if keys.is_empty() {
            tracing::debug!(target: "strata::options", "ignoring empty key filter");
            return Ok(());
        }
        let common = holder.common_mut();
        if common.key_filter.is_some() {
            return Err(Error::InvalidOption("key filter already set".into()));
        }
        common.key_filter = Some(keys.clone());
        Ok(())
    })
}

/// Stable-sort results by the value at the given dotted path.
pub fn order_by(path: impl Into<String>) -> StoreOption {
    let path = path.into();
    StoreOption::new(&[Op::List], move |holder| {
        let common = holder.common_mut();
        if common.order_by.is_some() {
            return Err(Error::InvalidOption("order by already set".into()));
        }
        common.order_by = Some(path.clone());
        Ok(())
    })
}

/// Flip the sort direction set by [`order_by`].
pub fn order_descending() -> StoreOption {
    StoreOption::new(&[Op::List], |holder| {
        let common = holder.common_mut();
        if !common.order_incremental {
            return Err(Error::InvalidOption("order direction already set".into()));
        }
        common.order_incremental = false;
        Ok(())
    })
}

/// Maximum number of results; 0 means unlimited.
pub fn page_size(size: usize) -> StoreOption {
    StoreOption::new(&[Op::List], move |holder| {
        let common = holder.common_mut();
        if common.page_size > 0 {
            return Err(Error::InvalidOption("page size already set".into()));
        }
        common.page_size = size;
        Ok(())
    })
}

/// Number of results to skip.
pub fn page_offset(offset: usize) -> StoreOption {
    StoreOption::new(&[Op::List], move |holder| {
        let common = holder.common_mut();
        if common.page_offset > 0 {
            return Err(Error::InvalidOption("page offset already set".into()));
        }
        common.page_offset = offset;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = CommonOptions::default();
        assert!(opts.order_incremental);
        assert_eq!(opts.page_size, 0);
        assert!(opts.prop_filter.is_none());
    }

    #[test]
    fn apply_list_options() {
        let mut holder = CommonOptions::default();
        let opts = [
            prop_filter("external.name", "abc"),
            key_filter(["a", "b"]),
            order_by("external.name"),
            order_descending(),
            page_size(10),
            page_offset(5),
        ];
        apply_options(&mut holder, &opts, Op::List).unwrap();

        assert_eq!(holder.prop_filter.as_ref().unwrap().key, "external.name");
        assert_eq!(holder.key_filter.as_ref().unwrap().len(), 2);
        assert_eq!(holder.order_by.as_deref(), Some("external.name"));
        assert!(!holder.order_incremental);
        assert_eq!(holder.page_size, 10);
        assert_eq!(holder.page_offset, 5);
    }

    #[test]
    fn double_set_fails() {
        let mut holder = CommonOptions::default();
        let opts = [order_by("a"), order_by("b")];
        let err = apply_options(&mut holder, &opts, Op::List).unwrap_err();
        assert!(matches!(err, Error::InvalidOption(_)));
    }

    #[test]
    fn wrong_operation_fails() {
        let mut holder = CommonOptions::default();
        let opts = [page_size(3)];
        let err = apply_options(&mut holder, &opts, Op::Create).unwrap_err();
        assert!(matches!(err, Error::InvalidOption(_)));
    }

    #[test]
    fn empty_key_filter_is_ignored() {
        let mut holder = CommonOptions::default();
        let opts = [key_filter(Vec::<String>::new())];
        apply_options(&mut holder, &opts, Op::List).unwrap();
        assert!(holder.key_filter.is_none());
    }
}
