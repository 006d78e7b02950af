//! List query-string parsing.

use std::collections::HashMap;
use strata_store::rest::{
    INCREMENTAL_ARG, KEY_FILTER_ARG, ORDER_BY_ARG, PAGE_OFFSET_ARG, PAGE_SIZE_ARG, PROP_FILTER_ARG,
};
use strata_store::{
    key_filter, order_by, order_descending, page_offset, page_size, prop_filter, Error, PropFilter,
    Result, StoreOption,
};

/// Translate the query string of a List request into store options.
/// Any argument that fails to parse is a bad request.
pub fn list_options(params: &HashMap<String, String>) -> Result<Vec<StoreOption>> {
    let mut opts = Vec::new();

    if let Some(raw) = params.get(PROP_FILTER_ARG) {
        let filter: PropFilter = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidOption(format!("bad {PROP_FILTER_ARG} argument: {e}")))?;
        opts.push(prop_filter(filter.key, filter.value));
    }

    if let Some(raw) = params.get(KEY_FILTER_ARG) {
        let keys: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidOption(format!("bad {KEY_FILTER_ARG} argument: {e}")))?;
        opts.push(key_filter(keys));
    }

    if let Some(raw) = params.get(PAGE_SIZE_ARG) {
        let size: usize = raw
            .parse()
            .map_err(|_| Error::InvalidOption(format!("bad {PAGE_SIZE_ARG} argument")))?;
        opts.push(page_size(size));
    }

    if let Some(raw) = params.get(PAGE_OFFSET_ARG) {
        let offset: usize = raw
            .parse()
            .map_err(|_| Error::InvalidOption(format!("bad {PAGE_OFFSET_ARG} argument")))?;
        opts.push(page_offset(offset));
    }

    if let Some(raw) = params.get(ORDER_BY_ARG) {
        opts.push(order_by(raw.clone()));
    }

    if let Some(raw) = params.get(INCREMENTAL_ARG) {
        let incremental: bool = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidOption(format!("bad {INCREMENTAL_ARG} argument: {e}")))?;
        if !incremental {
            opts.push(order_descending());
        }
    }

    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_all_arguments() {
        let opts = list_options(&params(&[
            ("pf", r#"{"key": "external.name", "value": "abc"}"#),
            ("kf", r#"["a", "b"]"#),
            ("pageSize", "5"),
            ("pageOffset", "2"),
            ("orderBy", "external.name"),
            ("inc", "false"),
        ]))
        .unwrap();
        assert_eq!(opts.len(), 6);
    }

    #[test]
    fn empty_query_is_no_options() {
        assert!(list_options(&HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn bad_arguments_fail() {
        assert!(list_options(&params(&[("pf", "not json")])).is_err());
        assert!(list_options(&params(&[("kf", "{}")])).is_err());
        assert!(list_options(&params(&[("pageSize", "many")])).is_err());
        assert!(list_options(&params(&[("inc", "yes")])).is_err());
    }
}
