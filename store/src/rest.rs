//! Wire-level constants shared by the REST client and server.

/// Query argument carrying a JSON-encoded `{key, value}` property filter.
pub const PROP_FILTER_ARG: &str = "pf";
/// Query argument carrying a JSON array of primary keys.
pub const KEY_FILTER_ARG: &str = "kf";
/// Query argument carrying a JSON boolean: ascending order when true.
pub const INCREMENTAL_ARG: &str = "inc";
/// Query argument carrying the page size.
pub const PAGE_SIZE_ARG: &str = "pageSize";
/// Query argument carrying the page offset.
pub const PAGE_OFFSET_ARG: &str = "pageOffset";
/// Query argument carrying the order-by path.
pub const ORDER_BY_ARG: &str = "orderBy";
