//! Well-known order counter names.

/// Counter that hands out `sort_order` values for imported documents.
pub const DOCUMENT_ORDER_COUNTER: &str = "document-order";
