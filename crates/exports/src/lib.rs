//! HTTP client for the export endpoint of an external document system.
//!
//! Every request carries the source's API key and the schema version this
//! service understands, so an incompatible source rejects the call instead
//! of returning documents we would misread.

pub mod api;

pub use api::{ExportsApi, ExportsApiError};
