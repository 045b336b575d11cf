//! Domain types and pure logic shared by every docport crate.
//!
//! Nothing in here performs I/O. Persistence lives in `docport-db`, the
//! external export client in `docport-exports`, and the services that tie
//! them together in `docport-pipeline`.

pub mod backoff;
pub mod batch;
pub mod error;
pub mod import;
pub mod locks;
pub mod ordering;
pub mod pagination;
pub mod progress;
pub mod types;
