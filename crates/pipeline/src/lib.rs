//! Domain services built on the docport store.
//!
//! - [`maintenance`] -- startup gate running migrations and consistency
//!   checks on exactly one instance at a time.
//! - [`import`] -- the import orchestrator: importable-document diff,
//!   lock-guarded batch creation, progress reporting.
//! - [`tasks`] -- attempt bookkeeping for a single import task.
//! - [`source`] -- the export-source seam over `docport-exports`.

pub mod import;
pub mod maintenance;
pub mod source;
pub mod tasks;
