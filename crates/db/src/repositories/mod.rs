//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations
//! that accept `&PgPool` as the first argument.

pub mod batch_repo;
pub mod imported_document_repo;
pub mod lock_repo;
pub mod order_repo;
pub mod task_repo;

pub use batch_repo::BatchRepo;
pub use imported_document_repo::ImportedDocumentRepo;
pub use lock_repo::{LockError, LockRepo};
pub use order_repo::OrderRepo;
pub use task_repo::TaskRepo;
