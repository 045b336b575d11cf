//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the table accepts them

pub mod batch;
pub mod imported_document;
pub mod lock;
pub mod task;
