//! Imported document models and DTOs.

use docport_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `imported_documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportedDocument {
    pub id: DbId,
    /// Origin tag of the host the document came from (`import:<host>`).
    pub origin: String,
    pub source_key: String,
    pub revision: String,
    pub title: String,
    pub slug: String,
    pub language: String,
    /// Position assigned from the `document-order` counter on first import.
    pub sort_order: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording that a document revision was imported.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordImportedDocument {
    pub origin: String,
    pub source_key: String,
    pub revision: String,
    pub title: String,
    pub slug: String,
    pub language: String,
}
