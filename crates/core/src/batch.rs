//! Batch and task type constants.
//!
//! These are the string values stored in `batches.batch_type` and
//! `tasks.task_type`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::import::{normalize_host, DocumentToImport, ImportSource, ImportType};
use crate::types::Timestamp;

pub const BATCH_TYPE_DOCUMENT_IMPORT: &str = "document-import";
pub const TASK_TYPE_DOCUMENT_IMPORT: &str = "document-import";

/// Kind of work a batch groups together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchType {
    DocumentImport,
}

impl BatchType {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentImport => BATCH_TYPE_DOCUMENT_IMPORT,
        }
    }

    /// Parse from a string, returning an error for unknown types.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            BATCH_TYPE_DOCUMENT_IMPORT => Ok(Self::DocumentImport),
            other => Err(CoreError::Validation(format!(
                "Unknown batch type: '{other}'"
            ))),
        }
    }
}

/// Kind of work a single task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    DocumentImport,
}

impl TaskType {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentImport => TASK_TYPE_DOCUMENT_IMPORT,
        }
    }

    /// Parse from a string, returning an error for unknown types.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            TASK_TYPE_DOCUMENT_IMPORT => Ok(Self::DocumentImport),
            other => Err(CoreError::Validation(format!(
                "Unknown task type: '{other}'"
            ))),
        }
    }
}

/// Source description persisted with a document-import batch.
///
/// Deliberately excludes the API key: credentials are never written to
/// the `batches` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParams {
    pub name: String,
    pub host_name: String,
    pub secure: bool,
}

impl From<&ImportSource> for BatchParams {
    fn from(source: &ImportSource) -> Self {
        Self {
            name: source.name.clone(),
            host_name: normalize_host(&source.host_name),
            secure: source.secure,
        }
    }
}

/// Payload of a document-import task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    /// Stable identifier of the document on the source system.
    pub document_key: String,
    /// Revision being imported from the source.
    pub source_revision: String,
    /// Revision already present locally, if any.
    pub target_revision: Option<String>,
    pub import_type: ImportType,
}

impl TaskParams {
    /// Payload for `doc`, given the revision currently imported locally.
    pub fn for_document(doc: &DocumentToImport, imported_revision: Option<&str>) -> Self {
        Self {
            document_key: doc.key.clone(),
            source_revision: doc.importable_revision.clone(),
            target_revision: imported_revision.map(str::to_string),
            import_type: ImportType::derive(imported_revision, &doc.importable_revision),
        }
    }
}

/// One processing attempt of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAttempt {
    pub started_on: Timestamp,
    pub error: Option<String>,
}

/// A fatal batch-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub occurred_on: Timestamp,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_type_parses_its_own_string() {
        let parsed = BatchType::from_str(BatchType::DocumentImport.as_str()).unwrap();
        assert_eq!(parsed, BatchType::DocumentImport);
    }

    #[test]
    fn unknown_task_type_is_rejected() {
        assert!(TaskType::from_str("media-import").is_err());
    }

    #[test]
    fn batch_params_drop_the_api_key() {
        let source = ImportSource {
            name: "Docs".into(),
            host_name: " Docs.Example.com".into(),
            secure: true,
            api_key: "secret".into(),
        };
        let params = BatchParams::from(&source);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["host_name"], "docs.example.com");
        assert!(json.get("api_key").is_none());
    }

    #[test]
    fn task_params_derive_import_type_from_local_revision() {
        let doc = DocumentToImport {
            key: "k1".into(),
            importable_revision: "r2".into(),
        };

        let fresh = TaskParams::for_document(&doc, None);
        assert_eq!(fresh.import_type, ImportType::Add);
        assert_eq!(fresh.target_revision, None);

        let newer = TaskParams::for_document(&doc, Some("r1"));
        assert_eq!(newer.import_type, ImportType::Update);
        assert_eq!(newer.target_revision.as_deref(), Some("r1"));

        let same = TaskParams::for_document(&doc, Some("r2"));
        assert_eq!(same.import_type, ImportType::Reimport);
    }

    #[test]
    fn task_params_serialize_import_type_lowercase() {
        let params = TaskParams {
            document_key: "k1".into(),
            source_revision: "r2".into(),
            target_revision: Some("r1".into()),
            import_type: ImportType::Update,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["import_type"], "update");
    }
}
