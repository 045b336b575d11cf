#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use docport_core::import::{DocumentToImport, ExportedDocument, ImportSource};
use docport_exports::ExportsApiError;
use docport_pipeline::import::CreateImportBatch;
use docport_pipeline::source::ExportSource;

/// In-memory export source.
pub struct FakeSource {
    pub documents: Vec<ExportedDocument>,
    pub fail: bool,
}

impl FakeSource {
    pub fn offering(documents: Vec<ExportedDocument>) -> Self {
        Self {
            documents,
            fail: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            documents: Vec::new(),
            fail: true,
        }
    }
}

impl ExportSource for FakeSource {
    async fn list_exports(
        &self,
        _source: &ImportSource,
    ) -> Result<Vec<ExportedDocument>, ExportsApiError> {
        if self.fail {
            return Err(ExportsApiError::ApiError {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(self.documents.clone())
    }
}

pub fn exported(key: &str, revision: &str) -> ExportedDocument {
    ExportedDocument {
        key: key.to_string(),
        revision: revision.to_string(),
        updated_on: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        title: format!("Doc {key}"),
        slug: key.to_string(),
        language: "en".to_string(),
    }
}

pub fn import_source(host_name: &str) -> ImportSource {
    ImportSource {
        name: "Docs".to_string(),
        host_name: host_name.to_string(),
        secure: true,
        api_key: "key".to_string(),
    }
}

pub fn to_import(key: &str, revision: &str) -> DocumentToImport {
    DocumentToImport {
        key: key.to_string(),
        importable_revision: revision.to_string(),
    }
}

pub fn create_request(host_name: &str, keys: &[&str]) -> CreateImportBatch {
    CreateImportBatch {
        source: import_source(host_name),
        documents: keys.iter().map(|k| to_import(k, "r1")).collect(),
        created_by: 1,
    }
}
