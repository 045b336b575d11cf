//! Import source descriptions and the importable-document diff.
//!
//! [`merge_importable`] compares what an external source currently offers
//! with what has already been imported from that host and classifies every
//! actionable document as an add, update, or reimport.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::Timestamp;

/// Prefix of the origin tag stamped on documents imported from a host.
pub const ORIGIN_TAG_PREFIX: &str = "import:";

/// An external system documents can be imported from.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ImportSource {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 253))]
    pub host_name: String,
    /// Use HTTPS when talking to the host.
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

fn default_secure() -> bool {
    true
}

impl std::fmt::Debug for ImportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSource")
            .field("name", &self.name)
            .field("host_name", &self.host_name)
            .field("secure", &self.secure)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ImportSource {
    /// Base URL of the source, e.g. `https://docs.example.com`.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}", self.host_name.trim().trim_end_matches('/'))
    }

    /// Origin tag carried by documents imported from this source.
    pub fn origin_tag(&self) -> String {
        origin_tag(&self.host_name)
    }
}

/// Canonical form of a host name: trimmed and lower-cased.
///
/// Used for the per-host import lock key and the incomplete-batch lookup.
pub fn normalize_host(host_name: &str) -> String {
    host_name.trim().to_lowercase()
}

/// Derive the origin tag for a host name. Host names are case-insensitive.
pub fn origin_tag(host_name: &str) -> String {
    format!("{ORIGIN_TAG_PREFIX}{}", normalize_host(host_name))
}

/// How a document will be applied locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    /// Never imported before.
    Add,
    /// A newer revision is offered than the one imported.
    Update,
    /// The same revision is being applied again.
    Reimport,
}

impl ImportType {
    /// Classify from the locally imported and source-offered revisions.
    pub fn derive(imported_revision: Option<&str>, importable_revision: &str) -> Self {
        match imported_revision {
            None => Self::Add,
            Some(imported) if imported == importable_revision => Self::Reimport,
            Some(_) => Self::Update,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Reimport => "reimport",
        }
    }
}

/// One entry of the source's `exports` listing.
///
/// The source speaks camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub key: String,
    pub revision: String,
    pub updated_on: Timestamp,
    pub title: String,
    pub slug: String,
    pub language: String,
}

/// A document already imported from some host, as far as the diff cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRevision {
    pub key: String,
    pub revision: String,
}

/// An actionable document: offered by the source, classified for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportableDocument {
    pub key: String,
    pub title: String,
    pub slug: String,
    pub language: String,
    pub updated_on: Timestamp,
    pub imported_revision: Option<String>,
    pub importable_revision: Option<String>,
    pub import_type: ImportType,
}

/// A document the caller selected for import.
///
/// Only the key and the offered revision come from the caller. The local
/// revision, and with it the import type, is looked up when the batch is
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DocumentToImport {
    #[validate(length(min = 1, max = 500))]
    pub key: String,
    #[validate(length(min = 1, max = 200))]
    pub importable_revision: String,
}

/// Merge the source listing with the already-imported set.
///
/// Keys present only in `imported` (no longer offered by the source) are
/// omitted. Output follows the order of `exported`; if the source lists
/// a key twice, the first occurrence wins.
pub fn merge_importable(
    exported: &[ExportedDocument],
    imported: &[ImportedRevision],
) -> Vec<ImportableDocument> {
    let imported_by_key: HashMap<&str, &str> = imported
        .iter()
        .map(|doc| (doc.key.as_str(), doc.revision.as_str()))
        .collect();

    let mut seen = HashSet::new();
    exported
        .iter()
        .filter(|doc| seen.insert(doc.key.as_str()))
        .map(|doc| {
            let imported_revision = imported_by_key.get(doc.key.as_str()).copied();
            ImportableDocument {
                key: doc.key.clone(),
                title: doc.title.clone(),
                slug: doc.slug.clone(),
                language: doc.language.clone(),
                updated_on: doc.updated_on,
                imported_revision: imported_revision.map(str::to_string),
                importable_revision: Some(doc.revision.clone()),
                import_type: ImportType::derive(imported_revision, &doc.revision),
            }
        })
        .collect()
}
