//! REST client for `GET exports` and `GET exports/{id}`.

use std::time::Duration;

use docport_core::import::{ExportedDocument, ImportSource};

/// Path of the export listing, relative to a source's base URL.
pub const EXPORTS_PATH: &str = "/api/exports";

/// Header carrying the source's API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Query parameter carrying the schema version.
pub const SCHEMA_VERSION_PARAM: &str = "schemaVersion";

/// Export schema this build understands.
pub const DEFAULT_SCHEMA_VERSION: u32 = 1;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the export endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ExportsApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The source returned a non-2xx status code.
    #[error("Export API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Client shared across all import sources.
///
/// The source is passed per call; the client itself only holds the
/// connection pool and the schema version.
#[derive(Debug, Clone)]
pub struct ExportsApi {
    client: reqwest::Client,
    schema_version: u32,
}

impl ExportsApi {
    /// Build a client with its own connection pool.
    pub fn new(schema_version: u32, timeout: Duration) -> Result<Self, ExportsApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, schema_version))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, schema_version: u32) -> Self {
        Self {
            client,
            schema_version,
        }
    }

    /// List every document the source currently offers for export.
    pub async fn list_exports(
        &self,
        source: &ImportSource,
    ) -> Result<Vec<ExportedDocument>, ExportsApiError> {
        let url = exports_url(source);
        tracing::debug!(host_name = %source.host_name, %url, "Listing exports");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &source.api_key)
            .query(&[(SCHEMA_VERSION_PARAM, self.schema_version)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the full export of one document.
    ///
    /// The payload shape belongs to the document-creation side, so it is
    /// returned as raw JSON.
    pub async fn get_export(
        &self,
        source: &ImportSource,
        document_key: &str,
    ) -> Result<serde_json::Value, ExportsApiError> {
        let url = export_url(source, document_key);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &source.api_key)
            .query(&[(SCHEMA_VERSION_PARAM, self.schema_version)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ExportsApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExportsApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ExportsApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn exports_url(source: &ImportSource) -> String {
    format!("{}{EXPORTS_PATH}", source.base_url())
}

fn export_url(source: &ImportSource, document_key: &str) -> String {
    format!(
        "{}{EXPORTS_PATH}/{}",
        source.base_url(),
        encode_path_segment(document_key)
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
