//! Where importable documents come from.

use docport_core::import::{ExportedDocument, ImportSource};
use docport_exports::{ExportsApi, ExportsApiError};

/// Lists the documents an import source currently offers.
///
/// Implemented by [`ExportsApi`] for real hosts; tests substitute an
/// in-memory listing.
pub trait ExportSource: Send + Sync {
    fn list_exports(
        &self,
        source: &ImportSource,
    ) -> impl std::future::Future<Output = Result<Vec<ExportedDocument>, ExportsApiError>> + Send;
}

impl ExportSource for ExportsApi {
    async fn list_exports(
        &self,
        source: &ImportSource,
    ) -> Result<Vec<ExportedDocument>, ExportsApiError> {
        ExportsApi::list_exports(self, source).await
    }
}
