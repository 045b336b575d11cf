//! Repository for the `imported_documents` table.

use docport_core::import::ImportedRevision;
use docport_core::ordering::DOCUMENT_ORDER_COUNTER;
use sqlx::PgPool;

use crate::models::imported_document::{ImportedDocument, RecordImportedDocument};
use crate::repositories::OrderRepo;

/// Column list for `imported_documents` queries.
const COLUMNS: &str = "id, origin, source_key, revision, title, slug, language, \
    sort_order, created_at, updated_at";

/// Provides read and record operations for imported documents.
pub struct ImportedDocumentRepo;

impl ImportedDocumentRepo {
    /// Key and revision of every document imported under `origin`.
    pub async fn list_revisions_for_origin(
        pool: &PgPool,
        origin: &str,
    ) -> Result<Vec<ImportedRevision>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT source_key, revision FROM imported_documents \
             WHERE origin = $1 \
             ORDER BY sort_order ASC",
        )
        .bind(origin)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, revision)| ImportedRevision { key, revision })
            .collect())
    }

    /// Find an imported document by origin and source key.
    pub async fn find_by_source_key(
        pool: &PgPool,
        origin: &str,
        source_key: &str,
    ) -> Result<Option<ImportedDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM imported_documents WHERE origin = $1 AND source_key = $2"
        );
        sqlx::query_as::<_, ImportedDocument>(&query)
            .bind(origin)
            .bind(source_key)
            .fetch_optional(pool)
            .await
    }

    /// Record that a document revision was imported.
    ///
    /// An existing row keeps its `sort_order` and has its revision and
    /// metadata replaced. A new row draws its `sort_order` from the
    /// `document-order` counter in the same transaction.
    pub async fn record_import(
        pool: &PgPool,
        input: &RecordImportedDocument,
    ) -> Result<ImportedDocument, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE imported_documents \
             SET revision = $3, title = $4, slug = $5, language = $6, updated_at = NOW() \
             WHERE origin = $1 AND source_key = $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ImportedDocument>(&update_query)
            .bind(&input.origin)
            .bind(&input.source_key)
            .bind(&input.revision)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.language)
            .fetch_optional(&mut *tx)
            .await?;

        let document = match updated {
            Some(document) => document,
            None => {
                let sort_order = OrderRepo::next_order(&mut *tx, DOCUMENT_ORDER_COUNTER).await?;
                let insert_query = format!(
                    "INSERT INTO imported_documents \
                         (origin, source_key, revision, title, slug, language, sort_order) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, ImportedDocument>(&insert_query)
                    .bind(&input.origin)
                    .bind(&input.source_key)
                    .bind(&input.revision)
                    .bind(&input.title)
                    .bind(&input.slug)
                    .bind(&input.language)
                    .bind(sort_order)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(document)
    }

    /// Highest `sort_order` in use, or `None` if nothing was imported yet.
    pub async fn max_sort_order(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
        let (max,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(sort_order) FROM imported_documents")
                .fetch_one(pool)
                .await?;
        Ok(max)
    }
}
