//! Repository for the `locks` table.
//!
//! Mutual exclusion rests entirely on the `(family, lock_key)` primary key:
//! acquiring is a single insert-or-replace-if-expired statement, releasing
//! is a delete matching the caller's session key. No process keeps
//! in-memory lock state.

use std::time::Duration;

use docport_core::locks::{ttl_millis, LockFamily, LOCK_TABLE_BOOTSTRAP_ID};
use sqlx::PgPool;
use uuid::Uuid;

use crate::is_unique_violation;
use crate::models::lock::Lock;

/// Column list for `locks` queries.
const COLUMNS: &str = "family, lock_key, session_key, expires_at, created_at";

/// DDL shared with the first migration, so the table can exist before
/// migrations have ever run.
const CREATE_LOCKS_TABLE: &str = "\
    CREATE TABLE IF NOT EXISTS locks ( \
        family      TEXT        NOT NULL, \
        lock_key    TEXT        NOT NULL, \
        session_key UUID        NOT NULL, \
        expires_at  TIMESTAMPTZ, \
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
        CONSTRAINT pk_locks PRIMARY KEY (family, lock_key) \
    )";

/// Errors from lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another caller holds a live lock on this key.
    #[error("Lock '{lock_key}' ({family}) is already taken")]
    AlreadyTaken {
        family: LockFamily,
        lock_key: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Provides acquire/release operations for cross-process locks.
pub struct LockRepo;

impl LockRepo {
    /// Create the `locks` table if it does not exist yet.
    ///
    /// Serialized through a transaction-scoped advisory lock because
    /// concurrent `CREATE TABLE IF NOT EXISTS` can still collide in the
    /// catalog.
    pub async fn ensure_table(pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LOCK_TABLE_BOOTSTRAP_ID)
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_LOCKS_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Take the lock on `lock_key` within `family`.
    ///
    /// Generates a fresh session key and computes the expiry from `ttl`
    /// on the database clock (`None` never expires). A row whose expiry
    /// has passed is treated as absent and replaced in the same
    /// statement. Fails with [`LockError::AlreadyTaken`] if a live lock
    /// exists.
    pub async fn take(
        pool: &PgPool,
        family: LockFamily,
        lock_key: &str,
        ttl: Option<Duration>,
    ) -> Result<Lock, LockError> {
        let query = format!(
            "INSERT INTO locks (family, lock_key, session_key, expires_at) \
             VALUES ($1, $2, $3, \
                     NOW() + ($4::BIGINT)::DOUBLE PRECISION * INTERVAL '1 millisecond') \
             ON CONFLICT (family, lock_key) DO UPDATE \
             SET session_key = EXCLUDED.session_key, \
                 expires_at = EXCLUDED.expires_at, \
                 created_at = NOW() \
             WHERE locks.expires_at IS NOT NULL AND locks.expires_at <= NOW() \
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, Lock>(&query)
            .bind(family.as_str())
            .bind(lock_key)
            .bind(Uuid::new_v4())
            .bind(ttl_millis(ttl))
            .fetch_optional(pool)
            .await;

        let already_taken = || LockError::AlreadyTaken {
            family,
            lock_key: lock_key.to_string(),
        };

        match result {
            Ok(Some(lock)) => {
                tracing::debug!(%family, lock_key, "Lock taken");
                Ok(lock)
            }
            Ok(None) => Err(already_taken()),
            Err(e) if is_unique_violation(&e) => Err(already_taken()),
            Err(e) => Err(LockError::Database(e)),
        }
    }

    /// Release a lock previously returned by [`LockRepo::take`].
    ///
    /// Only deletes the row if both key and session key still match, so a
    /// holder whose lock expired and was re-taken cannot release the new
    /// holder's lock. Returns `false` (not an error) when nothing matched.
    pub async fn release(pool: &PgPool, lock: &Lock) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM locks WHERE family = $1 AND lock_key = $2 AND session_key = $3",
        )
        .bind(&lock.family)
        .bind(&lock.lock_key)
        .bind(lock.session_key)
        .execute(pool)
        .await?;

        let released = result.rows_affected() > 0;
        if released {
            tracing::debug!(family = %lock.family, lock_key = %lock.lock_key, "Lock released");
        } else {
            tracing::debug!(
                family = %lock.family,
                lock_key = %lock.lock_key,
                "Lock already gone at release",
            );
        }
        Ok(released)
    }

    /// Find the live lock on `lock_key`, ignoring expired rows.
    pub async fn find(
        pool: &PgPool,
        family: LockFamily,
        lock_key: &str,
    ) -> Result<Option<Lock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE family = $1 AND lock_key = $2 \
               AND (expires_at IS NULL OR expires_at > NOW())"
        );
        sqlx::query_as::<_, Lock>(&query)
            .bind(family.as_str())
            .bind(lock_key)
            .fetch_optional(pool)
            .await
    }

    /// Delete every lock whose expiry has passed. Returns the number removed.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM locks WHERE expires_at IS NOT NULL AND expires_at <= NOW()",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
