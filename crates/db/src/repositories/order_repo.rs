//! Repository for the `order_counters` table.
//!
//! Every operation is a single statement; the counter is never read and
//! written in separate round-trips.

use sqlx::{PgExecutor, PgPool};

/// Provides atomic named counters.
pub struct OrderRepo;

impl OrderRepo {
    /// Increment `counter` and return the new value.
    ///
    /// Creates the counter with `seq = 1` on first use. Concurrent callers
    /// always receive distinct, contiguous values.
    ///
    /// Accepts any executor so it can run inside a caller's transaction.
    pub async fn next_order<'e>(
        executor: impl PgExecutor<'e>,
        counter: &str,
    ) -> Result<i64, sqlx::Error> {
        let (seq,): (i64,) = sqlx::query_as(
            "INSERT INTO order_counters (name, seq) VALUES ($1, 1) \
             ON CONFLICT (name) DO UPDATE SET seq = order_counters.seq + 1 \
             RETURNING seq",
        )
        .bind(counter)
        .fetch_one(executor)
        .await?;
        Ok(seq)
    }

    /// Current value of `counter`, or `None` if it was never incremented.
    pub async fn current(pool: &PgPool, counter: &str) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT seq FROM order_counters WHERE name = $1")
            .bind(counter)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(seq,)| seq))
    }

    /// Raise `counter` to at least `floor`, never lowering it.
    ///
    /// Returns the resulting value.
    pub async fn ensure_at_least(
        pool: &PgPool,
        counter: &str,
        floor: i64,
    ) -> Result<i64, sqlx::Error> {
        let (seq,): (i64,) = sqlx::query_as(
            "INSERT INTO order_counters (name, seq) VALUES ($1, GREATEST($2::BIGINT, 0)) \
             ON CONFLICT (name) DO UPDATE \
             SET seq = GREATEST(order_counters.seq, EXCLUDED.seq) \
             RETURNING seq",
        )
        .bind(counter)
        .bind(floor)
        .fetch_one(pool)
        .await?;
        Ok(seq)
    }
}
