//! Lock rows.

use docport_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `locks` table.
///
/// Holding a `Lock` value means this caller acquired it with
/// `session_key`; pass it back to `LockRepo::release` to give it up.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lock {
    pub family: String,
    pub lock_key: String,
    pub session_key: Uuid,
    /// `None` for a lock that never expires.
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
