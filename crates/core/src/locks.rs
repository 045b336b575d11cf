//! Lock families, well-known lock keys, and default time-to-live values.
//!
//! Every family shares the same record shape and the same uniqueness
//! guarantee; the family only scopes the key space (two families may hold
//! the same key independently).

use std::time::Duration;

// ---------------------------------------------------------------------------
// Family name constants
// ---------------------------------------------------------------------------

pub const FAMILY_MAINTENANCE: &str = "maintenance";
pub const FAMILY_IMPORT: &str = "import";
pub const FAMILY_DOCUMENT: &str = "document";
pub const FAMILY_ROOM: &str = "room";
pub const FAMILY_MENU: &str = "menu";

// ---------------------------------------------------------------------------
// Well-known keys
// ---------------------------------------------------------------------------

/// Key of the single lock that gates migrations and consistency checks.
pub const MAINTENANCE_LOCK_KEY: &str = "schema-maintenance";

/// PostgreSQL advisory lock ID used while bootstrapping the `locks` table
/// itself, before any migration has run.
pub const LOCK_TABLE_BOOTSTRAP_ID: i64 = 604_311_872;

// ---------------------------------------------------------------------------
// Default TTLs
// ---------------------------------------------------------------------------

pub const MAINTENANCE_LOCK_TTL: Duration = Duration::from_secs(10 * 60);
pub const IMPORT_LOCK_TTL: Duration = Duration::from_secs(5 * 60);
pub const EDITING_LOCK_TTL: Duration = Duration::from_secs(30 * 60);

/// A logical lock collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockFamily {
    Maintenance,
    Import,
    Document,
    Room,
    Menu,
}

impl LockFamily {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => FAMILY_MAINTENANCE,
            Self::Import => FAMILY_IMPORT,
            Self::Document => FAMILY_DOCUMENT,
            Self::Room => FAMILY_ROOM,
            Self::Menu => FAMILY_MENU,
        }
    }

    /// Time span after which a lock of this family is considered stale.
    pub fn default_ttl(&self) -> Option<Duration> {
        match self {
            Self::Maintenance => Some(MAINTENANCE_LOCK_TTL),
            Self::Import => Some(IMPORT_LOCK_TTL),
            Self::Document | Self::Room | Self::Menu => Some(EDITING_LOCK_TTL),
        }
    }
}

impl std::fmt::Display for LockFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound for a lock TTL, to keep `NOW() + ttl` representable.
pub const MAX_LOCK_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// TTL in whole milliseconds, as bound into SQL. `None` means the lock
/// never expires. Values above [`MAX_LOCK_TTL`] are clamped.
pub fn ttl_millis(ttl: Option<Duration>) -> Option<i64> {
    ttl.map(|ttl| ttl.min(MAX_LOCK_TTL).as_millis() as i64)
}
