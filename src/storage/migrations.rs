//! Schema for the bundled SQLite store.
//!
//! Tracked through `PRAGMA user_version`; each step runs once.

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[&str] = &[
    // 1: the three searchable collections
    "CREATE TABLE IF NOT EXISTS trends (
        id          TEXT PRIMARY KEY,
        owner_id    TEXT,
        label       TEXT NOT NULL,
        description TEXT,
        category    TEXT,
        created_at  TEXT NOT NULL,
        embedding   BLOB
    );
    CREATE INDEX IF NOT EXISTS idx_trends_owner ON trends(owner_id);

    CREATE TABLE IF NOT EXISTS creators (
        id          TEXT PRIMARY KEY,
        owner_id    TEXT,
        name        TEXT NOT NULL,
        handle      TEXT,
        platform    TEXT,
        created_at  TEXT NOT NULL,
        embedding   BLOB
    );
    CREATE INDEX IF NOT EXISTS idx_creators_owner ON creators(owner_id);

    CREATE TABLE IF NOT EXISTS content_assets (
        id          TEXT PRIMARY KEY,
        owner_id    TEXT,
        name        TEXT NOT NULL,
        kind        TEXT,
        url         TEXT,
        created_at  TEXT NOT NULL,
        embedding   BLOB
    );
    CREATE INDEX IF NOT EXISTS idx_content_assets_owner ON content_assets(owner_id);",
];

/// Apply pending migrations and return the resulting schema version.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    for (index, sql) in MIGRATIONS.iter().enumerate() {
        let version = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if version <= current {
            continue;
        }
        debug!(version, "applying migration");
        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
