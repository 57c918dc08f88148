//! `SQLite` schema definitions for sitecheck.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the inspections table.
///
/// `(site, date, shift)` is unique: one inspection per site per day per shift.
pub const CREATE_INSPECTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS inspections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    date TEXT NOT NULL,
    shift TEXT NOT NULL,
    answers_json TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    CONSTRAINT uniq_site_date_shift UNIQUE (site, date, shift)
)
";

/// SQL statement to create an index on `created_at` for newest-first listing.
pub const CREATE_INSPECTIONS_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_inspections_created ON inspections(created_at DESC)
";

/// SQL statement to create an index on `site` for filtered listing.
pub const CREATE_INSPECTIONS_SITE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_inspections_site ON inspections(site, created_at DESC)
";

/// SQL statement to create the permits table.
pub const CREATE_PERMITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS permits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    identification TEXT,
    company TEXT,
    reason TEXT,
    equipment TEXT,
    entry_date TEXT,
    entry_time TEXT,
    exit_date TEXT,
    exit_time TEXT,
    authorizer TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    provider_signature TEXT NOT NULL DEFAULT '',
    manager_signature TEXT NOT NULL DEFAULT '',
    escort_signature TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for newest-first listing.
pub const CREATE_PERMITS_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_permits_created ON permits(created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_INSPECTIONS_TABLE,
    CREATE_INSPECTIONS_CREATED_INDEX,
    CREATE_INSPECTIONS_SITE_INDEX,
    CREATE_PERMITS_TABLE,
    CREATE_PERMITS_CREATED_INDEX,
    CREATE_METADATA_TABLE,
];
