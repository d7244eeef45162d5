//! SQLite DDL for the variant catalog.
//!
//! The resolver only ever reads the catalog. This module provisions an empty
//! one for fixtures and benchmarks.

use rusqlite::Connection;

use crate::errors::CoinMatchResult;

/// `variants` table plus its lookup indexes.
///
/// `parent_variant_id` carries no foreign key: dangling parents are reported
/// as data-quality issues, not rejected at insert time.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS variants (
        variant_id TEXT PRIMARY KEY,
        base_type TEXT NOT NULL,
        year INTEGER NOT NULL,
        mint_mark TEXT NOT NULL DEFAULT 'P',
        variant_type TEXT,
        variant_description TEXT,
        is_base_variant INTEGER NOT NULL DEFAULT 0,
        parent_variant_id TEXT,
        resolution_level INTEGER NOT NULL DEFAULT 1,
        priority_score INTEGER NOT NULL DEFAULT 50
    );",
    "CREATE INDEX IF NOT EXISTS idx_variants_coordinate ON variants(year, mint_mark, base_type);",
    "CREATE INDEX IF NOT EXISTS idx_variants_base ON variants(is_base_variant, year);",
    "CREATE INDEX IF NOT EXISTS idx_variants_parent ON variants(parent_variant_id);",
];

/// Create the `variants` table and its indexes. Safe to call repeatedly.
pub fn init_schema(conn: &Connection) -> CoinMatchResult<()> {
    for stmt in SCHEMA_STATEMENTS {
        conn.execute_batch(stmt)?;
    }
    Ok(())
}
