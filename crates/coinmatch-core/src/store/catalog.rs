//! Read-only access to the variant catalog.
//!
//! The catalog is populated by an external batch process. Everything here
//! reads; the one writer, [`insert_variants`], exists to provision fixtures
//! and empty catalogs.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, Row};

use crate::errors::{CoinMatchError, CoinMatchResult};
use crate::matching::hierarchy::VariantSource;
use crate::models::{canonical_mint_mark, Coordinate, Variant, DEFAULT_PRIORITY_SCORE};

const VARIANT_COLUMNS: &str = "variant_id, base_type, year, mint_mark, variant_type, \
     variant_description, is_base_variant, parent_variant_id, resolution_level, priority_score";

/// Effective mint mark expression: empty and NULL both mean Philadelphia.
const MINT_EXPR: &str = "UPPER(COALESCE(NULLIF(TRIM(mint_mark), ''), 'P'))";

fn row_to_variant(row: &Row<'_>) -> rusqlite::Result<Variant> {
    let mint_mark: Option<String> = row.get(3)?;
    let mint_mark = canonical_mint_mark(mint_mark.as_deref().unwrap_or_default());
    Ok(Variant {
        variant_id: row.get(0)?,
        base_type: row.get(1)?,
        year: row.get(2)?,
        mint_mark,
        variant_type: row.get(4)?,
        variant_description: row.get(5)?,
        is_base_variant: row.get(6)?,
        parent_variant_id: row.get(7)?,
        resolution_level: row.get(8)?,
        priority_score: row
            .get::<_, Option<i64>>(9)?
            .unwrap_or(DEFAULT_PRIORITY_SCORE),
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Handle to an on-disk SQLite catalog.
///
/// Each call opens its own read-only connection so the handle can be shared
/// freely across threads.
#[derive(Debug, Clone)]
pub struct Catalog {
    db_path: PathBuf,
}

impl Catalog {
    /// Open an existing catalog. Fails if the file is missing or does not
    /// contain a `variants` table.
    pub fn open(db_path: impl AsRef<Path>) -> CoinMatchResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if !db_path.is_file() {
            return Err(CoinMatchError::Catalog(format!(
                "catalog not found at {}",
                db_path.display()
            )));
        }
        let catalog = Self { db_path };
        let conn = catalog.connect()?;
        ensure_catalog_table(&conn)?;
        Ok(catalog)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn connect(&self) -> CoinMatchResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    pub fn load_variants(&self) -> CoinMatchResult<Vec<Variant>> {
        let conn = self.connect()?;
        load_variants(&conn)
    }
}

/// Fail unless the connection exposes a `variants` table.
pub fn ensure_catalog_table(conn: &Connection) -> CoinMatchResult<()> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'variants';",
        [],
        |row| row.get(0),
    )?;
    if count == 0 {
        return Err(CoinMatchError::Catalog(
            "catalog has no variants table".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Every variant in catalog (insertion) order.
///
/// A row that cannot be decoded fails the whole load: a malformed catalog
/// must abort resolver construction rather than yield partial indexes.
pub fn load_variants(conn: &Connection) -> CoinMatchResult<Vec<Variant>> {
    ensure_catalog_table(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {VARIANT_COLUMNS} FROM variants ORDER BY rowid ASC;"
    ))?;
    let variants = stmt
        .query_map([], row_to_variant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(variants)
}

pub fn get_variant(conn: &Connection, variant_id: &str) -> CoinMatchResult<Option<Variant>> {
    let result = conn.query_row(
        &format!("SELECT {VARIANT_COLUMNS} FROM variants WHERE variant_id = ?1 LIMIT 1;"),
        params![variant_id],
        row_to_variant,
    );
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Base variants at a coordinate, highest priority first, then catalog order.
pub fn base_variants_at(
    conn: &Connection,
    coordinate: &Coordinate,
) -> CoinMatchResult<Vec<Variant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VARIANT_COLUMNS} FROM variants \
         WHERE LOWER(TRIM(base_type)) = ?1 AND year = ?2 AND {MINT_EXPR} = ?3 \
           AND is_base_variant = 1 \
         ORDER BY COALESCE(priority_score, {DEFAULT_PRIORITY_SCORE}) DESC, rowid ASC;"
    ))?;
    let rows = stmt
        .query_map(
            params![coordinate.base_type, coordinate.year, coordinate.mint_mark],
            row_to_variant,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every variant at `(year, mint)`, in catalog order.
pub fn variants_at_coordinate(conn: &Connection, year: i32, mint_mark: &str) -> CoinMatchResult<Vec<Variant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VARIANT_COLUMNS} FROM variants \
         WHERE year = ?1 AND {MINT_EXPR} = ?2 ORDER BY rowid ASC;"
    ))?;
    let rows = stmt
        .query_map(params![year, mint_mark.trim().to_uppercase()], row_to_variant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn children_of(conn: &Connection, variant_id: &str) -> CoinMatchResult<Vec<Variant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VARIANT_COLUMNS} FROM variants WHERE parent_variant_id = ?1 ORDER BY rowid ASC;"
    ))?;
    let rows = stmt
        .query_map(params![variant_id], row_to_variant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Provision rows into a catalog. Returns the number of rows written.
pub fn insert_variants(conn: &Connection, variants: &[Variant]) -> CoinMatchResult<usize> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO variants({VARIANT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);"
        ))?;
        for v in variants {
            stmt.execute(params![
                v.variant_id,
                v.base_type,
                v.year,
                v.mint_mark,
                v.variant_type,
                v.variant_description,
                v.is_base_variant,
                v.parent_variant_id,
                v.resolution_level,
                v.priority_score,
            ])?;
        }
    }
    tx.commit()?;
    Ok(variants.len())
}

impl VariantSource for Connection {
    type Error = CoinMatchError;

    fn variant(&self, variant_id: &str) -> CoinMatchResult<Option<Variant>> {
        get_variant(self, variant_id)
    }

    fn base_variants_at(&self, coordinate: &Coordinate) -> CoinMatchResult<Vec<Variant>> {
        base_variants_at(self, coordinate)
    }

    fn children_of(&self, variant_id: &str) -> CoinMatchResult<Vec<Variant>> {
        children_of(self, variant_id)
    }
}
