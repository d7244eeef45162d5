//! Parent-chain walks over the variant hierarchy.
//!
//! A variant resolves to its base by following `parent_variant_id` links. The
//! walk is iterative and only proceeds while each parent is strictly less
//! specific than its child, so corrupt catalogs (cycles, inverted levels)
//! terminate in at most one step per resolution level. Anything odd met on
//! the way is reported as a [`DataQualityIssue`] next to the answer.

use tracing::{debug, warn};

use crate::models::{Coordinate, DataQualityIssue, Variant, VariantHierarchy};

/// Lookups the resolver needs from a catalog.
///
/// Implemented by the in-memory [`CatalogIndex`](crate::matching::index::CatalogIndex)
/// (infallible) and by a raw `rusqlite::Connection` (SQL errors).
pub trait VariantSource {
    type Error;

    fn variant(&self, variant_id: &str) -> Result<Option<Variant>, Self::Error>;

    /// Base variants at `coordinate`, highest `priority_score` first, ties in
    /// catalog order.
    fn base_variants_at(&self, coordinate: &Coordinate) -> Result<Vec<Variant>, Self::Error>;

    fn children_of(&self, variant_id: &str) -> Result<Vec<Variant>, Self::Error>;
}

/// A resolved variant id and the catalog problems met while resolving it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub variant_id: String,
    pub issues: Vec<DataQualityIssue>,
}

impl Resolution {
    fn clean(variant_id: &str) -> Self {
        Self {
            variant_id: variant_id.to_string(),
            issues: Vec::new(),
        }
    }
}

/// Pick the preferred base from a priority-sorted list, flagging a tie at the
/// top.
fn pick_base(
    coordinate: &Coordinate,
    bases: &[Variant],
    issues: &mut Vec<DataQualityIssue>,
) -> Option<String> {
    let first = bases.first()?;
    let tied: Vec<String> = bases
        .iter()
        .take_while(|b| b.priority_score == first.priority_score)
        .map(|b| b.variant_id.clone())
        .collect();
    if tied.len() > 1 {
        warn!(
            base_type = %coordinate.base_type,
            year = coordinate.year,
            mint = %coordinate.mint_mark,
            candidates = ?tied,
            chosen = %first.variant_id,
            "ambiguous base variants share the top priority; using catalog order"
        );
        issues.push(DataQualityIssue::AmbiguousBase {
            coordinate: coordinate.clone(),
            variant_ids: tied,
        });
    }
    Some(first.variant_id.clone())
}

/// Resolve through the coordinate of `node`, or return `node` itself flagged
/// as unresolved.
fn resolve_by_coordinate<S: VariantSource + ?Sized>(
    source: &S,
    node: &Variant,
    mut issues: Vec<DataQualityIssue>,
) -> Result<Resolution, S::Error> {
    let coordinate = node.coordinate();
    let bases = source.base_variants_at(&coordinate)?;
    match pick_base(&coordinate, &bases, &mut issues) {
        Some(variant_id) => Ok(Resolution { variant_id, issues }),
        None => {
            debug!(variant_id = %node.variant_id, "no base variant at coordinate");
            issues.push(DataQualityIssue::UnresolvedBase {
                variant_id: node.variant_id.clone(),
            });
            Ok(Resolution {
                variant_id: node.variant_id.clone(),
                issues,
            })
        }
    }
}

/// Walk from `variant_id` to its base variant.
///
/// - unknown id: returned unchanged
/// - base: itself
/// - dangling parent: the input unchanged, flagged
/// - parent not less specific: walk stops, the current node's coordinate is
///   used instead
/// - no parent and not a base: highest-priority base at its coordinate
pub fn resolve_to_base_traced<S: VariantSource + ?Sized>(
    source: &S,
    variant_id: &str,
) -> Result<Resolution, S::Error> {
    let Some(mut current) = source.variant(variant_id)? else {
        return Ok(Resolution::clean(variant_id));
    };

    let mut issues = Vec::new();
    loop {
        if current.is_base_variant {
            return Ok(Resolution {
                variant_id: current.variant_id,
                issues,
            });
        }

        let Some(parent_id) = current.parent_variant_id.clone() else {
            return resolve_by_coordinate(source, &current, issues);
        };

        let Some(parent) = source.variant(&parent_id)? else {
            debug!(variant_id = %current.variant_id, parent = %parent_id, "dangling parent");
            issues.push(DataQualityIssue::DanglingParent {
                variant_id: current.variant_id.clone(),
                parent_variant_id: parent_id,
            });
            return Ok(Resolution {
                variant_id: variant_id.to_string(),
                issues,
            });
        };

        if parent.resolution_level >= current.resolution_level {
            debug!(
                variant_id = %current.variant_id,
                level = current.resolution_level,
                parent = %parent.variant_id,
                parent_level = parent.resolution_level,
                "parent is not less specific; stopping walk"
            );
            issues.push(DataQualityIssue::LevelNotDecreasing {
                variant_id: current.variant_id.clone(),
                parent_variant_id: parent.variant_id.clone(),
            });
            return resolve_by_coordinate(source, &current, issues);
        }

        current = parent;
    }
}

pub fn resolve_to_base<S: VariantSource + ?Sized>(
    source: &S,
    variant_id: &str,
) -> Result<String, S::Error> {
    Ok(resolve_to_base_traced(source, variant_id)?.variant_id)
}

/// The preferred base at a coordinate, or `None` when there is none.
pub fn resolve_ambiguous_base_traced<S: VariantSource + ?Sized>(
    source: &S,
    base_type: &str,
    year: i32,
    mint_mark: &str,
) -> Result<Option<Resolution>, S::Error> {
    let coordinate = Coordinate::new(base_type, year, mint_mark);
    let bases = source.base_variants_at(&coordinate)?;
    let mut issues = Vec::new();
    Ok(pick_base(&coordinate, &bases, &mut issues)
        .map(|variant_id| Resolution { variant_id, issues }))
}

pub fn resolve_ambiguous_base<S: VariantSource + ?Sized>(
    source: &S,
    base_type: &str,
    year: i32,
    mint_mark: &str,
) -> Result<Option<String>, S::Error> {
    Ok(resolve_ambiguous_base_traced(source, base_type, year, mint_mark)?.map(|r| r.variant_id))
}

/// The variant with its immediate parent and children; `None` for an
/// unknown id. A dangling parent reads as no parent.
pub fn get_variant_hierarchy<S: VariantSource + ?Sized>(
    source: &S,
    variant_id: &str,
) -> Result<Option<VariantHierarchy>, S::Error> {
    let Some(variant) = source.variant(variant_id)? else {
        return Ok(None);
    };
    let parent = match &variant.parent_variant_id {
        Some(parent_id) => source.variant(parent_id)?,
        None => None,
    };
    let children = source.children_of(&variant.variant_id)?;
    Ok(Some(VariantHierarchy {
        variant,
        parent,
        children,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LEVEL_MAJOR_VARIETY, LEVEL_SPECIAL_VARIETY, LEVEL_STRIKE_TYPE};
    use crate::store::catalog::insert_variants;
    use crate::store::schema::init_schema;
    use rusqlite::Connection;

    fn conn_with(variants: &[Variant]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        insert_variants(&conn, variants).unwrap();
        conn
    }

    fn buffalo_1918() -> Vec<Variant> {
        let base = Variant::base("bn-1918-d", "Buffalo Nickel", 1918, "D");
        let overdate = Variant::child_of("bn-1918-d-87", &base, LEVEL_SPECIAL_VARIETY)
            .with_type("Overdate", "8/7 Overdate");
        vec![base, overdate]
    }

    #[test]
    fn walks_parent_chain_to_base() {
        let base = Variant::base("tc-1864-lm", "Two Cent", 1864, "P");
        let major = Variant::child_of("tc-1864-lm-x", &base, LEVEL_MAJOR_VARIETY);
        let proof = Variant::child_of("tc-1864-lm-x-pf", &major, LEVEL_STRIKE_TYPE);
        let conn = conn_with(&[base, major, proof]);

        let resolution = resolve_to_base_traced(&conn, "tc-1864-lm-x-pf").unwrap();
        assert_eq!(resolution.variant_id, "tc-1864-lm");
        assert!(resolution.issues.is_empty());
    }

    #[test]
    fn base_and_unknown_ids_unchanged() {
        let conn = conn_with(&buffalo_1918());
        assert_eq!(resolve_to_base(&conn, "bn-1918-d").unwrap(), "bn-1918-d");
        assert_eq!(resolve_to_base(&conn, "nope").unwrap(), "nope");
    }

    #[test]
    fn resolution_is_idempotent() {
        let conn = conn_with(&buffalo_1918());
        let once = resolve_to_base(&conn, "bn-1918-d-87").unwrap();
        assert_eq!(once, "bn-1918-d");
        assert_eq!(resolve_to_base(&conn, &once).unwrap(), once);
    }

    #[test]
    fn dangling_parent_returns_input() {
        let base = Variant::base("ghost", "Buffalo Nickel", 1918, "D");
        let orphan = Variant::child_of("bn-1918-d-87", &base, LEVEL_SPECIAL_VARIETY);
        let conn = conn_with(&[orphan]);

        let resolution = resolve_to_base_traced(&conn, "bn-1918-d-87").unwrap();
        assert_eq!(resolution.variant_id, "bn-1918-d-87");
        assert_eq!(
            resolution.issues,
            vec![DataQualityIssue::DanglingParent {
                variant_id: "bn-1918-d-87".to_string(),
                parent_variant_id: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn cycle_terminates_via_level_guard() {
        let base = Variant::base("bn-1918-d", "Buffalo Nickel", 1918, "D");
        let mut a = Variant::child_of("a", &base, LEVEL_MAJOR_VARIETY);
        let mut b = Variant::child_of("b", &base, LEVEL_SPECIAL_VARIETY);
        a.parent_variant_id = Some("b".to_string());
        b.parent_variant_id = Some("a".to_string());
        let conn = conn_with(&[base, a, b]);

        let resolution = resolve_to_base_traced(&conn, "b").unwrap();
        // b -> a is a valid step; a -> b violates the level guard.
        assert_eq!(resolution.variant_id, "bn-1918-d");
        assert!(matches!(
            resolution.issues[0],
            DataQualityIssue::LevelNotDecreasing { .. }
        ));
    }

    #[test]
    fn self_parent_with_equal_level_falls_back() {
        let mut node = Variant::base("loop", "Buffalo Nickel", 1920, "S");
        node.is_base_variant = false;
        node.resolution_level = LEVEL_MAJOR_VARIETY;
        node.parent_variant_id = Some("loop".to_string());
        let conn = conn_with(&[node]);

        let resolution = resolve_to_base_traced(&conn, "loop").unwrap();
        assert_eq!(resolution.variant_id, "loop");
        assert!(resolution
            .issues
            .iter()
            .any(|i| matches!(i, DataQualityIssue::UnresolvedBase { .. })));
    }

    #[test]
    fn unlinked_record_uses_priority_then_catalog_order() {
        let small = Variant::base("tc-sm", "Two Cent", 1864, "P").with_priority(40);
        let large = Variant::base("tc-lm", "Two Cent", 1864, "P").with_priority(60);
        let mut unlinked = Variant::base("tc-odd", "Two Cent", 1864, "P");
        unlinked.is_base_variant = false;
        unlinked.resolution_level = LEVEL_MAJOR_VARIETY;
        let conn = conn_with(&[small, large, unlinked]);

        let resolution = resolve_to_base_traced(&conn, "tc-odd").unwrap();
        assert_eq!(resolution.variant_id, "tc-lm");
        assert!(resolution.issues.is_empty());
    }

    #[test]
    fn equal_priorities_flagged_and_first_in_catalog_wins() {
        let first = Variant::base("tc-first", "Two Cent", 1864, "P");
        let second = Variant::base("tc-second", "Two Cent", 1864, "P");
        let conn = conn_with(&[first, second]);

        let resolution = resolve_ambiguous_base_traced(&conn, "two cent", 1864, "p")
            .unwrap()
            .unwrap();
        assert_eq!(resolution.variant_id, "tc-first");
        assert!(matches!(
            &resolution.issues[0],
            DataQualityIssue::AmbiguousBase { variant_ids, .. } if variant_ids.len() == 2
        ));
        assert_eq!(
            resolve_ambiguous_base(&conn, "Two Cent", 1999, "P").unwrap(),
            None
        );
    }

    #[test]
    fn hierarchy_lists_parent_and_children() {
        let conn = conn_with(&buffalo_1918());
        let tree = get_variant_hierarchy(&conn, "bn-1918-d").unwrap().unwrap();
        assert!(tree.parent.is_none());
        assert_eq!(tree.children.len(), 1);

        let leaf = get_variant_hierarchy(&conn, "bn-1918-d-87").unwrap().unwrap();
        assert_eq!(leaf.parent.unwrap().variant_id, "bn-1918-d");
        assert!(leaf.children.is_empty());
        assert!(get_variant_hierarchy(&conn, "missing").unwrap().is_none());
    }
}
