//! Criterion benchmarks for coinmatch-core.
//!
//! ## Benchmark groups
//!
//! 1. **schema**: DDL init and fixture insert.
//! 2. **text**: Normalization and feature extraction.
//! 3. **grade**: Grade normalization and validation.
//! 4. **index**: Catalog scan and index build at several catalog sizes.
//! 5. **matching**: Single listings, base resolution, and rayon batches.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/coinmatch-core/Cargo.toml
//! # Run only the matching group:
//! cargo bench --manifest-path crates/coinmatch-core/Cargo.toml -- matching
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusqlite::Connection;

use coinmatch_core::grade::{normalize_grade, validate_grade};
use coinmatch_core::matching::index::CatalogIndex;
use coinmatch_core::models::{Variant, LEVEL_SPECIAL_VARIETY, LEVEL_STRIKE_TYPE};
use coinmatch_core::store::catalog::{insert_variants, load_variants};
use coinmatch_core::store::schema::init_schema;
use coinmatch_core::{Lexicon, MatcherConfig, PriorityTable, Resolver, Vocabulary};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SERIES: &[&str] = &[
    "Buffalo Nickel",
    "Lincoln Cent",
    "Mercury Dime",
    "Morgan Dollar",
    "Peace Dollar",
    "Washington Quarter",
];
const MINTS: &[&str] = &["P", "D", "S"];

const LISTINGS: &[&str] = &[
    "1918d buffallo nickle 8 over 7",
    "1864 Two Cent Piece Large Motto Proof",
    "nice buffalo nickel coin",
    "1921-S Morgan Dollar PCGS MS64 CAC",
    "1937-D Buffalo Nickel 3-Legged VF-30",
    "1955 DDO lincon cent BU",
    "1942/1 mercury dimme full bands au58",
];

/// Synthetic catalog: one base per (series, year, mint) plus a proof and an
/// overdate child on every fifth base.
fn synthetic_catalog(years: i32) -> Vec<Variant> {
    let mut variants = Vec::new();
    for series in SERIES {
        for year in 1900..1900 + years {
            for mint in MINTS {
                let id = format!("{}-{year}-{mint}", series.to_lowercase().replace(' ', "-"));
                let base = Variant::base(&id, series, year, mint);
                if year % 5 == 0 {
                    let proof = Variant::child_of(&format!("{id}-pf"), &base, LEVEL_STRIKE_TYPE)
                        .with_type("Proof", "Proof");
                    let overdate =
                        Variant::child_of(&format!("{id}-od"), &base, LEVEL_SPECIAL_VARIETY)
                            .with_type("Overdate", "8/7 Overdate");
                    variants.push(base);
                    variants.push(proof);
                    variants.push(overdate);
                } else {
                    variants.push(base);
                }
            }
        }
    }
    variants
}

fn setup_db(variants: &[Variant]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    insert_variants(&conn, variants).unwrap();
    conn
}

fn resolver(years: i32) -> Resolver {
    Resolver::from_variants(
        synthetic_catalog(years),
        &Vocabulary::builtin(),
        &PriorityTable::builtin(),
        MatcherConfig::default(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// 1. schema
// ---------------------------------------------------------------------------

fn bench_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema");
    group.bench_function("init_schema_fresh", |b| {
        b.iter(|| {
            let conn = Connection::open_in_memory().unwrap();
            init_schema(black_box(&conn)).unwrap();
        })
    });

    let variants = synthetic_catalog(10);
    group.bench_with_input(
        BenchmarkId::new("insert_variants", variants.len()),
        &variants,
        |b, variants| b.iter(|| setup_db(black_box(variants))),
    );
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. text
// ---------------------------------------------------------------------------

fn bench_text(c: &mut Criterion) {
    let lexicon = Lexicon::builtin();
    let mut group = c.benchmark_group("text");

    group.bench_function("normalize", |b| {
        b.iter(|| {
            for listing in LISTINGS {
                black_box(lexicon.normalize(black_box(listing)));
            }
        })
    });

    let normalized: Vec<String> = LISTINGS.iter().map(|l| lexicon.normalize(l)).collect();
    group.bench_function("extract", |b| {
        b.iter(|| {
            for text in &normalized {
                black_box(lexicon.extract(black_box(text)));
            }
        })
    });

    group.bench_function("compile_vocabulary", |b| {
        let vocabulary = Vocabulary::builtin();
        b.iter(|| Lexicon::compile(black_box(&vocabulary)).unwrap())
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. grade
// ---------------------------------------------------------------------------

fn bench_grade(c: &mut Criterion) {
    let inputs = ["MS65", "ms 64", "pr-69", "VF30", "AU58", "zz99", "PR-69 DCAM", "MS-65 RD"];
    let mut group = c.benchmark_group("grade");
    group.bench_function("normalize_grade", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = black_box(normalize_grade(black_box(input)));
            }
        })
    });
    group.bench_function("validate_grade", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(validate_grade(black_box(input)));
            }
        })
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 4. index
// ---------------------------------------------------------------------------

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");
    group.measurement_time(std::time::Duration::from_secs(10));

    for &years in &[10, 50, 120] {
        let variants = synthetic_catalog(years);
        let conn = setup_db(&variants);

        group.bench_with_input(
            BenchmarkId::new("load_variants", variants.len()),
            &conn,
            |b, conn| b.iter(|| load_variants(black_box(conn)).unwrap()),
        );
        group.bench_with_input(
            BenchmarkId::new("build", variants.len()),
            &variants,
            |b, variants| {
                b.iter(|| {
                    CatalogIndex::build(
                        black_box(variants.clone()),
                        &PriorityTable::builtin(),
                        Lexicon::builtin(),
                    )
                    .unwrap()
                })
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 5. matching
// ---------------------------------------------------------------------------

fn bench_matching(c: &mut Criterion) {
    let resolver = resolver(120);
    let mut group = c.benchmark_group("matching");

    group.bench_function("match_listing", |b| {
        b.iter(|| {
            for listing in LISTINGS {
                black_box(resolver.match_listing(black_box(listing), false));
            }
        })
    });
    group.bench_function("match_listing/require_base", |b| {
        b.iter(|| {
            for listing in LISTINGS {
                black_box(resolver.match_listing(black_box(listing), true));
            }
        })
    });
    group.bench_function("parse_listing", |b| {
        b.iter(|| {
            for listing in LISTINGS {
                black_box(resolver.parse_listing(black_box(listing), Some("Cert #40112233")));
            }
        })
    });

    for &batch in &[100usize, 1_000] {
        let texts: Vec<&str> = LISTINGS.iter().copied().cycle().take(batch).collect();
        group.bench_with_input(
            BenchmarkId::new("batch_match_listings", batch),
            &texts,
            |b, texts| b.iter(|| black_box(resolver.batch_match_listings(texts, true))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_schema,
    bench_text,
    bench_grade,
    bench_index,
    bench_matching,
);
criterion_main!(benches);
