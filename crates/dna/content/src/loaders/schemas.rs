//! Embedded schema documents.
//!
//! One JSON file per shipped encoding version. Documents are registered as
//! raw sources; the store parses them lazily on first resolution, so a
//! malformed document surfaces as a `SchemaParse` error at use time rather
//! than at load time.

use dna_core::SchemaStore;

/// The newest shipped schema version; `resolve(None)` lands here.
pub const LATEST_SCHEMA_VERSION: &str = "4.0.1";

const SCHEMAS: &[(&str, &str)] = &[
    ("0.2.0", include_str!("../../data/dna_schema_v0.2.0.json")),
    ("0.3.0", include_str!("../../data/dna_schema_v0.3.0.json")),
    ("2.0.0", include_str!("../../data/dna_schema_v2.0.0.json")),
    ("3.0.0", include_str!("../../data/dna_schema_v3.0.0.json")),
    ("3.2.0", include_str!("../../data/dna_schema_v3.2.0.json")),
    ("4.0.0", include_str!("../../data/dna_schema_v4.0.0.json")),
    ("4.0.1", include_str!("../../data/dna_schema_v4.0.1.json")),
];

/// A store over every embedded schema document.
pub fn load_schema_store() -> SchemaStore {
    let mut store = SchemaStore::new(LATEST_SCHEMA_VERSION);
    for (version, source) in SCHEMAS {
        store.register(*version, *source);
    }
    store
}
