//! Embedded adventures stat-range tables.
//!
//! Each document declares the absolute min/max per stat per species for one
//! table version. Tables are versioned and resolved with the same
//! latest-subversion rule as schema documents.

use anyhow::Context;
use dna_core::{AdvRangeStore, AdvRangeTable};

use crate::loaders::LoadResult;

/// The newest shipped range table; decode interpolates against it.
pub const LATEST_ADVENTURES_VERSION: &str = "1.6.1";

const TABLES: &[(&str, &str)] = &[
    ("0.0.7", include_str!("../../data/adventures/v0.0.7.json")),
    ("1.6.1", include_str!("../../data/adventures/v1.6.1.json")),
];

/// A store over every embedded range table.
pub fn load_range_store() -> LoadResult<AdvRangeStore> {
    let mut store = AdvRangeStore::new(LATEST_ADVENTURES_VERSION);
    for (version, source) in TABLES {
        let table: AdvRangeTable = serde_json::from_str(source)
            .with_context(|| format!("failed to parse adventures table v{version}"))?;
        anyhow::ensure!(
            table.version == *version,
            "adventures table v{version} declares version {}",
            table.version
        );
        store.register(table);
    }
    Ok(store)
}
