//! Loaders turning embedded JSON documents into `dna-core` registries.

pub mod adventures;
pub mod rarities;
pub mod schemas;

pub use adventures::{LATEST_ADVENTURES_VERSION, load_range_store};
pub use rarities::{load_generation_rarities, load_read_rarities};
pub use schemas::{LATEST_SCHEMA_VERSION, load_schema_store};

use dna_core::DnaFactory;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Builds a factory over the full embedded content set: every shipped
/// schema version, both rarity tables, and all adventures range tables.
pub fn default_factory() -> LoadResult<DnaFactory> {
    Ok(DnaFactory::new(
        load_schema_store(),
        load_generation_rarities()?,
        load_read_rarities()?,
        load_range_store()?,
    ))
}
