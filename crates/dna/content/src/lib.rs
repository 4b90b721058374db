//! Embedded DNA content and loaders.
//!
//! This crate houses the static data the codec runs against and provides
//! loaders that parse it into `dna-core` registries:
//! - schema documents, one per shipped encoding version
//! - rarity band tables (generation-side and read-side)
//! - per-species adventures stat ranges, versioned like schemas
//!
//! Data is embedded with `include_str!` and parsed lazily by the stores
//! where that is the store's contract (schemas) or eagerly at load time
//! (rarity and range tables).

pub mod loaders;

pub use loaders::{
    LATEST_ADVENTURES_VERSION, LATEST_SCHEMA_VERSION, LoadResult, default_factory,
    load_generation_rarities, load_range_store, load_read_rarities, load_schema_store,
};
