//! Embedded rarity band tables.
//!
//! Two tables exist on purpose: the generation table carries draw weights
//! and slightly inset bands that new creatures are rolled against, the read
//! table carries the contiguous bands decoded stat averages are matched
//! against. Each generation band nests inside its read band, so a creature
//! generated at a rarity also decodes to it.

use anyhow::Context;
use dna_core::RarityTable;

use crate::loaders::LoadResult;

const GENERATION: &str = include_str!("../../data/rarities_generation.json");
const READ: &str = include_str!("../../data/rarities_read.json");

/// Bands and weights used when generating new DNA.
pub fn load_generation_rarities() -> LoadResult<RarityTable> {
    serde_json::from_str(GENERATION).context("failed to parse rarities_generation.json")
}

/// Bands used when deriving rarity from a decoded stat average.
pub fn load_read_rarities() -> LoadResult<RarityTable> {
    serde_json::from_str(READ).context("failed to parse rarities_read.json")
}
