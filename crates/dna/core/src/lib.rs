//! Versioned creature DNA encoding, decoding, and generation.
//!
//! `dna-core` implements the two wire formats a creature's genetic traits
//! have shipped in: the field-packed hex layout of schema generations 0-3
//! and the compressed-JSON payload of generation 4+, together with the
//! version-resolution, rarity, and stat-generation machinery both formats
//! share. The [`factory::DnaFactory`] facade owns the shared tables and
//! dispatches each operation to the right codec; supporting crates depend
//! on the types re-exported here.
pub mod codec;
pub mod cursor;
pub mod error;
pub mod factory;
pub mod rarity;
pub mod schema;
pub mod stats;

pub use codec::{LegacyCodec, ModernCodec, ModernPayload, ParsedModern, ParsedTraits};
pub use cursor::{DnaCursor, Radix};
pub use error::{DnaError, DnaResult};
pub use factory::{DnaFactory, ParsedDna};
pub use rarity::{Grade, Rarity, RarityInfo, RarityLookup, RarityTable};
pub use schema::store::SchemaStore;
pub use schema::{Archetype, Category, EncodedAttribute, Gene, GeneKind, Schema};
pub use stats::{
    AdvRangeStore, AdvRangeTable, AdvStatRanges, AdvStats, AdvStatsComputed, TacticsStats,
    compute_absolute, generate_stats, tactics_to_adventures,
};
