//! Stat generation and cross-game stat mapping.

pub mod adventures;
pub mod generator;

pub use adventures::{
    AdvRangeStore, AdvRangeTable, AdvStatRanges, AdvStats, AdvStatsComputed, TacticsStats,
    compute_absolute, tactics_to_adventures,
};
pub use generator::generate_stats;
