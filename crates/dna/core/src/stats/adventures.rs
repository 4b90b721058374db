//! Cross-game stat mapping ("Tactics" 6-stat percentages to
//! "Adventures/SOT" 4-stat percentages and absolute values).
//!
//! The 6->4 mapping averages the physical/elemental attack and defense
//! pairs, then corrects the mapped vector until its floored average matches
//! the original's. Creatures whose stats are uniformly near-minimum
//! ("glitched") or near-maximum ("schimmering") must keep that pattern
//! across the conversion, and the correction must be deterministic so that
//! re-deriving the same creature's cross-game stats is idempotent.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{DnaError, DnaResult};
use crate::schema::store::latest_subversion;

/// All stats at or below this value means the creature is glitched.
pub const GLITCHED_RANGE_START: i64 = 5;
/// All stats at or above this value means the creature is schimmering.
pub const SCHIMMERING_RANGE_START: i64 = 95;

const MAX_SHIFT_PASSES: u32 = 256;
const MAX_CORRECTION_STEPS: u32 = 1024;

/// Tactics-side stat percentages, 0-100 each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TacticsStats {
    pub hp: i64,
    pub initiative: i64,
    pub atk: i64,
    pub def: i64,
    pub eatk: i64,
    pub edef: i64,
}

impl TacticsStats {
    pub fn to_array(self) -> [i64; 6] {
        [
            self.hp,
            self.initiative,
            self.atk,
            self.def,
            self.eatk,
            self.edef,
        ]
    }

    /// Floored average of the six percentages.
    pub fn floor_average(&self) -> i64 {
        floor_average(&self.to_array())
    }
}

/// Adventures-side stat percentages, 0-100 each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdvStats {
    pub hp: i64,
    pub speed: i64,
    pub power: i64,
    pub defense: i64,
}

impl AdvStats {
    pub fn to_array(self) -> [i64; 4] {
        [self.hp, self.speed, self.power, self.defense]
    }

    pub fn from_array(values: [i64; 4]) -> Self {
        Self {
            hp: values[0],
            speed: values[1],
            power: values[2],
            defense: values[3],
        }
    }

    /// Floored average of the four percentages.
    pub fn floor_average(&self) -> i64 {
        floor_average(&self.to_array())
    }
}

/// Absolute adventures stat values after interpolation against a species'
/// declared min/max ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdvStatsComputed {
    pub hp: i64,
    pub speed: i64,
    pub power: i64,
    pub defense: i64,
}

/// Absolute stat ranges for one species.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdvStatRanges {
    pub hp_min: f64,
    pub hp_max: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub power_min: f64,
    pub power_max: f64,
    pub defense_min: f64,
    pub defense_max: f64,
}

/// One versioned document of per-species absolute ranges.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdvRangeTable {
    pub version: String,
    pub species: HashMap<String, AdvStatRanges>,
}

impl AdvRangeTable {
    /// Ranges for one species code.
    pub fn ranges(&self, species: &str) -> DnaResult<&AdvStatRanges> {
        self.species
            .get(species)
            .ok_or_else(|| DnaError::SpeciesRangesMissing {
                species: species.to_string(),
            })
    }
}

/// Registry of versioned range tables, resolved with the same
/// latest-subversion rule as schema documents.
#[derive(Debug, Default)]
pub struct AdvRangeStore {
    tables: HashMap<String, AdvRangeTable>,
    latest_version: String,
    major_cache: Mutex<HashMap<String, String>>,
}

impl AdvRangeStore {
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self {
            tables: HashMap::new(),
            latest_version: latest_version.into(),
            major_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&mut self, table: AdvRangeTable) {
        self.tables.insert(table.version.clone(), table);
    }

    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    /// Resolves `None` to the latest version, an exact version directly,
    /// and a bare major to its greatest registered subversion.
    pub fn resolve(&self, version: Option<&str>) -> DnaResult<&AdvRangeTable> {
        let key = match version {
            None => self.latest_version.clone(),
            Some(v) if v.contains('.') => v.to_string(),
            Some(major) => {
                let mut majors = self
                    .major_cache
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                match majors.get(major) {
                    Some(full) => full.clone(),
                    None => {
                        let full =
                            latest_subversion(self.tables.keys().map(String::as_str), major)?;
                        majors.insert(major.to_string(), full.clone());
                        full
                    }
                }
            }
        };
        self.tables
            .get(&key)
            .ok_or(DnaError::SchemaNotFound { version: key })
    }
}

/// Floored average of integer percentages.
pub fn floor_average(stats: &[i64]) -> i64 {
    stats.iter().sum::<i64>().div_euclid(stats.len() as i64)
}

/// Picks one value from `candidates` with a reproducible rule: the key of
/// each entry is the sum of itself and its ring neighbors modulo the
/// length, and the entry with the smallest key wins (ties to the lowest
/// position). The same input always yields the same pick.
fn deterministic_pick(candidates: &[usize]) -> usize {
    let len = candidates.len();
    debug_assert!(len > 0);
    if len == 1 {
        return candidates[0];
    }
    let mut best = 0;
    let mut best_key = usize::MAX;
    for (position, value) in candidates.iter().enumerate() {
        let prev = candidates[if position == 0 { len - 1 } else { position - 1 }];
        let next = candidates[if position == len - 1 { 0 } else { position + 1 }];
        let key = (prev + next + value) % len;
        if key < best_key {
            best_key = key;
            best = position;
        }
    }
    candidates[best]
}

/// Adjusts `stats` one unit at a time at deterministically picked indices
/// until its floored average equals `target`. `valid` filters which indices
/// may be adjusted at each step; `step` is +1 or -1.
fn adjust_until_average(
    stats: &mut [i64; 4],
    target: i64,
    step: i64,
    valid: impl Fn(usize, i64) -> bool,
) {
    let mut steps = 0u32;
    while floor_average(stats) != target {
        steps += 1;
        if steps > MAX_CORRECTION_STEPS {
            warn!(average = target, ?stats, "extremal correction did not settle");
            break;
        }
        let candidates: Vec<usize> = stats
            .iter()
            .enumerate()
            .filter(|(index, value)| valid(*index, **value))
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() {
            warn!(average = target, ?stats, "extremal correction ran out of indices");
            break;
        }
        stats[deterministic_pick(&candidates)] += step;
    }
}

fn make_glitched(target: i64, original: [i64; 4]) -> [i64; 4] {
    let mut stats = original.map(|v| v.min(GLITCHED_RANGE_START));
    adjust_until_average(&mut stats, target, 1, |_, value| {
        value != GLITCHED_RANGE_START
    });
    stats
}

fn remove_glitched(target: i64, original: [i64; 4]) -> [i64; 4] {
    let mut stats = original;
    // Lift the highest stat just above the glitched ceiling, then walk the
    // others down until the average is restored.
    let max_index = max_position(&stats);
    stats[max_index] = GLITCHED_RANGE_START + 1;
    adjust_until_average(&mut stats, target, -1, |index, value| {
        value != 0 && index != max_index
    });
    stats
}

fn make_schimmering(target: i64, original: [i64; 4]) -> [i64; 4] {
    let mut stats = original.map(|v| v.max(SCHIMMERING_RANGE_START));
    adjust_until_average(&mut stats, target, -1, |_, value| {
        value != SCHIMMERING_RANGE_START
    });
    stats
}

fn remove_schimmering(target: i64, original: [i64; 4]) -> [i64; 4] {
    let mut stats = original;
    let min_index = min_position(&stats);
    stats[min_index] = SCHIMMERING_RANGE_START - 1;
    adjust_until_average(&mut stats, target, 1, |index, value| {
        value != 100 && index != min_index
    });
    stats
}

fn max_position(stats: &[i64; 4]) -> usize {
    let mut best = 0;
    for (index, value) in stats.iter().enumerate() {
        if *value > stats[best] {
            best = index;
        }
    }
    best
}

fn min_position(stats: &[i64; 4]) -> usize {
    let mut best = 0;
    for (index, value) in stats.iter().enumerate() {
        if *value < stats[best] {
            best = index;
        }
    }
    best
}

/// Baseline 6->4 mapping with average-matching correction.
///
/// `power` and `defense` average their physical/elemental pairs; `hp` and
/// `speed` pass through. If the floored average of the mapped vector
/// differs from the original's, the difference is added uniformly to all
/// four values (re-clamped to `[0, 100]`) until the averages agree.
pub fn convert_stats(tactics: &TacticsStats) -> AdvStats {
    let target = tactics.floor_average();
    let mut adv = [
        tactics.hp,
        tactics.initiative,
        ((tactics.atk + tactics.eatk) as f64 / 2.0).round() as i64,
        ((tactics.def + tactics.edef) as f64 / 2.0).round() as i64,
    ];
    let mut passes = 0u32;
    while floor_average(&adv) != target {
        passes += 1;
        if passes > MAX_SHIFT_PASSES {
            warn!(average = target, ?adv, "average-matching shift did not settle");
            break;
        }
        let diff = target - floor_average(&adv);
        for value in &mut adv {
            *value = (*value + diff).clamp(0, 100);
        }
    }
    AdvStats::from_array(adv)
}

fn is_glitched(stats: &[i64]) -> bool {
    stats.iter().all(|v| *v <= GLITCHED_RANGE_START)
}

fn is_schimmering(stats: &[i64]) -> bool {
    stats.iter().all(|v| *v >= SCHIMMERING_RANGE_START)
}

/// Forces the mapped vector into (or out of) the glitched/schimmering
/// pattern when it disagrees with the original's, restoring the original's
/// floored average under the new constraint. Already-consistent vectors
/// are returned unchanged, which makes the correction idempotent.
pub fn fix_extremal_patterns(tactics: &TacticsStats, adventures: AdvStats) -> AdvStats {
    let tactics_array = tactics.to_array();
    let adv_array = adventures.to_array();
    let target = tactics.floor_average();

    let glitched_source = is_glitched(&tactics_array);
    let schimmering_source = is_schimmering(&tactics_array);
    let glitched_mapped = is_glitched(&adv_array);
    let schimmering_mapped = is_schimmering(&adv_array);

    if glitched_source == glitched_mapped && schimmering_source == schimmering_mapped {
        return adventures;
    }

    let corrected = if glitched_source != glitched_mapped {
        if glitched_source {
            make_glitched(target, adv_array)
        } else {
            remove_glitched(target, adv_array)
        }
    } else if schimmering_source {
        make_schimmering(target, adv_array)
    } else {
        remove_schimmering(target, adv_array)
    };
    AdvStats::from_array(corrected)
}

/// Full tactics-to-adventures conversion: baseline mapping, average
/// correction, then extremal-pattern correction.
pub fn tactics_to_adventures(tactics: &TacticsStats) -> AdvStats {
    let adventures = convert_stats(tactics);
    fix_extremal_patterns(tactics, adventures)
}

/// Interpolates adventures percentages into a species' absolute ranges.
pub fn compute_absolute(percent: &AdvStats, ranges: &AdvStatRanges) -> AdvStatsComputed {
    let lerp = |p: i64, min: f64, max: f64| (p as f64 / 100.0 * (max - min) + min).round() as i64;
    AdvStatsComputed {
        hp: lerp(percent.hp, ranges.hp_min, ranges.hp_max),
        speed: lerp(percent.speed, ranges.speed_min, ranges.speed_max),
        power: lerp(percent.power, ranges.power_min, ranges.power_max),
        defense: lerp(percent.defense, ranges.defense_min, ranges.defense_max),
    }
}
