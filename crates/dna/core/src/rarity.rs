//! Rarity tiers, grades, and the band model mapping stat averages to tiers.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{DnaError, DnaResult};

/// Creature tier selecting which rarity-band table and generation ranges
/// apply.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Grade {
    Prime,
    Standard,
}

/// Discrete rarity tier derived from a creature's stat average.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Canonical declaration order; band lookup and the weighted draw scan
    /// tiers in this order.
    pub const ORDERED: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];
}

/// Band and draw weight for one tier within one grade.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RarityInfo {
    /// Draw weight in percent. Tables used only for band lookup may omit it.
    #[serde(default)]
    pub probability: f64,
    /// `[low, high)` average band; the top band's high bound is inclusive
    /// of 100.
    pub average_stats_range: [f64; 2],
}

/// Whether an average falling outside every band is an error or an absence.
///
/// Both behaviors exist upstream and are preserved as an explicit mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RarityLookup {
    /// Unmatched average raises [`DnaError::RarityNotFound`].
    Strict,
    /// Unmatched average yields `None`.
    Lenient,
}

/// Rarity bands and weights partitioned per grade.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RarityTable(HashMap<Grade, HashMap<Rarity, RarityInfo>>);

impl RarityTable {
    pub fn new(table: HashMap<Grade, HashMap<Rarity, RarityInfo>>) -> Self {
        Self(table)
    }

    /// The tier bands for one grade.
    pub fn grade(&self, grade: Grade) -> DnaResult<&HashMap<Rarity, RarityInfo>> {
        self.0.get(&grade).ok_or_else(|| DnaError::GradeNotFound {
            grade: grade.to_string(),
        })
    }

    /// Band and weight for one tier of one grade.
    pub fn info(&self, grade: Grade, rarity: Rarity) -> DnaResult<&RarityInfo> {
        self.grade(grade)?
            .get(&rarity)
            .ok_or_else(|| DnaError::SchemaParse {
                reason: format!("grade {grade} declares no band for {rarity}"),
            })
    }

    /// Maps a stat average in `[0, 100]` to the first tier whose band
    /// contains it. Bands are half-open `[low, high)`; an average of
    /// exactly 100 matches a band whose high bound is 100.
    pub fn rarity_for_average(
        &self,
        average: f64,
        grade: Grade,
        lookup: RarityLookup,
    ) -> DnaResult<Option<Rarity>> {
        let bands = self.grade(grade)?;
        for tier in Rarity::ORDERED {
            let Some(info) = bands.get(&tier) else {
                continue;
            };
            let [low, high] = info.average_stats_range;
            if average >= low && ((average == 100.0 && high == 100.0) || average < high) {
                return Ok(Some(tier));
            }
        }
        match lookup {
            RarityLookup::Strict => Err(DnaError::RarityNotFound { average }),
            RarityLookup::Lenient => Ok(None),
        }
    }

    /// Draws a tier with probability proportional to its declared weight.
    ///
    /// Weights are pre-scaled by a fixed 1000x precision factor before
    /// summation so the cumulative comparison does not flip on float noise.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, grade: Grade) -> DnaResult<Rarity> {
        const PRECISION: f64 = 1000.0;
        let bands = self.grade(grade)?;
        let total: f64 = Rarity::ORDERED
            .iter()
            .filter_map(|t| bands.get(t))
            .map(|info| info.probability * PRECISION)
            .sum();
        let roll = rng.r#gen::<f64>() * total;
        let mut cumulative = 0.0;
        for tier in Rarity::ORDERED {
            let Some(info) = bands.get(&tier) else {
                continue;
            };
            cumulative += info.probability * PRECISION;
            if roll <= cumulative {
                return Ok(tier);
            }
        }
        Err(DnaError::RarityNotFound {
            average: roll / PRECISION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn table() -> RarityTable {
        let json = r#"{
            "prime": {
                "Common":    { "probability": 40.5, "average_stats_range": [0.0, 20.0] },
                "Uncommon":  { "probability": 31.5, "average_stats_range": [20.0, 40.0] },
                "Rare":      { "probability": 20.0, "average_stats_range": [40.0, 60.0] },
                "Epic":      { "probability": 6.0,  "average_stats_range": [60.0, 80.0] },
                "Legendary": { "probability": 2.0,  "average_stats_range": [80.0, 100.0] }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn bands_partition_zero_to_hundred() {
        let table = table();
        // Every representable half-point average maps to exactly one tier.
        let mut average = 0.0;
        while average <= 100.0 {
            let tier = table
                .rarity_for_average(average, Grade::Prime, RarityLookup::Strict)
                .unwrap();
            assert!(tier.is_some(), "no band for {average}");
            average += 0.5;
        }
    }

    #[test]
    fn band_edges_are_half_open() {
        let table = table();
        let at = |avg: f64| {
            table
                .rarity_for_average(avg, Grade::Prime, RarityLookup::Strict)
                .unwrap()
                .unwrap()
        };
        assert_eq!(at(0.0), Rarity::Common);
        assert_eq!(at(19.9), Rarity::Common);
        assert_eq!(at(20.0), Rarity::Uncommon);
        assert_eq!(at(80.0), Rarity::Legendary);
    }

    #[test]
    fn top_band_is_closed_at_hundred() {
        let table = table();
        let tier = table
            .rarity_for_average(100.0, Grade::Prime, RarityLookup::Strict)
            .unwrap();
        assert_eq!(tier, Some(Rarity::Legendary));
    }

    #[test]
    fn strict_and_lenient_modes_differ() {
        let table = table();
        assert!(matches!(
            table.rarity_for_average(120.0, Grade::Prime, RarityLookup::Strict),
            Err(DnaError::RarityNotFound { .. })
        ));
        assert_eq!(
            table
                .rarity_for_average(120.0, Grade::Prime, RarityLookup::Lenient)
                .unwrap(),
            None
        );
    }

    #[test]
    fn missing_grade_fails() {
        let table = table();
        assert!(matches!(
            table.rarity_for_average(50.0, Grade::Standard, RarityLookup::Strict),
            Err(DnaError::GradeNotFound { .. })
        ));
    }

    #[test]
    fn weighted_draw_tracks_declared_weights() {
        let table = table();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut counts: HashMap<Rarity, u32> = HashMap::new();
        let draws = 20_000;
        for _ in 0..draws {
            let tier = table.draw(&mut rng, Grade::Prime).unwrap();
            *counts.entry(tier).or_default() += 1;
        }
        // Common is declared at 40.5%; allow a generous band for 20k draws.
        let common = counts[&Rarity::Common] as f64 / draws as f64;
        assert!((common - 0.405).abs() < 0.02, "common rate {common}");
        let legendary = counts[&Rarity::Legendary] as f64 / draws as f64;
        assert!((legendary - 0.02).abs() < 0.01, "legendary rate {legendary}");
    }

    #[test]
    fn grade_names_round_trip_strings() {
        use std::str::FromStr;
        assert_eq!(Grade::Prime.to_string(), "prime");
        assert_eq!(Grade::from_str("standard").unwrap(), Grade::Standard);
        assert_eq!(Rarity::from_str("Legendary").unwrap(), Rarity::Legendary);
    }
}
