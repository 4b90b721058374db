//! The `DnaFactory` facade: owns the schema store and supporting tables
//! and dispatches every operation to the legacy or modern codec based on
//! the resolved generation.

use rand::Rng;

use crate::codec::legacy::{LegacyCodec, ParsedTraits};
use crate::codec::modern::{ModernCodec, ParsedModern};
use crate::codec::VERSION_UNITS;
use crate::cursor::{DnaCursor, Radix, parse_raw};
use crate::error::DnaResult;
use crate::rarity::{Grade, Rarity, RarityTable};
use crate::schema::store::SchemaStore;
use crate::schema::{MODERN_GENERATION, major_of};
use crate::stats::adventures::{AdvRangeStore, AdvStats};

/// Decoded trait data of either generation family.
#[derive(Clone, Debug)]
pub enum ParsedDna {
    Legacy(ParsedTraits),
    Modern(ParsedModern),
}

impl ParsedDna {
    pub fn version(&self) -> &str {
        match self {
            Self::Legacy(t) => &t.version,
            Self::Modern(m) => &m.version,
        }
    }

    pub fn species_code(&self) -> &str {
        match self {
            Self::Legacy(t) => &t.species_code,
            Self::Modern(m) => &m.species_code,
        }
    }

    pub fn grade(&self) -> Grade {
        match self {
            Self::Legacy(t) => t.grade,
            Self::Modern(m) => m.grade,
        }
    }

    pub fn rarity(&self) -> Rarity {
        match self {
            Self::Legacy(t) => t.rarity,
            Self::Modern(m) => m.rarity,
        }
    }

    /// Adventures 4-stat percentages, derived (legacy) or stored (modern).
    pub fn adventures(&self) -> AdvStats {
        match self {
            Self::Legacy(t) => t.adventures,
            Self::Modern(m) => m.stats,
        }
    }
}

/// Entry point owning all shared state: the schema store, the rarity
/// tables used for legacy generation and decode-side derivation, and the
/// per-species adventures ranges.
///
/// All codec operations borrow from the factory, so one factory value can
/// serve any number of concurrent decode/encode calls.
pub struct DnaFactory {
    store: SchemaStore,
    generation_rarities: RarityTable,
    read_rarities: RarityTable,
    ranges: AdvRangeStore,
}

impl DnaFactory {
    pub fn new(
        store: SchemaStore,
        generation_rarities: RarityTable,
        read_rarities: RarityTable,
        ranges: AdvRangeStore,
    ) -> Self {
        Self {
            store,
            generation_rarities,
            read_rarities,
            ranges,
        }
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn ranges(&self) -> &AdvRangeStore {
        &self.ranges
    }

    /// The generations 0-3 codec, borrowing this factory's tables.
    pub fn legacy(&self) -> LegacyCodec<'_> {
        LegacyCodec::new(&self.store, &self.generation_rarities, &self.read_rarities)
    }

    /// The generation 4+ codec, borrowing this factory's tables.
    pub fn modern(&self) -> ModernCodec<'_> {
        ModernCodec::new(&self.store, &self.ranges)
    }

    /// Generates a new DNA string, picking the codec from the resolved
    /// schema generation. `version` may be a bare major or a full version;
    /// `None` targets the declared latest schema.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        archetype_index: &str,
        grade: Grade,
        version: Option<&str>,
        rarity_preset: Option<Rarity>,
    ) -> DnaResult<String> {
        if self.is_modern(version)? {
            self.modern()
                .encode(rng, archetype_index, grade, version, rarity_preset)
        } else {
            self.legacy()
                .encode(rng, archetype_index, grade, version, rarity_preset)
        }
    }

    /// Generates a starter DNA string with fixed stats and rarity.
    pub fn generate_starter(
        &self,
        archetype_index: &str,
        version: Option<&str>,
    ) -> DnaResult<String> {
        if self.is_modern(version)? {
            self.modern().encode_starter(archetype_index, version)
        } else {
            self.legacy().encode_starter(archetype_index, version)
        }
    }

    /// Decodes a DNA string of either generation family, dispatching on the
    /// version tag in the first four hex characters.
    pub fn parse(&self, dna: &str, forced_version: Option<&str>) -> DnaResult<ParsedDna> {
        let generation = match forced_version {
            Some(version) => major_of(&self.store.complete_version(Some(version))?)?,
            None => self.dna_generation(dna)? as u32,
        };
        if generation >= MODERN_GENERATION {
            self.modern().decode(dna, None).map(ParsedDna::Modern)
        } else {
            self.legacy()
                .decode(dna, forced_version)
                .map(ParsedDna::Legacy)
        }
    }

    /// The generation (major version) a DNA string's tag declares.
    pub fn dna_generation(&self, dna: &str) -> DnaResult<u64> {
        let mut cursor = DnaCursor::new(dna, Radix::Hex);
        parse_raw(cursor.read(VERSION_UNITS), Radix::Hex, VERSION_UNITS)
    }

    fn is_modern(&self, version: Option<&str>) -> DnaResult<bool> {
        let full = self.store.complete_version(version)?;
        Ok(major_of(&full)? >= MODERN_GENERATION)
    }
}

impl std::fmt::Debug for DnaFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnaFactory")
            .field("latest_version", &self.store.latest_version())
            .field("adventures_version", &self.ranges.latest_version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::stats::adventures::{AdvRangeTable, AdvStatRanges};

    const RARITY_BANDS: &str = r#"{
        "prime": {
            "Common":    { "probability": 40.5, "average_stats_range": [1.0, 19.0] },
            "Uncommon":  { "probability": 31.5, "average_stats_range": [20.0, 39.0] },
            "Rare":      { "probability": 20.0, "average_stats_range": [40.0, 59.0] },
            "Epic":      { "probability": 6.0,  "average_stats_range": [60.0, 79.0] },
            "Legendary": { "probability": 2.0,  "average_stats_range": [80.0, 100.0] }
        }
    }"#;

    const READ_BANDS: &str = r#"{
        "prime": {
            "Common":    { "average_stats_range": [0.0, 20.0] },
            "Uncommon":  { "average_stats_range": [20.0, 40.0] },
            "Rare":      { "average_stats_range": [40.0, 60.0] },
            "Epic":      { "average_stats_range": [60.0, 80.0] },
            "Legendary": { "average_stats_range": [80.0, 100.0] }
        }
    }"#;

    const SCHEMA_V3: &str = r#"{
        "version": "3.2.0",
        "global_genes_header": [
            { "name": "version", "base": 2 },
            { "name": "category", "base": 1 }
        ],
        "categories": {
            "0": {
                "name": "creatures",
                "category_genes_header": [
                    { "name": "archetype", "base": 1 },
                    { "name": "rarity", "base": 1 }
                ],
                "genes": [
                    { "name": "hp", "base": 1, "type": "range_completeness" },
                    { "name": "initiative", "base": 1, "type": "range_completeness" },
                    { "name": "atk", "base": 1, "type": "range_completeness" },
                    { "name": "def", "base": 1, "type": "range_completeness" },
                    { "name": "eatk", "base": 1, "type": "range_completeness" },
                    { "name": "edef", "base": 1, "type": "range_completeness" }
                ],
                "archetypes": {
                    "0": {
                        "fixed_attributes": { "name": "Crea_Emberfox", "family": "ember" },
                        "encoded_attributes": {
                            "hp": [500, 900],
                            "initiative": [10, 60],
                            "atk": [50, 250],
                            "def": [40, 200],
                            "eatk": [50, 250],
                            "edef": [40, 200]
                        }
                    }
                }
            }
        },
        "rarities": {
            "0": "Common", "1": "Uncommon", "2": "Rare", "3": "Epic", "4": "Legendary"
        }
    }"#;

    const SCHEMA_V4: &str = r#"{
        "version": "4.0.1",
        "archetypes": { "0": "Crea_Emberfox" },
        "rarities": {
            "prime": {
                "Common":    { "probability": 40.5, "average_stats_range": [1.0, 19.0] },
                "Uncommon":  { "probability": 31.5, "average_stats_range": [20.0, 39.0] },
                "Rare":      { "probability": 20.0, "average_stats_range": [40.0, 59.0] },
                "Epic":      { "probability": 6.0,  "average_stats_range": [60.0, 79.0] },
                "Legendary": { "probability": 2.0,  "average_stats_range": [80.0, 100.0] }
            },
            "standard": {
                "Common":    { "probability": 50.0, "average_stats_range": [1.0, 19.0] },
                "Uncommon":  { "probability": 30.0, "average_stats_range": [20.0, 39.0] },
                "Rare":      { "probability": 15.0, "average_stats_range": [40.0, 59.0] },
                "Epic":      { "probability": 4.0,  "average_stats_range": [60.0, 79.0] },
                "Legendary": { "probability": 1.0,  "average_stats_range": [80.0, 100.0] }
            }
        }
    }"#;

    fn factory() -> DnaFactory {
        let mut store = SchemaStore::new("4.0.1");
        store.register("3.2.0", SCHEMA_V3);
        store.register("4.0.1", SCHEMA_V4);
        let mut species = HashMap::new();
        species.insert(
            "Crea_Emberfox".to_string(),
            AdvStatRanges {
                hp_min: 640.0,
                hp_max: 960.0,
                speed_min: 20.0,
                speed_max: 80.0,
                power_min: 100.0,
                power_max: 300.0,
                defense_min: 50.0,
                defense_max: 250.0,
            },
        );
        let mut ranges = AdvRangeStore::new("1.6.1");
        ranges.register(AdvRangeTable {
            version: "1.6.1".to_string(),
            species,
        });
        DnaFactory::new(
            store,
            serde_json::from_str(RARITY_BANDS).unwrap(),
            serde_json::from_str(READ_BANDS).unwrap(),
            ranges,
        )
    }

    #[test]
    fn dispatches_on_requested_generation() {
        let factory = factory();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let legacy = factory
            .generate(&mut rng, "0", Grade::Prime, Some("3"), Some(Rarity::Rare))
            .unwrap();
        let modern = factory
            .generate(&mut rng, "0", Grade::Prime, None, Some(Rarity::Rare))
            .unwrap();
        assert_eq!(factory.dna_generation(&legacy).unwrap(), 3);
        assert_eq!(factory.dna_generation(&modern).unwrap(), 4);
        assert!(matches!(
            factory.parse(&legacy, None).unwrap(),
            ParsedDna::Legacy(_)
        ));
        assert!(matches!(
            factory.parse(&modern, None).unwrap(),
            ParsedDna::Modern(_)
        ));
    }

    #[test]
    fn parsed_accessors_agree_across_families() {
        let factory = factory();
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        for version in [Some("3"), Some("4")] {
            let dna = factory
                .generate(&mut rng, "0", Grade::Prime, version, Some(Rarity::Epic))
                .unwrap();
            let parsed = factory.parse(&dna, None).unwrap();
            assert_eq!(parsed.species_code(), "Crea_Emberfox");
            assert_eq!(parsed.rarity(), Rarity::Epic);
            assert_eq!(parsed.grade(), Grade::Prime);
        }
    }

    #[test]
    fn starter_dispatch_and_determinism() {
        let factory = factory();
        let legacy = factory.generate_starter("0", Some("3")).unwrap();
        let modern = factory.generate_starter("0", None).unwrap();
        let legacy_parsed = factory.parse(&legacy, None).unwrap();
        let modern_parsed = factory.parse(&modern, None).unwrap();
        assert_eq!(legacy_parsed.rarity(), Rarity::Uncommon);
        assert_eq!(modern_parsed.rarity(), Rarity::Uncommon);
        assert_eq!(modern_parsed.grade(), Grade::Standard);
        assert_eq!(modern_parsed.adventures().to_array(), [30, 30, 30, 30]);
    }

    #[test]
    fn forced_version_overrides_the_tag() {
        let factory = factory();
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let dna = factory
            .generate(&mut rng, "0", Grade::Prime, Some("3"), Some(Rarity::Rare))
            .unwrap();
        let parsed = factory.parse(&dna, Some("3.2.0")).unwrap();
        assert_eq!(parsed.version(), "3.2.0");
    }
}
