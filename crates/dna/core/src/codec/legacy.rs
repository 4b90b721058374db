//! Field-packed codec for schema generations 0-3.
//!
//! A legacy DNA string is a fixed 64-byte hex blob: version tag, category
//! selector, archetype selector, a rarity selector from generation 2 on,
//! the per-gene stat and index fields, and random padding out to the full
//! width. The schema resolved from the version tag fully determines the
//! layout; the codec itself holds no per-generation branches beyond the
//! rarity policy.

use std::collections::HashMap;

use rand::{Rng, RngCore, rngs::OsRng};
use tracing::debug;

use crate::codec::VERSION_UNITS;
use crate::cursor::{DnaCursor, Radix, parse_raw, to_padded_hex};
use crate::error::{DnaError, DnaResult};
use crate::rarity::{Grade, Rarity, RarityLookup, RarityTable};
use crate::schema::store::SchemaStore;
use crate::schema::{
    Category, EncodedAttribute, Gene, GeneKind, LegacySchema, category_key_from_name, find_gene,
    major_of,
};
use crate::stats::adventures::{AdvStats, TacticsStats, tactics_to_adventures};
use crate::stats::generator::generate_stats;

/// Total encoded width of a legacy DNA string, in logical units.
pub const DNA_BYTES: usize = 64;

/// The single category all creature archetypes live under.
pub const CATEGORY_CREATURES: &str = "creatures";

/// Completeness fraction a starter creature's stats are fixed at.
const STARTER_COMPLETENESS: f64 = 0.3;

/// Decoded trait data for a legacy DNA string.
#[derive(Clone, Debug)]
pub struct ParsedTraits {
    /// Full version of the schema the DNA was decoded against.
    pub version: String,
    /// Species code name, from the archetype's fixed attributes.
    pub species_code: String,
    /// Family name, if the archetype declares one.
    pub family: Option<String>,
    /// All fixed attributes of the selected archetype.
    pub fixed_attributes: HashMap<String, serde_json::Value>,
    /// Raw integer value of every gene, keyed by gene name.
    pub raw: HashMap<String, u64>,
    /// Mapped numeric values of range-completeness genes.
    pub stat_values: HashMap<String, i64>,
    /// Selected options of index genes.
    pub selections: HashMap<String, String>,
    /// Per-stat percentages (rounded completeness x 100).
    pub stats_percent: TacticsStats,
    pub grade: Grade,
    pub rarity: Rarity,
    /// Cross-game 4-stat percentages derived from `stats_percent`.
    pub adventures: AdvStats,
}

/// Encoder/decoder for generations 0-3, borrowing the shared schema store
/// and rarity tables.
pub struct LegacyCodec<'a> {
    store: &'a SchemaStore,
    /// Bands and weights used when generating new DNA.
    generation_rarities: &'a RarityTable,
    /// Bands used when re-deriving rarity from a decoded stat average.
    read_rarities: &'a RarityTable,
}

impl<'a> LegacyCodec<'a> {
    pub fn new(
        store: &'a SchemaStore,
        generation_rarities: &'a RarityTable,
        read_rarities: &'a RarityTable,
    ) -> Self {
        Self {
            store,
            generation_rarities,
            read_rarities,
        }
    }

    /// Decodes a DNA string against the schema its version tag resolves to,
    /// or against `forced_version` when given.
    pub fn decode(&self, dna: &str, forced_version: Option<&str>) -> DnaResult<ParsedTraits> {
        let mut cursor = DnaCursor::new(dna, Radix::Hex);
        let schema = self.schema_from_dna(&cursor, forced_version)?;
        let schema = schema.as_legacy()?;
        debug!(version = %schema.version, "decoding legacy dna");

        let mut raw: HashMap<String, u64> = HashMap::new();
        let mut global_header: HashMap<String, u64> = HashMap::new();
        for gene in &schema.global_genes_header {
            let value = parse_raw(cursor.read(gene.base as usize), Radix::Hex, gene.base as usize)?;
            global_header.insert(gene.name.clone(), value);
        }
        let category_key = global_header
            .get("category")
            .ok_or_else(|| DnaError::FieldSpecMissing {
                name: "category".to_string(),
            })?
            .to_string();
        let category =
            schema
                .categories
                .get(&category_key)
                .ok_or_else(|| DnaError::FieldSpecMissing {
                    name: format!("category `{category_key}`"),
                })?;

        let mut category_header: HashMap<String, u64> = HashMap::new();
        for gene in &category.category_genes_header {
            let value = parse_raw(cursor.read(gene.base as usize), Radix::Hex, gene.base as usize)?;
            category_header.insert(gene.name.clone(), value);
        }
        let archetype_key = category_header
            .get("archetype")
            .ok_or_else(|| DnaError::FieldSpecMissing {
                name: "archetype".to_string(),
            })?
            .to_string();
        let archetype =
            category
                .archetypes
                .get(&archetype_key)
                .ok_or_else(|| DnaError::InvalidArchetypeIndex {
                    index: archetype_key.clone(),
                    version: schema.version.clone(),
                })?;

        let mut stat_values: HashMap<String, i64> = HashMap::new();
        let mut selections: HashMap<String, String> = HashMap::new();
        let mut completeness: HashMap<String, f64> = HashMap::new();
        let mut stats_raw_sum = 0.0;
        let mut n_completeness = 0usize;
        for gene in &category.genes {
            let value = parse_raw(cursor.read(gene.base as usize), Radix::Hex, gene.base as usize)?;
            raw.insert(gene.name.clone(), value);
            let encoded = archetype.encoded_attributes.get(&gene.name).ok_or_else(|| {
                DnaError::GeneNotInArchetype {
                    gene: gene.name.clone(),
                    archetype: archetype_key.clone(),
                }
            })?;
            match (gene.kind, encoded) {
                (Some(GeneKind::RangeCompleteness), EncodedAttribute::Range([min, max])) => {
                    let fraction = value as f64 / gene.max_raw() as f64;
                    stats_raw_sum += fraction;
                    n_completeness += 1;
                    completeness.insert(gene.name.clone(), fraction);
                    stat_values.insert(
                        gene.name.clone(),
                        (fraction * (max - min) + min).round() as i64,
                    );
                }
                (Some(GeneKind::Index), EncodedAttribute::Options(options)) => {
                    if options.is_empty() {
                        return Err(DnaError::GeneNotInArchetype {
                            gene: gene.name.clone(),
                            archetype: archetype_key.clone(),
                        });
                    }
                    let selected = options[value as usize % options.len()].clone();
                    selections.insert(gene.name.clone(), selected);
                }
                (None, _) => {
                    return Err(DnaError::UnsupportedGeneKind {
                        kind: "unspecified".to_string(),
                    });
                }
                (Some(kind), _) => {
                    // Kind and encoded-attribute shape disagree.
                    return Err(DnaError::GeneNotInArchetype {
                        gene: format!("{} ({kind})", gene.name),
                        archetype: archetype_key.clone(),
                    });
                }
            }
        }

        let stats_percent = tactics_percentages(&completeness)?;
        let rarity = self.read_rarity(
            schema,
            category_header.get("rarity").copied(),
            stats_raw_sum,
            n_completeness,
        )?;
        let species_code = archetype
            .species_code()
            .ok_or_else(|| DnaError::FieldSpecMissing {
                name: format!("archetype `{archetype_key}` name"),
            })?
            .to_string();

        Ok(ParsedTraits {
            version: schema.version.clone(),
            species_code,
            family: archetype.family().map(str::to_string),
            fixed_attributes: archetype.fixed_attributes.clone(),
            raw,
            stat_values,
            selections,
            stats_percent,
            // Grade was not encoded before generation 4.
            grade: Grade::Prime,
            rarity,
            adventures: tactics_to_adventures(&stats_percent),
        })
    }

    /// Encodes a new DNA string for the archetype at `archetype_index`.
    ///
    /// Rarity is `rarity_preset` or a weighted draw; stats come from the
    /// constrained generator targeting that rarity's band. Generations 0-1
    /// carry neither rarity nor generated stats, only random payload.
    pub fn encode<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        archetype_index: &str,
        grade: Grade,
        version: Option<&str>,
        rarity_preset: Option<Rarity>,
    ) -> DnaResult<String> {
        let schema = self.store.resolve(version)?;
        let schema = schema.as_legacy()?;
        let (category_key, category) = self.category(schema, archetype_index)?;
        debug!(version = %schema.version, archetype = archetype_index, "encoding legacy dna");

        if major_of(&schema.version)? <= 1 {
            return self.encode_unranked(schema, &category_key, category, archetype_index);
        }

        let rarity = match rarity_preset {
            Some(rarity) => rarity,
            None => self.generation_rarities.draw(rng, grade)?,
        };
        let band = self
            .generation_rarities
            .info(grade, rarity)?
            .average_stats_range;
        let stat_genes: Vec<&Gene> = category
            .genes
            .iter()
            .filter(|g| g.kind == Some(GeneKind::RangeCompleteness))
            .collect();
        let maxes: Vec<i64> = stat_genes.iter().map(|g| g.max_raw() as i64).collect();
        let raw = generate_stats(rng, &maxes, band, None)?;
        self.assemble(schema, &category_key, category, archetype_index, rarity, {
            let mut packed = String::new();
            for (value, gene) in raw.iter().zip(&stat_genes) {
                let clamped = (*value).clamp(0, gene.max_raw() as i64) as u64;
                packed.push_str(&to_padded_hex(clamped, gene.base as usize));
            }
            packed
        })
    }

    /// Encodes a starter creature: rarity Uncommon, every stat fixed at 30%
    /// of its gene width, zero variance across calls.
    pub fn encode_starter(&self, archetype_index: &str, version: Option<&str>) -> DnaResult<String> {
        let schema = self.store.resolve(version)?;
        let schema = schema.as_legacy()?;
        let (category_key, category) = self.category(schema, archetype_index)?;

        let mut packed = String::new();
        for gene in &category.genes {
            if gene.kind != Some(GeneKind::RangeCompleteness) {
                continue;
            }
            let value = (gene.max_raw() as f64 * STARTER_COMPLETENESS).floor() as u64;
            packed.push_str(&to_padded_hex(value, gene.base as usize));
        }
        self.assemble(
            schema,
            &category_key,
            category,
            archetype_index,
            Rarity::Uncommon,
            packed,
        )
    }

    /// Reads the major version out of a DNA string without a full decode.
    pub fn dna_version(&self, dna: &str) -> DnaResult<u64> {
        let mut cursor = DnaCursor::new(dna, Radix::Hex);
        parse_raw(cursor.read(VERSION_UNITS), Radix::Hex, VERSION_UNITS)
    }

    fn schema_from_dna(
        &self,
        cursor: &DnaCursor<'_>,
        forced_version: Option<&str>,
    ) -> DnaResult<std::sync::Arc<crate::schema::Schema>> {
        match forced_version {
            Some(version) => self.store.resolve(Some(version)),
            None => {
                // Peek the tag with a clone so the caller's cursor stays at 0.
                let mut peek = cursor.clone();
                let major = parse_raw(peek.read(VERSION_UNITS), Radix::Hex, VERSION_UNITS)?;
                self.store.resolve(Some(&major.to_string()))
            }
        }
    }

    fn category<'s>(
        &self,
        schema: &'s LegacySchema,
        archetype_index: &str,
    ) -> DnaResult<(String, &'s Category)> {
        if archetype_index.parse::<u64>().is_err() {
            return Err(DnaError::InvalidArchetypeIndex {
                index: archetype_index.to_string(),
                version: schema.version.clone(),
            });
        }
        let key = category_key_from_name(CATEGORY_CREATURES, &schema.categories)?.to_string();
        let category = &schema.categories[&key];
        if !category.archetypes.contains_key(archetype_index) {
            return Err(DnaError::InvalidArchetypeIndex {
                index: archetype_index.to_string(),
                version: schema.version.clone(),
            });
        }
        Ok((key, category))
    }

    /// Writes header fields, overlays `packed_stats` onto the front of the
    /// random padding, and pads out to the fixed DNA width.
    fn assemble(
        &self,
        schema: &LegacySchema,
        category_key: &str,
        category: &Category,
        archetype_index: &str,
        rarity: Rarity,
        packed_stats: String,
    ) -> DnaResult<String> {
        let version_gene = find_gene(&schema.global_genes_header, "version")?;
        let category_gene = find_gene(&schema.global_genes_header, "category")?;
        let archetype_gene = find_gene(&category.category_genes_header, "archetype")?;
        let rarity_gene = find_gene(&category.category_genes_header, "rarity")?;
        let rarity_index = rarity_index(schema, rarity)?;

        let mut dna = String::new();
        dna.push_str(&to_padded_hex(
            major_of(&schema.version)? as u64,
            version_gene.base as usize,
        ));
        dna.push_str(&to_padded_hex(
            parse_key(category_key)?,
            category_gene.base as usize,
        ));
        dna.push_str(&to_padded_hex(
            parse_key(archetype_index)?,
            archetype_gene.base as usize,
        ));
        dna.push_str(&to_padded_hex(rarity_index, rarity_gene.base as usize));

        let header_units = (version_gene.base
            + category_gene.base
            + archetype_gene.base
            + rarity_gene.base) as usize;
        let padding = random_padding(DNA_BYTES - header_units);
        dna.push_str(&packed_stats);
        dna.push_str(padding.get(packed_stats.len()..).unwrap_or(""));
        Ok(dna)
    }

    /// Generation 0-1 layout: version, category, archetype, padding. No
    /// rarity field and no generated stats.
    fn encode_unranked(
        &self,
        schema: &LegacySchema,
        category_key: &str,
        category: &Category,
        archetype_index: &str,
    ) -> DnaResult<String> {
        let version_gene = find_gene(&schema.global_genes_header, "version")?;
        let category_gene = find_gene(&schema.global_genes_header, "category")?;
        let archetype_gene = find_gene(&category.category_genes_header, "archetype")?;

        let mut dna = String::new();
        dna.push_str(&to_padded_hex(
            major_of(&schema.version)? as u64,
            version_gene.base as usize,
        ));
        dna.push_str(&to_padded_hex(
            parse_key(category_key)?,
            category_gene.base as usize,
        ));
        dna.push_str(&to_padded_hex(
            parse_key(archetype_index)?,
            archetype_gene.base as usize,
        ));
        let header_units = (version_gene.base + category_gene.base + archetype_gene.base) as usize;
        dna.push_str(&random_padding(DNA_BYTES - header_units));
        Ok(dna)
    }

    /// Rarity policy per generation: 0-1 have no rarity field and derive
    /// from the stat average; generation 2 reads the field but discards it
    /// and re-derives anyway (historical wire behavior, kept as-is);
    /// generation 3 trusts the field via the schema's rarity enumeration.
    fn read_rarity(
        &self,
        schema: &LegacySchema,
        rarity_field: Option<u64>,
        stats_raw_sum: f64,
        n_completeness: usize,
    ) -> DnaResult<Rarity> {
        if major_of(&schema.version)? == 3
            && let Some(index) = rarity_field
        {
            let rarities = schema
                .rarities
                .as_ref()
                .ok_or_else(|| DnaError::FieldSpecMissing {
                    name: "rarities".to_string(),
                })?;
            let name =
                rarities
                    .get(&index.to_string())
                    .ok_or_else(|| DnaError::SchemaParse {
                        reason: format!("rarity index {index} is not enumerated"),
                    })?;
            return name.parse().map_err(|_| DnaError::SchemaParse {
                reason: format!("unknown rarity name `{name}`"),
            });
        }
        if n_completeness == 0 {
            return Err(DnaError::FieldSpecMissing {
                name: "range_completeness genes".to_string(),
            });
        }
        let average = stats_raw_sum * 100.0 / n_completeness as f64;
        self.read_rarities
            .rarity_for_average(average, Grade::Prime, RarityLookup::Strict)?
            .ok_or(DnaError::RarityNotFound { average })
    }
}

/// Collects the six named stat percentages out of the completeness map.
fn tactics_percentages(completeness: &HashMap<String, f64>) -> DnaResult<TacticsStats> {
    let percent = |name: &str| -> DnaResult<i64> {
        completeness
            .get(name)
            .map(|fraction| (fraction * 100.0).round() as i64)
            .ok_or_else(|| DnaError::FieldSpecMissing {
                name: name.to_string(),
            })
    };
    Ok(TacticsStats {
        hp: percent("hp")?,
        initiative: percent("initiative")?,
        atk: percent("atk")?,
        def: percent("def")?,
        eatk: percent("eatk")?,
        edef: percent("edef")?,
    })
}

fn rarity_index(schema: &LegacySchema, rarity: Rarity) -> DnaResult<u64> {
    let rarities = schema
        .rarities
        .as_ref()
        .ok_or_else(|| DnaError::FieldSpecMissing {
            name: "rarities".to_string(),
        })?;
    let name = rarity.to_string();
    rarities
        .iter()
        .find(|(_, v)| **v == name)
        .map(|(k, _)| parse_key(k))
        .transpose()?
        .ok_or(DnaError::SchemaParse {
            reason: format!("schema enumerates no index for rarity `{name}`"),
        })
}

fn parse_key(key: &str) -> DnaResult<u64> {
    key.parse().map_err(|_| DnaError::SchemaParse {
        reason: format!("`{key}` is not a numeric index"),
    })
}

/// Cryptographically sourced hex padding. The padding carries no decoded
/// meaning; it reserves width for future genes.
fn random_padding(units: usize) -> String {
    let mut bytes = vec![0u8; units];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

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
                    { "name": "edef", "base": 1, "type": "range_completeness" },
                    { "name": "element", "base": 1, "type": "index" }
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
                            "edef": [40, 200],
                            "element": ["fire", "ash", "smoke"]
                        }
                    }
                }
            }
        },
        "rarities": {
            "0": "Common",
            "1": "Uncommon",
            "2": "Rare",
            "3": "Epic",
            "4": "Legendary"
        }
    }"#;

    fn tables() -> (RarityTable, RarityTable) {
        let generation = r#"{
            "prime": {
                "Common":    { "probability": 40.5, "average_stats_range": [1.0, 19.0] },
                "Uncommon":  { "probability": 31.5, "average_stats_range": [20.0, 39.0] },
                "Rare":      { "probability": 20.0, "average_stats_range": [40.0, 59.0] },
                "Epic":      { "probability": 6.0,  "average_stats_range": [60.0, 79.0] },
                "Legendary": { "probability": 2.0,  "average_stats_range": [80.0, 100.0] }
            }
        }"#;
        let read = r#"{
            "prime": {
                "Common":    { "average_stats_range": [0.0, 20.0] },
                "Uncommon":  { "average_stats_range": [20.0, 40.0] },
                "Rare":      { "average_stats_range": [40.0, 60.0] },
                "Epic":      { "average_stats_range": [60.0, 80.0] },
                "Legendary": { "average_stats_range": [80.0, 100.0] }
            }
        }"#;
        (
            serde_json::from_str(generation).unwrap(),
            serde_json::from_str(read).unwrap(),
        )
    }

    fn store() -> SchemaStore {
        let mut store = SchemaStore::new("3.2.0");
        store.register("3.2.0", SCHEMA_V3);
        store
    }

    #[test]
    fn encode_decode_round_trip_preserves_identity() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for rarity in Rarity::ORDERED {
            let dna = codec
                .encode(&mut rng, "0", Grade::Prime, Some("3"), Some(rarity))
                .unwrap();
            assert_eq!(dna.len(), DNA_BYTES * 2);
            let parsed = codec.decode(&dna, None).unwrap();
            assert_eq!(parsed.species_code, "Crea_Emberfox");
            assert_eq!(parsed.grade, Grade::Prime);
            assert_eq!(parsed.rarity, rarity, "rarity lost in round trip");
            assert_eq!(parsed.version, "3.2.0");
        }
    }

    #[test]
    fn decoded_average_stays_in_requested_band() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..50 {
            let dna = codec
                .encode(&mut rng, "0", Grade::Prime, None, Some(Rarity::Rare))
                .unwrap();
            let parsed = codec.decode(&dna, None).unwrap();
            let average = parsed.stats_percent.floor_average();
            assert!((40..60).contains(&average), "average {average} not Rare");
        }
    }

    #[test]
    fn starter_stats_are_fixed() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let first = codec.encode_starter("0", None).unwrap();
        let second = codec.encode_starter("0", None).unwrap();
        for dna in [first, second] {
            let parsed = codec.decode(&dna, None).unwrap();
            assert_eq!(parsed.rarity, Rarity::Uncommon);
            for stat in ["hp", "initiative", "atk", "def", "eatk", "edef"] {
                assert_eq!(parsed.raw[stat], 76, "stat {stat} not fixed");
            }
        }
    }

    #[test]
    fn index_gene_selects_by_modulo() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let dna = codec
            .encode(&mut rng, "0", Grade::Prime, None, Some(Rarity::Common))
            .unwrap();
        let parsed = codec.decode(&dna, None).unwrap();
        let element = &parsed.selections["element"];
        assert!(["fire", "ash", "smoke"].contains(&element.as_str()));
        assert_eq!(
            element,
            &["fire", "ash", "smoke"][parsed.raw["element"] as usize % 3]
        );
    }

    #[test]
    fn unknown_archetype_is_rejected() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        assert!(matches!(
            codec.encode(&mut rng, "9", Grade::Prime, None, None),
            Err(DnaError::InvalidArchetypeIndex { .. })
        ));
        assert!(matches!(
            codec.encode(&mut rng, "fox", Grade::Prime, None, None),
            Err(DnaError::InvalidArchetypeIndex { .. })
        ));
    }

    #[test]
    fn truncated_dna_fails_loudly() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        assert!(matches!(
            codec.decode("000300", None),
            Err(DnaError::TruncatedDna { .. })
        ));
    }

    #[test]
    fn adventures_stats_match_tactics_average() {
        let store = store();
        let (generation, read) = tables();
        let codec = LegacyCodec::new(&store, &generation, &read);
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let dna = codec
            .encode(&mut rng, "0", Grade::Prime, None, Some(Rarity::Epic))
            .unwrap();
        let parsed = codec.decode(&dna, None).unwrap();
        assert_eq!(
            parsed.adventures.floor_average(),
            parsed.stats_percent.floor_average()
        );
    }
}
