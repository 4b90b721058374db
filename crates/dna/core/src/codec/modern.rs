//! Whole-object codec for schema generation 4+.
//!
//! A modern DNA string is a four-hex-character version tag followed by a
//! base64 text encoding of a zstd-compressed JSON payload. Nothing is
//! field-packed; decode inflates the payload in one step and then computes
//! the absolute per-species stat values from the adventures range tables.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::Rng;
use tracing::debug;

use crate::codec::VERSION_UNITS;
use crate::codec::legacy::ParsedTraits;
use crate::cursor::to_padded_hex;
use crate::error::{DnaError, DnaResult};
use crate::rarity::{Grade, Rarity};
use crate::schema::major_of;
use crate::schema::store::SchemaStore;
use crate::stats::adventures::{AdvRangeStore, AdvStats, AdvStatsComputed, compute_absolute};
use crate::stats::generator::generate_stats;

/// Number of adventures stats carried by the payload.
const N_STATS: usize = 4;

/// Percentage every starter stat is fixed at.
const STARTER_PERCENT: i64 = 30;

/// The compressed JSON document behind the version tag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModernPayload {
    /// Full schema version the payload was written under.
    pub version: String,
    pub grade: Grade,
    pub rarity: Rarity,
    pub species_code: String,
    /// Adventures 4-stat percentages.
    pub stats: AdvStats,
}

/// Decoded trait data for a modern DNA string.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedModern {
    pub version: String,
    pub grade: Grade,
    pub rarity: Rarity,
    pub species_code: String,
    /// Adventures stat percentages, straight from the payload.
    pub stats: AdvStats,
    /// Absolute stat values interpolated into the species' ranges.
    pub computed: AdvStatsComputed,
}

/// Encoder/decoder for generation 4+, borrowing the shared schema store and
/// the per-species adventures range tables.
pub struct ModernCodec<'a> {
    store: &'a SchemaStore,
    ranges: &'a AdvRangeStore,
}

impl<'a> ModernCodec<'a> {
    pub fn new(store: &'a SchemaStore, ranges: &'a AdvRangeStore) -> Self {
        Self { store, ranges }
    }

    /// Decodes a DNA string and eagerly computes absolute stats from the
    /// adventures range tables. `adventures_version` may pin a table
    /// version (bare major or full); `None` uses the latest.
    pub fn decode(&self, dna: &str, adventures_version: Option<&str>) -> DnaResult<ParsedModern> {
        let payload = self.payload(dna)?;
        debug!(version = %payload.version, species = %payload.species_code, "decoded modern dna");
        let ranges = self
            .ranges
            .resolve(adventures_version)?
            .ranges(&payload.species_code)?;
        let computed = compute_absolute(&payload.stats, ranges);
        Ok(ParsedModern {
            version: payload.version,
            grade: payload.grade,
            rarity: payload.rarity,
            species_code: payload.species_code,
            stats: payload.stats,
            computed,
        })
    }

    /// Deserializes the payload without touching the range tables.
    pub fn payload(&self, dna: &str) -> DnaResult<ModernPayload> {
        let tag_chars = VERSION_UNITS * 2;
        if dna.len() < tag_chars {
            return Err(DnaError::TruncatedDna {
                expected: tag_chars,
                found: dna.len(),
            });
        }
        deserialize(&dna[tag_chars..])
    }

    /// Encodes a new DNA string for the archetype at `archetype_index`,
    /// drawing rarity and stats against the schema's own rarity table.
    pub fn encode<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        archetype_index: &str,
        grade: Grade,
        version: Option<&str>,
        rarity_preset: Option<Rarity>,
    ) -> DnaResult<String> {
        let schema = self.store.resolve(version)?;
        let schema = schema.as_modern()?;
        let species_code = species_for_index(schema, archetype_index)?;
        debug!(version = %schema.version, species = %species_code, "encoding modern dna");

        let rarity = match rarity_preset {
            Some(rarity) => rarity,
            None => schema.rarities.draw(rng, grade)?,
        };
        let band = schema.rarities.info(grade, rarity)?.average_stats_range;
        let raw = generate_stats(rng, &[100; N_STATS], band, None)?;
        let stats = AdvStats {
            hp: raw[0],
            speed: raw[1],
            power: raw[2],
            defense: raw[3],
        };
        build_dna(&ModernPayload {
            version: schema.version.clone(),
            grade,
            rarity,
            species_code,
            stats,
        })
    }

    /// Encodes a starter creature: grade standard, rarity Uncommon, every
    /// stat fixed at 30 percent.
    pub fn encode_starter(&self, archetype_index: &str, version: Option<&str>) -> DnaResult<String> {
        let schema = self.store.resolve(version)?;
        let schema = schema.as_modern()?;
        let species_code = species_for_index(schema, archetype_index)?;
        build_dna(&ModernPayload {
            version: schema.version.clone(),
            grade: Grade::Standard,
            rarity: Rarity::Uncommon,
            species_code,
            stats: AdvStats {
                hp: STARTER_PERCENT,
                speed: STARTER_PERCENT,
                power: STARTER_PERCENT,
                defense: STARTER_PERCENT,
            },
        })
    }

    /// Rebuilds an existing modern DNA under a (possibly newer) schema
    /// version, optionally replacing the stats. Species, grade, and rarity
    /// are preserved.
    pub fn reencode(
        &self,
        dna: &str,
        new_stats: Option<AdvStats>,
        new_version: Option<&str>,
    ) -> DnaResult<String> {
        let existing = self.payload(dna)?;
        let schema = self.store.resolve(new_version)?;
        let schema = schema.as_modern()?;
        build_dna(&ModernPayload {
            version: schema.version.clone(),
            grade: existing.grade,
            rarity: existing.rarity,
            species_code: existing.species_code,
            stats: new_stats.unwrap_or(existing.stats),
        })
    }

    /// Promotes a decoded legacy creature into the modern format. The
    /// legacy 6-stat percentages have already been mapped to the 4-stat
    /// adventures shape during decode.
    pub fn promote_legacy(
        &self,
        traits: &ParsedTraits,
        new_stats: Option<AdvStats>,
        new_version: Option<&str>,
    ) -> DnaResult<String> {
        let schema = self.store.resolve(new_version)?;
        let schema = schema.as_modern()?;
        build_dna(&ModernPayload {
            version: schema.version.clone(),
            grade: traits.grade,
            rarity: traits.rarity,
            species_code: traits.species_code.clone(),
            stats: new_stats.unwrap_or(traits.adventures),
        })
    }
}

fn species_for_index(
    schema: &crate::schema::ModernSchema,
    archetype_index: &str,
) -> DnaResult<String> {
    if archetype_index.parse::<u64>().is_err() {
        return Err(DnaError::InvalidArchetypeIndex {
            index: archetype_index.to_string(),
            version: schema.version.clone(),
        });
    }
    schema
        .archetypes
        .get(archetype_index)
        .cloned()
        .ok_or_else(|| DnaError::InvalidArchetypeIndex {
            index: archetype_index.to_string(),
            version: schema.version.clone(),
        })
}

fn build_dna(payload: &ModernPayload) -> DnaResult<String> {
    let tag = to_padded_hex(major_of(&payload.version)? as u64, VERSION_UNITS);
    Ok(format!("{tag}{}", serialize(payload)?))
}

fn serialize(payload: &ModernPayload) -> DnaResult<String> {
    let json = serde_json::to_vec(payload).map_err(|e| DnaError::PayloadCorrupt {
        reason: format!("serialize: {e}"),
    })?;
    let compressed =
        zstd::stream::encode_all(json.as_slice(), 0).map_err(|e| DnaError::PayloadCorrupt {
            reason: format!("compress: {e}"),
        })?;
    Ok(BASE64.encode(compressed))
}

fn deserialize(payload: &str) -> DnaResult<ModernPayload> {
    let compressed = BASE64
        .decode(payload)
        .map_err(|e| DnaError::PayloadCorrupt {
            reason: format!("base64: {e}"),
        })?;
    let json =
        zstd::stream::decode_all(compressed.as_slice()).map_err(|e| DnaError::PayloadCorrupt {
            reason: format!("decompress: {e}"),
        })?;
    serde_json::from_slice(&json).map_err(|e| DnaError::PayloadCorrupt {
        reason: format!("json: {e}"),
    })
}
