//! Schema document model.
//!
//! A schema describes one encoding generation of the DNA wire format.
//! Generations 0-3 ("legacy") declare bit-packed field layouts per category;
//! generation 4+ ("modern") declares only an archetype table and rarity
//! bands, because the payload is a whole-object serialization.
//!
//! Documents are immutable once parsed and are shared behind `Arc` by the
//! [`store::SchemaStore`].

pub mod store;

use std::collections::HashMap;

use crate::error::{DnaError, DnaResult};
use crate::rarity::RarityTable;

/// First generation using the whole-object compressed payload.
pub const MODERN_GENERATION: u32 = 4;

/// How a gene's raw integer is interpreted.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeneKind {
    /// Selects one of an enumerated list by `raw mod enum_len`.
    Index,
    /// Normalizes `raw / (2^(base*8) - 1)` into `[0, 1]`, then maps
    /// linearly into the archetype-declared `[min, max]`.
    RangeCompleteness,
}

/// One field within the encoded payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gene {
    pub name: String,
    /// Width in logical units (bytes).
    pub base: u32,
    /// Interpretation; header genes (version/category/archetype/rarity)
    /// carry none.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<GeneKind>,
}

impl Gene {
    /// Maximum raw value this gene's width can store.
    pub fn max_raw(&self) -> u64 {
        (1u64 << (self.base as u64 * 8)) - 1
    }
}

/// Per-archetype encoding of one gene: either a numeric range (for
/// range-completeness genes) or an enumerated option list (for index genes).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum EncodedAttribute {
    Range([f64; 2]),
    Options(Vec<String>),
}

/// Fixed attributes plus per-gene encodings for one creature species.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Archetype {
    pub fixed_attributes: HashMap<String, serde_json::Value>,
    pub encoded_attributes: HashMap<String, EncodedAttribute>,
}

impl Archetype {
    /// The species code name, from the `name` fixed attribute.
    pub fn species_code(&self) -> Option<&str> {
        self.fixed_attributes.get("name").and_then(|v| v.as_str())
    }

    /// The family name, if declared.
    pub fn family(&self) -> Option<&str> {
        self.fixed_attributes.get("family").and_then(|v| v.as_str())
    }
}

/// One category of creatures within a legacy schema.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Category {
    pub name: String,
    pub category_genes_header: Vec<Gene>,
    pub genes: Vec<Gene>,
    pub archetypes: HashMap<String, Archetype>,
}

/// Field-packed schema for generations 0-3.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LegacySchema {
    pub version: String,
    #[serde(default)]
    pub version_date: String,
    pub global_genes_header: Vec<Gene>,
    pub categories: HashMap<String, Category>,
    /// Rarity enumeration (index key to tier name); present from
    /// generation 2 on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarities: Option<HashMap<String, String>>,
}

/// Whole-object schema for generation 4+.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModernSchema {
    pub version: String,
    #[serde(default)]
    pub version_date: String,
    /// Archetype table: index key to species code name.
    pub archetypes: HashMap<String, String>,
    /// Rarity bands and draw weights per grade.
    pub rarities: RarityTable,
}

/// A parsed schema document of either generation family.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    Legacy(LegacySchema),
    Modern(ModernSchema),
}

impl Schema {
    /// Parses a document registered under `version_key`, picking the
    /// generation family from the key's major component and validating the
    /// document's own `version` field against the key.
    pub fn from_json(version_key: &str, json: &str) -> DnaResult<Self> {
        let schema = if major_of(version_key)? >= MODERN_GENERATION {
            serde_json::from_str::<ModernSchema>(json)
                .map(Schema::Modern)
                .map_err(|e| DnaError::SchemaParse {
                    reason: e.to_string(),
                })?
        } else {
            serde_json::from_str::<LegacySchema>(json)
                .map(Schema::Legacy)
                .map_err(|e| DnaError::SchemaParse {
                    reason: e.to_string(),
                })?
        };
        if schema.version() != version_key {
            return Err(DnaError::VersionMismatch {
                requested: version_key.to_string(),
                declared: schema.version().to_string(),
            });
        }
        Ok(schema)
    }

    /// The document's declared full version.
    pub fn version(&self) -> &str {
        match self {
            Self::Legacy(s) => &s.version,
            Self::Modern(s) => &s.version,
        }
    }

    /// The encoding generation (the version's major component).
    pub fn generation(&self) -> u32 {
        major_of(self.version()).unwrap_or(0)
    }

    pub fn as_legacy(&self) -> DnaResult<&LegacySchema> {
        match self {
            Self::Legacy(s) => Ok(s),
            Self::Modern(s) => Err(DnaError::SchemaParse {
                reason: format!("version {} is not a legacy schema", s.version),
            }),
        }
    }

    pub fn as_modern(&self) -> DnaResult<&ModernSchema> {
        match self {
            Self::Modern(s) => Ok(s),
            Self::Legacy(s) => Err(DnaError::SchemaParse {
                reason: format!("version {} is not a modern schema", s.version),
            }),
        }
    }
}

/// Extracts the numeric major component of a version string
/// (`"3.2.0"` -> 3, `"3"` -> 3).
pub fn major_of(version: &str) -> DnaResult<u32> {
    let major = version.split('.').next().unwrap_or(version);
    major.parse().map_err(|_| DnaError::SchemaNotFound {
        version: version.to_string(),
    })
}

/// Finds a named field spec in a gene header.
pub fn find_gene<'a>(genes: &'a [Gene], name: &str) -> DnaResult<&'a Gene> {
    genes
        .iter()
        .find(|g| g.name == name)
        .ok_or_else(|| DnaError::FieldSpecMissing {
            name: name.to_string(),
        })
}

/// Finds the category key whose declared name matches `name`.
pub fn category_key_from_name<'a>(
    name: &str,
    categories: &'a HashMap<String, Category>,
) -> DnaResult<&'a str> {
    categories
        .iter()
        .find(|(_, c)| c.name == name)
        .map(|(k, _)| k.as_str())
        .ok_or_else(|| DnaError::FieldSpecMissing {
            name: format!("category `{name}`"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gene_max_raw_by_width() {
        let gene = Gene {
            name: "hp".into(),
            base: 1,
            kind: Some(GeneKind::RangeCompleteness),
        };
        assert_eq!(gene.max_raw(), 255);
        let wide = Gene {
            name: "hp".into(),
            base: 2,
            kind: Some(GeneKind::RangeCompleteness),
        };
        assert_eq!(wide.max_raw(), 65535);
    }

    #[test]
    fn encoded_attribute_untagged_shapes() {
        let range: EncodedAttribute = serde_json::from_str("[640, 960]").unwrap();
        assert_eq!(range, EncodedAttribute::Range([640.0, 960.0]));
        let options: EncodedAttribute = serde_json::from_str(r#"["fire", "ash"]"#).unwrap();
        assert_eq!(
            options,
            EncodedAttribute::Options(vec!["fire".into(), "ash".into()])
        );
    }

    #[test]
    fn major_component_parsing() {
        assert_eq!(major_of("0.2.0").unwrap(), 0);
        assert_eq!(major_of("3.2.0").unwrap(), 3);
        assert_eq!(major_of("4").unwrap(), 4);
        assert!(major_of("latest").is_err());
    }

    #[test]
    fn version_mismatch_is_fatal() {
        let doc = r#"{
            "version": "0.3.0",
            "global_genes_header": [],
            "categories": {}
        }"#;
        let err = Schema::from_json("0.2.0", doc).unwrap_err();
        assert_eq!(
            err,
            DnaError::VersionMismatch {
                requested: "0.2.0".into(),
                declared: "0.3.0".into()
            }
        );
    }
}
