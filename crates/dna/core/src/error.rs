//! Error taxonomy for DNA encode/decode/generate operations.
//!
//! Every fallible operation in this crate returns [`DnaResult`]. Errors are
//! propagated immediately to the caller; there is no partial-result mode,
//! a decode/encode/generate call either fully succeeds or fails atomically.

/// Convenience alias used throughout the crate.
pub type DnaResult<T> = Result<T, DnaError>;

/// Errors produced while resolving schemas, decoding or encoding DNA strings,
/// or generating stat vectors.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DnaError {
    /// No schema document is registered for the requested version or major.
    #[error("no schema found for version `{version}`")]
    SchemaNotFound {
        /// The version (exact or bare major) that failed to resolve.
        version: String,
    },

    /// A loaded document declares a different version than the key it was
    /// registered under.
    #[error("version mismatch: requested `{requested}` but document declares `{declared}`")]
    VersionMismatch {
        /// The version the caller asked for.
        requested: String,
        /// The version the document itself declares.
        declared: String,
    },

    /// A schema document could not be parsed or is internally inconsistent.
    #[error("malformed schema document: {reason}")]
    SchemaParse {
        /// Human-readable description of the defect.
        reason: String,
    },

    /// The schema lacks a required global or category field spec
    /// (`version`, `category`, `archetype`, `rarity`, or a named stat gene).
    #[error("schema is missing required field spec `{name}`")]
    FieldSpecMissing {
        /// Name of the missing field spec.
        name: String,
    },

    /// A gene declared on the category has no encoded range or enumeration
    /// in the selected archetype.
    #[error("gene `{gene}` has no encoded attribute in archetype `{archetype}`")]
    GeneNotInArchetype {
        /// Name of the gene.
        gene: String,
        /// Index key of the archetype.
        archetype: String,
    },

    /// A gene declares a kind this codec does not understand.
    #[error("gene kind `{kind}` is not supported")]
    UnsupportedGeneKind {
        /// The offending kind, or `unspecified` when absent.
        kind: String,
    },

    /// The encoding radix is neither 16 nor 64.
    #[error("encoding radix {radix} is not supported (try 16 or 64)")]
    UnsupportedRadix {
        /// The rejected radix.
        radix: u32,
    },

    /// No rarity band contains the given stat average (strict lookup only).
    #[error("no rarity band contains stat average {average}")]
    RarityNotFound {
        /// The average that matched no band.
        average: f64,
    },

    /// No rarity table exists for the requested grade.
    #[error("no rarity table for grade `{grade}`")]
    GradeNotFound {
        /// The requested grade.
        grade: String,
    },

    /// The archetype index is not an integer or is absent from the schema.
    #[error("invalid archetype index `{index}` for schema version `{version}`")]
    InvalidArchetypeIndex {
        /// The rejected index.
        index: String,
        /// The schema version it was checked against.
        version: String,
    },

    /// The DNA string is shorter than the schema's declared field layout.
    #[error("DNA string truncated: needed {expected} characters, found {found}")]
    TruncatedDna {
        /// Characters the layout requires up to the failing field.
        expected: usize,
        /// Characters actually present.
        found: usize,
    },

    /// The modern payload failed base64 decoding, decompression, or JSON
    /// deserialization.
    #[error("modern payload corrupt: {reason}")]
    PayloadCorrupt {
        /// Which decoding stage failed and why.
        reason: String,
    },

    /// No absolute stat ranges are known for the given species code.
    #[error("no stat ranges for species `{species}`")]
    SpeciesRangesMissing {
        /// The species code that has no range entry.
        species: String,
    },

    /// The constrained stat distribution exceeded its iteration cap.
    #[error(
        "stat generation did not converge after {rounds} rounds \
         (target mean {mean}, {n_stats} stats)"
    )]
    GenerationDidNotConverge {
        /// Distribution rounds performed before giving up.
        rounds: u32,
        /// The target floored average.
        mean: i64,
        /// Number of stats being generated.
        n_stats: usize,
    },
}
