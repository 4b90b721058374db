//! DNA string codecs.
//!
//! Two wire formats coexist: generations 0-3 pack schema-declared fields
//! into fixed-width hex slices ([`legacy`]), generation 4+ serializes the
//! whole trait object as compressed JSON behind a short hex version tag
//! ([`modern`]). Both start with a version tag in the first four hex
//! characters, which is how [`crate::factory::DnaFactory`] dispatches.

pub mod legacy;
pub mod modern;

pub use legacy::{LegacyCodec, ParsedTraits};
pub use modern::{ModernCodec, ModernPayload, ParsedModern};

/// Width of the version tag, in logical units (two hex characters each).
pub const VERSION_UNITS: usize = 2;
