//! Sequential fixed-width field reader over an encoded DNA string.

use crate::error::{DnaError, DnaResult};

/// Character encoding of a DNA string.
///
/// The radix implies how many characters one logical unit (one byte of
/// payload) occupies: hex stores a byte in 2 characters, the base64-like
/// mode in 8. Base64 is only ever used for raw random padding; packed
/// fields are always hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    /// Hexadecimal, 2 characters per unit.
    Hex,
    /// Base64-like, 8 characters per unit. Padding only, never parsed.
    Base64,
}

impl Radix {
    /// Validates a numeric radix (16 or 64).
    pub fn from_bits(bits: u32) -> DnaResult<Self> {
        match bits {
            16 => Ok(Self::Hex),
            64 => Ok(Self::Base64),
            _ => Err(DnaError::UnsupportedRadix { radix: bits }),
        }
    }

    /// Characters one logical unit occupies in this radix.
    pub fn chars_per_unit(self) -> usize {
        match self {
            Self::Hex => 2,
            Self::Base64 => 8,
        }
    }
}

/// Cursor over an encoded DNA string.
///
/// `read` consumes whole units and returns the consumed substring without
/// interpreting it; callers parse the returned slice themselves. Reading
/// past the end yields a truncated (possibly empty) slice rather than an
/// error, so callers must validate expected total length.
#[derive(Clone, Debug)]
pub struct DnaCursor<'a> {
    dna: &'a str,
    radix: Radix,
    cursor: usize,
}

impl<'a> DnaCursor<'a> {
    pub fn new(dna: &'a str, radix: Radix) -> Self {
        Self {
            dna,
            radix,
            cursor: 0,
        }
    }

    /// Consumes `units` logical units and returns the consumed substring.
    pub fn read(&mut self, units: usize) -> &'a str {
        let shift = units * self.radix.chars_per_unit();
        let start = self.cursor.min(self.dna.len());
        let end = (self.cursor + shift).min(self.dna.len());
        self.cursor += shift;
        // Non-ASCII input cannot split cleanly; treat it as truncated.
        self.dna.get(start..end).unwrap_or("")
    }

    /// Rewinds the cursor to position 0.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Current position, in characters.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total length of the underlying string, in characters.
    pub fn len(&self) -> usize {
        self.dna.len()
    }

    /// Whether the underlying string is empty.
    pub fn is_empty(&self) -> bool {
        self.dna.is_empty()
    }
}

/// Parses a slice returned by [`DnaCursor::read`] as an unsigned integer.
///
/// Only the hex radix carries parseable fields. An empty or short slice
/// means the DNA string ended before the schema's layout did.
pub fn parse_raw(value: &str, radix: Radix, expected_units: usize) -> DnaResult<u64> {
    if radix != Radix::Hex {
        return Err(DnaError::UnsupportedRadix { radix: 64 });
    }
    let expected = expected_units * radix.chars_per_unit();
    if value.len() < expected {
        return Err(DnaError::TruncatedDna {
            expected,
            found: value.len(),
        });
    }
    u64::from_str_radix(value, 16).map_err(|_| DnaError::SchemaParse {
        reason: format!("`{value}` is not a hex field"),
    })
}

/// Formats `value` as lower-case hex padded to `units` logical units.
pub fn to_padded_hex(value: u64, units: usize) -> String {
    format!("{value:0width$x}", width = units * Radix::Hex.chars_per_unit())
}
