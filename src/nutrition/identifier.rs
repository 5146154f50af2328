//! Lookup identifier classification
//!
//! Decides whether a pantry lookup string is a barcode or a free-text name.

use std::fmt;

/// Minimum digit count for an identifier to be treated as a barcode (EAN-8)
pub const MIN_BARCODE_DIGITS: usize = 8;

/// A classified lookup identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// UPC/EAN barcode (8 or more digits)
    Barcode(&'a str),
    /// Free-text product name
    Name(&'a str),
}

impl<'a> Identifier<'a> {
    /// Classify a raw identifier. Surrounding whitespace is ignored.
    pub fn classify(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if is_barcode(trimmed) {
            Identifier::Barcode(trimmed)
        } else {
            Identifier::Name(trimmed)
        }
    }

    /// The trimmed identifier text
    pub fn as_str(&self) -> &'a str {
        match self {
            Identifier::Barcode(s) | Identifier::Name(s) => s,
        }
    }

    pub fn is_barcode(&self) -> bool {
        matches!(self, Identifier::Barcode(_))
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Barcode(code) => write!(f, "barcode {}", code),
            Identifier::Name(name) => write!(f, "name \"{}\"", name),
        }
    }
}

/// True when the whole string is at least eight ASCII digits
pub fn is_barcode(s: &str) -> bool {
    s.len() >= MIN_BARCODE_DIGITS && s.bytes().all(|b| b.is_ascii_digit())
}
