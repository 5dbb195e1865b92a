//! Key-code rows: which physical key sits in which slot.
//!
//! A `KeyMap` names two ordered key rows. The low row covers the home/bottom
//! keys, the high row the number/top keys, one octave apart. Slots 4, 10 and
//! 18 of the canonical 22-key row are spacers: present on the keyboard, never
//! sounding in piano layout.

use serde::{Deserialize, Serialize};

/// Slots that never produce a note in piano layout.
pub const NON_NOTABLE_SLOTS: [usize; 3] = [4, 10, 18];

/// Whether the slot sounds in the given layout. Chromatic layout has no
/// spacer slots.
pub fn is_notable_slot(slot: usize, chromatic: bool) -> bool {
    chromatic || !NON_NOTABLE_SLOTS.contains(&slot)
}

// Canonical rows. Code points above 0x7E are extended key codes, not text.
const US101_LOW: &str = "AZSXDCFVGBHNJMK\u{bc}L\u{be}\u{bb}\u{bf}\u{ba}\u{e2}\u{dd} ";
const US101_HIGH: &str = "1Q2W3E4R5T6Y7U8I9O0P\u{bd}\u{c0}\u{de}\u{db}\u{dc}";
const JP106_LOW: &str = "AZSXDCFVGBHNJMK,L.;/:\\";
const JP106_HIGH: &str = "1Q2W3E4R5T6Y7U8I9O0P-@^";

/// Immutable description of the two key rows. Replacing a map builds a new
/// instance; fields are never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    name: String,
    low_keys: Vec<char>,
    high_keys: Vec<char>,
}

impl KeyMap {
    /// Build a custom map. Both rows must be non-empty.
    pub fn new(name: &str, low_keys: Vec<char>, high_keys: Vec<char>) -> Result<Self, String> {
        if low_keys.is_empty() || high_keys.is_empty() {
            return Err(format!("key map {:?} has an empty key row", name));
        }
        Ok(Self {
            name: name.to_string(),
            low_keys,
            high_keys,
        })
    }

    /// Build a map from two escaped interchange strings (see [`decode_keys`]).
    pub fn from_specs(name: &str, low_spec: &str, high_spec: &str) -> Result<Self, String> {
        Self::new(name, decode_keys(low_spec)?, decode_keys(high_spec)?)
    }

    /// US 101-key layout.
    pub fn us101() -> Self {
        Self {
            name: "US101".to_string(),
            low_keys: US101_LOW.chars().collect(),
            high_keys: US101_HIGH.chars().collect(),
        }
    }

    /// Japanese 106-key layout.
    pub fn jp106() -> Self {
        Self {
            name: "JP106".to_string(),
            low_keys: JP106_LOW.chars().collect(),
            high_keys: JP106_HIGH.chars().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn low_len(&self) -> usize {
        self.low_keys.len()
    }

    pub fn high_len(&self) -> usize {
        self.high_keys.len()
    }

    /// Slot index of `code` in the low row.
    pub fn index_of_low(&self, code: char) -> Option<usize> {
        self.low_keys.iter().position(|&k| k == code)
    }

    /// Slot index of `code` in the high row.
    pub fn index_of_high(&self, code: char) -> Option<usize> {
        self.high_keys.iter().position(|&k| k == code)
    }

    /// Low row in interchange form.
    pub fn low_spec(&self) -> String {
        encode_keys(&self.low_keys)
    }

    /// High row in interchange form.
    pub fn high_spec(&self) -> String {
        encode_keys(&self.high_keys)
    }
}

/// Serialize a key sequence as space-separated tokens. Printable ASCII other
/// than space stands for itself; everything else becomes `\u` + 4 hex digits.
pub fn encode_keys(keys: &[char]) -> String {
    let tokens: Vec<String> = keys
        .iter()
        .map(|&c| {
            if c.is_ascii_graphic() {
                c.to_string()
            } else {
                format!("\\u{:04x}", c as u32)
            }
        })
        .collect();
    tokens.join(" ")
}

/// Inverse of [`encode_keys`]: strips separators, unescapes `\uXXXX` tokens.
pub fn decode_keys(spec: &str) -> Result<Vec<char>, String> {
    spec.split_whitespace().map(decode_token).collect()
}

fn decode_token(token: &str) -> Result<char, String> {
    if let Some(hex) = token.strip_prefix("\\u") {
        if hex.len() != 4 {
            return Err(format!("bad escape in key spec: {:?}", token));
        }
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| format!("bad escape in key spec: {:?}", token))?;
        return char::from_u32(code).ok_or_else(|| format!("invalid code point: {:?}", token));
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("key token must be a single character: {:?}", token)),
    }
}
