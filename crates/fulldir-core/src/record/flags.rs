//! Attribute flag byte
//!
//! The dumper packs eight attributes into one byte with the directory bit as
//! the least significant bit and the archive bit as the most significant one.
//! Bits are indexed from the most significant end, so index 0 is `archived`
//! and index 7 is `directory`.

use serde::{Deserialize, Serialize};

pub const FLAG_COUNT: usize = 8;

pub const IDX_ARCHIVED: usize = 0;
pub const IDX_ENCRYPTED: usize = 1;
pub const IDX_COMPRESSED: usize = 2;
pub const IDX_SYSTEM: usize = 3;
pub const IDX_HIDDEN: usize = 4;
pub const IDX_READ_ONLY: usize = 5;
pub const IDX_DELETED: usize = 6;
pub const IDX_DIRECTORY: usize = 7;

/// Summary letters in report order, paired with the bit index they test
const SUMMARY_ORDER: [(usize, char); FLAG_COUNT] = [
    (IDX_DIRECTORY, 'D'),
    (IDX_DELETED, 'X'),
    (IDX_READ_ONLY, 'R'),
    (IDX_HIDDEN, 'H'),
    (IDX_SYSTEM, 'S'),
    (IDX_COMPRESSED, 'C'),
    (IDX_ENCRYPTED, 'E'),
    (IDX_ARCHIVED, 'A'),
];

/// Parsed attribute flags; the raw byte is not kept after decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeFlags([bool; FLAG_COUNT]);

impl AttributeFlags {
    pub fn from_byte(value: u8) -> Self {
        let mut bits = [false; FLAG_COUNT];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = value & (1 << (FLAG_COUNT - i - 1)) != 0;
        }
        Self(bits)
    }

    /// Pack back into the wire byte
    pub fn to_byte(self) -> u8 {
        let mut value = 0u8;
        for (i, set) in self.0.iter().enumerate() {
            if *set {
                value |= 1 << (FLAG_COUNT - i - 1);
            }
        }
        value
    }

    pub fn bits(&self) -> &[bool; FLAG_COUNT] {
        &self.0
    }

    pub fn is_archived(&self) -> bool {
        self.0[IDX_ARCHIVED]
    }

    pub fn is_encrypted(&self) -> bool {
        self.0[IDX_ENCRYPTED]
    }

    pub fn is_compressed(&self) -> bool {
        self.0[IDX_COMPRESSED]
    }

    pub fn is_system(&self) -> bool {
        self.0[IDX_SYSTEM]
    }

    pub fn is_hidden(&self) -> bool {
        self.0[IDX_HIDDEN]
    }

    pub fn is_read_only(&self) -> bool {
        self.0[IDX_READ_ONLY]
    }

    pub fn is_deleted(&self) -> bool {
        self.0[IDX_DELETED]
    }

    pub fn is_directory(&self) -> bool {
        self.0[IDX_DIRECTORY]
    }

    /// Set a flag by bit index, for building records by hand
    pub fn with(mut self, index: usize) -> Self {
        if index < FLAG_COUNT {
            self.0[index] = true;
        }
        self
    }

    /// One letter per set flag in D,X,R,H,S,C,E,A order; empty when none are set
    pub fn summary(&self) -> String {
        SUMMARY_ORDER
            .iter()
            .filter(|(idx, _)| self.0[*idx])
            .map(|(_, letter)| *letter)
            .collect()
    }
}

impl From<u8> for AttributeFlags {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl std::fmt::Display for AttributeFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.summary())
    }
}
