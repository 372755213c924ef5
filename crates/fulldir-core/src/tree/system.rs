//! NTFS well-known metadata record numbers
//!
//! The first sixteen MFT records hold volume metadata. Apart from the root
//! directory they have no parent in a full-dir dump and end up as orphans.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemRecord {
    Mft,
    MftMirr,
    LogFile,
    Volume,
    AttrDef,
    Root,
    Bitmap,
    Boot,
    BadClus,
    Secure,
    UpCase,
    Extend,
    Reserved(u8),
}

impl SystemRecord {
    /// Number of records reserved for metadata files
    pub const RESERVED_COUNT: u64 = 16;

    pub fn from_id(id: u64) -> Option<Self> {
        let record = match id {
            0 => SystemRecord::Mft,
            1 => SystemRecord::MftMirr,
            2 => SystemRecord::LogFile,
            3 => SystemRecord::Volume,
            4 => SystemRecord::AttrDef,
            5 => SystemRecord::Root,
            6 => SystemRecord::Bitmap,
            7 => SystemRecord::Boot,
            8 => SystemRecord::BadClus,
            9 => SystemRecord::Secure,
            10 => SystemRecord::UpCase,
            11 => SystemRecord::Extend,
            12..=15 => SystemRecord::Reserved(id as u8),
            _ => return None,
        };
        Some(record)
    }
}

impl std::fmt::Display for SystemRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemRecord::Mft => write!(f, "$MFT"),
            SystemRecord::MftMirr => write!(f, "$MFTMirr"),
            SystemRecord::LogFile => write!(f, "$LogFile"),
            SystemRecord::Volume => write!(f, "$Volume"),
            SystemRecord::AttrDef => write!(f, "$AttrDef"),
            SystemRecord::Root => write!(f, "."),
            SystemRecord::Bitmap => write!(f, "$Bitmap"),
            SystemRecord::Boot => write!(f, "$Boot"),
            SystemRecord::BadClus => write!(f, "$BadClus"),
            SystemRecord::Secure => write!(f, "$Secure"),
            SystemRecord::UpCase => write!(f, "$UpCase"),
            SystemRecord::Extend => write!(f, "$Extend"),
            SystemRecord::Reserved(n) => write!(f, "<reserved {}>", n),
        }
    }
}
