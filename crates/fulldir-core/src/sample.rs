//! Small synthetic dump for trying the tool without a real volume

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::filetime::FILETIME_TICKS_PER_SECOND;
use crate::record::flags::{
    IDX_ARCHIVED, IDX_COMPRESSED, IDX_DELETED, IDX_DIRECTORY, IDX_HIDDEN, IDX_READ_ONLY,
    IDX_SYSTEM,
};
use crate::record::{encode_record, AttributeFlags, RawRecord};

// 2021-06-01 00:00:00 UTC
const BASE_TIME: u64 = 132_669_792_000_000_000;

fn flags(indices: &[usize]) -> u8 {
    indices
        .iter()
        .fold(AttributeFlags::default(), |f, &i| f.with(i))
        .to_byte()
}

fn at(hours: u64) -> u64 {
    BASE_TIME + hours * 3600 * FILETIME_TICKS_PER_SECOND
}

/// A small volume, sorted by record id
pub fn sample_records() -> Vec<RawRecord> {
    let dir = flags(&[IDX_DIRECTORY]);
    let meta = flags(&[IDX_HIDDEN, IDX_SYSTEM]);

    vec![
        RawRecord::new("$MFT", 0, 1).with_flags(meta).with_size(262_144),
        RawRecord::new("$LogFile", 2, 1).with_flags(meta).with_size(67_108_864),
        RawRecord::new(".", 5, 5).with_flags(flags(&[IDX_DIRECTORY, IDX_HIDDEN, IDX_SYSTEM])),
        RawRecord::new("$Bitmap", 6, 1).with_flags(meta).with_size(40_960),
        RawRecord::new("Users", 64, 5).with_flags(dir).with_modified(at(1)),
        RawRecord::new("alice", 65, 64).with_flags(dir).with_modified(at(2)),
        RawRecord::new("notes.txt", 66, 65)
            .with_flags(flags(&[IDX_ARCHIVED]))
            .with_size(2048)
            .with_modified(at(3)),
        RawRecord::new("old-draft.docx", 67, 65)
            .with_flags(flags(&[IDX_DELETED, IDX_ARCHIVED]))
            .with_size(48_213)
            .with_modified(at(4)),
        RawRecord::new("Windows", 70, 5).with_flags(dir).with_modified(at(5)),
        RawRecord::new("win.ini", 71, 70)
            .with_flags(flags(&[IDX_READ_ONLY, IDX_ARCHIVED]))
            .with_size(92)
            .with_modified(at(6)),
        RawRecord::new("archive.cab", 72, 70)
            .with_flags(flags(&[IDX_COMPRESSED]))
            .with_size(5_242_880)
            .with_modified(at(7)),
        RawRecord::new("lost.tmp", 80, 9_999).with_size(1).with_modified(at(8)),
    ]
}

/// Write the sample dump to `path`, returning the number of records
pub fn write_sample_dump(path: &Path) -> Result<usize> {
    let records = sample_records();
    let mut writer = BufWriter::new(File::create(path)?);
    for record in &records {
        encode_record(&mut writer, record)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} sample records to {}", records.len(), path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_sorted() {
        let records = sample_records();
        assert!(records.windows(2).all(|w| w[0].record_id < w[1].record_id));
        assert_eq!(records.iter().filter(|r| r.record_id == 5).count(), 1);
    }

    #[test]
    fn test_flag_helper() {
        assert_eq!(flags(&[]), 0);
        assert_eq!(flags(&[IDX_DIRECTORY]), 0x01);
        assert_eq!(flags(&[IDX_ARCHIVED, IDX_DIRECTORY]), 0x81);
    }
}
