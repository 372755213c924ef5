//! Full-dir record decoding
//!
//! Each record in a dump is laid out as (all little-endian):
//! - u16 name length in bytes
//! - name as UTF-16LE code units
//! - u8 attribute flags
//! - u64 file size
//! - u64 allocated size
//! - u64 creation time
//! - u64 modified time
//! - u64 metadata change time
//! - u64 access time
//! - u64 record id
//! - u64 parent record id

pub mod flags;

pub use flags::AttributeFlags;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use crate::error::{ParseError, Result};

/// Size of the name length prefix
pub const PREFIX_SIZE: usize = 2;

/// Fixed tail after the name: flags byte plus eight u64 fields
pub const TAIL_SIZE: usize = 1 + 8 * 8;

/// Every field of one record as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub flags: u8,
    pub file_size: u64,
    pub allocated_size: u64,
    pub creation_time: u64,
    pub modified_time: u64,
    pub meta_change_time: u64,
    pub access_time: u64,
    pub record_id: u64,
    pub parent_id: u64,
}

impl RawRecord {
    /// Minimal record with zeroed sizes and timestamps
    pub fn new(name: impl Into<String>, record_id: u64, parent_id: u64) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            file_size: 0,
            allocated_size: 0,
            creation_time: 0,
            modified_time: 0,
            meta_change_time: 0,
            access_time: 0,
            record_id,
            parent_id,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self.allocated_size = size;
        self
    }

    pub fn with_modified(mut self, ticks: u64) -> Self {
        self.modified_time = ticks;
        self
    }

    /// Number of bytes this record occupies in a dump
    pub fn encoded_len(&self) -> usize {
        PREFIX_SIZE + self.name.encode_utf16().count() * 2 + TAIL_SIZE
    }
}

/// One decoded filesystem entry
///
/// Only the modified time is retained. Creation, metadata change and access
/// times are read off the wire and dropped to keep the in-memory collection
/// small, as is the allocated size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub flags: AttributeFlags,
    pub size: u64,
    pub modified_time: u64,
    pub id: u64,
    pub parent_id: u64,
    /// Arena indices of child entries, in stream order
    pub children: Vec<usize>,
}

impl From<RawRecord> for DirectoryEntry {
    fn from(raw: RawRecord) -> Self {
        Self {
            name: raw.name,
            flags: AttributeFlags::from_byte(raw.flags),
            size: raw.file_size,
            modified_time: raw.modified_time,
            id: raw.record_id,
            parent_id: raw.parent_id,
            children: Vec::new(),
        }
    }
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.flags.is_directory()
    }

    /// Size in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

/// Read until `buf` is full or the stream ends, returning the bytes read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decode UTF-16LE name bytes, rejecting odd lengths and unpaired surrogates
fn decode_utf16_name(data: &[u8], offset: u64) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(ParseError::MalformedName {
            offset,
            reason: format!("odd name length {}", data.len()),
        });
    }

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&units).map_err(|e| ParseError::MalformedName {
        offset,
        reason: e.to_string(),
    })
}

/// Decode one record starting at the length prefix
///
/// `offset` is the stream position of the prefix and only feeds error
/// messages. Returns `Ok(None)` on a clean end of stream, that is when no
/// byte of a new prefix is available.
pub fn decode_raw_record<R: Read>(reader: &mut R, offset: u64) -> Result<Option<RawRecord>> {
    let mut prefix = [0u8; PREFIX_SIZE];
    match read_up_to(reader, &mut prefix)? {
        0 => return Ok(None),
        PREFIX_SIZE => {}
        got => {
            return Err(ParseError::TruncatedRecord {
                offset,
                needed: PREFIX_SIZE,
                available: got,
            })
        }
    }

    let name_len = u16::from_le_bytes(prefix) as usize;
    let mut body = vec![0u8; name_len + TAIL_SIZE];
    let got = read_up_to(reader, &mut body)?;
    if got < body.len() {
        return Err(ParseError::TruncatedRecord {
            offset,
            needed: body.len(),
            available: got,
        });
    }

    let name = decode_utf16_name(&body[..name_len], offset)?;

    let mut cursor = Cursor::new(&body[name_len..]);
    let flags = cursor.read_u8()?;
    let file_size = cursor.read_u64::<LittleEndian>()?;
    let allocated_size = cursor.read_u64::<LittleEndian>()?;
    let creation_time = cursor.read_u64::<LittleEndian>()?;
    let modified_time = cursor.read_u64::<LittleEndian>()?;
    let meta_change_time = cursor.read_u64::<LittleEndian>()?;
    let access_time = cursor.read_u64::<LittleEndian>()?;
    let record_id = cursor.read_u64::<LittleEndian>()?;
    let parent_id = cursor.read_u64::<LittleEndian>()?;

    Ok(Some(RawRecord {
        name,
        flags,
        file_size,
        allocated_size,
        creation_time,
        modified_time,
        meta_change_time,
        access_time,
        record_id,
        parent_id,
    }))
}

/// Decode one record into a directory entry
pub fn decode_record<R: Read>(reader: &mut R, offset: u64) -> Result<Option<DirectoryEntry>> {
    Ok(decode_raw_record(reader, offset)?.map(DirectoryEntry::from))
}

/// Serialize a record in dump layout
pub fn encode_record<W: Write>(writer: &mut W, record: &RawRecord) -> Result<()> {
    let units: Vec<u16> = record.name.encode_utf16().collect();
    let name_len = u16::try_from(units.len() * 2).map_err(|_| ParseError::MalformedName {
        offset: 0,
        reason: format!("name too long to encode: {} code units", units.len()),
    })?;

    writer.write_u16::<LittleEndian>(name_len)?;
    for unit in units {
        writer.write_u16::<LittleEndian>(unit)?;
    }
    writer.write_u8(record.flags)?;
    writer.write_u64::<LittleEndian>(record.file_size)?;
    writer.write_u64::<LittleEndian>(record.allocated_size)?;
    writer.write_u64::<LittleEndian>(record.creation_time)?;
    writer.write_u64::<LittleEndian>(record.modified_time)?;
    writer.write_u64::<LittleEndian>(record.meta_change_time)?;
    writer.write_u64::<LittleEndian>(record.access_time)?;
    writer.write_u64::<LittleEndian>(record.record_id)?;
    writer.write_u64::<LittleEndian>(record.parent_id)?;
    Ok(())
}

/// Serialize a sequence of records into one buffer
pub fn encode_records(records: &[RawRecord]) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(records.iter().map(RawRecord::encoded_len).sum());
    for record in records {
        encode_record(&mut data, record)?;
    }
    Ok(data)
}

/// Streaming decoder over a whole dump
pub struct RecordReader<R> {
    reader: R,
    offset: u64,
    records_read: usize,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            records_read: 0,
            finished: false,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Records decoded so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match decode_raw_record(&mut self.reader, self.offset) {
            Ok(Some(raw)) => {
                self.offset += raw.encoded_len() as u64;
                self.records_read += 1;
                Some(Ok(DirectoryEntry::from(raw)))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
