//! Memory-mapped access to a full-dir dump file

use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A dump file mapped into memory for sequential decoding
pub struct DumpSource {
    _file: File,
    // Zero-length files cannot be mapped on every platform
    mmap: Option<Mmap>,
    path: PathBuf,
}

impl DumpSource {
    /// Open and map a dump file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        let mmap = if size == 0 {
            None
        } else {
            // The dump is opened read-only and not expected to change while mapped
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        Ok(DumpSource {
            _file: file,
            mmap,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the dump in bytes
    pub fn size(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Reader positioned at the first record
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes())
    }
}
