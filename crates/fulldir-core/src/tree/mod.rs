//! Directory tree reconstruction
//!
//! A dump carries one record per MFT entry, each naming its own record id and
//! its parent's. Records arrive sorted by id, so parents are located with a
//! binary search over the loaded collection instead of an auxiliary index.
//! Entries live in a flat arena and refer to their children by index.

mod system;

pub use system::SystemRecord;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Read;
use std::time::Instant;

use crate::config::ParseConfig;
use crate::error::{ParseError, Result};
use crate::record::{DirectoryEntry, RecordReader};

/// Counters gathered while linking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Entries decoded from the dump
    pub total_entries: usize,
    /// Entries attached under a parent
    pub linked: usize,
    /// Entries whose parent could not be found
    pub orphans: usize,
    /// Orphans that are NTFS metadata records
    pub system_orphans: usize,
}

/// Read every record until the end of the stream, in stream order
pub fn load_entries<R: Read>(reader: R) -> Result<Vec<DirectoryEntry>> {
    tracing::info!("Loading all records from dump");
    let start = Instant::now();

    let entries = RecordReader::new(reader).collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "All records loaded: {} entries ({:.3}s)",
        entries.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(entries)
}

/// Fail on the first record whose id is not above its predecessor's
pub fn verify_order(entries: &[DirectoryEntry]) -> Result<()> {
    for (i, pair) in entries.windows(2).enumerate() {
        if pair[1].id <= pair[0].id {
            return Err(ParseError::UnsortedInput {
                index: i + 1,
                previous: pair[0].id,
                current: pair[1].id,
            });
        }
    }
    Ok(())
}

/// Binary search for the entry whose id is `parent_id`
///
/// `entries` must be sorted ascending by id.
pub fn find_parent(entries: &[DirectoryEntry], parent_id: u64) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }

    let mut low = 0usize;
    let mut high = entries.len() - 1;
    while low <= high {
        let mid = (low + high) / 2;
        match parent_id.cmp(&entries[mid].id) {
            Ordering::Equal => return Some(mid),
            Ordering::Less => {
                if mid == 0 {
                    return None;
                }
                high = mid - 1;
            }
            Ordering::Greater => low = mid + 1,
        }
    }
    None
}

/// Attach every entry under its parent, returning the root index
fn link(entries: &mut [DirectoryEntry], root_id: u64) -> (Option<usize>, LinkStats) {
    let mut root = None;
    let mut stats = LinkStats {
        total_entries: entries.len(),
        ..Default::default()
    };

    for index in 0..entries.len() {
        let id = entries[index].id;
        let parent_id = entries[index].parent_id;

        if id == root_id {
            // Last one wins, matching a plain overwrite during the scan
            if let Some(previous) = root {
                tracing::warn!(
                    "Duplicate root record {} at index {} replaces index {}",
                    id,
                    index,
                    previous
                );
            }
            root = Some(index);
            continue;
        }

        match find_parent(entries, parent_id) {
            Some(parent) if parent != index => {
                entries[parent].children.push(index);
                stats.linked += 1;
            }
            _ => {
                // Metadata files like $MFT and $Bitmap have no parent here
                stats.orphans += 1;
                match SystemRecord::from_id(id) {
                    Some(system) => {
                        stats.system_orphans += 1;
                        tracing::debug!("Skipping metadata record {} ({})", id, system);
                    }
                    None => {
                        tracing::debug!(
                            "Skipping orphan record {} '{}' (parent {} not found)",
                            id,
                            entries[index].name,
                            parent_id
                        );
                    }
                }
            }
        }
    }

    (root, stats)
}

/// Rooted tree over an arena of decoded entries
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    entries: Vec<DirectoryEntry>,
    root: Option<usize>,
    root_id: u64,
    stats: LinkStats,
}

impl DirectoryTree {
    /// Link an already loaded, id-sorted collection
    pub fn from_entries(mut entries: Vec<DirectoryEntry>, config: &ParseConfig) -> Result<Self> {
        if config.verify_order {
            verify_order(&entries)?;
        }

        tracing::info!("Linking {} records", entries.len());
        let start = Instant::now();

        let (root, stats) = link(&mut entries, config.root_id);

        tracing::info!(
            "Linking completed: {} linked, {} orphans ({} metadata) ({:.3}s)",
            stats.linked,
            stats.orphans,
            stats.system_orphans,
            start.elapsed().as_secs_f64()
        );
        if root.is_none() {
            tracing::warn!("No root record {} found in dump", config.root_id);
        }

        Ok(Self {
            entries,
            root,
            root_id: config.root_id,
            stats,
        })
    }

    /// Decode a whole dump and link it
    pub fn load<R: Read>(reader: R, config: &ParseConfig) -> Result<Self> {
        let entries = load_entries(reader)?;
        Self::from_entries(entries, config)
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn root_index(&self) -> Option<usize> {
        self.root
    }

    pub fn root(&self) -> Option<&DirectoryEntry> {
        self.root.map(|i| &self.entries[i])
    }

    /// Root index, or `MissingRoot` when the dump had none
    pub fn require_root(&self) -> Result<usize> {
        self.root.ok_or(ParseError::MissingRoot {
            root_id: self.root_id,
        })
    }

    /// Children of an entry in stream order
    pub fn children(&self, index: usize) -> impl Iterator<Item = &DirectoryEntry> + '_ {
        self.entries
            .get(index)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&child| &self.entries[child])
    }

    /// Find an entry by id
    pub fn find(&self, id: u64) -> Option<&DirectoryEntry> {
        find_parent(&self.entries, id).map(|i| &self.entries[i])
    }

    /// Pre-order walk from the root, yielding `(depth, entry)`
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.root.map(|r| vec![(r, 0)]).unwrap_or_default(),
        }
    }

    /// Entries reachable from the root, the root included
    pub fn reachable_count(&self) -> usize {
        self.iter_depth_first().count()
    }
}

/// Pre-order traversal with an explicit stack
pub struct DepthFirst<'a> {
    tree: &'a DirectoryTree,
    stack: Vec<(usize, usize)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a DirectoryEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, depth) = self.stack.pop()?;
        let tree = self.tree;
        let entry = &tree.entries[index];
        // Reversed so the first child is visited first
        self.stack
            .extend(entry.children.iter().rev().map(|&child| (child, depth + 1)));
        Some((depth, entry))
    }
}
