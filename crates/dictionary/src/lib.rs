//! # Dictionary — packed BEJ schema dictionaries
//!
//! Loads and iterates the pre-shared binary dictionaries that map BEJ
//! sequence numbers to property names and types. A dictionary is a single
//! immutable byte buffer; entries and names are decoded on demand.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER (12 bytes)                                             │
//! │                                                               │
//! │ version (u8) | flags (u8) | entry_count (u16)                 │
//! │ dict_size (u32) | reserved (u32)                              │
//! ├───────────────────────────────────────────────────────────────┤
//! │ ENTRIES (entry_count × 10 bytes, first entry = schema root)   │
//! │                                                               │
//! │ format<<4|flags (u8) | sequence (u16)                         │
//! │ child_pointer (u16) | child_count (u16)                       │
//! │ name_len (u8) | name_offset (u16)                             │
//! ├───────────────────────────────────────────────────────────────┤
//! │ NAME TABLE (NUL-terminated strings)                           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `child_pointer` and `name_offset` are
//! absolute byte offsets into the buffer. A `child_count` of `0xFFFF` marks
//! an array element archetype; as a cursor bound it means "iterate to the
//! end of the buffer".
//!
//! ## Example
//!
//! ```rust,no_run
//! use dictionary::Dictionary;
//!
//! let dict = Dictionary::load("schema.bin").unwrap();
//! let root = dict.root().unwrap();
//! let entry = dict
//!     .find_by_name(root.child_pointer, root.child_count, "Id")
//!     .unwrap();
//! println!("{} -> seq {}", entry.name.as_deref().unwrap_or("?"), entry.sequence);
//! ```

mod cursor;
mod entry;

pub use cursor::EntryCursor;
pub use entry::Entry;

use anyhow::{bail, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::path::Path;

/// Size of the fixed dictionary header in bytes.
pub const HEADER_SIZE: usize = 12;
/// Size of one packed dictionary entry in bytes.
pub const ENTRY_SIZE: usize = 10;
/// Absolute offset of the first (root) entry.
pub const ENTRIES_OFFSET: u16 = 12;
/// `child_count` sentinel: array element archetype / unbounded cursor.
pub const CHILD_COUNT_WILDCARD: u16 = 0xFFFF;

/// Maximum dictionary file size we'll load (16 MiB). Prevents OOM on a
/// mis-pointed path; real dictionaries are addressed by u16 offsets and
/// stay far below this.
const MAX_DICTIONARY_BYTES: u64 = 16 * 1024 * 1024;

/// A loaded BEJ dictionary: one heap buffer, immutable for its lifetime.
///
/// Shared read-only by encoder and decoder; all lookups decode entries
/// straight out of the buffer.
pub struct Dictionary {
    bytes: Vec<u8>,
}

impl Dictionary {
    /// Wraps an in-memory dictionary buffer, applying the same header
    /// validation as [`load`](Dictionary::load).
    ///
    /// # Errors
    ///
    /// Fails if the buffer is smaller than the 12-byte header or if the
    /// declared entry table extends past the end of the buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            bail!("dictionary too small: {} bytes", bytes.len());
        }
        let entry_count = LittleEndian::read_u16(&bytes[2..4]) as usize;
        let table_end = HEADER_SIZE + entry_count * ENTRY_SIZE;
        if table_end > bytes.len() {
            bail!(
                "dictionary entry table out of bounds: {} entries need {} bytes, file has {}",
                entry_count,
                table_end,
                bytes.len()
            );
        }
        Ok(Self { bytes })
    }

    /// Loads a dictionary file into memory.
    ///
    /// A path ending in `.map` is redirected to the sibling `.bin` file
    /// (the conventional on-disk pairing); any other path is loaded
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, on files larger than the 16 MiB safety cap,
    /// and on header validation (see [`from_bytes`](Dictionary::from_bytes)).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.extension().map(|e| e == "map").unwrap_or(false) {
            path.with_extension("bin")
        } else {
            path.to_path_buf()
        };

        let metadata = std::fs::metadata(&path)?;
        if metadata.len() > MAX_DICTIONARY_BYTES {
            bail!(
                "dictionary file {} too large: {} bytes",
                path.display(),
                metadata.len()
            );
        }
        let bytes = std::fs::read(&path)?;
        Self::from_bytes(bytes)
    }

    /// The raw dictionary buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total buffer size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Version tag from the header.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.bytes[0]
    }

    /// Number of entries declared in the header.
    #[must_use]
    pub fn entry_count(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[2..4])
    }

    /// Dictionary size recorded in the header (informational; the loader
    /// trusts the actual file size).
    #[must_use]
    pub fn declared_size(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[4..8])
    }

    /// The root entry describing the schema's top-level object, or `None`
    /// for an empty entry table.
    #[must_use]
    pub fn root(&self) -> Option<Entry> {
        EntryCursor::root(self).next()
    }

    /// Linear scan of the subset at `offset`/`count` for an entry with the
    /// given sequence number.
    #[must_use]
    pub fn find_by_sequence(&self, offset: u16, count: u16, sequence: u64) -> Option<Entry> {
        let mut cursor = EntryCursor::subset(self, offset, count);
        while let Some(entry) = cursor.next() {
            if u64::from(entry.sequence) == sequence {
                return Some(entry);
            }
        }
        None
    }

    /// Linear scan of the subset at `offset`/`count` for an entry whose
    /// name matches `name` exactly.
    ///
    /// Linear search is fine here: child subsets are small (typically
    /// fewer than 50 entries).
    #[must_use]
    pub fn find_by_name(&self, offset: u16, count: u16, name: &str) -> Option<Entry> {
        let mut cursor = EntryCursor::subset(self, offset, count);
        while let Some(entry) = cursor.next() {
            if entry.name.as_deref() == Some(name) {
                return Some(entry);
            }
        }
        None
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("size", &self.bytes.len())
            .field("version", &self.version())
            .field("entry_count", &self.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests;
