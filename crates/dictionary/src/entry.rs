use byteorder::{ByteOrder, LittleEndian};

use crate::{CHILD_COUNT_WILDCARD, ENTRY_SIZE};

/// A decoded dictionary entry.
///
/// `child_pointer` and `child_count` describe the entry's children as a
/// subset of the dictionary: the pointer is an absolute byte offset to a
/// packed run of entries, the count its length. A count of `0xFFFF` marks
/// an array element archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Format code (upper nibble of the entry's first byte).
    pub format: u8,
    /// BEJ flags (lower nibble of the entry's first byte).
    pub flags: u8,
    /// Sequence number, unique within the entry's sibling subset.
    pub sequence: u16,
    /// Absolute byte offset of the child subset, 0 if the entry has none.
    pub child_pointer: u16,
    /// Number of children, or `0xFFFF` for an array element archetype.
    pub child_count: u16,
    /// Property name from the name table, if the entry has one.
    pub name: Option<String>,
}

impl Entry {
    /// Decodes the 10-byte entry starting at `index`, resolving the name
    /// lazily out of the dictionary's name table.
    ///
    /// Returns `None` if fewer than 10 bytes remain at `index`.
    pub(crate) fn decode(bytes: &[u8], index: usize) -> Option<Entry> {
        let raw = bytes.get(index..index + ENTRY_SIZE)?;

        let format_flags = raw[0];
        let name_len = raw[7];
        let name_offset = LittleEndian::read_u16(&raw[8..10]) as usize;

        let name = if name_len > 0 && name_offset < bytes.len() {
            read_name(&bytes[name_offset..])
        } else {
            None
        };

        Some(Entry {
            format: format_flags >> 4,
            flags: format_flags & 0x0F,
            sequence: LittleEndian::read_u16(&raw[1..3]),
            child_pointer: LittleEndian::read_u16(&raw[3..5]),
            child_count: LittleEndian::read_u16(&raw[5..7]),
            name,
        })
    }

    /// `true` if this entry marks an array element archetype.
    #[must_use]
    pub fn is_array_archetype(&self) -> bool {
        self.child_count == CHILD_COUNT_WILDCARD
    }

    /// `true` if the entry's name starts with `@` (an annotation property,
    /// resolved through the annotation dictionary).
    #[must_use]
    pub fn is_annotation(&self) -> bool {
        self.name.as_deref().map(|n| n.starts_with('@')).unwrap_or(false)
    }
}

/// Reads a NUL-terminated UTF-8 string from the head of `bytes`.
/// Names that run off the end of the buffer or are not UTF-8 are absent.
fn read_name(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&bytes[..end]).ok().map(str::to_owned)
}
