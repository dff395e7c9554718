use byteorder::{ByteOrder, LittleEndian};

use crate::{ENTRY_SIZE, HEADER_SIZE};

/// One row of a hand-assembled dictionary fixture.
pub struct EntrySpec {
    pub format: u8,
    pub sequence: u16,
    /// `(index of first child entry, child count)` — the helper converts
    /// the index to an absolute byte offset. `None` writes a zero pointer.
    pub children: Option<(usize, u16)>,
    pub name: Option<&'static str>,
}

impl EntrySpec {
    pub fn leaf(format: u8, sequence: u16, name: &'static str) -> Self {
        Self {
            format,
            sequence,
            children: None,
            name: Some(name),
        }
    }
}

/// Assembles a packed dictionary buffer: 12-byte header, entry table,
/// trailing NUL-terminated name table.
pub fn build_dictionary(entries: &[EntrySpec]) -> Vec<u8> {
    let table_end = HEADER_SIZE + entries.len() * ENTRY_SIZE;

    // lay out the name table first so entries can point into it
    let mut names = Vec::new();
    let mut name_refs = Vec::with_capacity(entries.len());
    for spec in entries {
        match spec.name {
            Some(n) => {
                let offset = (table_end + names.len()) as u16;
                names.extend_from_slice(n.as_bytes());
                names.push(0);
                name_refs.push((n.len() as u8 + 1, offset));
            }
            None => name_refs.push((0, 0xFFFF)),
        }
    }

    let total = table_end + names.len();
    let mut buf = vec![0u8; table_end];
    buf[0] = 0x00; // version
    buf[1] = 0x00; // flags
    LittleEndian::write_u16(&mut buf[2..4], entries.len() as u16);
    LittleEndian::write_u32(&mut buf[4..8], total as u32);

    for (i, spec) in entries.iter().enumerate() {
        let at = HEADER_SIZE + i * ENTRY_SIZE;
        buf[at] = spec.format << 4;
        LittleEndian::write_u16(&mut buf[at + 1..at + 3], spec.sequence);
        let (ptr, count) = match spec.children {
            Some((first, count)) => ((HEADER_SIZE + first * ENTRY_SIZE) as u16, count),
            None => (0, 0),
        };
        LittleEndian::write_u16(&mut buf[at + 3..at + 5], ptr);
        LittleEndian::write_u16(&mut buf[at + 5..at + 7], count);
        let (name_len, name_offset) = name_refs[i];
        buf[at + 7] = name_len;
        LittleEndian::write_u16(&mut buf[at + 8..at + 10], name_offset);
    }

    buf.extend_from_slice(&names);
    debug_assert_eq!(buf.len(), total);
    buf
}

/// A small two-level schema used across the test files:
///
/// ```text
/// 0: root "Thing" (SET, 3 children at 1..=3)
/// 1:   "Id"      INTEGER seq 0
/// 2:   "Name"    STRING  seq 1
/// 3:   "State"   ENUM    seq 2, 2 children at 4..=5
/// 4:     "Enabled"  seq 0
/// 5:     "Disabled" seq 1
/// ```
pub fn sample_schema() -> Vec<u8> {
    build_dictionary(&[
        EntrySpec {
            format: 0x00,
            sequence: 0,
            children: Some((1, 3)),
            name: Some("Thing"),
        },
        EntrySpec::leaf(0x03, 0, "Id"),
        EntrySpec::leaf(0x05, 1, "Name"),
        EntrySpec {
            format: 0x04,
            sequence: 2,
            children: Some((4, 2)),
            name: Some("State"),
        },
        EntrySpec::leaf(0x00, 0, "Enabled"),
        EntrySpec::leaf(0x00, 1, "Disabled"),
    ])
}
