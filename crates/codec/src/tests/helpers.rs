use byteorder::{ByteOrder, LittleEndian};
use dictionary::Dictionary;

const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: usize = 10;

/// One row of a hand-assembled dictionary fixture.
pub struct EntrySpec {
    pub format: u8,
    pub sequence: u16,
    /// `(index of first child entry, child count)`; the helper converts
    /// the index to an absolute byte offset.
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

/// Assembles a packed dictionary: 12-byte header, entry table, trailing
/// NUL-terminated name table.
pub fn build_dictionary(entries: &[EntrySpec]) -> Dictionary {
    let table_end = HEADER_SIZE + entries.len() * ENTRY_SIZE;

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
    Dictionary::from_bytes(buf).expect("fixture dictionary must validate")
}

// BEJ format codes, as they appear in dictionary entries.
pub const SET: u8 = 0x00;
pub const ARRAY: u8 = 0x01;
pub const NULL: u8 = 0x02;
pub const INTEGER: u8 = 0x03;
pub const ENUM: u8 = 0x04;
pub const STRING: u8 = 0x05;
pub const REAL: u8 = 0x06;
pub const BOOLEAN: u8 = 0x07;

/// Schema whose root SET has no children at all (scenario S1).
pub fn empty_root_schema() -> Dictionary {
    build_dictionary(&[EntrySpec {
        format: SET,
        sequence: 0,
        children: None,
        name: Some("Empty"),
    }])
}

/// Schema with a single INTEGER property `X` at sequence 0 (scenario S2).
pub fn single_int_schema() -> Dictionary {
    build_dictionary(&[
        EntrySpec {
            format: SET,
            sequence: 0,
            children: Some((1, 1)),
            name: Some("Root"),
        },
        EntrySpec::leaf(INTEGER, 0, "X"),
    ])
}

/// The main fixture: a "Widget" resource exercising every handled format.
///
/// ```text
///  0: "Widget"  SET     seq 0, children 1..=8
///  1:   "Id"      INTEGER seq 0
///  2:   "Name"    STRING  seq 1
///  3:   "Enabled" BOOLEAN seq 2
///  4:   "State"   ENUM    seq 3, children 9..=10
///  5:   "Tags"    ARRAY   seq 4, archetype at 11
///  6:   "Limits"  SET     seq 5, children 12..=13
///  7:   "Legacy"  NULL    seq 6
///  8:   "Ratio"   REAL    seq 7 (unhandled payload format)
///  9:     "Off"  seq 0
/// 10:     "On"   seq 1
/// 11:     (unnamed STRING array element archetype)
/// 12:     "Min"  INTEGER seq 0
/// 13:     "Max"  INTEGER seq 1
/// ```
pub fn widget_schema() -> Dictionary {
    build_dictionary(&[
        EntrySpec {
            format: SET,
            sequence: 0,
            children: Some((1, 8)),
            name: Some("Widget"),
        },
        EntrySpec::leaf(INTEGER, 0, "Id"),
        EntrySpec::leaf(STRING, 1, "Name"),
        EntrySpec::leaf(BOOLEAN, 2, "Enabled"),
        EntrySpec {
            format: ENUM,
            sequence: 3,
            children: Some((9, 2)),
            name: Some("State"),
        },
        EntrySpec {
            format: ARRAY,
            sequence: 4,
            children: Some((11, 1)),
            name: Some("Tags"),
        },
        EntrySpec {
            format: SET,
            sequence: 5,
            children: Some((12, 2)),
            name: Some("Limits"),
        },
        EntrySpec::leaf(NULL, 6, "Legacy"),
        EntrySpec::leaf(REAL, 7, "Ratio"),
        EntrySpec::leaf(SET, 0, "Off"),
        EntrySpec::leaf(SET, 1, "On"),
        EntrySpec {
            format: STRING,
            sequence: 0,
            children: None,
            name: None,
        },
        EntrySpec::leaf(INTEGER, 0, "Min"),
        EntrySpec::leaf(INTEGER, 1, "Max"),
    ])
}

/// Annotation dictionary used alongside the widget schema.
///
/// ```text
/// 0: "Annotations"  SET     seq 0, children 1..=3
/// 1: "@odata.count" INTEGER seq 5
/// 2: "@odata.id"    STRING  seq 9
/// 3: "@links"       ARRAY   seq 2, archetype at 4
/// 4: (unnamed STRING array element archetype)
/// ```
pub fn annotation_dict() -> Dictionary {
    build_dictionary(&[
        EntrySpec {
            format: SET,
            sequence: 0,
            children: Some((1, 3)),
            name: Some("Annotations"),
        },
        EntrySpec::leaf(INTEGER, 5, "@odata.count"),
        EntrySpec::leaf(STRING, 9, "@odata.id"),
        EntrySpec {
            format: ARRAY,
            sequence: 2,
            children: Some((4, 1)),
            name: Some("@links"),
        },
        EntrySpec {
            format: STRING,
            sequence: 0,
            children: None,
            name: None,
        },
    ])
}
