//! Payload-bounded BEJ decoder.
//!
//! The whole input is held in memory and every value decodes from a
//! sub-slice of exactly the length its SFL header declared, so a value
//! that tries to read past its own payload fails with a short read instead
//! of silently consuming a sibling's bytes.

use anyhow::{bail, Context, Result};
use dictionary::{Dictionary, Entry, EntryCursor, CHILD_COUNT_WILDCARD, ENTRIES_OFFSET};
use serde_json::{Map, Value};
use std::io::Read;
use wire::{read_nnint, read_packed_int, read_sfl, Format, SELECTOR_SCHEMA};

use crate::{MAX_DEPTH, STREAM_HEADER};

/// Decodes a complete BEJ stream held in `data` into a JSON object.
///
/// Validates the 4-byte magic, reads the outer SFL (which must be a SET),
/// and decodes the body against the schema dictionary's root entry.
///
/// # Errors
///
/// Any malformed NNINT, sequence lookup miss, wire/dictionary format
/// disagreement, short read, or length overrun aborts the whole decode;
/// no partial tree is returned.
pub fn decode_buffer(
    data: &[u8],
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<Value> {
    if data.len() < STREAM_HEADER.len() {
        bail!("input shorter than the 7-byte stream header");
    }
    let (header, body) = data.split_at(STREAM_HEADER.len());
    if header[..4] != STREAM_HEADER[..4] {
        bail!(
            "bad magic {:02X} {:02X} {:02X} {:02X} (expected 00 F0 F1 F1)",
            header[0],
            header[1],
            header[2],
            header[3]
        );
    }

    let root_entry = schema
        .root()
        .context("schema dictionary has no root entry")?;

    let mut src = body;
    let sfl = read_sfl(&mut src)?;
    if sfl.format != Format::Set.code() {
        bail!("outer value has format code {:#x}, expected SET", sfl.format);
    }
    let mut payload = take(&mut src, sfl.length)?;
    decode_set(&mut payload, &root_entry, schema, annotations, 0)
}

/// Reads `source` to the end and decodes it with
/// [`decode_buffer`].
pub fn decode_reader<R: Read>(
    source: &mut R,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<Value> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    decode_buffer(&data, schema, annotations)
}

/// Splits off the first `len` bytes of `src`, failing if the declared
/// length overruns what remains.
fn take<'a>(src: &mut &'a [u8], len: u64) -> Result<&'a [u8]> {
    let len = usize::try_from(len)
        .ok()
        .filter(|l| *l <= src.len())
        .with_context(|| {
            format!("payload length {len} overruns the {} remaining bytes", src.len())
        })?;
    let (head, tail) = src.split_at(len);
    *src = tail;
    Ok(head)
}

/// Decodes a SET payload: NNINT property count, then `count` SFL-framed
/// properties resolved by sequence number.
///
/// Selector bit 0 searches `P.child_pointer`/`P.child_count` in the set's
/// own dictionary; selector bit 1 searches the annotation dictionary
/// globally with the unbounded cursor.
fn decode_set(
    src: &mut &[u8],
    entry: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<Value> {
    let count = read_nnint(src)?;

    let dict_for_children = if entry.is_annotation() {
        annotations.context("annotation set without an annotation dictionary")?
    } else {
        schema
    };

    let mut object = Map::new();
    for _ in 0..count {
        let sfl = read_sfl(src)?;

        let child = if sfl.selector == SELECTOR_SCHEMA {
            dict_for_children
                .find_by_sequence(entry.child_pointer, entry.child_count, sfl.sequence)
                .with_context(|| {
                    format!(
                        "sequence {} not found under {:?}",
                        sfl.sequence,
                        entry.name.as_deref().unwrap_or("<root>")
                    )
                })?
        } else {
            let annotations =
                annotations.context("annotation selector without an annotation dictionary")?;
            annotations
                .find_by_sequence(ENTRIES_OFFSET, CHILD_COUNT_WILDCARD, sfl.sequence)
                .with_context(|| {
                    format!("sequence {} not found in the annotation dictionary", sfl.sequence)
                })?
        };

        if sfl.format != child.format {
            bail!(
                "wire format {:#x} disagrees with dictionary format {:#x} for {:?}",
                sfl.format,
                child.format,
                child.name.as_deref().unwrap_or("?")
            );
        }

        let mut payload = take(src, sfl.length)?;
        if let Some(value) = decode_value(&mut payload, &child, schema, annotations, depth)? {
            let key = child.name.clone().with_context(|| {
                format!("set member with sequence {} has no name", sfl.sequence)
            })?;
            object.insert(key, value);
        }
    }
    Ok(Value::Object(object))
}

/// Decodes an ARRAY payload: NNINT element count, then `count` SFL-framed
/// elements decoded against the array's element archetype. Element
/// sequence numbers are indices and are ignored; the archetype's format is
/// trusted over the element SFL's.
fn decode_array(
    src: &mut &[u8],
    entry: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<Value> {
    let count = read_nnint(src)?;

    let dict = if entry.is_annotation() {
        annotations.context("annotation array without an annotation dictionary")?
    } else {
        schema
    };
    let archetype = EntryCursor::subset(dict, entry.child_pointer, entry.child_count).next();
    let Some(archetype) = archetype else {
        // array with no element type definition decodes as empty
        return Ok(Value::Array(Vec::new()));
    };

    let mut items = Vec::new();
    for _ in 0..count {
        let sfl = read_sfl(src)?;
        let mut payload = take(src, sfl.length)?;
        if let Some(value) = decode_value(&mut payload, &archetype, schema, annotations, depth)? {
            items.push(value);
        }
    }
    Ok(Value::Array(items))
}

/// Decodes an ENUM payload: NNINT width (informational), then the
/// sequence value as an NNINT, resolved to a child name.
fn decode_enum(
    src: &mut &[u8],
    entry: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<Value> {
    let _width = read_nnint(src)?;
    let wanted = read_nnint(src)?;

    let dict = if entry.is_annotation() {
        annotations.context("annotation enum without an annotation dictionary")?
    } else {
        schema
    };

    let mut cursor = EntryCursor::subset(dict, entry.child_pointer, entry.child_count);
    while let Some(child) = cursor.next() {
        if u64::from(child.sequence) == wanted {
            let name = child.name.with_context(|| {
                format!("enum child with sequence {wanted} has no name")
            })?;
            return Ok(Value::String(name));
        }
    }
    bail!(
        "enum sequence {} not defined for property {:?}",
        wanted,
        entry.name.as_deref().unwrap_or("?")
    );
}

/// Decodes one value from its bounded payload slice, dispatching on the
/// dictionary entry's format. Returns `None` for format codes this codec
/// does not handle — the payload is already consumed by the caller's
/// framing, so skipping is free.
fn decode_value(
    src: &mut &[u8],
    entry: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<Option<Value>> {
    if depth >= MAX_DEPTH {
        bail!("BEJ stream nested deeper than {MAX_DEPTH} levels");
    }

    let Some(format) = Format::from_code(entry.format) else {
        return Ok(None);
    };

    let value = match format {
        Format::Set => decode_set(src, entry, schema, annotations, depth + 1)?,
        Format::Array => decode_array(src, entry, schema, annotations, depth + 1)?,
        Format::Integer => Value::from(read_packed_int(src)?),
        Format::String => decode_string(src)?,
        Format::Boolean => {
            let len = read_nnint(src)?;
            if len != 1 {
                bail!("boolean payload declares {len} bytes, expected 1");
            }
            let mut b = [0u8; 1];
            src.read_exact(&mut b)?;
            Value::Bool(b[0] != 0)
        }
        Format::Enum => decode_enum(src, entry, schema, annotations)?,
        Format::Null => Value::Null,
        Format::Real | Format::PropertyAnnotation | Format::ResourceLink => return Ok(None),
    };
    Ok(Some(value))
}

/// Decodes a STRING payload. The on-wire byte count includes the NUL
/// terminator, which is stripped; a zero count is the degenerate empty
/// string.
fn decode_string(src: &mut &[u8]) -> Result<Value> {
    let len = read_nnint(src)?;
    if len == 0 {
        return Ok(Value::String(String::new()));
    }
    let bytes = take(src, len)?;
    let text = std::str::from_utf8(&bytes[..bytes.len() - 1])
        .context("string payload is not valid UTF-8")?;
    Ok(Value::String(text.to_owned()))
}
