//! Schema-driven BEJ encoder.
//!
//! Walks the JSON tree with a dictionary entry as context. SFL headers
//! carry the payload length, so every payload is staged into a scratch
//! `Vec<u8>` first, measured, and only then framed and copied out. Scratch
//! buffers nest with the recursion and die at frame exit.

use anyhow::{bail, Context, Result};
use dictionary::{Dictionary, Entry, EntryCursor, ENTRIES_OFFSET};
use serde_json::Value;
use std::io::Write;
use wire::{
    nnint_width, write_nnint, write_packed_int, write_sfl, Format, SELECTOR_ANNOTATION,
    SELECTOR_SCHEMA,
};

use crate::{MAX_DEPTH, STREAM_HEADER};

/// Encodes `root` against the schema dictionary and writes the complete
/// BEJ stream (7-byte header, outer SET SFL, payload) to `sink`.
///
/// # Errors
///
/// Fails if the root value is not a JSON object, if the schema dictionary
/// has no root entry, if a value's JSON type disagrees with its dictionary
/// format, or on any I/O error. Properties whose names resolve in neither
/// dictionary are silently skipped.
pub fn encode_stream<W: Write>(
    sink: &mut W,
    root: &Value,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<()> {
    if !root.is_object() {
        bail!("top-level JSON value must be an object");
    }
    let root_entry = schema
        .root()
        .context("schema dictionary has no root entry")?;

    let mut payload = Vec::new();
    encode_set_payload(&mut payload, root, &root_entry, schema, annotations, 0)?;

    sink.write_all(&STREAM_HEADER)?;
    write_sfl(sink, 0, SELECTOR_SCHEMA, Format::Set, payload.len() as u64)?;
    sink.write_all(&payload)?;
    Ok(())
}

/// Convenience wrapper returning the encoded stream as a byte vector.
pub fn encode_to_vec(
    root: &Value,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_stream(&mut out, root, schema, annotations)?;
    Ok(out)
}

/// Resolves a property key to a dictionary entry and selector.
///
/// `@`-prefixed keys search the annotation dictionary over its full entry
/// range; all other keys search the parent entry's child subset of the
/// schema dictionary. `None` means the property is unknown and will be
/// skipped.
fn resolve_property(
    key: &str,
    parent: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Option<(Entry, u8)> {
    if key.starts_with('@') {
        let annotations = annotations?;
        annotations
            .find_by_name(ENTRIES_OFFSET, annotations.entry_count(), key)
            .map(|e| (e, SELECTOR_ANNOTATION))
    } else {
        schema
            .find_by_name(parent.child_pointer, parent.child_count, key)
            .map(|e| (e, SELECTOR_SCHEMA))
    }
}

/// Encodes a SET payload: NNINT count of resolved properties, then each
/// resolved property in JSON insertion order.
fn encode_set_payload(
    out: &mut Vec<u8>,
    value: &Value,
    parent: &Entry,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<()> {
    let Value::Object(object) = value else {
        bail!(
            "property {:?} is a SET in the dictionary but not an object in the JSON",
            parent.name.as_deref().unwrap_or("<root>")
        );
    };

    // one resolution pass feeds both the count and the emission loop;
    // unknown names drop out of both
    let mut resolved = Vec::new();
    for (key, val) in object {
        if let Some((entry, selector)) = resolve_property(key, parent, schema, annotations) {
            resolved.push((entry, selector, val));
        }
    }

    write_nnint(out, resolved.len() as u64)?;
    for (entry, selector, val) in resolved {
        let sequence = u64::from(entry.sequence);
        encode_value(out, &entry, sequence, selector, val, schema, annotations, depth)?;
    }
    Ok(())
}

/// Encodes an ARRAY payload: NNINT element count, then each element
/// against the array's sole element archetype, with the element index as
/// its sequence number. The archetype lives in the annotation dictionary
/// when the array itself is an annotation property.
fn encode_array_payload(
    out: &mut Vec<u8>,
    array_entry: &Entry,
    selector: u8,
    value: &Value,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<()> {
    let Value::Array(items) = value else {
        bail!(
            "property {:?} is an ARRAY in the dictionary but not an array in the JSON",
            array_entry.name.as_deref().unwrap_or("?")
        );
    };

    let dict = if array_entry.is_annotation() {
        annotations.context("annotation array without an annotation dictionary")?
    } else {
        schema
    };
    let archetype = EntryCursor::subset(dict, array_entry.child_pointer, array_entry.child_count)
        .next()
        .with_context(|| {
            format!(
                "array entry {:?} has no element archetype",
                array_entry.name.as_deref().unwrap_or("?")
            )
        })?;

    write_nnint(out, items.len() as u64)?;
    for (index, item) in items.iter().enumerate() {
        encode_value(
            out,
            &archetype,
            index as u64,
            selector,
            item,
            schema,
            annotations,
            depth,
        )?;
    }
    Ok(())
}

/// Encodes an ENUM payload: NNINT minimal byte width of the sequence, then
/// the sequence itself as an NNINT. The JSON string must name one of the
/// entry's children.
fn encode_enum_payload(
    out: &mut Vec<u8>,
    entry: &Entry,
    selector: u8,
    value: &Value,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
) -> Result<()> {
    let Value::String(wanted) = value else {
        bail!(
            "property {:?} is an ENUM in the dictionary but not a string in the JSON",
            entry.name.as_deref().unwrap_or("?")
        );
    };

    let dict = if selector == SELECTOR_ANNOTATION {
        annotations.context("annotation enum without an annotation dictionary")?
    } else {
        schema
    };

    let mut cursor = EntryCursor::subset(dict, entry.child_pointer, entry.child_count);
    let sequence = loop {
        match cursor.next() {
            Some(child) if child.name.as_deref() == Some(wanted.as_str()) => break child.sequence,
            Some(_) => continue,
            None => bail!(
                "enum value {:?} not defined for property {:?}",
                wanted,
                entry.name.as_deref().unwrap_or("?")
            ),
        }
    };

    write_nnint(out, nnint_width(u64::from(sequence)) as u64)?;
    write_nnint(out, u64::from(sequence))?;
    Ok(())
}

/// Encodes one complete value: stages the payload into a scratch buffer,
/// then emits `SFL(sequence | selector, format, payload_len)` followed by
/// the payload.
#[allow(clippy::too_many_arguments)]
fn encode_value(
    out: &mut Vec<u8>,
    entry: &Entry,
    sequence: u64,
    selector: u8,
    value: &Value,
    schema: &Dictionary,
    annotations: Option<&Dictionary>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        bail!("JSON nested deeper than {MAX_DEPTH} levels");
    }

    let format = Format::from_code(entry.format).with_context(|| {
        format!(
            "dictionary entry {:?} carries unknown format code {:#x}",
            entry.name.as_deref().unwrap_or("?"),
            entry.format
        )
    })?;

    let mut payload = Vec::new();
    match format {
        Format::Set => {
            encode_set_payload(&mut payload, value, entry, schema, annotations, depth + 1)?;
        }
        Format::Array => {
            encode_array_payload(
                &mut payload,
                entry,
                selector,
                value,
                schema,
                annotations,
                depth + 1,
            )?;
        }
        Format::Integer => {
            // exact for anything that fits an i64; fractional numbers
            // truncate toward zero
            let number = value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f as i64))
                .with_context(|| {
                    format!(
                        "property {:?} is an INTEGER in the dictionary but not a number in the JSON",
                        entry.name.as_deref().unwrap_or("?")
                    )
                })?;
            write_packed_int(&mut payload, number)?;
        }
        Format::String => {
            let s = value.as_str().with_context(|| {
                format!(
                    "property {:?} is a STRING in the dictionary but not a string in the JSON",
                    entry.name.as_deref().unwrap_or("?")
                )
            })?;
            // on-wire byte count includes the NUL terminator
            write_nnint(&mut payload, s.len() as u64 + 1)?;
            payload.extend_from_slice(s.as_bytes());
            payload.push(0);
        }
        Format::Boolean => {
            let b = value.as_bool().with_context(|| {
                format!(
                    "property {:?} is a BOOLEAN in the dictionary but not a boolean in the JSON",
                    entry.name.as_deref().unwrap_or("?")
                )
            })?;
            write_nnint(&mut payload, 1)?;
            payload.push(u8::from(b));
        }
        Format::Enum => {
            encode_enum_payload(&mut payload, entry, selector, value, schema, annotations)?;
        }
        Format::Null => {
            if !value.is_null() {
                bail!(
                    "property {:?} is NULL in the dictionary but not null in the JSON",
                    entry.name.as_deref().unwrap_or("?")
                );
            }
            // empty payload
        }
        Format::Real | Format::PropertyAnnotation | Format::ResourceLink => {
            bail!(
                "property {:?} uses format {:?}, which this encoder does not support",
                entry.name.as_deref().unwrap_or("?"),
                format
            );
        }
    }

    write_sfl(out, sequence, selector, format, payload.len() as u64)?;
    out.extend_from_slice(&payload);
    Ok(())
}
