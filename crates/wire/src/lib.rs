//! # Wire — BEJ framing primitives
//!
//! Low-level byte encoding shared by the BEJ encoder and decoder: NNINT
//! variable-width integers, SFL value headers, and minimal-width signed
//! integer packing.
//!
//! ## NNINT
//!
//! ```text
//! [len: u8][payload: len bytes, little-endian]
//! ```
//!
//! `len` is in `1..=8`. Zero encodes as `01 00`, never as `len = 0` — a
//! zero-length NNINT on the wire is a protocol error, as is any `len > 8`.
//!
//! ## SFL — Sequence, Format, Length
//!
//! Every encoded BEJ value is introduced by an SFL tuple:
//!
//! ```text
//! [sequence: nnint][format_flags: u8][length: nnint]
//! ```
//!
//! The sequence NNINT packs `(sequence_number << 1) | selector`; the low bit
//! selects the dictionary (0 = schema, 1 = annotation). The format byte's
//! upper nibble is the format code, the lower nibble the BEJ flags.
//! `length` counts the payload bytes that follow the tuple.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use wire::{read_nnint, write_nnint};
//!
//! let mut buf = Vec::new();
//! write_nnint(&mut buf, 300).unwrap();
//! assert_eq!(buf, [0x02, 0x2C, 0x01]);
//! assert_eq!(read_nnint(&mut Cursor::new(&buf)).unwrap(), 300);
//! ```

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use thiserror::Error;

/// Dictionary selector carried in the low bit of the on-wire sequence.
pub const SELECTOR_SCHEMA: u8 = 0;
/// Selector value routing a property to the annotation dictionary.
pub const SELECTOR_ANNOTATION: u8 = 1;

/// BEJ format codes (upper nibble of the SFL format byte and of a
/// dictionary entry's first byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Set,
    Array,
    Null,
    Integer,
    Enum,
    String,
    Real,
    Boolean,
    PropertyAnnotation,
    ResourceLink,
}

impl Format {
    /// Maps a raw 4-bit code to a known format, or `None` for codes this
    /// codec does not recognise.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Format> {
        match code {
            0x00 => Some(Format::Set),
            0x01 => Some(Format::Array),
            0x02 => Some(Format::Null),
            0x03 => Some(Format::Integer),
            0x04 => Some(Format::Enum),
            0x05 => Some(Format::String),
            0x06 => Some(Format::Real),
            0x07 => Some(Format::Boolean),
            0x0A => Some(Format::PropertyAnnotation),
            0x0E => Some(Format::ResourceLink),
            _ => None,
        }
    }

    /// The raw 4-bit wire code for this format.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Format::Set => 0x00,
            Format::Array => 0x01,
            Format::Null => 0x02,
            Format::Integer => 0x03,
            Format::Enum => 0x04,
            Format::String => 0x05,
            Format::Real => 0x06,
            Format::Boolean => 0x07,
            Format::PropertyAnnotation => 0x0A,
            Format::ResourceLink => 0x0E,
        }
    }
}

/// Errors produced by the framing primitives.
#[derive(Debug, Error)]
pub enum WireError {
    /// An underlying I/O error (including short reads past end of stream).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An NNINT declared a zero-length payload.
    #[error("zero-length nnint")]
    EmptyNnint,

    /// An NNINT declared a payload longer than 8 bytes.
    #[error("nnint length {0} exceeds 8 bytes")]
    OverlongNnint(u8),

    /// A packed integer payload declared a width outside `1..=8`.
    #[error("integer width {0} outside 1..=8")]
    BadIntegerWidth(u64),
}

/// Minimal number of payload bytes needed to represent `v` as an NNINT
/// (always at least 1 — zero occupies a single payload byte).
#[must_use]
pub fn nnint_width(v: u64) -> usize {
    let mut n = 1;
    let mut rest = v >> 8;
    while rest != 0 {
        n += 1;
        rest >>= 8;
    }
    n
}

/// Reads an NNINT from `src` and assembles its little-endian payload.
pub fn read_nnint<R: Read>(src: &mut R) -> Result<u64, WireError> {
    let len = src.read_u8()?;
    if len == 0 {
        return Err(WireError::EmptyNnint);
    }
    if len > 8 {
        return Err(WireError::OverlongNnint(len));
    }
    let mut bytes = [0u8; 8];
    src.read_exact(&mut bytes[..len as usize])?;
    Ok(u64::from_le_bytes(bytes))
}

/// Writes `v` as an NNINT using the minimal payload width.
pub fn write_nnint<W: Write>(sink: &mut W, v: u64) -> Result<(), WireError> {
    let width = nnint_width(v);
    sink.write_u8(width as u8)?;
    sink.write_all(&v.to_le_bytes()[..width])?;
    Ok(())
}

/// Writes `v` as a length-prefixed two's-complement integer using the
/// smallest width in `1..=8` that preserves the sign.
///
/// Layout: `[width: nnint][bytes: width, little-endian]`. Starting from the
/// full 8-byte representation, the top byte is dropped while it is a pure
/// sign extension of the byte below it (`0x00` over a clear sign bit, or
/// `0xFF` over a set one).
pub fn write_packed_int<W: Write>(sink: &mut W, v: i64) -> Result<(), WireError> {
    let bytes = v.to_le_bytes();
    let mut width = 8;
    while width > 1 {
        let top = bytes[width - 1];
        let below_sign = bytes[width - 2] & 0x80 != 0;
        let redundant = (top == 0x00 && !below_sign) || (top == 0xFF && below_sign);
        if !redundant {
            break;
        }
        width -= 1;
    }
    write_nnint(sink, width as u64)?;
    sink.write_all(&bytes[..width])?;
    Ok(())
}

/// Reads a length-prefixed packed integer and sign-extends it to 64 bits.
pub fn read_packed_int<R: Read>(src: &mut R) -> Result<i64, WireError> {
    let width = read_nnint(src)?;
    if width == 0 || width > 8 {
        return Err(WireError::BadIntegerWidth(width));
    }
    let width = width as usize;
    let mut bytes = [0u8; 8];
    src.read_exact(&mut bytes[..width])?;

    // sign-extend from the top bit of the last retained byte
    if bytes[width - 1] & 0x80 != 0 {
        for b in bytes.iter_mut().skip(width) {
            *b = 0xFF;
        }
    }
    Ok(i64::from_le_bytes(bytes))
}

/// A decoded SFL header with the sequence already split from its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sfl {
    /// Sequence number with the selector bit removed.
    pub sequence: u64,
    /// Dictionary selector (0 = schema, 1 = annotation).
    pub selector: u8,
    /// Raw 4-bit format code (may be a code this codec does not handle).
    pub format: u8,
    /// Lower-nibble BEJ flags (deferred binding, nested annotation).
    pub flags: u8,
    /// Payload byte count following the header.
    pub length: u64,
}

/// Reads one SFL tuple from `src`.
pub fn read_sfl<R: Read>(src: &mut R) -> Result<Sfl, WireError> {
    let raw_seq = read_nnint(src)?;
    let format_flags = src.read_u8()?;
    let length = read_nnint(src)?;
    Ok(Sfl {
        sequence: raw_seq >> 1,
        selector: (raw_seq & 0x01) as u8,
        format: format_flags >> 4,
        flags: format_flags & 0x0F,
        length,
    })
}

/// Writes one SFL tuple: sequence and selector packed into a single NNINT,
/// the format code in the upper nibble (flags zero), then the length.
pub fn write_sfl<W: Write>(
    sink: &mut W,
    sequence: u64,
    selector: u8,
    format: Format,
    length: u64,
) -> Result<(), WireError> {
    write_nnint(sink, (sequence << 1) | u64::from(selector & 0x01))?;
    sink.write_u8(format.code() << 4)?;
    write_nnint(sink, length)
}
