//! # Codec - BEJ encoder and decoder
//!
//! Bidirectional conversion between a JSON value tree and the BEJ (Binary
//! Encoded JSON) wire format, driven by the pre-shared dictionaries of the
//! [`dictionary`] crate and the framing primitives of [`wire`].
//!
//! ## Stream layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ HEADER (7 bytes)                              │
//! │                                               │
//! │ magic 00 F0 F1 F1 | flags (2 bytes) | class   │
//! ├───────────────────────────────────────────────┤
//! │ OUTER SFL: sequence 0, format SET             │
//! ├───────────────────────────────────────────────┤
//! │ SET payload: nnint property count, then one   │
//! │ (SFL + payload) per resolved property,        │
//! │ recursively                                   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | [`encode`] | schema-driven JSON walk, scratch-buffer length       |
//! |            | pre-computation, two-dictionary name resolution      |
//! | [`decode`] | payload-bounded SFL stream walk, sequence lookup,    |
//! |            | sign extension, enum resolution                      |
//!
//! ## Dictionary routing
//!
//! Property keys beginning with `@` resolve through the annotation
//! dictionary and carry selector bit 1 on the wire; all other keys resolve
//! through the schema dictionary subset of their parent entry. The same
//! routing applies in reverse on decode.
//!
//! ## Failure model
//!
//! Every error is fatal to the whole call: no partial JSON tree and no
//! trailing partial bytes are ever surfaced. The only forgiving behaviours
//! are skipping unresolved property names on encode and skipping payloads
//! of unhandled format codes on decode.

mod decode;
mod encode;

pub use decode::{decode_buffer, decode_reader};
pub use encode::{encode_stream, encode_to_vec};

/// Fixed stream header: 4-byte magic, 2 reserved flag bytes, schema class
/// (0x00 = major schema).
pub const STREAM_HEADER: [u8; 7] = [0x00, 0xF0, 0xF1, 0xF1, 0x00, 0x00, 0x00];

/// Hard cap on recursion depth for both walks. JSON nested deeper than
/// this is rejected rather than risking stack exhaustion.
pub const MAX_DEPTH: usize = 128;

#[cfg(test)]
mod tests;
