use crate::{Dictionary, Entry, CHILD_COUNT_WILDCARD, ENTRIES_OFFSET, ENTRY_SIZE};

/// Position + count iterator over a run of packed dictionary entries.
///
/// Three construction modes:
///
/// - [`root`](EntryCursor::root): starts at the first entry with an
///   implicit count of 1. Callers wanting more follow child pointers.
/// - [`subset`](EntryCursor::subset) with an ordinary count: yields exactly
///   that many entries (or fewer if the buffer ends early).
/// - [`subset`](EntryCursor::subset) with `0xFFFF`: unbounded, proceeds to
///   the end of the buffer. Used to search the annotation dictionary
///   globally by sequence.
pub struct EntryCursor<'a> {
    bytes: &'a [u8],
    /// Byte offset of the next entry to decode.
    index: usize,
    /// Entries left to yield; `None` means unbounded.
    remaining: Option<u16>,
}

impl<'a> EntryCursor<'a> {
    /// Cursor over the top level of the dictionary: the single root entry.
    #[must_use]
    pub fn root(dict: &'a Dictionary) -> Self {
        Self {
            bytes: dict.as_bytes(),
            index: ENTRIES_OFFSET as usize,
            remaining: Some(1),
        }
    }

    /// Cursor over the subset starting at byte `offset` with `count`
    /// entries. A count of `0xFFFF` iterates until the end of the buffer.
    #[must_use]
    pub fn subset(dict: &'a Dictionary, offset: u16, count: u16) -> Self {
        Self {
            bytes: dict.as_bytes(),
            index: offset as usize,
            remaining: if count == CHILD_COUNT_WILDCARD {
                None
            } else {
                Some(count)
            },
        }
    }

    /// Decodes the next entry and advances, or returns `None` when the
    /// subset (or the buffer) is exhausted. An entry that would extend
    /// past the end of the buffer is never yielded.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Entry> {
        if self.remaining == Some(0) {
            return None;
        }
        let entry = Entry::decode(self.bytes, self.index)?;

        self.index += ENTRY_SIZE;
        if let Some(left) = self.remaining.as_mut() {
            *left -= 1;
        }
        Some(entry)
    }

    /// Byte offset of the next entry this cursor would decode.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }
}
