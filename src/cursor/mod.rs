//! Position-tracked byte-buffer cursors
//!
//! Foundation for the archive compiler and loader:
//!
//! - [`WriteCursor`] owns a growable buffer and supports seeking,
//!   backpatching ([`WriteCursor::write_at`]), alignment padding, and nested
//!   fixed-size sub-writers ([`WriteCursor::slice`]).
//! - [`ReadCursor`] is a non-owning view with forward and reverse reads;
//!   reverse reads are how fixed-size trailer records are parsed from the
//!   end of an archive without knowing its layout up front.
//!
//! Out-of-range reads return [`ArchiveError::OutOfBounds`](crate::error::ArchiveError)
//! and leave the position untouched. Overflowing a non-growable writer is a
//! programmer error and panics.

mod read;
mod write;

pub use read::ReadCursor;
pub use write::{SliceWriter, WriteCursor};

/// Reference point for [`WriteCursor::seek`] and [`ReadCursor::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Offset relative to the start of the buffer
    Beginning,
    /// Offset relative to the current position
    Position,
    /// Offset relative to the end of the buffer
    End,
    /// Absolute byte offset
    Exact,
}

/// Fill policy for alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadPolicy {
    /// Pad with a constant byte
    Fill(u8),
    /// Pad with a deterministic byte derived by hashing the pad position.
    ///
    /// Keeps padding reproducible and diff-friendly without writing a fixed
    /// sentinel value.
    Hashed,
}

impl Default for PadPolicy {
    fn default() -> Self {
        PadPolicy::Hashed
    }
}

/// Resolve a seek target, clamping underflow to zero.
pub(crate) fn resolve_seek(origin: SeekOrigin, offset: i64, pos: usize, end: usize) -> usize {
    let base = match origin {
        SeekOrigin::Beginning | SeekOrigin::Exact => 0i128,
        SeekOrigin::Position => pos as i128,
        SeekOrigin::End => end as i128,
    };
    let target = base + offset as i128;
    if target < 0 {
        0
    } else {
        target as usize
    }
}

/// Bytes needed to advance `pos` to the next multiple of `alignment`.
pub(crate) fn padding_for(pos: usize, alignment: usize) -> usize {
    debug_assert!(alignment > 0, "alignment must be non-zero");
    let rem = pos % alignment;
    if rem == 0 {
        0
    } else {
        alignment - rem
    }
}
