use super::{padding_for, resolve_seek, PadPolicy, SeekOrigin};
use crate::hash::fnv1a_64;

/// Default growth quantum for a growable cursor (bytes).
pub const DEFAULT_GROWTH: usize = 4096;

/// A growable, seekable write cursor over an owned byte buffer.
///
/// The buffer grows only in multiples of the growth quantum, and
/// `position <= length <= capacity` holds after every public operation.
/// The length is the high-water mark of everything written or seeked over;
/// capacity beyond it is allocation slack and never observable. A cursor
/// constructed with [`WriteCursor::fixed`] never grows; overflowing it is a
/// programmer error and panics.
pub struct WriteCursor {
    /// Backing storage; `buf.len()` is the capacity and is always
    /// zero-filled up to capacity so seeks past written data are defined.
    buf: Vec<u8>,
    pos: usize,
    /// Written length: the furthest position ever reached.
    end: usize,
    quantum: usize,
}

impl WriteCursor {
    /// Create a growable cursor with the default growth quantum.
    pub fn new() -> Self {
        WriteCursor::with_quantum(DEFAULT_GROWTH)
    }

    /// Create a growable cursor with an explicit growth quantum.
    ///
    /// A quantum of zero produces a cursor that cannot grow at all; prefer
    /// [`WriteCursor::fixed`] for that, which also preallocates.
    pub fn with_quantum(quantum: usize) -> Self {
        WriteCursor {
            buf: Vec::new(),
            pos: 0,
            end: 0,
            quantum,
        }
    }

    /// Create a non-growable cursor with a preallocated capacity.
    pub fn fixed(capacity: usize) -> Self {
        WriteCursor {
            buf: vec![0; capacity],
            pos: 0,
            end: 0,
            quantum: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Written length: the furthest position writing or seeking has reached.
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Move the position, growing the buffer first if the target exceeds
    /// capacity. Returns the previous position. Negative targets clamp to
    /// zero. [`SeekOrigin::End`] is the written length, not the allocated
    /// capacity; seeking past the written length extends it, and the gap
    /// reads as zero.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> usize {
        let target = resolve_seek(origin, offset, self.pos, self.end);
        self.grow_to(target);
        self.end = self.end.max(target);
        std::mem::replace(&mut self.pos, target)
    }

    /// Rewind to position zero and discard the written length, keeping the
    /// allocation for reuse.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.end = 0;
    }

    /// View of all bytes written so far, independent of the current
    /// position.
    pub fn memory(&self) -> &[u8] {
        &self.buf[..self.end]
    }

    /// View of an arbitrary already-written range.
    ///
    /// The range must lie within capacity; violating that is a programmer
    /// error and panics.
    pub fn memory_at(&self, offset: usize, size: usize) -> &[u8] {
        &self.buf[offset..offset + size]
    }

    /// Carve a nested fixed-size writer over the next `size` bytes and
    /// advance this cursor past it. The sub-writer starts at position zero
    /// and cannot grow; it exists for backpatching a reserved region later
    /// in the write sequence.
    pub fn slice(&mut self, size: usize) -> SliceWriter<'_> {
        let start = self.pos;
        self.grow_to(start + size);
        self.pos = start + size;
        self.end = self.end.max(self.pos);
        SliceWriter {
            buf: &mut self.buf[start..start + size],
            pos: 0,
        }
    }

    /// Copy `bytes` at the current position, growing if needed, and advance.
    /// Returns the offset the data was written at.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let offset = self.pos;
        self.grow_to(offset + bytes.len());
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.pos = offset + bytes.len();
        self.end = self.end.max(self.pos);
        offset
    }

    /// Seek, write, then restore the prior position. This is the backpatch
    /// primitive for fixing up header fields once trailing sizes are known.
    ///
    /// Returns the post-restore position, not the offset written at. The
    /// asymmetry with [`WriteCursor::write`] is intentional and kept for
    /// compatibility with existing callers.
    pub fn write_at(&mut self, bytes: &[u8], offset: i64, origin: SeekOrigin) -> usize {
        let prev = self.seek(offset, origin);
        self.write(bytes);
        self.seek(prev as i64, SeekOrigin::Beginning);
        self.pos
    }

    pub fn write_u8(&mut self, value: u8) -> usize {
        self.write(&[value])
    }

    pub fn write_u32(&mut self, value: u32) -> usize {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> usize {
        self.write(&value.to_le_bytes())
    }

    /// Advance to the next `alignment` boundary, filling the gap according
    /// to `policy`. A position already on the boundary writes nothing, so
    /// calling this twice in a row is a no-op the second time.
    pub fn write_alignment(&mut self, alignment: usize, policy: PadPolicy) {
        let pad = padding_for(self.pos, alignment);
        for _ in 0..pad {
            let byte = match policy {
                PadPolicy::Fill(value) => value,
                PadPolicy::Hashed => fnv1a_64(&(self.pos as u64).to_le_bytes()) as u8,
            };
            self.write(&[byte]);
        }
    }

    /// Consume the cursor, returning all written bytes regardless of where
    /// the position was left.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.end);
        self.buf
    }

    fn grow_to(&mut self, needed: usize) {
        if needed <= self.buf.len() {
            return;
        }
        assert!(
            self.quantum != 0,
            "write cursor overflow: capacity {} exceeded with growth disabled",
            self.buf.len()
        );
        let quanta = needed.div_ceil(self.quantum);
        self.buf.resize(quanta * self.quantum, 0);
    }
}

impl Default for WriteCursor {
    fn default() -> Self {
        WriteCursor::new()
    }
}

/// A nested, fixed-size write cursor over a region reserved by
/// [`WriteCursor::slice`]. Writing past the region is a programmer error
/// and panics.
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Move the position within the reserved region; returns the previous
    /// position. Targets past the region clamp to its end.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> usize {
        let target = resolve_seek(origin, offset, self.pos, self.buf.len()).min(self.buf.len());
        std::mem::replace(&mut self.pos, target)
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let offset = self.pos;
        assert!(
            offset + bytes.len() <= self.buf.len(),
            "slice writer overflow: {} bytes into a {} byte region at position {}",
            bytes.len(),
            self.buf.len(),
            offset
        );
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.pos = offset + bytes.len();
        offset
    }

    pub fn write_u32(&mut self, value: u32) -> usize {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> usize {
        self.write(&value.to_le_bytes())
    }
}
