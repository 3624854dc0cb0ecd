use super::{padding_for, resolve_seek, SeekOrigin};
use crate::error::{ArchiveError, Result};
use crate::hash::Hash128;

/// A read cursor over an externally owned, fixed byte view.
///
/// Never owns memory; the view must outlive the cursor. Reads that would
/// exceed the view return [`ArchiveError::OutOfBounds`] without moving the
/// position.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ReadCursor { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the position; returns the previous position. Negative targets
    /// clamp to zero, targets past the end clamp to the end.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> usize {
        let target = resolve_seek(origin, offset, self.pos, self.data.len()).min(self.data.len());
        std::mem::replace(&mut self.pos, target)
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// The entire underlying view.
    pub fn memory(&self) -> &'a [u8] {
        self.data
    }

    /// A sub-view of the underlying bytes, independent of the position.
    pub fn memory_at(&self, offset: usize, size: usize) -> Result<&'a [u8]> {
        self.data
            .get(offset..offset + size)
            .ok_or(ArchiveError::OutOfBounds)
    }

    /// Copy forward into `out` and advance.
    pub fn read(&mut self, out: &mut [u8]) -> Result<()> {
        let span = self
            .data
            .get(self.pos..self.pos + out.len())
            .ok_or(ArchiveError::OutOfBounds)?;
        out.copy_from_slice(span);
        self.pos += out.len();
        Ok(())
    }

    /// Move the position backward by `out.len()` first, then copy forward
    /// from the new position. The position stays at the retreated offset, so
    /// consecutive reverse reads parse fixed-size trailer records from the
    /// end of a buffer in reverse field order.
    pub fn read_reverse(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() > self.pos {
            return Err(ArchiveError::OutOfBounds);
        }
        self.pos -= out.len();
        out.copy_from_slice(&self.data[self.pos..self.pos + out.len()]);
        Ok(())
    }

    /// Zero-copy sub-view of the next `size` bytes; advances.
    pub fn read_memory(&mut self, size: usize) -> Result<&'a [u8]> {
        let span = self
            .data
            .get(self.pos..self.pos + size)
            .ok_or(ArchiveError::OutOfBounds)?;
        self.pos += size;
        Ok(span)
    }

    /// Zero-copy sub-view of the `size` bytes ending at the current
    /// position; the position retreats to the start of the view.
    pub fn read_reverse_memory(&mut self, size: usize) -> Result<&'a [u8]> {
        if size > self.pos {
            return Err(ArchiveError::OutOfBounds);
        }
        self.pos -= size;
        Ok(&self.data[self.pos..self.pos + size])
    }

    /// Nested read cursor over the next `size` bytes; advances past them.
    pub fn slice(&mut self, size: usize) -> Result<ReadCursor<'a>> {
        Ok(ReadCursor::new(self.read_memory(size)?))
    }

    /// Advance the position to the next `alignment` boundary without
    /// reading. The writer's padding is recoverable from position alone.
    pub fn read_alignment(&mut self, alignment: usize) -> Result<()> {
        let pad = padding_for(self.pos, alignment);
        if self.pos + pad > self.data.len() {
            return Err(ArchiveError::OutOfBounds);
        }
        self.pos += pad;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_hash128(&mut self) -> Result<Hash128> {
        let mut buf = [0u8; 16];
        self.read(&mut buf)?;
        Ok(Hash128::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances() {
        let data = b"hello world";
        let mut cursor = ReadCursor::new(data);
        let mut buf = [0u8; 5];
        cursor.read(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.remaining(), 6);
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let mut cursor = ReadCursor::new(b"abc");
        let mut buf = [0u8; 4];
        assert_eq!(cursor.read(&mut buf), Err(ArchiveError::OutOfBounds));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_reverse_parses_trailing_fields() {
        // Two little-endian u32 fields written in order: 1 then 2
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());

        let mut cursor = ReadCursor::new(&data);
        cursor.seek(0, SeekOrigin::End);

        // Reverse reads surface the fields in reverse write order
        let mut buf = [0u8; 4];
        cursor.read_reverse(&mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 2);
        cursor.read_reverse(&mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 1);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_reverse_underflow_fails_without_moving() {
        let mut cursor = ReadCursor::new(b"ab");
        cursor.seek(0, SeekOrigin::End);
        let mut buf = [0u8; 3];
        assert_eq!(cursor.read_reverse(&mut buf), Err(ArchiveError::OutOfBounds));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_read_memory_is_zero_copy() {
        let data = b"0123456789";
        let mut cursor = ReadCursor::new(data);
        cursor.seek(2, SeekOrigin::Beginning);
        let view = cursor.read_memory(4).unwrap();
        assert_eq!(view, b"2345");
        assert_eq!(view.as_ptr(), data[2..].as_ptr());
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_slice_is_nested_cursor() {
        let mut cursor = ReadCursor::new(b"abcdef");
        let mut inner = cursor.slice(3).unwrap();
        assert_eq!(inner.read_u8().unwrap(), b'a');
        assert_eq!(inner.len(), 3);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_read_alignment_advances_to_boundary() {
        let data = [0u8; 32];
        let mut cursor = ReadCursor::new(&data);
        cursor.seek(5, SeekOrigin::Beginning);
        cursor.read_alignment(16).unwrap();
        assert_eq!(cursor.position(), 16);
        cursor.read_alignment(16).unwrap();
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_read_alignment_past_end_fails() {
        let data = [0u8; 10];
        let mut cursor = ReadCursor::new(&data);
        cursor.seek(9, SeekOrigin::Beginning);
        assert_eq!(cursor.read_alignment(16), Err(ArchiveError::OutOfBounds));
    }

    #[test]
    fn test_typed_reads() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xAABB_CCDDu32.to_le_bytes());
        data.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
        let mut cursor = ReadCursor::new(&data);
        assert_eq!(cursor.read_u32().unwrap(), 0xAABB_CCDD);
        assert_eq!(cursor.read_u64().unwrap(), 0x1122_3344_5566_7788);
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn test_seek_clamps_both_ends() {
        let mut cursor = ReadCursor::new(b"abcdef");
        cursor.seek(-10, SeekOrigin::End);
        assert_eq!(cursor.position(), 0);
        cursor.seek(100, SeekOrigin::Beginning);
        assert_eq!(cursor.position(), 6);
    }
}
