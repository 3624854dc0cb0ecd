//! Binary layout of a compiled archive
//!
//! All integers are little-endian. The compiled byte stream is:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ArchiveHeader (16 bytes)                     │
//! │  magic "ZARH", data version, version, flags  │
//! ├──────────────────────────────────────────────┤
//! │ Per block, ascending id, 16-byte aligned:    │
//! │  BlockHeader { type, header size, data size }│
//! │  header bytes, data bytes, padding           │
//! ├──────────────────────────────────────────────┤
//! │ InfoRecord[n]  { offset, length }            │
//! │ Hash128[n]     per-block content hash        │
//! │ u64[n]         block ids                     │
//! ├──────────────────────────────────────────────┤
//! │ Footer (32 bytes)                            │
//! │  magic "ZARF", flags, count, archive hash    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The trailer arrays share the sorted block order, so index `i` in any of
//! them refers to the same block. The footer anchors backward parsing: a
//! reader seeks to the end and reverse-reads the footer, then the id, hash,
//! and info tables, without knowing the block count up front.

use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{ArchiveError, Result};
use crate::hash::Hash128;

/// Archive header magic, "ZARH"
pub const ARCHIVE_MAGIC: [u8; 4] = *b"ZARH";

/// Footer magic, "ZARF"
pub const FOOTER_MAGIC: [u8; 4] = *b"ZARF";

/// Archive format version written into every header
pub const FORMAT_VERSION: u32 = 1;

/// Every block's compiled byte range is padded to this boundary
pub const BLOCK_ALIGNMENT: usize = 16;

/// Fixed archive header at offset zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArchiveHeader {
    pub data_version: u32,
    pub version: u32,
    pub flags: u32,
}

impl ArchiveHeader {
    pub const SIZE: usize = 16;

    pub fn write(&self, out: &mut WriteCursor) {
        out.write(&ARCHIVE_MAGIC);
        out.write_u32(self.data_version);
        out.write_u32(self.version);
        out.write_u32(self.flags);
    }

    pub fn read(cursor: &mut ReadCursor<'_>) -> Result<Self> {
        let mut magic = [0u8; 4];
        cursor.read(&mut magic)?;
        if magic != ARCHIVE_MAGIC {
            return Err(ArchiveError::InvalidMagic("archive header"));
        }
        let data_version = cursor.read_u32()?;
        let version = cursor.read_u32()?;
        let flags = cursor.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(ArchiveError::UnsupportedVersion { found: version });
        }
        Ok(ArchiveHeader {
            data_version,
            version,
            flags,
        })
    }
}

/// Per-block header preceding the block's payload bytes.
///
/// A cleared block writes zero for both sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    pub block_type: u32,
    pub header_size: u32,
    pub data_size: u64,
}

impl BlockHeader {
    pub const SIZE: usize = 16;

    pub fn write(&self, out: &mut WriteCursor) {
        out.write_u32(self.block_type);
        out.write_u32(self.header_size);
        out.write_u64(self.data_size);
    }

    pub fn read(cursor: &mut ReadCursor<'_>) -> Result<Self> {
        Ok(BlockHeader {
            block_type: cursor.read_u32()?,
            header_size: cursor.read_u32()?,
            data_size: cursor.read_u64()?,
        })
    }
}

/// Trailer record locating one block's compiled byte range.
///
/// `length` includes the block header and alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InfoRecord {
    pub offset: u64,
    pub length: u64,
}

impl InfoRecord {
    pub const SIZE: usize = 16;

    pub fn write(&self, out: &mut WriteCursor) {
        out.write_u64(self.offset);
        out.write_u64(self.length);
    }

    pub fn read(cursor: &mut ReadCursor<'_>) -> Result<Self> {
        Ok(InfoRecord {
            offset: cursor.read_u64()?,
            length: cursor.read_u64()?,
        })
    }
}

/// Fixed-size footer terminating the archive.
///
/// `hash` digests every byte before the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Footer {
    pub flags: u32,
    pub block_count: u64,
    pub hash: Hash128,
}

impl Footer {
    pub const SIZE: usize = 32;

    pub fn write(&self, out: &mut WriteCursor) {
        out.write(&FOOTER_MAGIC);
        out.write_u32(self.flags);
        out.write_u64(self.block_count);
        out.write(&self.hash.to_le_bytes());
    }

    /// Parse the footer backward from the cursor's current position (the
    /// end of the archive). On success the position rests on the footer's
    /// first byte, ready for reverse-reading the trailer tables.
    pub fn read_reverse(cursor: &mut ReadCursor<'_>) -> Result<Self> {
        let mut hash = [0u8; 16];
        cursor.read_reverse(&mut hash)?;

        let mut block_count = [0u8; 8];
        cursor.read_reverse(&mut block_count)?;

        let mut flags = [0u8; 4];
        cursor.read_reverse(&mut flags)?;

        let mut magic = [0u8; 4];
        cursor.read_reverse(&mut magic)?;
        if magic != FOOTER_MAGIC {
            return Err(ArchiveError::InvalidMagic("archive footer"));
        }

        Ok(Footer {
            flags: u32::from_le_bytes(flags),
            block_count: u64::from_le_bytes(block_count),
            hash: Hash128::from_le_bytes(hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SeekOrigin;
    use crate::hash::fnv1a_128;

    #[test]
    fn test_archive_header_round_trip() {
        let header = ArchiveHeader {
            data_version: 7,
            version: FORMAT_VERSION,
            flags: 0x11,
        };
        let mut out = WriteCursor::new();
        header.write(&mut out);
        assert_eq!(out.position(), ArchiveHeader::SIZE);

        let bytes = out.into_bytes();
        let mut cursor = ReadCursor::new(&bytes);
        assert_eq!(ArchiveHeader::read(&mut cursor).unwrap(), header);
    }

    #[test]
    fn test_archive_header_rejects_bad_magic() {
        let bytes = [0u8; ArchiveHeader::SIZE];
        let mut cursor = ReadCursor::new(&bytes);
        assert_eq!(
            ArchiveHeader::read(&mut cursor),
            Err(ArchiveError::InvalidMagic("archive header"))
        );
    }

    #[test]
    fn test_archive_header_rejects_future_version() {
        let mut out = WriteCursor::new();
        ArchiveHeader {
            data_version: 0,
            version: FORMAT_VERSION + 1,
            flags: 0,
        }
        .write(&mut out);
        let bytes = out.into_bytes();
        let mut cursor = ReadCursor::new(&bytes);
        assert_eq!(
            ArchiveHeader::read(&mut cursor),
            Err(ArchiveError::UnsupportedVersion {
                found: FORMAT_VERSION + 1
            })
        );
    }

    #[test]
    fn test_footer_reverse_round_trip() {
        let footer = Footer {
            flags: 3,
            block_count: 42,
            hash: fnv1a_128(b"archive body"),
        };
        let mut out = WriteCursor::new();
        out.write(b"some leading bytes");
        let footer_start = out.position();
        footer.write(&mut out);

        let bytes = out.into_bytes();
        let mut cursor = ReadCursor::new(&bytes);
        cursor.seek(0, SeekOrigin::End);
        assert_eq!(Footer::read_reverse(&mut cursor).unwrap(), footer);
        assert_eq!(cursor.position(), footer_start);
    }

    #[test]
    fn test_footer_rejects_bad_magic() {
        let bytes = [0u8; Footer::SIZE];
        let mut cursor = ReadCursor::new(&bytes);
        cursor.seek(0, SeekOrigin::End);
        assert_eq!(
            Footer::read_reverse(&mut cursor),
            Err(ArchiveError::InvalidMagic("archive footer"))
        );
    }

    #[test]
    fn test_block_header_size() {
        let mut out = WriteCursor::new();
        BlockHeader {
            block_type: 1,
            header_size: 2,
            data_size: 3,
        }
        .write(&mut out);
        assert_eq!(out.position(), BlockHeader::SIZE);
    }
}
