//! Archive builder: named blocks in, one deterministic container out
//!
//! An [`ArchiveBuilder`] manages a set of blocks identified by the FNV-64
//! hash of their name. [`ArchiveBuilder::compile`] lays the surviving
//! blocks out in ascending-id order through a [`WriteCursor`], appends the
//! info/hash/id trailer tables, and finishes with a footer carrying the
//! whole-archive hash. [`ArchiveBuilder::load_archive`] rebuilds the block
//! set from previously compiled bytes, verifying every integrity hash on
//! the way in, which enables open → modify → recompile workflows.
//!
//! The builder owns block *metadata* only; payloads are borrowed views into
//! caller memory (or into the archive bytes handed to `load_archive`) and
//! must stay alive through the matching `compile` call.

use ahash::AHashMap;

use crate::cursor::{PadPolicy, ReadCursor, SeekOrigin, WriteCursor};
use crate::error::{ArchiveError, Result};
use crate::format::{ArchiveHeader, BlockHeader, Footer, InfoRecord, BLOCK_ALIGNMENT, FORMAT_VERSION};
use crate::hash::{fnv1a_128, fnv1a_64, Hash128};

/// Per-block flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFlags(u32);

impl BlockFlags {
    /// Tombstoned: listed in every trailer table but with zero length.
    pub const CLEAR: BlockFlags = BlockFlags(1 << 0);
    /// Excluded from compilation and from every trailer table.
    pub const REMOVE: BlockFlags = BlockFlags(1 << 1);
    /// Payload must never be run through the block codec.
    pub const KEEP_UNCOMPRESSED: BlockFlags = BlockFlags(1 << 2);

    pub fn empty() -> Self {
        BlockFlags(0)
    }

    pub fn contains(self, other: BlockFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: BlockFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: BlockFlags) {
        self.0 &= !other.0;
    }
}

/// A named unit of bytes managed by the builder.
///
/// Identity is `id`, the FNV-64 hash of the block's name. The optional
/// sidecar header travels next to the data in the compiled archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveBlock<'a> {
    pub id: u64,
    pub block_type: u32,
    pub flags: BlockFlags,
    pub header: Option<&'a [u8]>,
    pub data: &'a [u8],
}

impl ArchiveBlock<'_> {
    fn is_cleared(&self) -> bool {
        self.flags.contains(BlockFlags::CLEAR)
    }

    fn is_removed(&self) -> bool {
        self.flags.contains(BlockFlags::REMOVE)
    }
}

/// Options for one compile pass.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Caller-defined content version stamped into the archive header
    pub data_version: u32,
    /// Caller-defined flag bits for the header and footer
    pub flags: u32,
    /// Fill policy for block alignment padding
    pub pad_policy: PadPolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            data_version: 0,
            flags: 0,
            pad_policy: PadPolicy::Hashed,
        }
    }
}

/// Assembles named byte blocks into a single deterministic,
/// integrity-checked binary container.
#[derive(Debug, Default)]
pub struct ArchiveBuilder<'a> {
    blocks: Vec<ArchiveBlock<'a>>,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new() -> Self {
        ArchiveBuilder { blocks: Vec::new() }
    }

    /// Add a block, or replace the payload of an existing block with the
    /// same id in place (its position in the builder is preserved).
    /// Returns the block's id.
    ///
    /// Names are trusted to hash uniquely; a second name colliding on the
    /// same 64-bit id silently replaces the first (last write wins).
    pub fn add_block(&mut self, name: &str, data: &'a [u8]) -> u64 {
        self.insert(name, 0, None, data)
    }

    /// [`ArchiveBuilder::add_block`] with a sidecar header.
    pub fn add_block_with_header(&mut self, name: &str, header: &'a [u8], data: &'a [u8]) -> u64 {
        self.insert(name, 0, Some(header), data)
    }

    /// [`ArchiveBuilder::add_block`] with an explicit 32-bit type tag.
    pub fn add_block_typed(
        &mut self,
        name: &str,
        block_type: u32,
        header: Option<&'a [u8]>,
        data: &'a [u8],
    ) -> u64 {
        self.insert(name, block_type, header, data)
    }

    fn insert(
        &mut self,
        name: &str,
        block_type: u32,
        header: Option<&'a [u8]>,
        data: &'a [u8],
    ) -> u64 {
        let id = fnv1a_64(name.as_bytes());
        match self.blocks.iter_mut().find(|block| block.id == id) {
            Some(block) => {
                block.block_type = block_type;
                block.flags = BlockFlags::empty();
                block.header = header;
                block.data = data;
            }
            None => self.blocks.push(ArchiveBlock {
                id,
                block_type,
                flags: BlockFlags::empty(),
                header,
                data,
            }),
        }
        id
    }

    /// Tombstone a block: it keeps its slot in every trailer table at
    /// compile time but carries zero length and no payload. Returns whether
    /// the id was known.
    pub fn clear_block(&mut self, id: u64) -> bool {
        match self.blocks.iter_mut().find(|block| block.id == id) {
            Some(block) => {
                block.flags.insert(BlockFlags::CLEAR);
                block.header = None;
                block.data = &[];
                true
            }
            None => false,
        }
    }

    /// Fully exclude a block from compilation and from every trailer
    /// table. Returns whether the id was known.
    pub fn remove_block(&mut self, id: u64) -> bool {
        match self.blocks.iter_mut().find(|block| block.id == id) {
            Some(block) => {
                block.flags.insert(BlockFlags::REMOVE);
                true
            }
            None => false,
        }
    }

    /// Snapshot of live block ids in builder-internal order (not the
    /// compiled sort order).
    pub fn block_ids(&self) -> Vec<u64> {
        self.blocks
            .iter()
            .filter(|block| !block.is_removed())
            .map(|block| block.id)
            .collect()
    }

    /// Look up a live block by id.
    pub fn block(&self, id: u64) -> Option<&ArchiveBlock<'a>> {
        self.blocks
            .iter()
            .find(|block| block.id == id && !block.is_removed())
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_removed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compile the current block set into `out`.
    ///
    /// The cursor is expected to be rewound; the archive header lands at
    /// position zero and the whole-archive hash covers everything up to the
    /// footer. Compiling an unchanged block set twice yields byte-identical
    /// output, and compiling never mutates the block set.
    pub fn compile(&self, options: &CompileOptions, out: &mut WriteCursor) -> Result<()> {
        let mut survivors: Vec<&ArchiveBlock<'a>> = self
            .blocks
            .iter()
            .filter(|block| !block.is_removed())
            .collect();
        survivors.sort_by_key(|block| block.id);

        ArchiveHeader {
            data_version: options.data_version,
            version: FORMAT_VERSION,
            flags: options.flags,
        }
        .write(out);

        // Phase one: block payloads, each padded to the block alignment.
        let mut layout: AHashMap<u64, InfoRecord> = AHashMap::with_capacity(survivors.len());
        for block in &survivors {
            let start = out.position();
            if block.is_cleared() {
                BlockHeader {
                    block_type: block.block_type,
                    header_size: 0,
                    data_size: 0,
                }
                .write(out);
            } else {
                let header = block.header.unwrap_or(&[]);
                BlockHeader {
                    block_type: block.block_type,
                    header_size: header.len() as u32,
                    data_size: block.data.len() as u64,
                }
                .write(out);
                if !header.is_empty() {
                    out.write(header);
                }
                if !block.data.is_empty() {
                    out.write(block.data);
                }
            }
            out.write_alignment(BLOCK_ALIGNMENT, options.pad_policy);

            layout.insert(
                block.id,
                InfoRecord {
                    offset: start as u64,
                    length: (out.position() - start) as u64,
                },
            );
        }

        // Phase two: three flat trailer arrays in the same sorted order,
        // then the footer. Per-block hashes re-read the bytes just written,
        // padding included.
        for block in &survivors {
            layout[&block.id].write(out);
        }
        for block in &survivors {
            let info = layout[&block.id];
            let digest = fnv1a_128(out.memory_at(info.offset as usize, info.length as usize));
            out.write(&digest.to_le_bytes());
        }
        for block in &survivors {
            out.write_u64(block.id);
        }

        let archive_hash = fnv1a_128(out.memory());
        Footer {
            flags: options.flags,
            block_count: survivors.len() as u64,
            hash: archive_hash,
        }
        .write(out);

        tracing::debug!(
            blocks = survivors.len(),
            bytes = out.position(),
            hash = %archive_hash,
            "compiled archive"
        );
        Ok(())
    }

    /// Replace this builder's block set with the blocks recorded in a
    /// previously compiled archive.
    ///
    /// Parses the header, then the footer backward from the end, then the
    /// id, hash, and info tables backward (the exact reverse of write
    /// order), then each block's header and payload forward. The
    /// whole-archive hash and every per-block hash are verified; a mismatch
    /// or any truncation fails with [`ArchiveError::CorruptArchive`] and
    /// leaves the builder untouched.
    ///
    /// Loaded blocks borrow from `bytes`.
    pub fn load_archive(&mut self, bytes: &'a [u8]) -> Result<()> {
        let mut cursor = ReadCursor::new(bytes);
        let header = ArchiveHeader::read(&mut cursor)?;

        cursor.seek(0, SeekOrigin::End);
        let footer = Footer::read_reverse(&mut cursor)?;
        let footer_start = cursor.position();

        if fnv1a_128(&bytes[..footer_start]) != footer.hash {
            tracing::warn!(expected = %footer.hash, "archive hash mismatch");
            return Err(ArchiveError::CorruptArchive("whole-archive hash mismatch"));
        }

        let count = usize::try_from(footer.block_count)
            .map_err(|_| ArchiveError::CorruptArchive("implausible block count"))?;
        let trailer_size = count
            .checked_mul(InfoRecord::SIZE + Hash128::SIZE + std::mem::size_of::<u64>())
            .ok_or(ArchiveError::CorruptArchive("implausible block count"))?;
        if ArchiveHeader::SIZE + trailer_size > footer_start {
            return Err(ArchiveError::CorruptArchive("trailer tables truncated"));
        }

        let ids = cursor.read_reverse_memory(count * 8)?;
        let hashes = cursor.read_reverse_memory(count * Hash128::SIZE)?;
        let infos = cursor.read_reverse_memory(count * InfoRecord::SIZE)?;
        let trailer_start = cursor.position();

        let mut blocks = Vec::with_capacity(count);
        for index in 0..count {
            let mut info_cursor = ReadCursor::new(&infos[index * InfoRecord::SIZE..]);
            let info = InfoRecord::read(&mut info_cursor)?;

            let offset = usize::try_from(info.offset)
                .map_err(|_| ArchiveError::CorruptArchive("block offset out of range"))?;
            let length = usize::try_from(info.length)
                .map_err(|_| ArchiveError::CorruptArchive("block length out of range"))?;
            let end = offset
                .checked_add(length)
                .filter(|&end| offset >= ArchiveHeader::SIZE && end <= trailer_start)
                .ok_or(ArchiveError::CorruptArchive("block range out of bounds"))?;

            let recorded = Hash128::from_le_bytes(
                hashes[index * Hash128::SIZE..(index + 1) * Hash128::SIZE]
                    .try_into()
                    .expect("hash record is 16 bytes"),
            );
            if fnv1a_128(&bytes[offset..end]) != recorded {
                return Err(ArchiveError::CorruptArchive("block hash mismatch"));
            }

            cursor.seek(offset as i64, SeekOrigin::Beginning);
            let block_header = BlockHeader::read(&mut cursor)?;
            let header_size = block_header.header_size as usize;
            let data_size = usize::try_from(block_header.data_size)
                .map_err(|_| ArchiveError::CorruptArchive("block data size out of range"))?;
            let payload_size = BlockHeader::SIZE
                .checked_add(header_size)
                .and_then(|size| size.checked_add(data_size))
                .ok_or(ArchiveError::CorruptArchive("block sizes out of range"))?;
            if payload_size > length {
                return Err(ArchiveError::CorruptArchive(
                    "block payload exceeds recorded length",
                ));
            }

            let sidecar = if header_size > 0 {
                Some(cursor.read_memory(header_size)?)
            } else {
                None
            };
            let data = cursor.read_memory(data_size)?;

            let id = u64::from_le_bytes(
                ids[index * 8..(index + 1) * 8]
                    .try_into()
                    .expect("id record is 8 bytes"),
            );
            blocks.push(ArchiveBlock {
                id,
                block_type: block_header.block_type,
                flags: BlockFlags::empty(),
                header: sidecar,
                data,
            });
        }

        tracing::debug!(
            blocks = blocks.len(),
            data_version = header.data_version,
            "loaded archive"
        );
        self.blocks = blocks;
        Ok(())
    }
}
