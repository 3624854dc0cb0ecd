//! ZArchive: content-addressed binary archive format
//!
//! A deterministic, integrity-checked container for named byte blocks,
//! built for asset pipelines that need byte-identical output from identical
//! input and cheap incremental edits.
//!
//! ## Features
//!
//! - **Content-addressed blocks**: ids are FNV-64 hashes of block names
//! - **Deterministic layout**: blocks sorted by id, reproducible padding
//! - **Integrity hashing**: FNV-128 digest per block and for the whole file
//! - **Backward-readable trailers**: a reader finds the footer at the end
//!   of the file and parses the index tables in reverse, with no block
//!   count known up front
//! - **Incremental edits**: clear (tombstone) or remove blocks and
//!   recompile without disturbing unrelated ids
//! - **LZF block codec**: standalone greedy LZ77 compressor/decompressor
//!
//! ## Example
//!
//! ```rust
//! use zarchive::{ArchiveBuilder, CompileOptions, WriteCursor};
//!
//! # fn main() -> zarchive::Result<()> {
//! let mut builder = ArchiveBuilder::new();
//! builder.add_block("meshes/crate", b"mesh bytes");
//! let id = builder.add_block("textures/crate", b"texture bytes");
//!
//! let mut out = WriteCursor::new();
//! builder.compile(&CompileOptions::default(), &mut out)?;
//! let bytes = out.into_bytes();
//!
//! // Reload, tombstone one block, compile again
//! let mut edited = ArchiveBuilder::new();
//! edited.load_archive(&bytes)?;
//! edited.clear_block(id);
//!
//! let mut out = WriteCursor::new();
//! edited.compile(&CompileOptions::default(), &mut out)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header: magic "ZARH", versions, flags        │
//! ├──────────────────────────────────────────────┤
//! │ Blocks, ascending id, 16-byte aligned        │
//! ├──────────────────────────────────────────────┤
//! │ Trailers: info[n] │ hash[n] │ id[n]          │
//! ├──────────────────────────────────────────────┤
//! │ Footer: magic "ZARF", count, archive hash    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The engine is synchronous and allocation-light: block payloads are
//! borrowed views into caller memory, and the only owned buffer is the
//! [`WriteCursor`] the caller hands to [`ArchiveBuilder::compile`]. Nothing
//! here touches files or sockets; the compiled bytes go wherever the caller
//! sends them.

pub mod archive;
pub mod codec;
pub mod cursor;
pub mod error;
pub mod format;
pub mod hash;

pub use archive::{ArchiveBlock, ArchiveBuilder, BlockFlags, CompileOptions};
pub use cursor::{PadPolicy, ReadCursor, SeekOrigin, SliceWriter, WriteCursor};
pub use error::{ArchiveError, Result};
pub use format::{ARCHIVE_MAGIC, BLOCK_ALIGNMENT, FOOTER_MAGIC, FORMAT_VERSION};
pub use hash::{fnv1a_128, fnv1a_64, Hash128};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
