use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("invalid magic number in {0}")]
    InvalidMagic(&'static str),

    #[error("unsupported archive format version: {found}")]
    UnsupportedVersion { found: u32 },

    #[error("corrupt archive: {0}")]
    CorruptArchive(&'static str),

    #[error("read past the end of the buffer")]
    OutOfBounds,

    #[error("input ended before decoding finished")]
    TruncatedInput,

    #[error("decoded data would exceed the destination size")]
    TruncatedOutput,

    #[error("back-reference reaches before the start of the output")]
    InvalidBackReference,
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
