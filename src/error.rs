//! Error taxonomy for the tablebase builder, one enum per fallible boundary.
//!
//! Programmer errors (invariant violations, index-out-of-range, races on a
//! write-once field) are never represented here: they `assert!`/`panic!` and
//! are never recovered, matching the error handling design of the project.

use std::io;
use std::path::PathBuf;

/// Errors raised while validating board/block dimensions before any
/// allocation happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board width {board} is not a multiple of block width {block}")]
    WidthNotDivisible { board: u32, block: u32 },

    #[error("board height {board} is not a multiple of block height {block}")]
    HeightNotDivisible { board: u32, block: u32 },

    #[error("board dimensions must be at least 1x1, got {0}x{1}")]
    ZeroDimension(u32, u32),

    #[error("block dimensions must be at least 1x1, got {0}x{1}")]
    ZeroBlockDimension(u32, u32),

    #[error("record width of {bits} bits does not fit in a 64-bit record")]
    RecordTooWide { bits: u32 },
}

/// Errors raised while writing or reading the record store to/from disk.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("refusing to overwrite existing tablebase file at {0}")]
    AlreadyExists(PathBuf),

    #[error("tablebase file {0} does not exist")]
    NotFound(PathBuf),

    #[error("tablebase file has size {actual} bytes, expected {expected} bytes for this board configuration")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("tablebase file is missing or has a corrupt completion trailer")]
    BadTrailer,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while serving the probe protocol. These never abort the
/// server: the connection is closed and the accept loop continues.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("connection closed mid-request after {0} of {1} bytes")]
    TruncatedRequest(usize, usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Top-level error type returned by the CLI binaries' `main` functions.
#[derive(Debug, thiserror::Error)]
pub enum TablebaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
