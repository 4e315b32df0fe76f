//! Error types for the ROM/cartridge loading boundary.
//!
//! The CPU core itself has no fallible operations: every register and
//! address computation wraps by definition, and unrecognized opcodes are
//! simply illegal no-ops. The only place this crate can fail is at startup,
//! parsing an iNES image, so there is exactly one error type.

use thiserror::Error;

/// Errors produced while parsing an iNES ROM image.
///
/// These propagate to the embedding program and are fatal at startup: there
/// is no recovery policy here, only "configured correctly and runs" or
/// "refuses to start".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RomError {
    /// The 16-byte header signature did not match `"NES\x1A"`.
    #[error("invalid iNES header: expected magic bytes 'NES\\x1A'")]
    BadMagic,

    /// The header declared a mapper id this crate does not implement.
    #[error("unsupported mapper id {id}")]
    UnsupportedMapper { id: u16 },

    /// The file was shorter than the header's declared PRG+CHR payload.
    #[error("truncated ROM: expected at least {expected} bytes, found {actual}")]
    TruncatedRom { expected: usize, actual: usize },

    /// The header's NES 2.0 marker bits were set; this crate only parses
    /// iNES v1 headers.
    #[error("NES 2.0 headers are not supported")]
    Ines2Unsupported,

    /// The ROM file could not be read from disk.
    #[error("failed to read ROM file: {0}")]
    Io(String),
}
