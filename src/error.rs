//! Crate errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::brainfuck::Inst;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unmatched `]` at byte {0}")]
    UnmatchedClose(usize),

    #[error("unmatched `[` at byte {0}")]
    UnmatchedOpen(usize),

    /// A loop bracket in an instruction sequence has no partner.
    #[error("loop bracket at instruction {0} has no matching partner")]
    UnbalancedJumps(usize),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} exceeds the source limit of {limit} bytes", path.display())]
    SourceTooLarge { path: PathBuf, limit: u64 },

    #[error("invalid optimization level {0}, expected 0, 1 or 2")]
    InvalidOptLevel(u8),

    #[error("pointer left the tape at instruction {ip} ({inst}) with pointer {ptr}")]
    PointerOutOfBounds { ip: usize, inst: Inst, ptr: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
