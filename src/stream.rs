//! Reading program sources and mirroring program output.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Reads the program at `path`, refusing sources longer than `limit` bytes.
///
/// Bytes that are not valid UTF-8 can only ever be comments, so they are
/// replaced rather than rejected.
pub fn read_source(path: &Path, limit: u64) -> Result<String> {
    let read_err = |source: io::Error| Error::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut buf = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(read_err)?;
    if buf.len() as u64 > limit {
        return Err(Error::SourceTooLarge {
            path: path.to_path_buf(),
            limit,
        });
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// A writer that copies everything written to `primary` into `mirror`.
#[derive(Debug)]
pub struct Tee<A, B> {
    primary: A,
    mirror: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(primary: A, mirror: B) -> Self {
        Self { primary, mirror }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        self.mirror.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.mirror.flush()
    }
}
