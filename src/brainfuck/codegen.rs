use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::Inst;
use crate::error::Result;

const CHUNK: usize = 1 << 16;

/// Writes a C translation unit equivalent to `prog` with a tape of
/// `length` cells. Loop nesting is mirrored as block indentation.
pub fn emit_c<W: Write>(prog: &[Inst], length: usize, out: W) -> Result<()> {
    let mut out = BufWriter::with_capacity(CHUNK, out);
    writeln!(out, "#include <stdio.h>")?;
    writeln!(out)?;
    writeln!(out, "static unsigned char tape[{length}];")?;
    writeln!(out)?;
    writeln!(out, "int main(void)")?;
    writeln!(out, "{{")?;
    writeln!(out, "    unsigned char *ptr = tape;")?;
    if prog.contains(&Inst::Input) {
        writeln!(out, "    int c;")?;
    }
    let mut depth = 1usize;
    for inst in prog {
        if let Inst::Close(_) = inst {
            depth = depth.saturating_sub(1);
        }
        write!(out, "{:width$}", "", width = depth * 4)?;
        match *inst {
            Inst::Add(n) => writeln!(out, "*ptr += {n};")?,
            Inst::Sub(n) => writeln!(out, "*ptr -= {n};")?,
            Inst::Right(n) => writeln!(out, "ptr += {n};")?,
            Inst::Left(n) => writeln!(out, "ptr -= {n};")?,
            Inst::Output => writeln!(out, "putchar(*ptr);")?,
            Inst::Input => writeln!(out, "c = getchar(); *ptr = c == EOF ? 0 : c;")?,
            Inst::Open(_) => {
                writeln!(out, "while (*ptr) {{")?;
                depth += 1;
            }
            Inst::Close(_) => writeln!(out, "}}")?,
            Inst::SetZero => writeln!(out, "*ptr = 0;")?,
            Inst::MulAdd { offset, factor } => {
                let sign = if offset < 0 { '-' } else { '+' };
                writeln!(
                    out,
                    "*(ptr {sign} {}) += *ptr * {factor};",
                    offset.unsigned_abs()
                )?
            }
        }
    }
    writeln!(out, "    return 0;")?;
    writeln!(out, "}}")?;
    out.flush()?;
    Ok(())
}

/// Writes the C translation of `prog` to a new file at `path`.
pub fn emit_c_file(prog: &[Inst], length: usize, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    emit_c(prog, length, file)?;
    debug!(path = %path.display(), insts = prog.len(), "wrote C source");
    Ok(())
}
