use std::fmt;

/// One instruction of the intermediate representation.
///
/// Loop brackets carry the index of their partner once
/// [`resolve_jumps`](super::resolve_jumps) has run over the sequence.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Inst {
    Add(u32),
    Sub(u32),
    Right(u32),
    Left(u32),
    Output,
    Input,
    /// Jumps past its matching `Close` when the current cell is zero.
    Open(usize),
    /// Jumps back to its matching `Open` when the current cell is non-zero.
    Close(usize),
    SetZero,
    /// Adds `cell * factor` into the cell at `ptr + offset`.
    MulAdd { offset: isize, factor: i32 },
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Inst::Add(n) => write!(f, "add {n}"),
            Inst::Sub(n) => write!(f, "sub {n}"),
            Inst::Right(n) => write!(f, "right {n}"),
            Inst::Left(n) => write!(f, "left {n}"),
            Inst::Output => f.write_str("output"),
            Inst::Input => f.write_str("input"),
            Inst::Open(target) => write!(f, "open -> {target}"),
            Inst::Close(target) => write!(f, "close -> {target}"),
            Inst::SetZero => f.write_str("set 0"),
            Inst::MulAdd { offset, factor } => write!(f, "muladd [{offset:+}] * {factor}"),
        }
    }
}

/// Writes one instruction per line, prefixed with its index.
pub fn dump<W: fmt::Write>(prog: &[Inst], out: &mut W) -> fmt::Result {
    let width = prog.len().saturating_sub(1).to_string().len();
    for (idx, inst) in prog.iter().enumerate() {
        writeln!(out, "{idx:>width$}  {inst}")?;
    }
    Ok(())
}
