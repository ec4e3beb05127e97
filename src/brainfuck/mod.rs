//! The translation pipeline: source text is lexed into an instruction
//! sequence, optionally optimized, and then interpreted or emitted as C.

mod codegen;
mod inst;
mod interp;
mod jumps;
mod lexer;
mod optimize;

pub use codegen::{emit_c, emit_c_file};
pub use inst::{Inst, dump};
pub use interp::{run, run_with_state};
pub use jumps::resolve_jumps;
pub use lexer::{OptLevel, lex, validate_loops};
pub use optimize::optimize;

use tracing::debug;

use crate::error::Result;

/// Validates, lexes and, at [`OptLevel::O2`], optimizes `code`.
pub fn compile(code: &str, level: OptLevel) -> Result<Vec<Inst>> {
    validate_loops(code)?;
    let prog = lex(code, level)?;
    debug!(%level, insts = prog.len(), "lexed");
    match level {
        OptLevel::O2 => optimize(prog),
        OptLevel::O0 | OptLevel::O1 => Ok(prog),
    }
}
