use super::Inst;
use crate::error::{Error, Result};

/// Stores the partner index in every `Open`/`Close` of `prog`.
///
/// Runs once over the sequence with a stack of pending `Open` indices.
/// Any edit that inserts or removes instructions invalidates the targets,
/// so passes rebuild their output and call this again afterwards.
pub fn resolve_jumps(prog: &mut [Inst]) -> Result<()> {
    let mut stack = Vec::new();
    for idx in 0..prog.len() {
        match prog[idx] {
            Inst::Open(_) => stack.push(idx),
            Inst::Close(_) => {
                let open = stack.pop().ok_or(Error::UnbalancedJumps(idx))?;
                prog[open] = Inst::Open(idx);
                prog[idx] = Inst::Close(open);
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(open) => Err(Error::UnbalancedJumps(open)),
        None => Ok(()),
    }
}
