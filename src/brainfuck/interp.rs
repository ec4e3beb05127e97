use std::io::{self, Read, Write};

use tracing::debug;

use super::Inst;
use crate::error::{Error, Result};

/// Executes `prog` on a fresh tape of `length` cells, streaming bytes from
/// `input` and to `output`.
///
/// With `FLUSH` set the output is flushed after every byte, which keeps
/// interactive programs responsive.
pub fn run<const FLUSH: bool, R: Read, W: Write>(
    prog: &[Inst],
    length: usize,
    mut input: R,
    mut output: W,
) -> Result<()> {
    let mut data = vec![0u8; length];
    execute::<FLUSH>(prog, &mut data, &mut input, &mut output)?;
    output.flush()?;
    Ok(())
}

/// Executes `prog` against an in-memory input and returns the produced
/// output, the final tape and the final pointer.
pub fn run_with_state(
    prog: &[Inst],
    length: usize,
    mut input: &[u8],
) -> Result<(Vec<u8>, Vec<u8>, usize)> {
    let mut data = vec![0u8; length];
    let mut output = Vec::new();
    let dp = execute::<false>(prog, &mut data, &mut input, &mut output)?;
    Ok((output, data, dp))
}

fn execute<const FLUSH: bool>(
    prog: &[Inst],
    data: &mut [u8],
    input: &mut impl Read,
    output: &mut impl Write,
) -> Result<usize> {
    let mut dp: usize = 0;
    let mut ip: usize = 0;
    let mut steps: u64 = 0;
    let out_of_bounds = |ip: usize, dp: usize| Error::PointerOutOfBounds {
        ip,
        inst: prog[ip],
        ptr: dp,
    };
    while ip < prog.len() {
        match prog[ip] {
            Inst::Add(n) => data[dp] = data[dp].wrapping_add(n as u8),
            Inst::Sub(n) => data[dp] = data[dp].wrapping_sub(n as u8),
            Inst::Right(n) => {
                dp = shift(dp, n as isize, data.len()).ok_or_else(|| out_of_bounds(ip, dp))?;
            }
            Inst::Left(n) => {
                dp = shift(dp, -(n as isize), data.len()).ok_or_else(|| out_of_bounds(ip, dp))?;
            }
            Inst::Output => {
                output.write_all(&[data[dp]])?;
                if FLUSH {
                    output.flush()?;
                }
            }
            Inst::Input => data[dp] = read_byte(input)?,
            Inst::Open(target) => {
                if data[dp] == 0 {
                    ip = target;
                }
            }
            Inst::Close(target) => {
                if data[dp] != 0 {
                    ip = target;
                }
            }
            Inst::SetZero => data[dp] = 0,
            Inst::MulAdd { offset, factor } => {
                if data[dp] != 0 {
                    let pos =
                        shift(dp, offset, data.len()).ok_or_else(|| out_of_bounds(ip, dp))?;
                    data[pos] = data[pos].wrapping_add(data[dp].wrapping_mul(factor as u8));
                }
            }
        }
        ip += 1;
        steps += 1;
    }
    debug!(steps, ptr = dp, "program finished");
    Ok(dp)
}

fn shift(dp: usize, by: isize, length: usize) -> Option<usize> {
    dp.checked_add_signed(by).filter(|&pos| pos < length)
}

/// Reads a single byte, storing 0 once the input is exhausted.
fn read_byte(input: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8];
    match input.read_exact(&mut buf) {
        Ok(()) => Ok(buf[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
        Err(e) => Err(e.into()),
    }
}
