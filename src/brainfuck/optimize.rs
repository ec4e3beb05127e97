//! Structural optimizer.
//!
//! A single left-to-right pass over a jump-resolved sequence that builds a
//! fresh output sequence. Arithmetic and pointer runs collapse into one net
//! instruction, loops that provably never run are skipped, and loops whose
//! effect is affine in the current cell are replaced by straight-line
//! `MulAdd`/`SetZero` instructions. Everything else is copied as a real loop.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Inst, resolve_jumps};
use crate::error::{Error, Result};

/// Consumes a jump-resolved sequence and returns a shorter equivalent one
/// with freshly resolved jump targets.
pub fn optimize(prog: Vec<Inst>) -> Result<Vec<Inst>> {
    let mut out = Vec::with_capacity(prog.len());
    // The current cell is known to hold zero.
    let mut zeroed = false;
    let mut idx = 0;
    while idx < prog.len() {
        match prog[idx] {
            Inst::Add(_) | Inst::Sub(_) => {
                let mut net = 0i64;
                while let Some(inst) = prog.get(idx) {
                    match *inst {
                        Inst::Add(n) => net += i64::from(n),
                        Inst::Sub(n) => net -= i64::from(n),
                        _ => break,
                    }
                    idx += 1;
                }
                if net.rem_euclid(256) != 0 {
                    out.push(cell_delta(net));
                    zeroed = false;
                }
                continue;
            }
            Inst::Right(_) | Inst::Left(_) => {
                let mut net = 0i64;
                let (mut lo, mut lo_at, mut hi, mut hi_at) = (0i64, 0, 0i64, 0);
                while let Some(inst) = prog.get(idx) {
                    match *inst {
                        Inst::Right(n) => net += i64::from(n),
                        Inst::Left(n) => net -= i64::from(n),
                        _ => break,
                    }
                    if net < lo {
                        (lo, lo_at) = (net, idx);
                    }
                    if net > hi {
                        (hi, hi_at) = (net, idx);
                    }
                    idx += 1;
                }
                // Every cell the run passes over lies between its extremes,
                // so the folded moves still visit any extreme it overshoots.
                let mut stops = Vec::with_capacity(3);
                if lo < net.min(0) {
                    stops.push((lo_at, lo));
                }
                if hi > net.max(0) {
                    stops.push((hi_at, hi));
                }
                stops.sort_unstable();
                stops.push((idx, net));
                let mut at = 0i64;
                for (_, stop) in stops {
                    if stop != at {
                        out.push(pointer_delta(stop - at));
                        zeroed = false;
                        at = stop;
                    }
                }
                continue;
            }
            Inst::Open(end) => {
                let body = prog
                    .get(idx + 1..end)
                    .ok_or(Error::UnbalancedJumps(idx))?;
                if zeroed {
                    debug!(start = idx, end, "dropped dead loop");
                    idx = end + 1;
                    continue;
                }
                if let Some(folded) = fold_clear_loop(body).or_else(|| fold_mul_loop(body)) {
                    debug!(start = idx, end, emitted = folded.len(), "unrolled loop");
                    out.extend(folded);
                    zeroed = true;
                    idx = end + 1;
                    continue;
                }
                out.push(Inst::Open(0));
                zeroed = false;
            }
            Inst::Close(_) => {
                out.push(Inst::Close(0));
                zeroed = true;
            }
            Inst::SetZero => {
                if !zeroed {
                    out.push(Inst::SetZero);
                }
                zeroed = true;
            }
            inst @ Inst::MulAdd { .. } => {
                if !zeroed {
                    out.push(inst);
                }
            }
            Inst::Output => out.push(Inst::Output),
            Inst::Input => {
                out.push(Inst::Input);
                zeroed = false;
            }
        }
        idx += 1;
    }
    resolve_jumps(&mut out)?;
    debug!(before = prog.len(), after = out.len(), "optimized");
    Ok(out)
}

fn cell_delta(net: i64) -> Inst {
    if net >= 0 {
        Inst::Add(net as u32)
    } else {
        Inst::Sub(net.unsigned_abs() as u32)
    }
}

fn pointer_delta(net: i64) -> Inst {
    if net >= 0 {
        Inst::Right(net as u32)
    } else {
        Inst::Left(net.unsigned_abs() as u32)
    }
}

/// Recognizes loops that leave the current cell at zero after one pass
/// without moving the pointer or doing I/O.
fn fold_clear_loop(body: &[Inst]) -> Option<Vec<Inst>> {
    let mut net = 0i64;
    let mut cleared = false;
    for inst in body {
        match *inst {
            Inst::Add(n) => net += i64::from(n),
            Inst::Sub(n) => net -= i64::from(n),
            Inst::SetZero => {
                cleared = true;
                net = 0;
            }
            _ => return None,
        }
    }
    let net = net.rem_euclid(256);
    // an odd step visits every value, so the cell reaches zero eventually
    let terminates = if cleared { net == 0 } else { net % 2 == 1 };
    terminates.then(|| vec![Inst::SetZero])
}

/// Recognizes loops that only move the pointer and add constants, return to
/// the origin cell, and decrement it by exactly one per iteration.
///
/// The unrolled form only touches the offsets it writes to, so loops whose
/// pointer strays beyond the outermost written offsets are kept as loops.
fn fold_mul_loop(body: &[Inst]) -> Option<Vec<Inst>> {
    let (mut ptr, mut lo, mut hi) = (0i64, 0i64, 0i64);
    let mut changes: BTreeMap<i64, i64> = BTreeMap::new();
    for inst in body {
        match *inst {
            Inst::Add(n) => *changes.entry(ptr).or_insert(0) += i64::from(n),
            Inst::Sub(n) => *changes.entry(ptr).or_insert(0) -= i64::from(n),
            Inst::Right(n) => ptr += i64::from(n),
            Inst::Left(n) => ptr -= i64::from(n),
            _ => return None,
        }
        lo = lo.min(ptr);
        hi = hi.max(ptr);
    }
    if ptr != 0 || changes.get(&0).map(|d| d.rem_euclid(256)) != Some(255) {
        return None;
    }
    changes.retain(|&offset, weight| {
        *weight = weight.rem_euclid(256);
        offset != 0 && *weight != 0
    });
    let reaches = |edge: i64| edge == 0 || changes.contains_key(&edge);
    if !reaches(lo) || !reaches(hi) {
        return None;
    }
    let mut folded: Vec<Inst> = changes
        .into_iter()
        .map(|(offset, weight)| {
            let factor = if weight > 127 { weight - 256 } else { weight };
            Inst::MulAdd {
                offset: offset as isize,
                factor: factor as i32,
            }
        })
        .collect();
    folded.push(Inst::SetZero);
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brainfuck::{OptLevel, lex};

    fn optimized(code: &str) -> Vec<Inst> {
        optimize(lex(code, OptLevel::O2).unwrap()).unwrap()
    }

    #[test]
    fn opposite_neighbours_cancel() {
        assert_eq!(
            optimize(vec![Inst::Add(5), Inst::Sub(3)]).unwrap(),
            vec![Inst::Add(2)]
        );
        assert_eq!(
            optimize(vec![Inst::Add(3), Inst::Sub(5)]).unwrap(),
            vec![Inst::Sub(2)]
        );
        assert_eq!(
            optimize(vec![Inst::Left(2), Inst::Right(2), Inst::Right(1)]).unwrap(),
            vec![Inst::Left(2), Inst::Right(3)]
        );
        assert_eq!(optimized("+-+-+"), vec![Inst::Add(1)]);
        assert_eq!(optimized(">> >>>."), vec![Inst::Right(5), Inst::Output]);
    }

    #[test]
    fn shift_runs_keep_their_extremes() {
        assert_eq!(optimized("><"), vec![Inst::Right(1), Inst::Left(1)]);
        assert_eq!(optimized("<>."), vec![Inst::Left(1), Inst::Right(1), Inst::Output]);
        assert_eq!(
            optimized(">>><<<<<>"),
            vec![Inst::Right(3), Inst::Left(5), Inst::Right(1)]
        );
    }

    #[test]
    fn mul_loops_straying_past_their_targets_are_kept() {
        assert_eq!(
            optimized("+[>-+<-]"),
            vec![
                Inst::Add(1),
                Inst::Open(5),
                Inst::Right(1),
                Inst::Left(1),
                Inst::Sub(1),
                Inst::Close(1),
            ]
        );
        assert!(optimized("+[<<>>>+<-]").contains(&Inst::Open(7)));
        // a detour that stays between written offsets still unrolls
        assert_eq!(
            optimized("+[>>+<+<<+>-]"),
            vec![
                Inst::Add(1),
                Inst::MulAdd { offset: -1, factor: 1 },
                Inst::MulAdd { offset: 1, factor: 1 },
                Inst::MulAdd { offset: 2, factor: 1 },
                Inst::SetZero,
            ]
        );
    }

    #[test]
    fn full_wraps_vanish() {
        assert_eq!(optimize(vec![Inst::Add(256)]).unwrap(), vec![]);
    }

    #[test]
    fn clear_loops_become_set_zero() {
        assert_eq!(optimized("[-]"), vec![Inst::SetZero]);
        assert_eq!(optimized("[+]"), vec![Inst::SetZero]);
        assert_eq!(optimized("+[ - ]"), vec![Inst::Add(1), Inst::SetZero]);
        assert_eq!(optimized("+[---]"), vec![Inst::Add(1), Inst::SetZero]);
        assert_eq!(optimized("+[+[-]]"), vec![Inst::Add(1), Inst::SetZero]);
        // an even step may never hit zero
        assert_eq!(
            optimized("+[--]"),
            vec![Inst::Add(1), Inst::Open(3), Inst::Sub(2), Inst::Close(1)]
        );
    }

    #[test]
    fn loops_after_a_closed_loop_are_dead() {
        assert_eq!(optimized("[-][+]"), vec![Inst::SetZero]);
        assert_eq!(
            optimized(",[.,][.>+<]."),
            vec![
                Inst::Input,
                Inst::Open(4),
                Inst::Output,
                Inst::Input,
                Inst::Close(1),
                Inst::Output,
            ]
        );
    }

    #[test]
    fn copy_loop_unrolls() {
        assert_eq!(
            optimized("+[->+<]"),
            vec![
                Inst::Add(1),
                Inst::MulAdd { offset: 1, factor: 1 },
                Inst::SetZero,
            ]
        );
    }

    #[test]
    fn multiply_loop_accumulates_offsets() {
        assert_eq!(
            optimized(",[>++<<--->>+<-]"),
            vec![
                Inst::Input,
                Inst::MulAdd { offset: -1, factor: -3 },
                Inst::MulAdd { offset: 1, factor: 3 },
                Inst::SetZero,
            ]
        );
    }

    #[test]
    fn loops_with_io_or_drift_are_kept() {
        assert_eq!(
            optimized(",[->+<.]"),
            vec![
                Inst::Input,
                Inst::Open(7),
                Inst::Sub(1),
                Inst::Right(1),
                Inst::Add(1),
                Inst::Left(1),
                Inst::Output,
                Inst::Close(1),
            ]
        );
        assert_eq!(
            optimized(",[->+]"),
            vec![
                Inst::Input,
                Inst::Open(5),
                Inst::Sub(1),
                Inst::Right(1),
                Inst::Add(1),
                Inst::Close(1),
            ]
        );
    }

    #[test]
    fn nested_loops_are_optimized_in_place() {
        let prog = optimized(",[>,[->+<]<-]");
        assert_eq!(
            prog,
            vec![
                Inst::Input,
                Inst::Open(8),
                Inst::Right(1),
                Inst::Input,
                Inst::MulAdd { offset: 1, factor: 1 },
                Inst::SetZero,
                Inst::Left(1),
                Inst::Sub(1),
                Inst::Close(1),
            ]
        );
    }

    #[test]
    fn redundant_clears_after_loops_are_dropped() {
        assert_eq!(
            optimized(",[.-][-]>"),
            vec![
                Inst::Input,
                Inst::Open(4),
                Inst::Output,
                Inst::Sub(1),
                Inst::Close(1),
                Inst::Right(1),
            ]
        );
    }
}
