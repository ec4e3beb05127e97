use std::fmt;

use clap::ValueEnum;

use super::{Inst, resolve_jumps};
use crate::error::{Error, Result};

/// How far a program travels down the pipeline before it is run or emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OptLevel {
    /// One instruction per source symbol.
    #[value(name = "0")]
    O0,
    /// Runs of identical symbols are folded into a single counted instruction.
    #[value(name = "1")]
    O1,
    /// Clear loops are recognized while lexing and the structural
    /// optimizer runs over the result.
    #[value(name = "2")]
    O2,
}

impl TryFrom<u8> for OptLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(OptLevel::O0),
            1 => Ok(OptLevel::O1),
            2 => Ok(OptLevel::O2),
            other => Err(Error::InvalidOptLevel(other)),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            OptLevel::O0 => 0,
            OptLevel::O1 => 1,
            OptLevel::O2 => 2,
        };
        write!(f, "O{level}")
    }
}

/// Checks that every `[` has a matching `]` and no `]` closes nothing.
pub fn validate_loops(code: &str) -> Result<()> {
    let mut open = Vec::new();
    for (pos, ch) in code.bytes().enumerate() {
        match ch {
            b'[' => open.push(pos),
            b']' => {
                open.pop().ok_or(Error::UnmatchedClose(pos))?;
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(pos) => Err(Error::UnmatchedOpen(pos)),
        None => Ok(()),
    }
}

/// Turns source text into an instruction sequence with resolved loop targets.
///
/// Callers are expected to have run [`validate_loops`] first; an unbalanced
/// program surfaces here as [`Error::UnbalancedJumps`].
pub fn lex(code: &str, level: OptLevel) -> Result<Vec<Inst>> {
    let bytes = code.as_bytes();
    let mut prog = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let ch = bytes[idx];
        idx += 1;
        let inst = match ch {
            b'+' | b'-' | b'>' | b'<' => {
                let mut count = 1u32;
                if level >= OptLevel::O1 {
                    while bytes.get(idx) == Some(&ch) {
                        count += 1;
                        idx += 1;
                    }
                }
                match ch {
                    b'+' => Inst::Add(count),
                    b'-' => Inst::Sub(count),
                    b'>' => Inst::Right(count),
                    _ => Inst::Left(count),
                }
            }
            b'.' => Inst::Output,
            b',' => Inst::Input,
            b'[' => {
                if level == OptLevel::O2
                    && matches!(bytes.get(idx..idx + 2), Some([b'+' | b'-', b']']))
                {
                    idx += 2;
                    Inst::SetZero
                } else {
                    Inst::Open(0)
                }
            }
            b']' => Inst::Close(0),
            _ => continue,
        };
        prog.push(inst);
    }
    resolve_jumps(&mut prog)?;
    Ok(prog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_fold_only_above_o0() {
        assert_eq!(lex("+++++", OptLevel::O0).unwrap(), vec![Inst::Add(1); 5]);
        assert_eq!(lex("+++++", OptLevel::O1).unwrap(), vec![Inst::Add(5)]);
        assert_eq!(
            lex(">>><<-", OptLevel::O2).unwrap(),
            vec![Inst::Right(3), Inst::Left(2), Inst::Sub(1)]
        );
    }

    #[test]
    fn comments_are_dropped_and_split_runs() {
        assert_eq!(
            lex("++ hello ++\n.", OptLevel::O1).unwrap(),
            vec![Inst::Add(2), Inst::Add(2), Inst::Output]
        );
        assert_eq!(lex("no code at all", OptLevel::O2).unwrap(), vec![]);
    }

    #[test]
    fn clear_idiom_is_recognized_at_o2() {
        assert_eq!(lex("[-]", OptLevel::O2).unwrap(), vec![Inst::SetZero]);
        assert_eq!(lex("[+]", OptLevel::O2).unwrap(), vec![Inst::SetZero]);
        assert_eq!(
            lex("[-]", OptLevel::O1).unwrap(),
            vec![Inst::Open(2), Inst::Sub(1), Inst::Close(0)]
        );
        // the lookahead is exact, so a comment inside defeats it
        assert_eq!(
            lex("[ -]", OptLevel::O2).unwrap(),
            vec![Inst::Open(2), Inst::Sub(1), Inst::Close(0)]
        );
        assert_eq!(
            lex("[--]", OptLevel::O2).unwrap(),
            vec![Inst::Open(2), Inst::Sub(2), Inst::Close(0)]
        );
    }

    #[test]
    fn io_and_trailing_bracket() {
        assert_eq!(
            lex(",.[", OptLevel::O0).map_err(|e| e.to_string()),
            Err("loop bracket at instruction 2 has no matching partner".to_string())
        );
        assert_eq!(
            lex(",[.]", OptLevel::O0).unwrap(),
            vec![Inst::Input, Inst::Open(3), Inst::Output, Inst::Close(1)]
        );
    }

    #[test]
    fn validation_reports_positions() {
        assert!(validate_loops("+[>[-]<]").is_ok());
        assert!(matches!(validate_loops("+]["), Err(Error::UnmatchedClose(1))));
        assert!(matches!(validate_loops("[[]"), Err(Error::UnmatchedOpen(0))));
    }

    #[test]
    fn opt_level_from_number() {
        assert_eq!(OptLevel::try_from(1).unwrap(), OptLevel::O1);
        assert!(matches!(
            OptLevel::try_from(3),
            Err(Error::InvalidOptLevel(3))
        ));
        assert_eq!(OptLevel::O2.to_string(), "O2");
    }
}
