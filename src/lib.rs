pub mod brainfuck;
pub mod error;
pub mod stream;

#[cfg(feature = "python")]
mod python;

pub use error::{Error, Result};

use brainfuck::{OptLevel, compile, run};
use std::ffi::CStr;
use std::io;
use std::os::raw::{c_char, c_int, c_uchar};

/// Tape length used when the caller does not pick one.
pub const DEFAULT_TAPE_LEN: usize = 65536;

/// Largest source file accepted by default, in bytes.
pub const DEFAULT_SOURCE_LIMIT: u64 = 1 << 20;

/// Compile and execute a program on stdin/stdout through a C-compatible
/// interface. Returns 0 on success and -1 on any failure, after writing the
/// error to stderr.
///
/// # Safety
/// `code` must be a valid null-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tapeopt_run(code: *const c_char, length: usize, flush: c_uchar) -> c_int {
    if code.is_null() {
        return -1;
    }
    let c_str = unsafe { CStr::from_ptr(code) };
    let Ok(code_str) = c_str.to_str() else {
        return -1;
    };
    let result = compile(code_str, OptLevel::O2).and_then(|prog| {
        if flush != 0 {
            run::<true, _, _>(&prog, length, io::stdin().lock(), io::stdout().lock())
        } else {
            run::<false, _, _>(&prog, length, io::stdin().lock(), io::stdout().lock())
        }
    });
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("tapeopt: {e}");
            -1
        }
    }
}
