//! Python bindings, built with the `python` feature.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::brainfuck::{OptLevel, compile, emit_c, run_with_state};
use crate::error::Error;

impl From<Error> for PyErr {
    fn from(e: Error) -> PyErr {
        PyValueError::new_err(e.to_string())
    }
}

/// Run a program and return everything it printed.
#[pyfunction]
#[pyo3(signature = (code, opt_level = 2, length = 65536, input = None))]
fn run<'py>(
    py: Python<'py>,
    code: &str,
    opt_level: u8,
    length: usize,
    input: Option<Vec<u8>>,
) -> PyResult<Bound<'py, PyBytes>> {
    let prog = compile(code, OptLevel::try_from(opt_level)?)?;
    let (output, _, _) = run_with_state(&prog, length, input.as_deref().unwrap_or_default())?;
    Ok(PyBytes::new(py, &output))
}

/// Translate a program to C source.
#[pyfunction]
#[pyo3(signature = (code, opt_level = 2, length = 65536))]
fn to_c(code: &str, opt_level: u8, length: usize) -> PyResult<String> {
    let prog = compile(code, OptLevel::try_from(opt_level)?)?;
    let mut buf = Vec::new();
    emit_c(&prog, length, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[pymodule]
fn tapeopt(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run, m)?)?;
    m.add_function(wrap_pyfunction!(to_c, m)?)?;
    Ok(())
}
