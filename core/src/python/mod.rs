//! Python bindings for mcinsert
//!
//! This module provides PyO3 bindings for sampling cluster layouts,
//! drawing contrasts and browsing the shape catalog from Python.

// Suppress false positive warnings from PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod catalog;
mod errors;
mod layout;
mod utils;

pub use catalog::*;
pub use errors::*;
pub use layout::*;

/// Python module definition
#[pymodule]
fn _mcinsert(py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register exception classes
    m.add("InsertionError", py.get_type_bound::<errors::PyInsertionError>())?;
    m.add(
        "PreconditionViolation",
        py.get_type_bound::<errors::PyPreconditionViolation>(),
    )?;
    m.add(
        "EmptyCandidateSet",
        py.get_type_bound::<errors::PyEmptyCandidateSet>(),
    )?;
    m.add(
        "DegenerateField",
        py.get_type_bound::<errors::PyDegenerateField>(),
    )?;
    m.add(
        "ShapeArchiveError",
        py.get_type_bound::<errors::PyShapeArchiveError>(),
    )?;

    // Register classes
    m.add_class::<PyClusterLayout>()?;
    m.add_class::<PyShapeCatalog>()?;

    // Register functions
    m.add_function(wrap_pyfunction!(py_sample_layout, m)?)?;
    m.add_function(wrap_pyfunction!(py_draw_contrasts, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
