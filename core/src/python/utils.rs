//! Utility functions for Python bindings conversions

use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::types::Window3;

/// Converts a Python path-like object (str or pathlib.Path) to PathBuf
pub fn path_to_pathbuf(path: &Bound<'_, PyAny>) -> PyResult<PathBuf> {
    // Try to convert as string first
    if let Ok(s) = path.extract::<String>() {
        return Ok(PathBuf::from(s));
    }

    // Try to call __str__() for pathlib.Path objects
    if let Ok(s) = path.str() {
        let path_str: String = s.extract()?;
        return Ok(PathBuf::from(path_str));
    }

    Err(pyo3::exceptions::PyTypeError::new_err(
        "Path must be a string or path-like object",
    ))
}

/// Converts an `(x, y, z)` tuple to a window
pub fn window_from_tuple(extent: (usize, usize, usize)) -> Window3 {
    Window3::new(extent.0, extent.1, extent.2)
}

/// Seeded generator, or one seeded from entropy when `seed` is None
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
