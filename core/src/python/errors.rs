//! Python exception types for mcinsert
//!
//! This module defines Python exception classes that map to Rust error types.

// Suppress warnings from PyO3's create_exception! macro about gil-refs feature
#![allow(unexpected_cfgs)]

use pyo3::{create_exception, exceptions::PyException, prelude::*};

use crate::error::InsertionError;

// Base exception
create_exception!(
    mcinsert,
    PyInsertionError,
    PyException,
    "Base exception for all mcinsert errors"
);

// Specific exceptions
create_exception!(
    mcinsert,
    PyPreconditionViolation,
    PyInsertionError,
    "Inputs violate a documented precondition"
);

create_exception!(
    mcinsert,
    PyEmptyCandidateSet,
    PyInsertionError,
    "No voxel of the reconstructed density volume passed the threshold"
);

create_exception!(
    mcinsert,
    PyDegenerateField,
    PyInsertionError,
    "The placement probability field lost all of its mass"
);

create_exception!(
    mcinsert,
    PyShapeArchiveError,
    PyInsertionError,
    "A calcification shape could not be located or decoded"
);

/// Convert Rust InsertionError to appropriate Python exception
pub fn convert_error(err: InsertionError) -> PyErr {
    match err {
        InsertionError::PreconditionViolation(msg) => PyPreconditionViolation::new_err(msg),
        e @ InsertionError::EmptyCandidateSet { .. } => PyEmptyCandidateSet::new_err(e.to_string()),
        InsertionError::DegenerateField(msg) => PyDegenerateField::new_err(msg),
        InsertionError::ShapeArchiveError(msg) => PyShapeArchiveError::new_err(msg),
        other => PyInsertionError::new_err(other.to_string()),
    }
}
