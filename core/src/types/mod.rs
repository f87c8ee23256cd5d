//! Core type definitions for lesion placement
//!
//! This module provides the fundamental types used throughout the library:
//! - [`Window3`]: Integer voxel extents (cluster window, calcification window)
//! - [`Position`]: Voxel coordinates of cluster centres and calcifications
//! - [`ShapeRecord`]: Entry of the calcification shape library

mod position;
mod shape;
mod window;

pub use position::Position;
pub use shape::{ShapeRecord, CALC_KIND};
pub use window::{centered_span, half_split, Window3};
