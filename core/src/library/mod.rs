//! Calcification shape library
//!
//! The library is a CSV catalog describing every segmented lesion plus a
//! store holding the raw voxel payloads, either as one zip archive per shape
//! or as an extracted directory tree.

mod catalog;
mod repository;

pub use catalog::ShapeCatalog;
pub use repository::{decode_raw, RawShapeRepository, ShapeRepository, ZipShapeRepository};
