//! DICOM plumbing for DBT projection series
//!
//! Discovery and ordering of projection files, native pixel access and the
//! header preparation needed by the density segmentation service.

mod discovery;
mod header;
mod pixels;
pub mod tags;

pub use discovery::{collect_projection_files, is_dicom_file, projection_index};
pub use header::{prepare_for_density_estimation, DENSITY_HEADER_OVERRIDES};
pub use pixels::{dimensions, read_pixels, write_pixels};
