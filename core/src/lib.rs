//! Synthetic microcalcification cluster insertion for breast tomosynthesis
//!
//! The engine turns per-projection density masks into a cluster centre,
//! samples a declumped layout of calcifications around it, and composites
//! real calcification shapes from a library into a region-of-interest volume
//! that is forward-projected and blended back into the projections.
//!
//! External services (density segmentation, reconstruction, forward
//! projection, shape storage) are traits so they can be swapped or stubbed.

pub mod candidate;
pub mod cli;
pub mod composite;
pub mod config;
pub mod dicom;
pub mod error;
pub mod layout;
pub mod library;
pub mod masks;
pub mod pipeline;
pub mod projection;
pub mod segmentation;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

pub use candidate::{CandidateRegionFinder, Geometry, Reconstructor};
pub use cli::report::TextReport;
pub use cli::Cli;
pub use composite::{draw_contrasts, CalcificationCompositor, CompositeResult};
pub use config::{
    BlendParams, CandidateParams, CompositorParams, EngineConfig, LayoutParams, MaskParams,
};
pub use dicom::{
    collect_projection_files, dimensions, prepare_for_density_estimation, projection_index,
    read_pixels, write_pixels,
};
pub use error::{InsertionError, Result};
pub use layout::{sample_layout, ClusterLayout, ClusterLayoutSampler};
pub use library::{RawShapeRepository, ShapeCatalog, ShapeRepository, ZipShapeRepository};
pub use masks::MaskCleaner;
pub use pipeline::{exam_rng, ExamInserter, InsertionOutcome};
pub use projection::{blend_lesion, embed_roi, EmbeddedLesion, Projector};
pub use segmentation::{stack_masks, MaskStack, Segmenter, SliceMasks};
pub use types::*;
