//! Intra-cluster calcification layout
//!
//! A prior Gaussian field over the cluster window is sampled one calcification
//! at a time; every placement multiplies an inverted Gaussian template into the
//! field around it before the next draw.

pub mod field;
mod sampler;

pub use sampler::{sample_layout, ClusterLayout, ClusterLayoutSampler};
