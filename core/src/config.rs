//! Engine configuration
//!
//! All tunables of the placement engine live here with the defaults used for
//! the reference dataset. A configuration can be loaded from JSON, where any
//! missing field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{InsertionError, Result};
use crate::types::{Window3, CALC_KIND};

/// Parameters of the mask cleanup stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Columns discarded on the near-field side of the detector
    pub crop_columns: usize,
    /// Side of the square kernel used to close gaps in the dense mask
    pub close_kernel: usize,
    /// Side of the square kernel used to open away specks in the dense mask
    pub open_kernel: usize,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            crop_columns: 1500,
            close_kernel: 31,
            open_kernel: 30,
        }
    }
}

/// Parameters of the cluster-centre search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Depth of the reconstructed candidate volume, in slices
    pub depth: usize,
    /// Voxels strictly above this value are candidates
    pub threshold: f64,
    /// `depth / margin_divisor` planes are zeroed at the top and at the bottom
    pub margin_divisor: usize,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self {
            depth: 127,
            threshold: 0.5,
            margin_divisor: 4,
        }
    }
}

/// Parameters of the intra-cluster layout sampler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Standard deviation (voxels) of the prior field over the cluster window
    pub prior_stdev: f64,
    /// Standard deviation (voxels) of the exclusion template
    pub exclusion_stdev: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            prior_stdev: 30.0,
            exclusion_stdev: 10.0,
        }
    }
}

/// Parameters of the calcification compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorParams {
    /// Catalog kind tag shapes must carry
    pub kind: String,
    /// Maximum native extent along Z
    pub max_extent_z: usize,
    /// Lowest contrast for calcifications after the first
    pub contrast_min: f64,
    /// Upper (exclusive) contrast bound
    pub contrast_max: f64,
    /// Number of contrast levels in `[contrast_min, contrast_max)`
    pub contrast_bins: usize,
}

impl Default for CompositorParams {
    fn default() -> Self {
        Self {
            kind: CALC_KIND.to_string(),
            max_extent_z: 10,
            contrast_min: 0.5,
            contrast_max: 1.0,
            contrast_bins: 100,
        }
    }
}

/// Parameters of the projection blending step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendParams {
    /// Peak fractional attenuation applied where the lesion projects
    pub attenuation: f64,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self { attenuation: 0.3 }
    }
}

/// Full engine configuration
///
/// # Example
///
/// ```
/// use mcinsert_core::{EngineConfig, Window3};
///
/// let config = EngineConfig::from_json_str(r#"{ "num_calc": 5, "seed": 7 }"#).unwrap();
/// assert_eq!(config.num_calc, 5);
/// assert_eq!(config.seed, Some(7));
/// assert_eq!(config.cluster_window, Window3::new(200, 200, 28));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cluster_window: Window3,
    pub calc_window: Window3,
    pub num_calc: usize,
    pub seed: Option<u64>,
    pub masks: MaskParams,
    pub candidate: CandidateParams,
    pub layout: LayoutParams,
    pub compositor: CompositorParams,
    pub blend: BlendParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster_window: Window3::new(200, 200, 28),
            calc_window: Window3::new(80, 80, 10),
            num_calc: 8,
            seed: None,
            masks: MaskParams::default(),
            candidate: CandidateParams::default(),
            layout: LayoutParams::default(),
            compositor: CompositorParams::default(),
            blend: BlendParams::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from a JSON string
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the calcification window does not fit
    /// in the cluster window, and `InvalidValue` for out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        self.cluster_window.placement_bounds(&self.calc_window)?;

        if self.num_calc == 0 {
            return Err(InsertionError::precondition("num_calc must be at least 1"));
        }
        if self.layout.prior_stdev <= 0.0 || self.layout.exclusion_stdev <= 0.0 {
            return Err(InsertionError::InvalidValue(
                "layout standard deviations must be positive".to_string(),
            ));
        }
        let c = &self.compositor;
        let ordered = c.contrast_min.is_finite()
            && c.contrast_max.is_finite()
            && c.contrast_min < c.contrast_max;
        if c.contrast_bins == 0 || !ordered {
            return Err(InsertionError::InvalidValue(format!(
                "invalid contrast range [{}, {}) with {} bins",
                c.contrast_min, c.contrast_max, c.contrast_bins
            )));
        }
        if self.candidate.margin_divisor == 0 || self.candidate.depth == 0 {
            return Err(InsertionError::InvalidValue(
                "candidate depth and margin divisor must be positive".to_string(),
            ));
        }
        if self.masks.close_kernel == 0 || self.masks.open_kernel == 0 {
            return Err(InsertionError::InvalidValue(
                "morphology kernels must be at least 1 pixel".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.masks.crop_columns, 1500);
        assert_eq!(config.candidate.depth, 127);
        assert_eq!(config.compositor.kind, "calc");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "calc_window": { "x": 40, "y": 40, "z": 6 }, "masks": { "crop_columns": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.calc_window, Window3::new(40, 40, 6));
        assert_eq!(config.masks.crop_columns, 0);
        assert_eq!(config.masks.close_kernel, 31);
        assert_eq!(config.num_calc, 8);
    }

    #[test]
    fn test_rejects_oversized_calc_window() {
        let err = EngineConfig::from_json_str(
            r#"{ "cluster_window": { "x": 50, "y": 50, "z": 8 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, InsertionError::PreconditionViolation(_)));
    }

    #[test]
    fn test_rejects_zero_calcifications() {
        let err = EngineConfig::from_json_str(r#"{ "num_calc": 0 }"#).unwrap_err();
        assert!(matches!(err, InsertionError::PreconditionViolation(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": 42, "blend": {{ "attenuation": 0.25 }} }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.blend.attenuation, 0.25);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(InsertionError::InvalidValue(_))
        ));
    }
}
