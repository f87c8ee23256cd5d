//! Cluster-centre search in the reconstructed candidate-density volume

use log::{debug, info};
use ndarray::{s, Array3, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CandidateParams;
use crate::error::{InsertionError, Result};
use crate::types::Position;

/// Detector and volume extents handed to the reconstruction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Detector pixels along a row (columns)
    pub nu: usize,
    /// Detector pixels along a column (rows)
    pub nv: usize,
    /// Reconstructed slices
    pub nz: usize,
}

impl Geometry {
    /// Creates a new Geometry
    pub fn new(nu: usize, nv: usize, nz: usize) -> Self {
        Self { nu, nv, nz }
    }

    /// Shape `(nv, nu, nz)` of a reconstructed volume
    pub fn volume_shape(&self) -> (usize, usize, usize) {
        (self.nv, self.nu, self.nz)
    }
}

/// Back-projection capability of the tomographic reconstruction engine
pub trait Reconstructor {
    /// Back-projects a `(nv, nu, projections)` stack into a `(nv, nu, nz)` volume
    fn back_project(&self, projections: &Array3<f64>, geometry: &Geometry) -> Result<Array3<f64>>;
}

/// Draws a cluster centre from dense tissue of the reconstructed breast
pub struct CandidateRegionFinder<'a, R: Reconstructor + ?Sized> {
    reconstructor: &'a R,
    params: CandidateParams,
}

impl<'a, R: Reconstructor + ?Sized> CandidateRegionFinder<'a, R> {
    /// Creates a finder using the given reconstruction engine
    pub fn new(reconstructor: &'a R, params: CandidateParams) -> Self {
        Self {
            reconstructor,
            params,
        }
    }

    /// Geometry used to reconstruct a final mask of the given shape
    pub fn geometry_for(&self, final_mask: &Array3<f64>) -> Geometry {
        let (rows, cols, _) = final_mask.dim();
        Geometry::new(cols, rows, self.params.depth)
    }

    /// Reconstructs the final mask and draws one candidate voxel uniformly
    ///
    /// # Errors
    ///
    /// - `Reconstruction` if the engine fails or returns a volume of the
    ///   wrong shape
    /// - `EmptyCandidateSet` if no voxel exceeds the threshold
    pub fn find_cluster_center<G: Rng + ?Sized>(
        &self,
        final_mask: &Array3<f64>,
        rng: &mut G,
    ) -> Result<Position> {
        let geometry = self.geometry_for(final_mask);
        info!(
            "Reconstructing candidate density volume ({} x {} x {})",
            geometry.nv, geometry.nu, geometry.nz
        );

        let mut volume = self.reconstructor.back_project(final_mask, &geometry)?;
        if volume.dim() != geometry.volume_shape() {
            return Err(InsertionError::Reconstruction(format!(
                "expected a {:?} volume, got {:?}",
                geometry.volume_shape(),
                volume.dim()
            )));
        }

        self.clear_depth_margins(&mut volume);
        self.draw_candidate(&volume, rng)
    }

    /// Zeroes the top and bottom `depth / margin_divisor` slices
    pub fn clear_depth_margins(&self, volume: &mut Array3<f64>) {
        let nz = volume.len_of(Axis(2));
        let margin = (nz / self.params.margin_divisor.max(1)).min(nz);
        volume.slice_mut(s![.., .., ..margin]).fill(0.0);
        volume.slice_mut(s![.., .., nz - margin..]).fill(0.0);
    }

    /// Picks one above-threshold voxel uniformly at random
    pub fn draw_candidate<G: Rng + ?Sized>(
        &self,
        volume: &Array3<f64>,
        rng: &mut G,
    ) -> Result<Position> {
        let threshold = self.params.threshold;
        let count = volume.iter().filter(|&&v| v > threshold).count();
        if count == 0 {
            return Err(InsertionError::EmptyCandidateSet { threshold });
        }

        let pick = rng.gen_range(0..count);
        debug!("Drawing candidate {} of {}", pick, count);

        volume
            .indexed_iter()
            .filter(|(_, &v)| v > threshold)
            .nth(pick)
            .map(|((x, y, z), _)| Position::new(x, y, z))
            .ok_or(InsertionError::EmptyCandidateSet { threshold })
    }
}
