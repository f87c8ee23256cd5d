//! Dense-tissue and breast mask cleanup
//!
//! Turns the raw per-projection masks returned by the density segmentation
//! into a single volume whose positive voxels are dense tissue lying far
//! enough from the skin line and chest wall to hold a whole cluster.

pub mod morphology;

use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2, Axis, Zip};

use crate::config::MaskParams;
use crate::error::{InsertionError, Result};
use crate::types::Window3;
use morphology::StructuringElement;

/// Morphological cleanup of dense-tissue and breast-outline masks
///
/// Masks are `(row, column, slice)` volumes with one slice per projection.
///
/// # Example
///
/// ```
/// use mcinsert_core::{MaskCleaner, MaskParams, Window3};
/// use ndarray::Array3;
///
/// let params = MaskParams { crop_columns: 0, close_kernel: 3, open_kernel: 2 };
/// let cleaner = MaskCleaner::new(Window3::new(6, 6, 4), params);
///
/// let dense = Array3::<f64>::ones((30, 30, 2));
/// let breast = Array3::<f64>::ones((30, 30, 2));
/// let final_mask = cleaner.clean(&dense, &breast).unwrap();
///
/// // The zeroed edge columns erode inwards, the centre survives
/// assert_eq!(final_mask[[15, 0, 0]], 0.0);
/// assert_eq!(final_mask[[15, 15, 1]], 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct MaskCleaner {
    params: MaskParams,
    erosion: StructuringElement,
    closing: StructuringElement,
    opening: StructuringElement,
}

impl MaskCleaner {
    /// Creates a cleaner for clusters of the given window
    ///
    /// The breast erosion element is an ellipse of
    /// `(cluster.x / 2, cluster.y / 2)` pixels.
    pub fn new(cluster_window: Window3, params: MaskParams) -> Self {
        Self {
            erosion: StructuringElement::ellipse(cluster_window.x / 2, cluster_window.y / 2),
            closing: StructuringElement::rect(params.close_kernel, params.close_kernel),
            opening: StructuringElement::rect(params.open_kernel, params.open_kernel),
            params,
        }
    }

    /// Produces the final placement mask `eroded(breast) * cleaned(dense)`
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the two masks differ in shape or if
    /// the column crop leaves nothing.
    pub fn clean(&self, dense: &Array3<f64>, breast: &Array3<f64>) -> Result<Array3<f64>> {
        if dense.dim() != breast.dim() {
            return Err(InsertionError::precondition(format!(
                "dense mask {:?} and breast mask {:?} differ in shape",
                dense.dim(),
                breast.dim()
            )));
        }

        let (rows, cols, slices) = dense.dim();
        let crop = self.params.crop_columns;
        if crop >= cols {
            return Err(InsertionError::precondition(format!(
                "crop of {} columns leaves nothing of a {}-column mask",
                crop, cols
            )));
        }

        debug!(
            "Cleaning masks: {} rows x {} columns x {} slices, crop {}",
            rows, cols, slices, crop
        );

        let mut dense = dense.slice(s![.., crop.., ..]).to_owned();
        let mut breast = breast.slice(s![.., crop.., ..]).to_owned();

        let last = breast.len_of(Axis(1)) - 1;
        breast.slice_mut(s![.., 0, ..]).fill(0.0);
        breast.slice_mut(s![.., last, ..]).fill(0.0);

        for z in 0..slices {
            let eroded = morphology::erode(breast.index_axis(Axis(2), z), &self.erosion);
            breast.index_axis_mut(Axis(2), z).assign(&eroded);

            let cleaned = self.clean_dense_slice(dense.index_axis(Axis(2), z));
            dense.index_axis_mut(Axis(2), z).assign(&cleaned);
        }

        Zip::from(&mut breast)
            .and(&dense)
            .for_each(|b, &d| *b *= d);

        Ok(breast)
    }

    /// Closes then opens one dense slice and keeps its original values
    /// only where the cleaned mask survives
    pub fn clean_dense_slice(&self, slice: ArrayView2<f64>) -> Array2<f64> {
        let closed = morphology::close(slice, &self.closing);
        let mut cleaned = morphology::open(closed.view(), &self.opening);
        Zip::from(&mut cleaned)
            .and(&slice)
            .for_each(|c, &orig| *c *= orig);
        cleaned
    }

    /// Dense-tissue cleanup of every slice, without cropping or breast erosion
    pub fn clean_dense(&self, dense: &Array3<f64>) -> Array3<f64> {
        let mut out = dense.clone();
        for z in 0..dense.len_of(Axis(2)) {
            let cleaned = self.clean_dense_slice(dense.index_axis(Axis(2), z));
            out.index_axis_mut(Axis(2), z).assign(&cleaned);
        }
        out
    }
}
