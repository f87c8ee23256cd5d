//! Density segmentation interface and mask stacking

use dicom_object::InMemDicomObject;
use ndarray::{stack, Array2, Array3, ArrayView2, Axis};

use crate::error::{InsertionError, Result};

/// Dense-tissue and breast-outline masks of one projection
#[derive(Debug, Clone, PartialEq)]
pub struct SliceMasks {
    pub dense: Array2<f64>,
    pub breast: Array2<f64>,
}

/// Density/breast segmentation service
pub trait Segmenter {
    /// Segments projection `index` of the exam
    ///
    /// The projection header has already been prepared for density
    /// estimation. Both returned masks must share the projection's shape.
    fn segment(&self, projection: &InMemDicomObject, index: usize) -> Result<SliceMasks>;
}

/// Per-projection masks stacked along axis 2
#[derive(Debug, Clone)]
pub struct MaskStack {
    pub dense: Array3<f64>,
    pub breast: Array3<f64>,
}

/// Stacks per-projection masks into `(row, column, projection)` volumes
///
/// # Errors
///
/// Returns `PreconditionViolation` if there are no slices or the slices do
/// not all share one shape.
pub fn stack_masks(slices: &[SliceMasks]) -> Result<MaskStack> {
    let first = slices
        .first()
        .ok_or_else(|| InsertionError::precondition("no projection masks to stack"))?;
    let shape = first.dense.dim();

    for (i, slice) in slices.iter().enumerate() {
        if slice.dense.dim() != shape || slice.breast.dim() != shape {
            return Err(InsertionError::precondition(format!(
                "masks of projection {} are {:?}/{:?}, expected {:?}",
                i,
                slice.dense.dim(),
                slice.breast.dim(),
                shape
            )));
        }
    }

    let dense: Vec<ArrayView2<f64>> = slices.iter().map(|s| s.dense.view()).collect();
    let breast: Vec<ArrayView2<f64>> = slices.iter().map(|s| s.breast.view()).collect();
    let stack_err = |e: ndarray::ShapeError| InsertionError::precondition(format!("{}", e));

    Ok(MaskStack {
        dense: stack(Axis(2), &dense).map_err(stack_err)?,
        breast: stack(Axis(2), &breast).map_err(stack_err)?,
    })
}
