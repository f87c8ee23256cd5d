//! ROI embedding and lesion blending into projections

use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2, Zip};

use crate::candidate::Geometry;
use crate::error::{InsertionError, Result};
use crate::types::Position;

/// Forward projection capability of the tomographic engine
pub trait Projector {
    /// Projects a `(nv, nu, nz)` volume into a `(nv, nu, projections)` stack
    fn forward_project(&self, volume: &Array3<f64>, geometry: &Geometry) -> Result<Array3<f64>>;
}

/// Lesion volume in reconstruction geometry
#[derive(Debug, Clone)]
pub struct EmbeddedLesion {
    pub volume: Array3<f64>,
    /// Voxel where the ROI's first corner landed
    pub offset: Position,
}

/// Places a ROI into a zero volume of `shape`, centred at `centre`
///
/// The ROI origin is `centre - floor(n/2)` on each axis.
///
/// # Errors
///
/// Returns `PreconditionViolation` if the ROI does not fit in the volume at
/// that origin.
pub fn embed_roi(
    shape: (usize, usize, usize),
    roi: &Array3<f64>,
    centre: Position,
) -> Result<EmbeddedLesion> {
    let dims = [shape.0, shape.1, shape.2];
    let roi_dims = [roi.dim().0, roi.dim().1, roi.dim().2];
    let centre_arr = centre.as_array();

    let mut origin = [0usize; 3];
    for axis in 0..3 {
        let half = roi_dims[axis] / 2;
        let fits = centre_arr[axis] >= half && centre_arr[axis] - half + roi_dims[axis] <= dims[axis];
        if !fits {
            return Err(InsertionError::precondition(format!(
                "ROI {:?} centred at {} does not fit in volume {:?} (axis {})",
                roi.dim(),
                centre,
                shape,
                axis
            )));
        }
        origin[axis] = centre_arr[axis] - half;
    }

    let mut volume = Array3::<f64>::zeros(shape);
    volume
        .slice_mut(s![
            origin[0]..origin[0] + roi_dims[0],
            origin[1]..origin[1] + roi_dims[1],
            origin[2]..origin[2] + roi_dims[2]
        ])
        .assign(roi);

    Ok(EmbeddedLesion {
        volume,
        offset: Position::new(origin[0], origin[1], origin[2]),
    })
}

/// Attenuates projection pixels where the lesion projects
///
/// `|mask|` is min-max normalised, positive entries are scaled by
/// `attenuation`, and image columns `column_offset..` are multiplied by
/// `1 - m`. A flat mask leaves the image unchanged.
///
/// # Errors
///
/// Returns `PreconditionViolation` if the mask does not match the image
/// columns from `column_offset` on.
pub fn blend_lesion(
    image: &mut Array2<f32>,
    mask: ArrayView2<f64>,
    column_offset: usize,
    attenuation: f64,
) -> Result<()> {
    let (rows, cols) = image.dim();
    let expected = (rows, cols.saturating_sub(column_offset));
    if column_offset > cols || mask.dim() != expected {
        return Err(InsertionError::precondition(format!(
            "lesion mask {:?} does not match image {:?} from column {}",
            mask.dim(),
            image.dim(),
            column_offset
        )));
    }

    let magnitude = mask.mapv(f64::abs);
    let (lo, hi) = magnitude
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if !(range.is_finite() && range > 0.0) {
        debug!("Flat lesion mask, projection left unchanged");
        return Ok(());
    }

    let mut target = image.slice_mut(s![.., column_offset..]);
    Zip::from(&mut target).and(&magnitude).for_each(|px, &m| {
        let norm = (m - lo) / range;
        *px = (*px as f64 * (1.0 - norm * attenuation)) as f32;
    });
    Ok(())
}
