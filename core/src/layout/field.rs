//! Probability fields over voxel windows

use ndarray::{Array1, Array3, ArrayView1};

use crate::error::{InsertionError, Result};
use crate::types::Window3;

/// Isotropic 3-D Gaussian over a window, normalised to sum 1
///
/// Samples sit on `n` evenly spaced points spanning `[0, n]` per axis (so the
/// spacing is `n / (n - 1)`), and the mean is at `n / 2` (integer division).
pub fn gaussian_field(window: Window3, stdev: f64) -> Array3<f64> {
    let gx = axis_profile(window.x, stdev);
    let gy = axis_profile(window.y, stdev);
    let gz = axis_profile(window.z, stdev);

    let mut field = Array3::from_shape_fn(window.shape(), |(i, j, k)| gx[i] * gy[j] * gz[k]);
    let total = field.sum();
    if total > 0.0 {
        field /= total;
    }
    field
}

/// Exclusion template: inverted, min-max normalised Gaussian over the calcification window
///
/// The Gaussian peak maps to 0 and the corners to 1. A window whose samples
/// do not vary (one or two voxels per axis) yields an all-zero template.
pub fn exclusion_template(window: Window3, stdev: f64) -> Array3<f64> {
    let gauss = gaussian_field(window, stdev);
    let min = gauss.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = gauss.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !(range.is_finite() && range > 0.0) {
        return Array3::zeros(window.shape());
    }
    gauss.mapv(|g| 1.0 - (g - min) / range)
}

/// Rescales a field in place so it sums to 1
///
/// # Errors
///
/// Returns `DegenerateField` if the field has no finite positive mass.
pub fn normalize(field: &mut Array3<f64>) -> Result<()> {
    let total = field.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(InsertionError::DegenerateField(format!(
            "field sums to {} and cannot be renormalised",
            total
        )));
    }
    *field /= total;
    Ok(())
}

/// Inverse-CDF draw from unnormalised non-negative weights
///
/// Returns the smallest index whose cumulative probability exceeds `u`
/// (`u` in `[0, 1)`). Rounding that leaves the last cumulative value below
/// `u` falls back to the last index carrying mass.
///
/// # Errors
///
/// Returns `DegenerateField` if the weights have no finite positive mass.
pub fn inverse_cdf_index(weights: ArrayView1<f64>, u: f64) -> Result<usize> {
    let total = weights.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(InsertionError::DegenerateField(format!(
            "marginal sums to {}",
            total
        )));
    }

    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w / total;
        if cumulative > u {
            return Ok(i);
        }
    }

    weights
        .iter()
        .rposition(|&w| w > 0.0)
        .ok_or_else(|| InsertionError::DegenerateField("marginal has no mass".to_string()))
}

fn axis_profile(n: usize, stdev: f64) -> Array1<f64> {
    let mean = (n / 2) as f64;
    let step = if n > 1 { n as f64 / (n - 1) as f64 } else { 0.0 };
    let two_var = 2.0 * stdev * stdev;
    Array1::from_shape_fn(n, |i| {
        let d = i as f64 * step - mean;
        (-d * d / two_var).exp()
    })
}
