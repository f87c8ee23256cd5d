//! Python wrappers for layout sampling and contrast draws

use pyo3::prelude::*;

use super::errors::convert_error;
use super::utils::{make_rng, window_from_tuple};
use crate::config::{CompositorParams, LayoutParams};

/// Python wrapper for ClusterLayout
#[pyclass(name = "ClusterLayout", module = "mcinsert")]
#[derive(Clone)]
pub struct PyClusterLayout {
    pub(crate) inner: crate::layout::ClusterLayout,
}

#[pymethods]
impl PyClusterLayout {
    /// Calcification positions as `(x, y, z)` tuples
    #[getter]
    fn positions(&self) -> Vec<(usize, usize, usize)> {
        self.inner
            .positions
            .iter()
            .map(|p| (p.x, p.y, p.z))
            .collect()
    }

    /// Probability field after each draw, as nested `[x][y][z]` lists
    fn pdf(&self, index: usize) -> PyResult<Vec<Vec<Vec<f64>>>> {
        let field = self.inner.pdf_history.get(index).ok_or_else(|| {
            pyo3::exceptions::PyIndexError::new_err(format!(
                "no field for calcification {}",
                index
            ))
        })?;
        Ok(field
            .outer_iter()
            .map(|plane| plane.outer_iter().map(|row| row.to_vec()).collect())
            .collect())
    }

    fn __len__(&self) -> usize {
        self.inner.positions.len()
    }

    fn __repr__(&self) -> String {
        format!("ClusterLayout(positions={:?})", self.positions())
    }
}

/// Sample calcification positions inside one cluster window
///
/// Args:
///     num_calc: Number of calcifications
///     cluster_window: (x, y, z) extent of the cluster window
///     calc_window: (x, y, z) extent reserved per calcification
///     seed: Optional random seed
///
/// Returns:
///     ClusterLayout: Positions and the probability field after each draw
///
/// Example:
///     >>> from mcinsert import sample_layout
///     >>> layout = sample_layout(8, (200, 200, 28), (80, 80, 10), seed=42)
///     >>> len(layout.positions)
///     8
#[pyfunction]
#[pyo3(name = "sample_layout", signature = (num_calc, cluster_window, calc_window, seed=None))]
pub fn py_sample_layout(
    num_calc: usize,
    cluster_window: (usize, usize, usize),
    calc_window: (usize, usize, usize),
    seed: Option<u64>,
) -> PyResult<PyClusterLayout> {
    let mut rng = make_rng(seed);
    crate::layout::sample_layout(
        num_calc,
        window_from_tuple(cluster_window),
        window_from_tuple(calc_window),
        &LayoutParams::default(),
        &mut rng,
    )
    .map(|inner| PyClusterLayout { inner })
    .map_err(convert_error)
}

/// Draw one peak contrast per calcification
///
/// The first contrast is always 1.0, the others lie on 100 levels in [0.5, 1.0).
#[pyfunction]
#[pyo3(name = "draw_contrasts", signature = (num_calc, seed=None))]
pub fn py_draw_contrasts(num_calc: usize, seed: Option<u64>) -> Vec<f64> {
    let mut rng = make_rng(seed);
    crate::composite::draw_contrasts(num_calc, &CompositorParams::default(), &mut rng)
}
