//! Python wrapper for the shape catalog

use pyo3::prelude::*;

use super::errors::convert_error;
use super::utils::path_to_pathbuf;

/// Python wrapper for ShapeCatalog
#[pyclass(name = "ShapeCatalog", module = "mcinsert")]
#[derive(Clone)]
pub struct PyShapeCatalog {
    pub(crate) inner: crate::library::ShapeCatalog,
}

#[pymethods]
impl PyShapeCatalog {
    /// Read a catalog CSV or spreadsheet (Type, FileName, BB_CountX, BB_CountY, BB_CountZ)
    #[staticmethod]
    fn from_path(path: &Bound<'_, PyAny>) -> PyResult<Self> {
        let path = path_to_pathbuf(path)?;
        crate::library::ShapeCatalog::from_path(&path)
            .map(|inner| Self { inner })
            .map_err(convert_error)
    }

    /// Records of `kind` at most `max_z` voxels deep
    #[pyo3(signature = (kind="calc", max_z=10))]
    fn filter(&self, kind: &str, max_z: usize) -> Self {
        Self {
            inner: self.inner.filter(kind, max_z),
        }
    }

    /// Archive names `<FileName>_<X>x<Y>x<Z>` of every record
    fn names(&self) -> Vec<String> {
        self.inner
            .records()
            .iter()
            .map(|r| r.archive_name())
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}
