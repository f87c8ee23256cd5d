use serde::Serialize;
use std::fmt;

use super::Window3;

/// Catalog kind tag for calcification shapes
pub const CALC_KIND: &str = "calc";

/// Entry of the calcification shape library
///
/// `extent` holds the native bounding-box voxel counts `(BB_CountX,
/// BB_CountY, BB_CountZ)`. The decoded voxel payload is stored row-major with
/// shape `(BB_CountY, BB_CountX, BB_CountZ)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeRecord {
    /// Kind tag (e.g. "calc", "mass")
    pub kind: String,
    /// Base identifier of the shape
    pub file_name: String,
    /// Native bounding box
    pub extent: Window3,
}

impl ShapeRecord {
    /// Creates a new ShapeRecord
    pub fn new(kind: impl Into<String>, file_name: impl Into<String>, extent: Window3) -> Self {
        Self {
            kind: kind.into(),
            file_name: file_name.into(),
            extent,
        }
    }

    /// Name shared by the archive and the raw payload: `<FileName>_<X>x<Y>x<Z>`
    pub fn archive_name(&self) -> String {
        format!("{}_{}", self.file_name, self.extent)
    }

    /// Shape of the decoded voxel volume
    pub fn volume_shape(&self) -> (usize, usize, usize) {
        (self.extent.y, self.extent.x, self.extent.z)
    }

    /// Checks whether this record is a calcification
    pub fn is_calcification(&self) -> bool {
        self.kind == CALC_KIND
    }
}

impl fmt::Display for ShapeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.archive_name(), self.kind)
    }
}
