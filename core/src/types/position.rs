use serde::{Deserialize, Serialize};
use std::fmt;

/// Voxel coordinate inside a volume
///
/// For calcifications this is relative to the cluster window; for cluster
/// centres it is relative to the reconstructed volume `(row, column, depth)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Position {
    /// Creates a new Position
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Coordinates as an `[x, y, z]` array
    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean distance to another position, in voxels
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<(usize, usize, usize)> for Position {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
