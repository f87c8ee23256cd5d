use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{InsertionError, Result};

/// Integer voxel extent along three axes
///
/// Used for the cluster window (the box holding one cluster), the
/// calcification window (the box reserved per calcification) and the
/// native bounding box of library shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window3 {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Window3 {
    /// Creates a new Window3
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Extents as an `[x, y, z]` array
    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Extents as an ndarray shape tuple
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.x, self.y, self.z)
    }

    /// Number of voxels in the window
    pub fn voxel_count(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Returns true if no axis has zero extent
    pub fn is_non_empty(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// Returns true if this window fits inside `outer` on every axis
    pub fn fits_within(&self, outer: &Window3) -> bool {
        self.x <= outer.x && self.y <= outer.y && self.z <= outer.z
    }

    /// Inclusive per-axis bounds for a calcification centre inside this window
    ///
    /// A centre `p` on an axis with cluster extent `s` and calcification extent
    /// `c` must satisfy `ceil(c/2) <= p <= s - floor(c/2)` so that the span
    /// `[p - ceil(c/2), p + floor(c/2))` stays inside the cluster.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if either window is empty or if the
    /// bounds would invert on any axis. The upper bound is additionally capped
    /// at `s - 1`, which only matters for single-voxel calcification axes.
    pub fn placement_bounds(&self, calc: &Window3) -> Result<[(usize, usize); 3]> {
        if !self.is_non_empty() || !calc.is_non_empty() {
            return Err(InsertionError::precondition(format!(
                "windows must be non-empty (cluster {}, calc {})",
                self, calc
            )));
        }

        let mut bounds = [(0, 0); 3];
        for (axis, (&s, &c)) in self
            .as_array()
            .iter()
            .zip(calc.as_array().iter())
            .enumerate()
        {
            let (below, above) = half_split(c);
            let lower = below;
            // the centre must also be a valid voxel index
            let upper = s.saturating_sub(above).min(s - 1);
            if c > s || lower > upper {
                return Err(InsertionError::precondition(format!(
                    "calc window {} does not fit in cluster window {} (axis {})",
                    calc, self, axis
                )));
            }
            bounds[axis] = (lower, upper);
        }
        Ok(bounds)
    }

    /// Parses a window from strings like "200x200x28", "200,200,28" or "[200, 200, 28]"
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| Regex::new(r"\d+").expect("Failed to compile regex"));

        let values: Vec<usize> = re
            .find_iter(s)
            .map(|m| m.as_str().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| format!("Failed to parse window from '{}': {}", s, e))?;

        match values.as_slice() {
            [x, y, z] => Ok(Window3::new(*x, *y, *z)),
            _ => Err(format!(
                "Failed to parse window from '{}': expected 3 extents, found {}",
                s,
                values.len()
            )),
        }
    }
}

impl fmt::Display for Window3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Splits an extent into `(ceil(n/2), floor(n/2))`
///
/// Even extents are centred one voxel towards the upper side.
pub fn half_split(n: usize) -> (usize, usize) {
    ((n + 1) / 2, n / 2)
}

/// Half-open span `[center - ceil(n/2), center + floor(n/2))` of length `n`
///
/// Signed so callers can detect spans hanging over the lower edge.
pub fn centered_span(center: usize, n: usize) -> (isize, isize) {
    let (below, above) = half_split(n);
    (
        center as isize - below as isize,
        center as isize + above as isize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(80, (40, 40))]
    #[case(10, (5, 5))]
    #[case(9, (5, 4))]
    #[case(1, (1, 0))]
    fn test_half_split(#[case] n: usize, #[case] expected: (usize, usize)) {
        assert_eq!(half_split(n), expected);
    }

    #[test]
    fn test_centered_span_length() {
        for n in 1..12 {
            let (start, end) = centered_span(20, n);
            assert_eq!((end - start) as usize, n);
        }
        assert_eq!(centered_span(3, 9), (-2, 7));
    }

    #[test]
    fn test_placement_bounds_default_windows() {
        let cluster = Window3::new(200, 200, 28);
        let calc = Window3::new(80, 80, 10);
        let bounds = cluster.placement_bounds(&calc).unwrap();
        assert_eq!(bounds, [(40, 160), (40, 160), (5, 23)]);
    }

    #[test]
    fn test_placement_bounds_equal_windows() {
        let w = Window3::new(9, 8, 2);
        let bounds = w.placement_bounds(&w).unwrap();
        assert_eq!(bounds, [(5, 5), (4, 4), (1, 1)]);
    }

    #[test]
    fn test_placement_bounds_single_voxel_calc_axis() {
        let cluster = Window3::new(10, 10, 1);
        let calc = Window3::new(4, 4, 1);
        assert!(cluster.placement_bounds(&calc).is_err());

        let cluster = Window3::new(10, 10, 5);
        let bounds = cluster.placement_bounds(&calc).unwrap();
        assert_eq!(bounds[2], (1, 4));
    }

    #[test]
    fn test_placement_bounds_rejects_oversized_calc() {
        let cluster = Window3::new(20, 20, 8);
        let calc = Window3::new(21, 10, 4);
        assert!(matches!(
            cluster.placement_bounds(&calc),
            Err(InsertionError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_placement_bounds_rejects_empty() {
        let cluster = Window3::new(20, 0, 8);
        let calc = Window3::new(2, 0, 4);
        assert!(cluster.placement_bounds(&calc).is_err());
    }

    #[rstest]
    #[case("200x200x28")]
    #[case("200,200,28")]
    #[case("[200, 200, 28]")]
    fn test_parse(#[case] input: &str) {
        assert_eq!(Window3::parse(input).unwrap(), Window3::new(200, 200, 28));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Window3::parse("200x200").is_err());
        assert!(Window3::parse("").is_err());
        assert!(Window3::parse("1x2x3x4").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Window3::new(80, 80, 10).to_string(), "80x80x10");
    }
}
