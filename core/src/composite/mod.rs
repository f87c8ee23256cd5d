//! Calcification compositing into a cluster ROI

mod contrast;
mod resample;

pub use contrast::draw_contrasts;
pub use resample::{halve_volume, resize_nearest};

use log::{debug, info};
use ndarray::{s, Array3};
use rand::Rng;

use crate::config::CompositorParams;
use crate::error::{InsertionError, Result};
use crate::library::{ShapeCatalog, ShapeRepository};
use crate::types::{centered_span, Position, ShapeRecord, Window3};

/// ROI volume with the per-calcification draws that produced it
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub roi: Array3<f64>,
    pub contrasts: Vec<f64>,
    pub shapes: Vec<ShapeRecord>,
}

/// Composites library shapes into a zero ROI at sampled positions
///
/// Shapes are drawn with replacement from the catalog restricted to
/// calcifications that are at most `max_extent_z` voxels deep.
pub struct CalcificationCompositor<'a, S: ShapeRepository + ?Sized> {
    shapes: ShapeCatalog,
    repository: &'a S,
    roi_window: Window3,
    params: CompositorParams,
}

impl<'a, S: ShapeRepository + ?Sized> CalcificationCompositor<'a, S> {
    /// Creates a compositor for ROIs of `roi_window`
    ///
    /// # Errors
    ///
    /// Returns `ShapeArchiveError` if no catalog record passes the filter.
    pub fn new(
        catalog: &ShapeCatalog,
        repository: &'a S,
        roi_window: Window3,
        params: CompositorParams,
    ) -> Result<Self> {
        let shapes = catalog.filter(&params.kind, params.max_extent_z);
        if shapes.is_empty() {
            return Err(InsertionError::ShapeArchiveError(format!(
                "no '{}' shapes with Z extent <= {} among {} catalog records",
                params.kind,
                params.max_extent_z,
                catalog.len()
            )));
        }
        debug!("{} of {} catalog shapes usable", shapes.len(), catalog.len());

        Ok(Self {
            shapes,
            repository,
            roi_window,
            params,
        })
    }

    /// Shapes eligible for compositing
    pub fn eligible(&self) -> &ShapeCatalog {
        &self.shapes
    }

    /// Builds the ROI for one cluster
    ///
    /// Every calcification `i` gets contrast `contrasts[i]`, a random library
    /// shape halved on each axis, scaled to peak `contrasts[i]` and added
    /// into the ROI over `[p - ceil(n/2), p + floor(n/2))`.
    ///
    /// # Errors
    ///
    /// - `PreconditionViolation` if `positions` does not hold `num_calc` entries,
    ///   or if a calcification would extend past the ROI border
    /// - `ShapeArchiveError` if a shape cannot be loaded or has no foreground
    pub fn composite<R: Rng + ?Sized>(
        &self,
        num_calc: usize,
        positions: &[Position],
        rng: &mut R,
    ) -> Result<CompositeResult> {
        if num_calc == 0 || positions.len() != num_calc {
            return Err(InsertionError::precondition(format!(
                "{} positions given for {} calcifications",
                positions.len(),
                num_calc
            )));
        }

        let contrasts = draw_contrasts(num_calc, &self.params, rng);
        let shapes = (0..num_calc)
            .map(|_| self.shapes.choose(rng).cloned())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| InsertionError::ShapeArchiveError("shape catalog is empty".to_string()))?;

        let mut roi = Array3::<f64>::zeros(self.roi_window.shape());
        for (i, ((position, record), &contrast)) in positions
            .iter()
            .zip(shapes.iter())
            .zip(contrasts.iter())
            .enumerate()
        {
            let lesion = self.prepare(record, contrast)?;
            debug!(
                "Calcification {}/{}: {} at {} with contrast {:.3}",
                i + 1,
                num_calc,
                record.archive_name(),
                position,
                contrast
            );
            place_additive(&mut roi, &lesion, *position)?;
        }

        info!(
            "Composited {} calcifications into a {} ROI",
            num_calc, self.roi_window
        );

        Ok(CompositeResult {
            roi,
            contrasts,
            shapes,
        })
    }

    /// Loads, halves and contrast-scales one shape
    pub fn prepare(&self, record: &ShapeRecord, contrast: f64) -> Result<Array3<f64>> {
        let raw = self.repository.load(record)?;
        let mut lesion = halve_volume(&raw.mapv(f64::from));
        let peak = lesion.fold(0.0_f64, |m, &v| m.max(v));
        if peak <= 0.0 {
            return Err(InsertionError::ShapeArchiveError(format!(
                "{} has no foreground voxels",
                record.archive_name()
            )));
        }
        lesion.mapv_inplace(|v| contrast * v / peak);
        Ok(lesion)
    }
}

/// Adds `lesion` into `roi` centred at `position`
///
/// Lesion axis `i` runs along ROI axis `i`.
///
/// # Errors
///
/// Returns `PreconditionViolation` if the lesion span leaves the ROI on any
/// axis. The ROI is left untouched in that case.
pub fn place_additive(roi: &mut Array3<f64>, lesion: &Array3<f64>, position: Position) -> Result<()> {
    let roi_dims = [roi.dim().0, roi.dim().1, roi.dim().2];
    let lesion_dims = [lesion.dim().0, lesion.dim().1, lesion.dim().2];
    let centre = position.as_array();

    let mut dst = [(0usize, 0usize); 3];
    for axis in 0..3 {
        let (lo, hi) = centered_span(centre[axis], lesion_dims[axis]);
        if lo < 0 || hi > roi_dims[axis] as isize {
            return Err(InsertionError::precondition(format!(
                "calcification of shape {:?} at {} spans [{}, {}) on axis {}, outside the ROI of shape {:?}",
                lesion_dims, position, lo, hi, axis, roi_dims
            )));
        }
        dst[axis] = (lo as usize, hi as usize);
    }

    let mut target = roi.slice_mut(s![
        dst[0].0..dst[0].1,
        dst[1].0..dst[1].1,
        dst[2].0..dst[2].1
    ]);
    target += lesion;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutParams;
    use crate::layout::sample_layout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves in-memory volumes and records every request
    #[derive(Default)]
    struct MemoryRepository {
        volumes: HashMap<String, Array3<u8>>,
        requests: RefCell<Vec<String>>,
    }

    impl MemoryRepository {
        fn with(mut self, record: &ShapeRecord, volume: Array3<u8>) -> Self {
            self.volumes.insert(record.archive_name(), volume);
            self
        }
    }

    impl ShapeRepository for MemoryRepository {
        fn load(&self, record: &ShapeRecord) -> Result<Array3<u8>> {
            self.requests.borrow_mut().push(record.archive_name());
            self.volumes
                .get(&record.archive_name())
                .cloned()
                .ok_or_else(|| {
                    InsertionError::ShapeArchiveError(format!("{} not found", record))
                })
        }
    }

    fn cube_record(name: &str) -> ShapeRecord {
        ShapeRecord::new("calc", name, Window3::new(4, 4, 4))
    }

    fn cube(value: u8) -> Array3<u8> {
        Array3::from_elem((4, 4, 4), value)
    }

    fn catalog() -> ShapeCatalog {
        ShapeCatalog::new(vec![
            cube_record("a"),
            cube_record("b"),
            ShapeRecord::new("mass", "m", Window3::new(4, 4, 4)),
            ShapeRecord::new("calc", "deep", Window3::new(4, 4, 12)),
        ])
    }

    fn repository() -> MemoryRepository {
        MemoryRepository::default()
            .with(&cube_record("a"), cube(200))
            .with(&cube_record("b"), cube(17))
    }

    #[test]
    fn test_empty_filtered_catalog() {
        let repo = repository();
        let only_masses = ShapeCatalog::new(vec![ShapeRecord::new("mass", "m", Window3::new(4, 4, 4))]);
        let result = CalcificationCompositor::new(
            &only_masses,
            &repo,
            Window3::new(20, 20, 8),
            CompositorParams::default(),
        );
        assert!(matches!(result, Err(InsertionError::ShapeArchiveError(_))));
    }

    #[test]
    fn test_only_shallow_calcifications_are_eligible() {
        let repo = repository();
        let compositor = CalcificationCompositor::new(
            &catalog(),
            &repo,
            Window3::new(20, 20, 8),
            CompositorParams::default(),
        )
        .unwrap();
        let names: Vec<_> = compositor
            .eligible()
            .records()
            .iter()
            .map(|r| r.file_name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_composite_scales_to_contrast() {
        let repo = repository();
        let compositor = CalcificationCompositor::new(
            &catalog(),
            &repo,
            Window3::new(30, 30, 10),
            CompositorParams::default(),
        )
        .unwrap();

        let positions = [Position::new(5, 5, 3), Position::new(20, 20, 6)];
        let mut rng = StdRng::seed_from_u64(12);
        let result = compositor.composite(2, &positions, &mut rng).unwrap();

        assert_eq!(result.roi.dim(), (30, 30, 10));
        assert_eq!(result.contrasts[0], 1.0);
        assert_eq!(result.shapes.len(), 2);
        assert_eq!(repo.requests.borrow().len(), 2);

        // 4^3 cubes halve to 2^3 blocks spanning [p - 1, p + 1)
        let first = result.roi.slice(s![4..6, 4..6, 2..4]);
        assert!(first.iter().all(|&v| (v - 1.0).abs() < 1e-12));
        let second = result.roi.slice(s![19..21, 19..21, 5..7]);
        assert!(second.iter().all(|&v| (v - result.contrasts[1]).abs() < 1e-12));

        let total: f64 = result.roi.sum();
        assert!((total - 8.0 * (1.0 + result.contrasts[1])).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_calcifications_add() {
        let mut roi = Array3::<f64>::zeros((10, 10, 10));
        let lesion = Array3::<f64>::from_elem((2, 2, 2), 0.5);
        place_additive(&mut roi, &lesion, Position::new(5, 5, 5)).unwrap();
        place_additive(&mut roi, &lesion, Position::new(5, 5, 5)).unwrap();
        assert_eq!(roi[[4, 4, 4]], 1.0);
        assert_eq!(roi.sum(), 8.0);
    }

    #[test]
    fn test_placement_touching_border_fits() {
        let mut roi = Array3::<f64>::zeros((6, 6, 6));
        let lesion = Array3::<f64>::ones((4, 4, 4));
        // span on every axis is [0, 4) and [2, 6)
        place_additive(&mut roi, &lesion, Position::new(2, 4, 2)).unwrap();
        assert_eq!(roi.sum(), 64.0);
        assert_eq!(roi[[0, 2, 0]], 1.0);
        assert_eq!(roi[[3, 5, 3]], 1.0);
    }

    #[test]
    fn test_placement_past_border_is_rejected() {
        let mut roi = Array3::<f64>::zeros((6, 6, 6));
        let lesion = Array3::<f64>::ones((4, 4, 4));
        // span on axis 0 is [-1, 3)
        let result = place_additive(&mut roi, &lesion, Position::new(1, 3, 3));
        assert!(matches!(result, Err(InsertionError::PreconditionViolation(_))));
        assert_eq!(roi.sum(), 0.0);

        // span on axis 2 is [3, 7)
        let result = place_additive(&mut roi, &lesion, Position::new(3, 3, 5));
        assert!(matches!(result, Err(InsertionError::PreconditionViolation(_))));
        assert_eq!(roi.sum(), 0.0);
    }

    #[test]
    fn test_placement_entirely_outside_is_rejected() {
        let mut roi = Array3::<f64>::zeros((4, 4, 4));
        let lesion = Array3::<f64>::ones((2, 2, 2));
        let result = place_additive(&mut roi, &lesion, Position::new(9, 1, 1));
        assert!(matches!(result, Err(InsertionError::PreconditionViolation(_))));
        assert_eq!(roi.sum(), 0.0);
    }

    #[test]
    fn test_composite_rejects_position_outside_roi() {
        let repo = repository();
        let compositor = CalcificationCompositor::new(
            &catalog(),
            &repo,
            Window3::new(10, 10, 10),
            CompositorParams::default(),
        )
        .unwrap();
        let positions = [Position::new(5, 5, 5), Position::new(50, 50, 50)];
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            compositor.composite(2, &positions, &mut rng),
            Err(InsertionError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_oversized_shape_never_yields_partial_roi() {
        let record = ShapeRecord::new("calc", "large", Window3::new(16, 16, 4));
        let repo = MemoryRepository::default().with(&record, Array3::from_elem((16, 16, 4), 255));
        let cluster = Window3::new(20, 20, 8);
        let calc = Window3::new(4, 4, 2);
        let compositor = CalcificationCompositor::new(
            &ShapeCatalog::new(vec![record]),
            &repo,
            cluster,
            CompositorParams::default(),
        )
        .unwrap();

        // halved to 8x8x2, so only centres in [4, 16] x [4, 16] x [1, 7] fit
        let fits = |p: &Position| (4..=16).contains(&p.x) && (4..=16).contains(&p.y) && (1..=7).contains(&p.z);
        let mut rejected = 0;
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = sample_layout(2, cluster, calc, &LayoutParams::default(), &mut rng).unwrap();
            match compositor.composite(2, &layout.positions, &mut rng) {
                Ok(result) => {
                    assert!(layout.positions.iter().all(fits));
                    let expected = 128.0 * result.contrasts.iter().sum::<f64>();
                    assert!((result.roi.sum() - expected).abs() < 1e-9);
                }
                Err(InsertionError::PreconditionViolation(_)) => {
                    assert!(!layout.positions.iter().all(fits));
                    rejected += 1;
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert!(rejected > 0);
    }

    #[test]
    fn test_blank_shape_is_rejected() {
        let record = cube_record("blank");
        let repo = MemoryRepository::default().with(&record, cube(0));
        let compositor = CalcificationCompositor::new(
            &ShapeCatalog::new(vec![record]),
            &repo,
            Window3::new(10, 10, 10),
            CompositorParams::default(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            compositor.composite(1, &[Position::new(5, 5, 5)], &mut rng),
            Err(InsertionError::ShapeArchiveError(_))
        ));
    }

    #[test]
    fn test_missing_shape_aborts() {
        let repo = MemoryRepository::default();
        let compositor = CalcificationCompositor::new(
            &catalog(),
            &repo,
            Window3::new(10, 10, 10),
            CompositorParams::default(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let positions = [Position::new(5, 5, 5); 3];
        assert!(compositor.composite(3, &positions, &mut rng).is_err());
    }

    #[test]
    fn test_position_count_must_match() {
        let repo = repository();
        let compositor = CalcificationCompositor::new(
            &catalog(),
            &repo,
            Window3::new(10, 10, 10),
            CompositorParams::default(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            compositor.composite(2, &[Position::new(5, 5, 5)], &mut rng),
            Err(InsertionError::PreconditionViolation(_))
        ));
    }
}
