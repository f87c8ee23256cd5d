//! End-to-end insertion of one calcification cluster into one exam

use dicom_object::InMemDicomObject;
use log::info;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::candidate::{CandidateRegionFinder, Reconstructor};
use crate::composite::CalcificationCompositor;
use crate::config::EngineConfig;
use crate::dicom::{prepare_for_density_estimation, read_pixels, write_pixels};
use crate::error::{InsertionError, Result};
use crate::layout::sample_layout;
use crate::library::{ShapeCatalog, ShapeRepository};
use crate::masks::MaskCleaner;
use crate::projection::{blend_lesion, embed_roi, Projector};
use crate::segmentation::{stack_masks, Segmenter};
use crate::types::Position;

/// Independent generator for exam `exam_index` of a seeded batch
pub fn exam_rng(seed: u64, exam_index: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(exam_index.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

/// What was inserted into an exam
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertionOutcome {
    /// Cluster centre in the cropped reconstruction volume
    pub centre: Position,
    /// First corner of the ROI in the cropped reconstruction volume
    pub offset: Position,
    /// Calcification positions inside the cluster window
    pub positions: Vec<Position>,
    pub contrasts: Vec<f64>,
    /// Archive names of the composited shapes
    pub shapes: Vec<String>,
}

/// Runs every stage of the insertion on one exam
///
/// All external services are borrowed; the inserter itself holds no
/// per-exam state, so one instance can process a whole batch.
pub struct ExamInserter<'a, S, R, P, Repo>
where
    S: Segmenter + ?Sized,
    R: Reconstructor + ?Sized,
    P: Projector + ?Sized,
    Repo: ShapeRepository + ?Sized,
{
    segmenter: &'a S,
    reconstructor: &'a R,
    projector: &'a P,
    repository: &'a Repo,
    catalog: &'a ShapeCatalog,
    config: EngineConfig,
}

impl<'a, S, R, P, Repo> ExamInserter<'a, S, R, P, Repo>
where
    S: Segmenter + ?Sized,
    R: Reconstructor + ?Sized,
    P: Projector + ?Sized,
    Repo: ShapeRepository + ?Sized,
{
    /// Creates an inserter after validating the configuration
    pub fn new(
        segmenter: &'a S,
        reconstructor: &'a R,
        projector: &'a P,
        repository: &'a Repo,
        catalog: &'a ShapeCatalog,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter,
            reconstructor,
            projector,
            repository,
            catalog,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Inserts one cluster, rewriting the pixel data of every projection
    ///
    /// Projections must be in acquisition order. On error no projection has
    /// been modified.
    pub fn insert<G: Rng + ?Sized>(
        &self,
        projections: &mut [InMemDicomObject],
        rng: &mut G,
    ) -> Result<InsertionOutcome> {
        if projections.is_empty() {
            return Err(InsertionError::precondition("exam has no projections"));
        }
        let config = &self.config;

        info!("Segmenting {} projections", projections.len());
        let slices = projections
            .iter()
            .enumerate()
            .map(|(i, p)| {
                self.segmenter
                    .segment(&prepare_for_density_estimation(p), i)
            })
            .collect::<Result<Vec<_>>>()?;
        let masks = stack_masks(&slices)?;

        let cleaner = MaskCleaner::new(config.cluster_window, config.masks.clone());
        let final_mask = cleaner.clean(&masks.dense, &masks.breast)?;

        let finder = CandidateRegionFinder::new(self.reconstructor, config.candidate.clone());
        let centre = finder.find_cluster_center(&final_mask, rng)?;
        let geometry = finder.geometry_for(&final_mask);
        info!("Cluster centre at {}", centre);

        let layout = sample_layout(
            config.num_calc,
            config.cluster_window,
            config.calc_window,
            &config.layout,
            rng,
        )?;

        let compositor = CalcificationCompositor::new(
            self.catalog,
            self.repository,
            config.cluster_window,
            config.compositor.clone(),
        )?;
        let composite = compositor.composite(config.num_calc, &layout.positions, rng)?;

        let embedded = embed_roi(geometry.volume_shape(), &composite.roi, centre)?;
        let lesion = self.projector.forward_project(&embedded.volume, &geometry)?;
        let expected = (geometry.nv, geometry.nu, projections.len());
        if lesion.dim() != expected {
            return Err(InsertionError::Reconstruction(format!(
                "forward projection returned {:?}, expected {:?}",
                lesion.dim(),
                expected
            )));
        }

        // decode and blend everything before touching the projections
        let blended = projections
            .iter()
            .zip(lesion.axis_iter(Axis(2)))
            .map(|(projection, mask)| {
                let mut image = read_pixels(projection)?;
                blend_lesion(
                    &mut image,
                    mask,
                    config.masks.crop_columns,
                    config.blend.attenuation,
                )?;
                Ok(image)
            })
            .collect::<Result<Vec<_>>>()?;
        for (projection, image) in projections.iter_mut().zip(blended.iter()) {
            write_pixels(projection, image)?;
        }

        info!(
            "Inserted {} calcifications around {}",
            config.num_calc, centre
        );

        Ok(InsertionOutcome {
            centre,
            offset: embedded.offset,
            positions: layout.positions,
            contrasts: composite.contrasts,
            shapes: composite
                .shapes
                .iter()
                .map(|record| record.archive_name())
                .collect(),
        })
    }
}
