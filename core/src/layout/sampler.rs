use log::debug;
use ndarray::{s, Array3, ArrayView1, Axis, Zip};
use rand::Rng;

use super::field::{exclusion_template, gaussian_field, inverse_cdf_index, normalize};
use crate::config::LayoutParams;
use crate::error::{InsertionError, Result};
use crate::types::{centered_span, Position, Window3};

/// Positions drawn for one cluster, with a snapshot of the field after each draw
#[derive(Debug, Clone)]
pub struct ClusterLayout {
    pub positions: Vec<Position>,
    pub pdf_history: Vec<Array3<f64>>,
}

/// Sequential declumping sampler for the calcifications of one cluster
///
/// Owns the placement probability field for the lifetime of one cluster.
/// Each draw conditions on every earlier draw: after a calcification is
/// placed, the field around it is multiplied by the exclusion template so
/// later calcifications tend to spread out without being forbidden from
/// touching.
///
/// # Example
///
/// ```
/// use mcinsert_core::{ClusterLayoutSampler, LayoutParams, Window3};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let sampler = ClusterLayoutSampler::new(
///     Window3::new(60, 60, 12),
///     Window3::new(20, 20, 6),
///     &LayoutParams::default(),
/// )
/// .unwrap();
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let layout = sampler.sample(4, &mut rng).unwrap();
/// assert_eq!(layout.positions.len(), 4);
/// assert_eq!(layout.pdf_history.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct ClusterLayoutSampler {
    cluster: Window3,
    calc: Window3,
    bounds: [(usize, usize); 3],
    field: Array3<f64>,
    template: Array3<f64>,
}

impl ClusterLayoutSampler {
    /// Creates a sampler with a fresh prior field
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the calcification window does not fit
    /// in the cluster window (the clamp bounds would invert).
    pub fn new(cluster: Window3, calc: Window3, params: &LayoutParams) -> Result<Self> {
        let bounds = cluster.placement_bounds(&calc)?;
        Ok(Self {
            cluster,
            calc,
            bounds,
            field: gaussian_field(cluster, params.prior_stdev),
            template: exclusion_template(calc, params.exclusion_stdev),
        })
    }

    /// Current placement probability field
    pub fn field(&self) -> &Array3<f64> {
        &self.field
    }

    pub fn cluster_window(&self) -> Window3 {
        self.cluster
    }

    pub fn calc_window(&self) -> Window3 {
        self.calc
    }

    /// Draws `num_calc` positions, consuming the sampler
    ///
    /// # Errors
    ///
    /// - `PreconditionViolation` if `num_calc` is zero
    /// - `DegenerateField` if the field loses all of its mass
    pub fn sample<R: Rng + ?Sized>(mut self, num_calc: usize, rng: &mut R) -> Result<ClusterLayout> {
        if num_calc == 0 {
            return Err(InsertionError::precondition(
                "a cluster needs at least one calcification",
            ));
        }

        let mut positions = Vec::with_capacity(num_calc);
        let mut pdf_history = Vec::with_capacity(num_calc);

        for i in 0..num_calc {
            let position = self.place_next(rng)?;
            debug!(
                "Placed calcification {}/{} at {}",
                i + 1,
                num_calc,
                position
            );
            positions.push(position);
            pdf_history.push(self.field.clone());
        }

        Ok(ClusterLayout {
            positions,
            pdf_history,
        })
    }

    /// Draws one position, then applies the exclusion update and renormalises
    pub fn place_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Position> {
        // XY projection of the field
        let mut plane = self.field.sum_axis(Axis(2));
        let plane_total = plane.sum();
        if !(plane_total.is_finite() && plane_total > 0.0) {
            return Err(InsertionError::DegenerateField(format!(
                "XY projection sums to {}",
                plane_total
            )));
        }
        plane /= plane_total;

        let x = self.draw(plane.sum_axis(Axis(1)).view(), 0, rng)?;
        let y = self.draw(plane.row(x), 1, rng)?;
        let z = self.draw(self.field.slice(s![x, y, ..]), 2, rng)?;
        let position = Position::new(x, y, z);

        self.exclude_around(position);
        normalize(&mut self.field)?;

        Ok(position)
    }

    /// Inverse-CDF draw along one axis, clamped into the placement bounds
    fn draw<R: Rng + ?Sized>(
        &self,
        weights: ArrayView1<f64>,
        axis: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let u: f64 = rng.gen();
        let index = inverse_cdf_index(weights, u)?;
        let (lower, upper) = self.bounds[axis];
        Ok(index.clamp(lower, upper))
    }

    /// Multiplies the calcification-window block centred on `position` by the template
    fn exclude_around(&mut self, position: Position) {
        let (x0, x1) = centered_span(position.x, self.calc.x);
        let (y0, y1) = centered_span(position.y, self.calc.y);
        let (z0, z1) = centered_span(position.z, self.calc.z);

        // clamped positions keep every span inside the cluster window
        let mut block = self.field.slice_mut(s![
            x0 as usize..x1 as usize,
            y0 as usize..y1 as usize,
            z0 as usize..z1 as usize
        ]);
        Zip::from(&mut block)
            .and(&self.template)
            .for_each(|f, &t| *f *= t);
    }
}

/// Samples a cluster layout with a fresh sampler
pub fn sample_layout<R: Rng + ?Sized>(
    num_calc: usize,
    cluster: Window3,
    calc: Window3,
    params: &LayoutParams,
    rng: &mut R,
) -> Result<ClusterLayout> {
    ClusterLayoutSampler::new(cluster, calc, params)?.sample(num_calc, rng)
}
