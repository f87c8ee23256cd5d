use rand::Rng;

use crate::config::CompositorParams;

/// Draws one peak contrast per calcification
///
/// The first calcification always gets full contrast `1.0`. Every other one
/// gets `contrast_min + k * step` with `k` uniform over the
/// `contrast_bins` levels and `step = (contrast_max - contrast_min) / contrast_bins`.
pub fn draw_contrasts<R: Rng + ?Sized>(
    num_calc: usize,
    params: &CompositorParams,
    rng: &mut R,
) -> Vec<f64> {
    let bins = params.contrast_bins.max(1);
    let step = (params.contrast_max - params.contrast_min) / bins as f64;
    (0..num_calc)
        .map(|i| {
            if i == 0 {
                1.0
            } else {
                params.contrast_min + rng.gen_range(0..bins) as f64 * step
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_first_contrast_is_full() {
        let mut rng = StdRng::seed_from_u64(1);
        let contrasts = draw_contrasts(8, &CompositorParams::default(), &mut rng);
        assert_eq!(contrasts.len(), 8);
        assert_eq!(contrasts[0], 1.0);
        for &c in &contrasts[1..] {
            assert!((0.5..1.0).contains(&c), "contrast {}", c);
        }
    }

    #[test]
    fn test_contrasts_fall_on_bins() {
        let mut rng = StdRng::seed_from_u64(5);
        let contrasts = draw_contrasts(2000, &CompositorParams::default(), &mut rng);
        for &c in &contrasts[1..] {
            let k = (c - 0.5) / 0.005;
            assert!((k - k.round()).abs() < 1e-6);
        }
        // the top bin is reachable
        assert!(contrasts[1..].iter().any(|&c| (c - 0.995).abs() < 1e-9));
    }

    #[test]
    fn test_zero_calcifications() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(draw_contrasts(0, &CompositorParams::default(), &mut rng).is_empty());
    }
}
