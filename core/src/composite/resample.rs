use ndarray::{Array2, Array3, ArrayView2, Axis};

/// Nearest-neighbour resize of a 2-D plane
///
/// Destination index `d` along an axis of source length `n` and destination
/// length `m` reads source index `floor(d * n / m)`.
pub fn resize_nearest(plane: ArrayView2<f64>, shape: (usize, usize)) -> Array2<f64> {
    let (src_rows, src_cols) = plane.dim();
    let (rows, cols) = shape;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        plane[[r * src_rows / rows, c * src_cols / cols]]
    })
}

/// Halves a volume on every axis, rounding sizes up
///
/// Two passes: every axis-0 slice is resized in its (1, 2) plane, then every
/// axis-2 slice of the intermediate is resized in its (0, 1) plane.
pub fn halve_volume(volume: &Array3<f64>) -> Array3<f64> {
    let (a, b, c) = volume.dim();
    let (ha, hb, hc) = (a.div_ceil(2), b.div_ceil(2), c.div_ceil(2));

    let mut inner = Array3::<f64>::zeros((a, hb, hc));
    for (src, mut dst) in volume
        .axis_iter(Axis(0))
        .zip(inner.axis_iter_mut(Axis(0)))
    {
        dst.assign(&resize_nearest(src, (hb, hc)));
    }

    let mut out = Array3::<f64>::zeros((ha, hb, hc));
    for (src, mut dst) in inner.axis_iter(Axis(2)).zip(out.axis_iter_mut(Axis(2))) {
        dst.assign(&resize_nearest(src, (ha, hb)));
    }
    out
}
