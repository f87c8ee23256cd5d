//! Grey-level morphology on 2-D slices
//!
//! Structuring elements are stored as one horizontal run of active columns
//! per element row, which covers rectangles and digital ellipses. Each
//! erosion/dilation computes a sliding minimum/maximum per distinct run and
//! then combines element rows vertically, so cost grows with the element
//! height rather than its area.
//!
//! Erosion takes the minimum over the element placed at its anchor; dilation
//! takes the maximum over the reflected element. Samples outside the image
//! are ignored. With the reflected dilation, [`open`] and [`close`] are
//! idempotent for even-sized elements too.

use ndarray::{Array2, ArrayView2};
use std::collections::{HashMap, VecDeque};

/// Flat structuring element made of one horizontal run per row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    anchor_row: usize,
    anchor_col: usize,
    /// Half-open `[start, end)` active columns per row; empty when start == end
    runs: Vec<(usize, usize)>,
}

impl StructuringElement {
    /// Full rectangle of `width` columns by `height` rows, anchored at its centre
    ///
    /// Zero extents are raised to 1.
    pub fn rect(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            anchor_row: height / 2,
            anchor_col: width / 2,
            runs: vec![(0, width); height],
        }
    }

    /// Digital ellipse inscribed in a `width` x `height` box, anchored at its centre
    ///
    /// Row `i` is active on `[c - dx, c + dx + 1)` clipped to the box, where
    /// `r = height / 2`, `c = width / 2`, `dy = i - r` and
    /// `dx = round(c * sqrt((r^2 - dy^2) / r^2))`.
    pub fn ellipse(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let r = (height / 2) as i64;
        let c = (width / 2) as i64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let runs = (0..height as i64)
            .map(|i| {
                let dy = i - r;
                if dy.abs() > r {
                    return (0, 0);
                }
                let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
                let start = (c - dx).max(0) as usize;
                let end = (c + dx + 1).min(width as i64) as usize;
                (start, end)
            })
            .collect();

        Self {
            width,
            height,
            anchor_row: height / 2,
            anchor_col: width / 2,
            runs,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if the element is active at `(row, col)`
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.runs
            .get(row)
            .is_some_and(|&(start, end)| col >= start && col < end)
    }

    /// Number of active cells
    pub fn area(&self) -> usize {
        self.runs.iter().map(|&(start, end)| end - start).sum()
    }

    /// Active rows as `(row offset, [col offset lo, col offset hi))` relative to the anchor
    fn offsets(&self, reflect: bool) -> Vec<(isize, isize, isize)> {
        let ar = self.anchor_row as isize;
        let ac = self.anchor_col as isize;
        self.runs
            .iter()
            .enumerate()
            .filter(|(_, run)| run.1 > run.0)
            .map(|(i, &(start, end))| {
                let dy = i as isize - ar;
                let lo = start as isize - ac;
                let hi = end as isize - ac;
                if reflect {
                    (-dy, 1 - hi, 1 - lo)
                } else {
                    (dy, lo, hi)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn identity(self) -> f64 {
        match self {
            Extremum::Min => f64::INFINITY,
            Extremum::Max => f64::NEG_INFINITY,
        }
    }

    /// True if `a` should replace `b` at the back of the monotonic deque
    fn dominates(self, a: f64, b: f64) -> bool {
        match self {
            Extremum::Min => a <= b,
            Extremum::Max => a >= b,
        }
    }

    fn pick(self, a: f64, b: f64) -> f64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

/// Grey-level erosion
pub fn erode(image: ArrayView2<f64>, element: &StructuringElement) -> Array2<f64> {
    apply(image, &element.offsets(false), Extremum::Min)
}

/// Grey-level dilation (reflected element)
pub fn dilate(image: ArrayView2<f64>, element: &StructuringElement) -> Array2<f64> {
    apply(image, &element.offsets(true), Extremum::Max)
}

/// Opening: erosion followed by dilation
pub fn open(image: ArrayView2<f64>, element: &StructuringElement) -> Array2<f64> {
    let eroded = erode(image, element);
    dilate(eroded.view(), element)
}

/// Closing: dilation followed by erosion
pub fn close(image: ArrayView2<f64>, element: &StructuringElement) -> Array2<f64> {
    let dilated = dilate(image, element);
    erode(dilated.view(), element)
}

fn apply(image: ArrayView2<f64>, offsets: &[(isize, isize, isize)], op: Extremum) -> Array2<f64> {
    let (rows, cols) = image.dim();
    let mut out = Array2::from_elem((rows, cols), op.identity());

    // Horizontal pass, shared between element rows with the same run
    let mut horizontal: HashMap<(isize, isize), Array2<f64>> = HashMap::new();
    for &(_, lo, hi) in offsets {
        horizontal
            .entry((lo, hi))
            .or_insert_with(|| sliding_rows(image, lo, hi, op));
    }

    // Vertical combination
    for &(dy, lo, hi) in offsets {
        let rowwise = &horizontal[&(lo, hi)];
        for r in 0..rows {
            let src = r as isize + dy;
            if src < 0 || src >= rows as isize {
                continue;
            }
            let src_row = rowwise.row(src as usize);
            let mut dst_row = out.row_mut(r);
            for (dst, &v) in dst_row.iter_mut().zip(src_row.iter()) {
                *dst = op.pick(*dst, v);
            }
        }
    }

    out
}

/// Per-row sliding extremum over `[c + lo, c + hi)` clipped to the row
fn sliding_rows(image: ArrayView2<f64>, lo: isize, hi: isize, op: Extremum) -> Array2<f64> {
    let (rows, cols) = image.dim();
    let mut out = Array2::from_elem((rows, cols), op.identity());
    let n = cols as isize;

    for r in 0..rows {
        let row = image.row(r);
        let mut window: VecDeque<usize> = VecDeque::new();
        let mut next: isize = 0;

        for c in 0..cols {
            let start = c as isize + lo;
            let end = (c as isize + hi).min(n);

            while next < end {
                if next >= 0 {
                    let v = row[next as usize];
                    while let Some(&back) = window.back() {
                        if op.dominates(v, row[back]) {
                            window.pop_back();
                        } else {
                            break;
                        }
                    }
                    window.push_back(next as usize);
                }
                next += 1;
            }
            while let Some(&front) = window.front() {
                if (front as isize) < start {
                    window.pop_front();
                } else {
                    break;
                }
            }
            if let Some(&front) = window.front() {
                out[[r, c]] = row[front];
            }
        }
    }

    out
}
