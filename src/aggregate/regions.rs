//! Regional decomposition of saliency grids.
//!
//! Each H×W grid is split at the fixed midlines `(H/2, W/2)` into four
//! quadrants. The intensity of quadrant `i` at frame `t` is its share of the
//! frame total: `q_i(t) = sum(quadrant_i(t)) / sum(grid(t))`, defined as `0`
//! when the frame total is exactly zero.

use serde::{Deserialize, Serialize};

use crate::archive::Array;

/// One of the four grid quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Quadrants in row-major order.
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 3,
        }
    }

    /// Human readable label used for subplot titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "Top left",
            Self::TopRight => "Top right",
            Self::BottomLeft => "Bottom left",
            Self::BottomRight => "Bottom right",
        }
    }

    /// `(row, col)` of this quadrant in a 2×2 subplot grid, 1-based.
    #[must_use]
    pub const fn subplot(self) -> (u8, u8) {
        match self {
            Self::TopLeft => (1, 1),
            Self::TopRight => (1, 2),
            Self::BottomLeft => (2, 1),
            Self::BottomRight => (2, 2),
        }
    }

    fn of(row: usize, col: usize, mid_row: usize, mid_col: usize) -> Self {
        match (row < mid_row, col < mid_col) {
            (true, true) => Self::TopLeft,
            (true, false) => Self::TopRight,
            (false, true) => Self::BottomLeft,
            (false, false) => Self::BottomRight,
        }
    }
}

/// Per-quadrant intensity series plus per-frame totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSeries {
    /// `quadrants[q.index()][t]` is `q(t)`.
    pub quadrants: [Vec<f64>; 4],
    /// Sum over the full grid at each frame.
    pub totals: Vec<f64>,
}

impl RegionSeries {
    /// Episode length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    #[must_use]
    pub fn quadrant(&self, q: Quadrant) -> &[f64] {
        &self.quadrants[q.index()]
    }

    /// The four fractions at frame `t`.
    #[must_use]
    pub fn at(&self, t: usize) -> Option<[f64; 4]> {
        if t >= self.len() {
            return None;
        }
        Some([
            self.quadrants[0][t],
            self.quadrants[1][t],
            self.quadrants[2][t],
            self.quadrants[3][t],
        ])
    }
}

/// Raw (unnormalized) quadrant sums of a single row-major `h × w` grid.
#[must_use]
pub fn quadrant_sums(grid: &[f32], h: usize, w: usize) -> [f64; 4] {
    let (mid_row, mid_col) = (h / 2, w / 2);
    let mut sums = [0.0f64; 4];
    for (row, cells) in grid.chunks(w.max(1)).take(h).enumerate() {
        for (col, &v) in cells.iter().enumerate() {
            sums[Quadrant::of(row, col, mid_row, mid_col).index()] += f64::from(v);
        }
    }
    sums
}

/// Quadrant fractions of a single grid; all zero when the grid sums to zero.
#[must_use]
pub fn quadrant_fractions(grid: &[f32], h: usize, w: usize) -> ([f64; 4], f64) {
    let sums = quadrant_sums(grid, h, w);
    let total: f64 = sums.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return ([0.0; 4], if total.is_finite() { total } else { 0.0 });
    }
    (sums.map(|s| s / total), total)
}

/// Regional intensity series for a `[L, H, W]` stack of grids.
///
/// Trailing dimensions beyond `H` are flattened into the width, so a
/// `[L, H, W, C]` tensor is treated as `H × (W·C)`.
#[must_use]
pub fn regional_intensity(grids: &Array) -> RegionSeries {
    let frame_shape = grids.frame_shape();
    let h = frame_shape.first().copied().unwrap_or(1);
    let w = frame_shape.get(1..).map_or(1, |rest| rest.iter().product());

    let mut out = RegionSeries::default();
    for frame in grids.frames() {
        let (fractions, total) = quadrant_fractions(frame, h, w);
        for (series, value) in out.quadrants.iter_mut().zip(fractions) {
            series.push(value);
        }
        out.totals.push(total);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_stack(frames: &[Vec<f32>], h: usize, w: usize) -> Array {
        Array::from_frames(&[h, w], frames).unwrap()
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let frames: Vec<Vec<f32>> = (0..5)
            .map(|t| (0..36).map(|i| ((i * 7 + t * 3) % 11) as f32).collect())
            .collect();
        let series = regional_intensity(&grid_stack(&frames, 6, 6));
        for t in 0..series.len() {
            let sum: f64 = series.at(t).unwrap().iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "frame {t} sums to {sum}");
        }
    }

    #[test]
    fn test_zero_frame_yields_zero_fractions() {
        let series = regional_intensity(&grid_stack(&[vec![0.0; 16]], 4, 4));
        assert_eq!(series.at(0), Some([0.0; 4]));
        assert_eq!(series.totals, vec![0.0]);
    }

    #[test]
    fn test_single_hot_cell_lands_in_its_quadrant() {
        // 4x4 grid, hot cell at row 3, col 0 -> bottom left
        let mut g = vec![0.0; 16];
        g[3 * 4] = 2.0;
        let series = regional_intensity(&grid_stack(&[g], 4, 4));
        assert_eq!(series.quadrant(Quadrant::BottomLeft), &[1.0]);
        assert_eq!(series.quadrant(Quadrant::TopRight), &[0.0]);
        assert_eq!(series.totals, vec![2.0]);
    }

    #[test]
    fn test_odd_dimensions_split_at_integer_midline() {
        // 3x3: mid_row = 1, mid_col = 1, so only (0,0) is top-left.
        let series = regional_intensity(&grid_stack(&[vec![1.0; 9]], 3, 3));
        let at = series.at(0).unwrap();
        assert!((at[0] - 1.0 / 9.0).abs() < 1e-12);
        assert!((at[1] - 2.0 / 9.0).abs() < 1e-12);
        assert!((at[2] - 2.0 / 9.0).abs() < 1e-12);
        assert!((at[3] - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_episode_is_empty_result() {
        let series = regional_intensity(&Array::zeros(vec![0, 80, 80]));
        assert!(series.is_empty());
        assert!(series.quadrants.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_zero_width_grids_yield_zero_fractions_per_frame() {
        let series = regional_intensity(&Array::zeros(vec![3, 4, 0]));
        assert_eq!(series.len(), 3);
        assert_eq!(series.at(2), Some([0.0; 4]));
        assert_eq!(series.totals, vec![0.0; 3]);
    }
}
