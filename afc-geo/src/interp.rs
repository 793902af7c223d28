use crate::result::{Error, Result};

/// A piecewise-linear 1-D lookup table.
///
/// Stores, per interval, the left ordinate and the interval slope. Queries
/// below the first or above the last abscissa clamp to the edge interval and
/// extrapolate linearly.
#[derive(Clone, Debug)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl LinearInterpolator {
    /// Build a table from samples sorted by strictly increasing abscissa.
    pub fn new(samples: &[(f64, f64)]) -> Result<Self> {
        Self::with_shift(samples, 0.0, 0.0)
    }

    /// Build a table from sorted samples, offsetting every sample by
    /// `(x_shift, y_shift)` first.
    pub fn with_shift(samples: &[(f64, f64)], x_shift: f64, y_shift: f64) -> Result<Self> {
        if samples.len() < 2 {
            return Err(Error::TableTooSmall);
        }

        let xs: Vec<f64> = samples.iter().map(|(x, _)| x + x_shift).collect();
        let ys: Vec<f64> = samples.iter().map(|(_, y)| y + y_shift).collect();

        let mut slopes = Vec::with_capacity(xs.len() - 1);
        for i in 0..xs.len() - 1 {
            let dx = xs[i + 1] - xs[i];
            if dx <= 0.0 {
                return Err(Error::TableNotIncreasing);
            }
            slopes.push((ys[i + 1] - ys[i]) / dx);
        }

        Ok(Self { xs, ys, slopes })
    }

    /// The index of the interval containing `x`, clamped to the edge
    /// intervals. Intervals are half-open on the right.
    fn interval(&self, x: f64) -> usize {
        let n = self.slopes.len();
        let idx = self.xs.partition_point(|&x0| x0 <= x);
        idx.saturating_sub(1).min(n - 1)
    }

    /// Evaluate the table at `x`.
    pub fn value(&self, x: f64) -> f64 {
        let i = self.interval(x);
        self.ys[i] + self.slopes[i] * (x - self.xs[i])
    }

    /// The slope of the interval containing `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        self.slopes[self.interval(x)]
    }

    /// The smallest abscissa of the table.
    pub fn min_x(&self) -> f64 {
        self.xs[0]
    }

    /// The largest abscissa of the table.
    pub fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}
