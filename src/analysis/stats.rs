/// Mean and sample standard deviation of one group of observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalSummary {
    count: usize,
    mean: f64,
    std_dev: f64,
}

impl StatisticalSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let mean = if count == 0 {
            0.0
        } else {
            values.iter().sum::<f64>() / count as f64
        };

        Self {
            count,
            mean,
            std_dev: sample_std_dev(values, mean),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Absolute distance of `value` from the mean in standard deviations.
    ///
    /// Returns `None` when the group has no spread (fewer than two
    /// observations or all equal), so such a group never yields an outlier.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.std_dev == 0.0 {
            return None;
        }

        let z_score = ((value - self.mean) / self.std_dev).abs();
        z_score.is_finite().then_some(z_score)
    }

    /// `Some(z)` only when `value` lies strictly beyond `threshold`.
    pub fn outlier_score(&self, value: f64, threshold: f64) -> Option<f64> {
        self.z_score(value).filter(|z| *z > threshold)
    }
}

/// Bessel-corrected standard deviation; zero for fewer than two values.
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let sum_squared_diffs: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_squared_diffs / (values.len() - 1) as f64).sqrt()
}
