//! Online summary statistics for Monte Carlo output
//!
//! Mean and variance use Welford's update; percentiles are exact, computed
//! from the retained draws (one f64 per iteration) at summary time.

use serde::{Deserialize, Serialize};

use crate::portfolio::CostEffectiveness;

/// Summary of one output metric across iterations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: u64,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    pub median: f64,
    pub p2_5: f64,
    pub p97_5: f64,
}

/// Running mean/variance with retained samples
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    samples: Vec<f64>,
}

impl RunningStats {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.samples.push(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; 0 with fewer than two observations
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> Option<MetricSummary> {
        if self.count == 0 {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        Some(MetricSummary {
            count: self.count,
            mean: self.mean,
            std_dev: self.std_dev(),
            median: percentile(&sorted, 0.5),
            p2_5: percentile(&sorted, 0.025),
            p97_5: percentile(&sorted, 0.975),
        })
    }
}

/// Linear-interpolated percentile of sorted data, `q` in [0, 1]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Cost-per-QALY draws split by dominance class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostPerQalySummary {
    /// Summary of the numeric ratios, if any iteration produced one
    pub ratios: Option<MetricSummary>,
    pub dominant_share: f64,
    pub dominated_share: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CostPerQalyStats {
    ratios: RunningStats,
    dominant: u64,
    dominated: u64,
    total: u64,
}

impl CostPerQalyStats {
    pub fn push(&mut self, outcome: &CostEffectiveness) {
        self.total += 1;
        match *outcome {
            CostEffectiveness::CostPerQaly(ratio) => self.ratios.push(ratio),
            CostEffectiveness::Dominant => self.dominant += 1,
            CostEffectiveness::Dominated => self.dominated += 1,
        }
    }

    pub fn summary(&self) -> CostPerQalySummary {
        let share = |n: u64| if self.total == 0 { 0.0 } else { n as f64 / self.total as f64 };
        CostPerQalySummary {
            ratios: self.ratios.summary(),
            dominant_share: share(self.dominant),
            dominated_share: share(self.dominated),
        }
    }
}

/// Online Pearson correlation between two paired series
#[derive(Debug, Clone, Copy, Default)]
pub struct PairedStats {
    count: u64,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    co_moment: f64,
}

impl PairedStats {
    pub fn push(&mut self, x: f64, y: f64) {
        self.count += 1;
        let n = self.count as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        let dy = y - self.mean_y;
        self.mean_y += dy / n;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.co_moment += dx * (y - self.mean_y);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    /// `None` until both series have non-zero spread
    pub fn correlation(&self) -> Option<f64> {
        if self.count < 2 || self.m2_x <= 0.0 || self.m2_y <= 0.0 {
            return None;
        }
        Some((self.co_moment / (self.m2_x * self.m2_y).sqrt()).clamp(-1.0, 1.0))
    }
}

/// How strongly one sampled parameter moves the portfolio net benefit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSensitivity {
    /// Scoped name, e.g. `cardiovascular.event_cost`
    pub parameter: String,
    pub mean_draw: f64,
    /// Pearson correlation of the draws with net benefit
    pub correlation: f64,
}

/// One point of the cost-effectiveness acceptability curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptabilityPoint {
    pub threshold: f64,
    pub probability: f64,
}

/// Share of iterations that are cost-effective at each threshold
#[derive(Debug, Clone)]
pub struct AcceptabilityCurve {
    thresholds: Vec<f64>,
    counts: Vec<u64>,
    total: u64,
}

impl AcceptabilityCurve {
    pub fn new(thresholds: &[f64]) -> Self {
        Self {
            thresholds: thresholds.to_vec(),
            counts: vec![0; thresholds.len()],
            total: 0,
        }
    }

    pub fn push(&mut self, outcome: &CostEffectiveness) {
        self.total += 1;
        for (count, &threshold) in self.counts.iter_mut().zip(&self.thresholds) {
            if outcome.is_cost_effective(threshold) {
                *count += 1;
            }
        }
    }

    pub fn points(&self) -> Vec<AcceptabilityPoint> {
        self.thresholds
            .iter()
            .zip(&self.counts)
            .map(|(&threshold, &count)| AcceptabilityPoint {
                threshold,
                probability: if self.total == 0 {
                    0.0
                } else {
                    count as f64 / self.total as f64
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_welford_matches_two_pass() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = RunningStats::default();
        for &x in &data {
            stats.push(x);
        }
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
        assert_relative_eq!(stats.mean(), 5.0);
        assert_relative_eq!(stats.variance(), var, max_relative = 1e-12);
    }

    #[test]
    fn test_percentiles_interpolate() {
        let sorted: Vec<f64> = (1..=5).map(f64::from).collect();
        assert_relative_eq!(percentile(&sorted, 0.5), 3.0);
        assert_relative_eq!(percentile(&sorted, 0.025), 1.1, max_relative = 1e-12);
        assert_relative_eq!(percentile(&sorted, 0.975), 4.9, max_relative = 1e-12);
        assert_eq!(percentile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn test_summary_of_empty_is_none() {
        assert!(RunningStats::default().summary().is_none());
        let mut one = RunningStats::default();
        one.push(3.0);
        let summary = one.summary().unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.median, 3.0);
    }

    #[test]
    fn test_dominance_shares() {
        let mut stats = CostPerQalyStats::default();
        stats.push(&CostEffectiveness::Dominant);
        stats.push(&CostEffectiveness::Dominant);
        stats.push(&CostEffectiveness::Dominated);
        stats.push(&CostEffectiveness::CostPerQaly(1000.0));
        let summary = stats.summary();
        assert_relative_eq!(summary.dominant_share, 0.5);
        assert_relative_eq!(summary.dominated_share, 0.25);
        assert_eq!(summary.ratios.unwrap().count, 1);
    }

    #[test]
    fn test_paired_correlation() {
        let mut linear = PairedStats::default();
        let mut inverse = PairedStats::default();
        let mut flat = PairedStats::default();
        for x in [1.0, 2.5, 4.0, 7.0, 11.0] {
            linear.push(x, 3.0 * x + 2.0);
            inverse.push(x, -x);
            flat.push(x, 5.0);
        }
        assert_relative_eq!(linear.correlation().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(inverse.correlation().unwrap(), -1.0, epsilon = 1e-12);
        assert!(flat.correlation().is_none());
        assert_relative_eq!(linear.mean_x(), 5.1, epsilon = 1e-12);
    }

    #[test]
    fn test_paired_correlation_of_uncorrelated_pattern() {
        let mut stats = PairedStats::default();
        for (x, y) in [(1.0, 1.0), (2.0, -1.0), (3.0, -1.0), (4.0, 1.0)] {
            stats.push(x, y);
        }
        assert_relative_eq!(stats.correlation().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acceptability_curve() {
        let mut curve = AcceptabilityCurve::new(&[0.0, 50_000.0, 100_000.0]);
        curve.push(&CostEffectiveness::CostPerQaly(60_000.0));
        curve.push(&CostEffectiveness::Dominant);
        let points = curve.points();
        assert_eq!(points[0].probability, 0.5);
        assert_eq!(points[1].probability, 0.5);
        assert_eq!(points[2].probability, 1.0);
    }
}
