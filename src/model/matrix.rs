//! Transition matrix construction and validation
//!
//! Matrices are assembled from off-diagonal (outgoing) probabilities; the
//! self-transition of each transient state is the residual `1 - sum(outgoing)`.
//! A negative residual is a configuration error and is never clamped away.

use super::HealthState;
use crate::error::ConfigError;

/// Maximum allowed deviation of a row sum from 1
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Slack allowed when outgoing probabilities sum marginally above 1 through
/// floating-point rounding
const OVERFLOW_SLACK: f64 = 1e-12;

/// Row-stochastic transition matrix over an ordered set of health states
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    states: Vec<HealthState>,
    /// Row-major probabilities, `probs[from * n + to]`
    probs: Vec<f64>,
}

impl TransitionMatrix {
    /// Number of states (rows and columns)
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[HealthState] {
        &self.states
    }

    /// Position of a state in the ordering
    pub fn index_of(&self, state: HealthState) -> Option<usize> {
        self.states.iter().position(|&s| s == state)
    }

    /// Probability of moving from state index `from` to state index `to`
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.probs[from * self.size() + to]
    }

    /// Probability between two named states (0 if either is absent)
    pub fn probability(&self, from: HealthState, to: HealthState) -> f64 {
        match (self.index_of(from), self.index_of(to)) {
            (Some(i), Some(j)) => self.get(i, j),
            _ => 0.0,
        }
    }

    pub fn row(&self, from: usize) -> &[f64] {
        let n = self.size();
        &self.probs[from * n..(from + 1) * n]
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.size()).map(|i| self.row(i).iter().sum()).collect()
    }

    /// Advance an occupancy vector one cycle: `next = occupancy x matrix`
    pub fn advance(&self, occupancy: &[f64]) -> Vec<f64> {
        let n = self.size();
        let mut next = vec![0.0; n];
        for (i, &share) in occupancy.iter().enumerate() {
            if share == 0.0 {
                continue;
            }
            for (j, slot) in next.iter_mut().enumerate() {
                *slot += share * self.probs[i * n + j];
            }
        }
        next
    }

    /// Check the stochastic-matrix invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, state) in self.states.iter().enumerate() {
            let row = self.row(i);
            for (j, &p) in row.iter().enumerate() {
                if !(0.0..=1.0).contains(&p) {
                    return Err(ConfigError::ProbabilityOutOfRange {
                        name: format!("{}->{}", state.label(), self.states[j].label()),
                        value: p,
                    });
                }
            }

            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ConfigError::RowSum {
                    state: state.label().to_string(),
                    total,
                });
            }

            if state.is_absorbing() && row[i] != 1.0 {
                return Err(ConfigError::RowSum {
                    state: state.label().to_string(),
                    total: row[i],
                });
            }
        }
        Ok(())
    }
}

/// Assembles a [`TransitionMatrix`] from outgoing probabilities
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    states: Vec<HealthState>,
    outgoing: Vec<f64>,
}

impl MatrixBuilder {
    pub fn new(states: &[HealthState]) -> Self {
        let n = states.len();
        Self {
            states: states.to_vec(),
            outgoing: vec![0.0; n * n],
        }
    }

    fn index(&self, state: HealthState) -> Result<usize, ConfigError> {
        self.states
            .iter()
            .position(|&s| s == state)
            .ok_or_else(|| ConfigError::parameter(state.label(), "state is not part of this model"))
    }

    /// Set the probability of moving between two distinct states
    pub fn set(&mut self, from: HealthState, to: HealthState, p: f64) -> Result<&mut Self, ConfigError> {
        let name = format!("{}->{}", from.label(), to.label());
        if from == to {
            return Err(ConfigError::parameter(name, "self-transition is the residual and cannot be set"));
        }
        if from.is_absorbing() {
            return Err(ConfigError::parameter(name, "absorbing state cannot have outgoing transitions"));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::ProbabilityOutOfRange { name, value: p });
        }

        let n = self.states.len();
        let (i, j) = (self.index(from)?, self.index(to)?);
        self.outgoing[i * n + j] = p;
        Ok(self)
    }

    /// Fill residual self-transitions and validate
    pub fn build(self) -> Result<TransitionMatrix, ConfigError> {
        let n = self.states.len();
        let mut probs = self.outgoing;

        for (i, state) in self.states.iter().enumerate() {
            if state.is_absorbing() {
                probs[i * n + i] = 1.0;
                continue;
            }

            let total: f64 = (0..n).filter(|&j| j != i).map(|j| probs[i * n + j]).sum();
            if total > 1.0 + OVERFLOW_SLACK {
                return Err(ConfigError::RowOverflow {
                    state: state.label().to_string(),
                    total,
                });
            }
            probs[i * n + i] = (1.0 - total).max(0.0);
        }

        let matrix = TransitionMatrix {
            states: self.states,
            probs,
        };
        matrix.validate()?;
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use HealthState::*;

    fn three_state() -> MatrixBuilder {
        MatrixBuilder::new(&[Healthy, AtRisk, Death])
    }

    #[test]
    fn test_residual_self_transition() {
        let mut builder = three_state();
        builder.set(Healthy, AtRisk, 0.05).unwrap().set(Healthy, Death, 0.001).unwrap();
        builder.set(AtRisk, Death, 0.002).unwrap();
        let m = builder.build().unwrap();

        assert_abs_diff_eq!(m.get(0, 0), 0.949, epsilon = 1e-12);
        assert_abs_diff_eq!(m.get(1, 1), 0.998, epsilon = 1e-12);
        for sum in m.row_sums() {
            assert_abs_diff_eq!(sum, 1.0, epsilon = ROW_SUM_TOLERANCE);
        }
    }

    #[test]
    fn test_death_row_is_identity() {
        let m = three_state().build().unwrap();
        assert_eq!(m.row(2), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut builder = three_state();
        builder.set(Healthy, AtRisk, 0.7).unwrap().set(Healthy, Death, 0.4).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, ConfigError::RowOverflow { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_and_absorbing_outgoing() {
        let mut builder = three_state();
        assert!(builder.set(Healthy, AtRisk, 1.5).is_err());
        assert!(builder.set(Death, Healthy, 0.1).is_err());
        assert!(builder.set(AtRisk, AtRisk, 0.1).is_err());
    }

    #[test]
    fn test_advance_conserves_mass() {
        let mut builder = three_state();
        builder.set(Healthy, AtRisk, 0.1).unwrap();
        builder.set(AtRisk, Death, 0.2).unwrap();
        let m = builder.build().unwrap();

        let next = m.advance(&[0.6, 0.4, 0.0]);
        assert_abs_diff_eq!(next[0], 0.54, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 0.06 + 0.32, epsilon = 1e-12);
        assert_abs_diff_eq!(next[2], 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(next.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}
