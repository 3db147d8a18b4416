//! Acute-event structure
//!
//! Two states, `AtRisk` and `Death`. A recurrent annual event hazard acts on
//! everyone still at risk; a fraction of events is fatal and the survivors
//! stay at risk. Each event carries a one-off healthcare cost, productivity
//! loss and QALY decrement on top of the per-cycle state rewards.

use serde::{Deserialize, Serialize};

use super::{ArmInputs, EffectDraw, HealthState, MarkovStructure, MatrixBuilder, Rewards};
use crate::config::{ParameterSource, Support, Uncertain};
use crate::error::ConfigError;

const STATES: [HealthState; 2] = [HealthState::AtRisk, HealthState::Death];

/// Declared parameters of an acute-event disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcuteEventModel {
    /// Annual probability of a disease event among the at-risk cohort
    pub annual_event_rate: Uncertain,
    /// Fraction of events that are fatal
    pub case_fatality_rate: Uncertain,
    /// Annual probability of death from other causes
    #[serde(default = "Uncertain::zero")]
    pub background_mortality: Uncertain,
    /// Utility weight of a year spent at risk
    pub utility_weight: Uncertain,
    /// QALYs lost per event, scaled by the utility weight
    #[serde(default = "Uncertain::zero")]
    pub qalys_lost_per_event: Uncertain,
    /// Annual healthcare cost of a year spent at risk
    #[serde(default = "Uncertain::zero")]
    pub annual_cost: Uncertain,
    /// Healthcare cost of one event
    pub event_cost: Uncertain,
    /// Productivity loss of one event
    #[serde(default = "Uncertain::zero")]
    pub productivity_cost: Uncertain,
}

impl AcuteEventModel {
    fn parameters(&self) -> [(&'static str, &Uncertain, Support); 8] {
        [
            ("annual_event_rate", &self.annual_event_rate, Support::Probability),
            ("case_fatality_rate", &self.case_fatality_rate, Support::Probability),
            ("background_mortality", &self.background_mortality, Support::Probability),
            ("utility_weight", &self.utility_weight, Support::Probability),
            ("qalys_lost_per_event", &self.qalys_lost_per_event, Support::NonNegative),
            ("annual_cost", &self.annual_cost, Support::NonNegative),
            ("event_cost", &self.event_cost, Support::NonNegative),
            ("productivity_cost", &self.productivity_cost, Support::NonNegative),
        ]
    }

    pub fn validate(&self, disease: &str) -> Result<(), ConfigError> {
        for (name, param, support) in self.parameters() {
            param.validate(&format!("{}.{}", disease, name), support)?;
        }
        Ok(())
    }

    /// Realize every parameter, in declaration order
    pub fn realize<S: ParameterSource>(&self, source: &mut S) -> Result<AcuteEventRealization, ConfigError> {
        let mut values = [0.0; 8];
        for (slot, (name, param, support)) in values.iter_mut().zip(self.parameters()) {
            *slot = source.value(name, param, support)?;
        }
        let [event_rate, case_fatality, background_mortality, utility, qalys_lost_per_event, annual_cost, event_cost, productivity_cost] =
            values;

        Ok(AcuteEventRealization {
            event_rate,
            case_fatality,
            background_mortality,
            utility,
            qalys_lost_per_event,
            annual_cost,
            event_cost,
            productivity_cost,
        })
    }

    #[cfg(test)]
    pub(crate) fn example_cardiovascular() -> Self {
        Self {
            annual_event_rate: Uncertain::fixed(0.012),
            case_fatality_rate: Uncertain::fixed(0.15),
            background_mortality: Uncertain::zero(),
            utility_weight: Uncertain::fixed(0.85),
            qalys_lost_per_event: Uncertain::fixed(0.0617),
            annual_cost: Uncertain::zero(),
            event_cost: Uncertain::fixed(174_610.0),
            productivity_cost: Uncertain::fixed(487_832.0),
        }
    }
}

/// One realization of an acute-event model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcuteEventRealization {
    pub event_rate: f64,
    pub case_fatality: f64,
    pub background_mortality: f64,
    pub utility: f64,
    pub qalys_lost_per_event: f64,
    pub annual_cost: f64,
    pub event_cost: f64,
    pub productivity_cost: f64,
}

impl MarkovStructure for AcuteEventRealization {
    fn states(&self) -> &'static [HealthState] {
        &STATES
    }

    fn initial_occupancy(&self) -> Vec<f64> {
        vec![1.0, 0.0]
    }

    fn arm(&self, effect: Option<&EffectDraw>) -> Result<ArmInputs, ConfigError> {
        let event_rate = match effect {
            Some(effect) => effect.apply("annual_event_rate", self.event_rate)?,
            None => self.event_rate,
        };
        let death = event_rate * self.case_fatality + self.background_mortality;

        let mut builder = MatrixBuilder::new(&STATES);
        builder.set(HealthState::AtRisk, HealthState::Death, death)?;

        Ok(ArmInputs {
            matrix: builder.build()?,
            event_probabilities: vec![event_rate, 0.0],
        })
    }

    fn rewards(&self) -> Rewards {
        Rewards {
            utilities: vec![self.utility, 0.0],
            annual_costs: vec![self.annual_cost, 0.0],
            event_costs: vec![self.event_cost, 0.0],
            event_productivity_losses: vec![self.productivity_cost, 0.0],
            event_qaly_losses: vec![self.qalys_lost_per_event * self.utility, 0.0],
            intervention_mask: vec![1.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointEstimates;
    use approx::assert_abs_diff_eq;

    fn realized() -> AcuteEventRealization {
        AcuteEventModel::example_cardiovascular()
            .realize(&mut PointEstimates)
            .unwrap()
    }

    #[test]
    fn test_rows_sum_to_one_for_sampled_parameters() {
        use crate::model::EffectSize;
        use crate::psa::ParameterSampler;

        let mut declared = AcuteEventModel::example_cardiovascular();
        declared.annual_event_rate = Uncertain::beta(12.0, 988.0);
        declared.case_fatality_rate = Uncertain::beta(15.0, 85.0);
        declared.background_mortality = Uncertain::beta(8.0, 992.0);
        let effect = EffectSize::RelativeRiskReduction {
            rrr: Uncertain::beta(30.0, 70.0),
        };

        for iteration in 0..250 {
            let mut sampler = ParameterSampler::for_iteration(3, iteration);
            let model = declared.realize(&mut sampler).unwrap();
            let draw = effect.realize(&mut sampler).unwrap();
            for matrix in [model.baseline_matrix().unwrap(), model.intervention_matrix(&draw).unwrap()] {
                for sum in matrix.row_sums() {
                    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_baseline_death_probability() {
        let inputs = realized().arm(None).unwrap();
        assert_abs_diff_eq!(inputs.matrix.get(0, 1), 0.012 * 0.15, epsilon = 1e-15);
        assert_abs_diff_eq!(inputs.matrix.get(0, 0), 1.0 - 0.0018, epsilon = 1e-15);
        assert_eq!(inputs.event_probabilities, vec![0.012, 0.0]);
    }

    #[test]
    fn test_effect_reduces_event_and_death_rate() {
        let model = realized();
        let effect = EffectDraw::RelativeRiskReduction(0.3);
        let inputs = model.arm(Some(&effect)).unwrap();
        assert_abs_diff_eq!(inputs.event_probabilities[0], 0.0084, epsilon = 1e-15);
        assert_abs_diff_eq!(inputs.matrix.get(0, 1), 0.0084 * 0.15, epsilon = 1e-15);
        for sum in inputs.matrix.row_sums() {
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_background_mortality_adds_to_death_row() {
        let mut model = realized();
        model.background_mortality = 0.01;
        let matrix = model.baseline_matrix().unwrap();
        assert_abs_diff_eq!(matrix.get(0, 1), 0.0018 + 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_overflowing_death_probability_is_rejected() {
        let mut model = realized();
        model.event_rate = 0.9;
        model.case_fatality = 1.0;
        model.background_mortality = 0.2;
        assert!(model.arm(None).is_err());
    }

    #[test]
    fn test_qaly_decrement_is_utility_weighted() {
        let rewards = realized().rewards();
        assert_abs_diff_eq!(rewards.event_qaly_losses[0], 0.0617 * 0.85, epsilon = 1e-15);
        assert_eq!(rewards.intervention_mask, vec![1.0, 0.0]);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut model = AcuteEventModel::example_cardiovascular();
        model.event_cost = Uncertain::fixed(-1.0);
        assert!(model.validate("cardiovascular").is_err());
    }
}
