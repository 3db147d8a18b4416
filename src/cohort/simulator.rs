//! Markov cohort trace simulator
//!
//! Iterates an occupancy vector through annual cycles under one arm's
//! transition matrix. Per-cycle state rewards use the post-transition
//! occupancy; event consequences use the pre-transition occupancy times each
//! state's event probability.

use super::discount::DiscountTiming;
use super::trace::{CohortOutcome, CycleRow};
use crate::error::ConfigError;
use crate::model::{ArmInputs, EffectDraw, MarkovStructure, Rewards};
use serde::{Deserialize, Serialize};

/// Configuration for a cohort run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortConfig {
    /// Number of annual cycles
    pub horizon_years: u32,

    /// Annual discount rate
    pub discount_rate: f64,

    pub discount_timing: DiscountTiming,

    /// Whether to keep the cycle-by-cycle trace
    pub detailed_output: bool,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            discount_rate: 0.03,
            discount_timing: DiscountTiming::EndOfCycle,
            detailed_output: false,
        }
    }
}

/// Baseline and intervention outcomes from one parameter realization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmComparison {
    pub baseline: CohortOutcome,
    pub intervention: CohortOutcome,
}

/// Runs cohort traces with a fixed horizon and discounting scheme
#[derive(Debug, Clone)]
pub struct CohortSimulator {
    config: CohortConfig,
    factors: Vec<f64>,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl CohortSimulator {
    pub fn new(config: CohortConfig) -> Self {
        let factors = config
            .discount_timing
            .factors(config.horizon_years, config.discount_rate);
        Self { config, factors }
    }

    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Run one arm. `intervention_cost` is the per-person annual cost charged
    /// in masked states; `None` for the status-quo arm.
    pub fn simulate(
        &self,
        initial: &[f64],
        inputs: &ArmInputs,
        rewards: &Rewards,
        intervention_cost: Option<f64>,
    ) -> CohortOutcome {
        let death = inputs.matrix.states().iter().position(|s| s.is_absorbing());
        let mut occupancy = initial.to_vec();
        let mut outcome = CohortOutcome::default();

        for (cycle, &factor) in (1..).zip(self.factors.iter()) {
            let mut row = CycleRow::new(cycle, factor);

            for (i, &share) in occupancy.iter().enumerate() {
                let events = share * inputs.event_probabilities[i];
                if events == 0.0 {
                    continue;
                }
                row.events += events;
                row.healthcare_cost += events * rewards.event_costs[i];
                row.productivity_cost += events * rewards.event_productivity_losses[i];
                row.qalys -= events * rewards.event_qaly_losses[i];
            }

            let next = inputs.matrix.advance(&occupancy);
            row.qalys += dot(&next, &rewards.utilities);
            row.healthcare_cost += dot(&next, &rewards.annual_costs);
            if let Some(cost) = intervention_cost {
                row.intervention_cost = dot(&next, &rewards.intervention_mask) * cost;
            }
            if let Some(d) = death {
                row.deaths = next[d] - occupancy[d];
            }

            outcome.accumulate(&row);
            occupancy = next;

            if self.config.detailed_output {
                row.occupancy = occupancy.clone();
                outcome.trace.push(row);
            }
        }

        outcome
    }

    /// Run both arms of a realized model
    pub fn compare<M: MarkovStructure + ?Sized>(
        &self,
        model: &M,
        effect: &EffectDraw,
        cost_per_person: f64,
    ) -> Result<ArmComparison, ConfigError> {
        let initial = model.initial_occupancy();
        let rewards = model.rewards();
        let baseline_inputs = model.arm(None)?;
        let intervention_inputs = model.arm(Some(effect))?;

        Ok(ArmComparison {
            baseline: self.simulate(&initial, &baseline_inputs, &rewards, None),
            intervention: self.simulate(&initial, &intervention_inputs, &rewards, Some(cost_per_person)),
        })
    }
}

impl Default for CohortSimulator {
    fn default() -> Self {
        Self::new(CohortConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::annuity_immediate;
    use crate::config::PointEstimates;
    use crate::model::{AcuteEventModel, AcuteEventRealization, ProgressiveModel};
    use approx::assert_relative_eq;

    fn acute(cfr: f64) -> AcuteEventRealization {
        AcuteEventRealization {
            event_rate: 0.012,
            case_fatality: cfr,
            background_mortality: 0.0,
            utility: 0.85,
            qalys_lost_per_event: 0.06,
            annual_cost: 0.0,
            event_cost: 174_610.0,
            productivity_cost: 0.0,
        }
    }

    #[test]
    fn test_acute_closed_form_without_fatality() {
        let sim = CohortSimulator::default();
        let effect = EffectDraw::RelativeRiskReduction(0.30);
        let arms = sim.compare(&acute(0.0), &effect, 384.52).unwrap();

        let d = annuity_immediate(10, 0.03);
        let savings = arms.baseline.healthcare_cost - arms.intervention.healthcare_cost;
        assert_relative_eq!(savings, 0.012 * 0.30 * 174_610.0 * d, max_relative = 1e-9);
        assert_relative_eq!(arms.intervention.intervention_cost, 384.52 * d, max_relative = 1e-9);
        assert_relative_eq!(arms.baseline.events, 0.12, max_relative = 1e-9);
        assert_eq!(arms.baseline.deaths, 0.0);
    }

    #[test]
    fn test_monotone_in_effect_size() {
        let sim = CohortSimulator::default();
        let models = [
            crate::model::DiseaseModel::AcuteEvent(AcuteEventModel::example_cardiovascular()),
            crate::model::DiseaseModel::Progressive(ProgressiveModel::example_cardiovascular()),
        ];

        for declared in &models {
            let model = declared.realize(&mut PointEstimates).unwrap();
            let mut previous: Option<(f64, f64, f64)> = None;
            for rrr in [0.1, 0.3, 0.5] {
                let arms = sim
                    .compare(&model, &EffectDraw::RelativeRiskReduction(rrr), 100.0)
                    .unwrap();
                let prevented = arms.baseline.events - arms.intervention.events;
                let averted = arms.baseline.deaths - arms.intervention.deaths;
                let gained = arms.intervention.qalys - arms.baseline.qalys;
                if let Some((p, a, g)) = previous {
                    assert!(prevented > p);
                    assert!(averted > a);
                    assert!(gained >= g);
                }
                previous = Some((prevented, averted, gained));
            }
        }
    }

    #[test]
    fn test_trace_conserves_mass() {
        let sim = CohortSimulator::new(CohortConfig {
            detailed_output: true,
            ..CohortConfig::default()
        });
        let model = ProgressiveModel::example_cardiovascular()
            .realize(&mut PointEstimates)
            .unwrap();
        let arms = sim
            .compare(&model, &EffectDraw::RelativeRisk(0.8), 50.0)
            .unwrap();

        assert_eq!(arms.baseline.trace.len(), 10);
        for row in &arms.baseline.trace {
            assert_relative_eq!(row.occupancy.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
        let dead = arms.baseline.final_occupancy().unwrap()[4];
        assert_relative_eq!(dead, arms.baseline.deaths, epsilon = 1e-12);
    }

    #[test]
    fn test_mid_cycle_shifts_discount_only() {
        let model = acute(0.15);
        let effect = EffectDraw::RelativeRiskReduction(0.2);
        let end = CohortSimulator::default().compare(&model, &effect, 10.0).unwrap();
        let mid = CohortSimulator::new(CohortConfig {
            discount_timing: DiscountTiming::MidCycle,
            ..CohortConfig::default()
        })
        .compare(&model, &effect, 10.0)
        .unwrap();

        let shift = 1.03_f64.sqrt();
        assert_relative_eq!(mid.baseline.qalys, end.baseline.qalys * shift, max_relative = 1e-12);
        assert_relative_eq!(
            mid.intervention.intervention_cost,
            end.intervention.intervention_cost * shift,
            max_relative = 1e-12
        );
        assert_eq!(mid.baseline.events, end.baseline.events);
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let sim = CohortSimulator::new(CohortConfig {
            horizon_years: 0,
            ..CohortConfig::default()
        });
        let arms = sim
            .compare(&acute(0.1), &EffectDraw::RelativeRiskReduction(0.3), 100.0)
            .unwrap();
        assert_eq!(arms.baseline, CohortOutcome::default());
    }
}
