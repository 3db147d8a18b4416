//! Progressive chronic-disease structure
//!
//! States: Healthy -> AtRisk -> Diagnosed -> Complications, each with an
//! outgoing transition to Death. Onset (AtRisk -> Diagnosed) and complication
//! (Diagnosed -> Complications) flows are the counted disease events.

use serde::{Deserialize, Serialize};

use super::{ArmInputs, EffectDraw, HealthState, MarkovStructure, MatrixBuilder, Rewards};
use crate::config::{ParameterSource, Support, Uncertain};
use crate::error::ConfigError;

const STATES: [HealthState; 5] = [
    HealthState::Healthy,
    HealthState::AtRisk,
    HealthState::Diagnosed,
    HealthState::Complications,
    HealthState::Death,
];

/// Tolerance on the initial occupancy total
const OCCUPANCY_TOLERANCE: f64 = 1e-9;

/// Progression transitions an intervention can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionStep {
    /// Healthy -> AtRisk
    RiskProgression,
    /// AtRisk -> Diagnosed
    Onset,
    /// Diagnosed -> Complications
    Complication,
}

impl ProgressionStep {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressionStep::RiskProgression => "healthy_to_at_risk",
            ProgressionStep::Onset => "at_risk_to_diagnosed",
            ProgressionStep::Complication => "diagnosed_to_complications",
        }
    }
}

fn default_targets() -> Vec<ProgressionStep> {
    vec![ProgressionStep::Onset, ProgressionStep::Complication]
}

fn default_intervention_states() -> Vec<HealthState> {
    vec![HealthState::Healthy, HealthState::AtRisk]
}

/// Annual transition probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionProbabilities {
    pub healthy_to_at_risk: Uncertain,
    pub at_risk_to_diagnosed: Uncertain,
    pub diagnosed_to_complications: Uncertain,
    pub healthy_to_death: Uncertain,
    pub at_risk_to_death: Uncertain,
    pub diagnosed_to_death: Uncertain,
    pub complications_to_death: Uncertain,
}

impl ProgressionProbabilities {
    fn named(&self) -> [(&'static str, &Uncertain); 7] {
        [
            ("healthy_to_at_risk", &self.healthy_to_at_risk),
            ("at_risk_to_diagnosed", &self.at_risk_to_diagnosed),
            ("diagnosed_to_complications", &self.diagnosed_to_complications),
            ("healthy_to_death", &self.healthy_to_death),
            ("at_risk_to_death", &self.at_risk_to_death),
            ("diagnosed_to_death", &self.diagnosed_to_death),
            ("complications_to_death", &self.complications_to_death),
        ]
    }
}

/// One value per living state (Death always carries zero)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    pub healthy: Uncertain,
    pub at_risk: Uncertain,
    pub diagnosed: Uncertain,
    pub complications: Uncertain,
}

impl StateValues {
    fn named(&self) -> [(&'static str, &Uncertain); 4] {
        [
            ("healthy", &self.healthy),
            ("at_risk", &self.at_risk),
            ("diagnosed", &self.diagnosed),
            ("complications", &self.complications),
        ]
    }

    fn realize<S: ParameterSource>(
        &self,
        group: &str,
        support: Support,
        source: &mut S,
    ) -> Result<[f64; 5], ConfigError> {
        let mut values = [0.0; 5];
        for (slot, (name, param)) in values.iter_mut().zip(self.named()) {
            *slot = source.value(&format!("{}.{}", group, name), param, support)?;
        }
        Ok(values)
    }
}

/// Cohort distribution at cycle 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialOccupancy {
    pub healthy: f64,
    pub at_risk: f64,
    pub diagnosed: f64,
    pub complications: f64,
}

impl Default for InitialOccupancy {
    fn default() -> Self {
        Self {
            healthy: 1.0,
            at_risk: 0.0,
            diagnosed: 0.0,
            complications: 0.0,
        }
    }
}

impl InitialOccupancy {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.healthy, self.at_risk, self.diagnosed, self.complications, 0.0]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let shares = self.to_vec();
        let total: f64 = shares.iter().sum();
        if shares.iter().any(|s| !(0.0..=1.0).contains(s)) || (total - 1.0).abs() > OCCUPANCY_TOLERANCE {
            return Err(ConfigError::InitialOccupancy { total });
        }
        Ok(())
    }
}

/// Declared parameters of a progressive disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveModel {
    pub transitions: ProgressionProbabilities,
    pub utilities: StateValues,
    pub annual_costs: StateValues,
    /// Healthcare cost of one onset or complication event
    #[serde(default = "Uncertain::zero")]
    pub event_cost: Uncertain,
    /// Productivity loss of one onset or complication event
    #[serde(default = "Uncertain::zero")]
    pub productivity_cost: Uncertain,
    #[serde(default = "Uncertain::zero")]
    pub qalys_lost_per_event: Uncertain,
    #[serde(default)]
    pub initial_occupancy: InitialOccupancy,
    /// Transitions reduced by the intervention effect
    #[serde(default = "default_targets")]
    pub targets: Vec<ProgressionStep>,
    /// States in which the per-person intervention cost is charged
    #[serde(default = "default_intervention_states")]
    pub intervention_states: Vec<HealthState>,
}

impl ProgressiveModel {
    pub fn validate(&self, disease: &str) -> Result<(), ConfigError> {
        for (name, param) in self.transitions.named() {
            param.validate(&format!("{}.{}", disease, name), Support::Probability)?;
        }
        for (name, param) in self.utilities.named() {
            param.validate(&format!("{}.utilities.{}", disease, name), Support::Probability)?;
        }
        for (name, param) in self.annual_costs.named() {
            param.validate(&format!("{}.annual_costs.{}", disease, name), Support::NonNegative)?;
        }
        self.event_cost
            .validate(&format!("{}.event_cost", disease), Support::NonNegative)?;
        self.productivity_cost
            .validate(&format!("{}.productivity_cost", disease), Support::NonNegative)?;
        self.qalys_lost_per_event
            .validate(&format!("{}.qalys_lost_per_event", disease), Support::NonNegative)?;

        self.initial_occupancy.validate()?;

        if self.targets.is_empty() {
            return Err(ConfigError::parameter(
                format!("{}.targets", disease),
                "intervention must target at least one progression step",
            ));
        }
        if self.intervention_states.iter().any(|s| s.is_absorbing()) {
            return Err(ConfigError::parameter(
                format!("{}.intervention_states", disease),
                "intervention cost cannot be charged in an absorbing state",
            ));
        }
        Ok(())
    }

    pub fn realize<S: ParameterSource>(&self, source: &mut S) -> Result<ProgressiveRealization, ConfigError> {
        let mut probabilities = [0.0; 7];
        for (slot, (name, param)) in probabilities.iter_mut().zip(self.transitions.named()) {
            *slot = source.value(name, param, Support::Probability)?;
        }
        let utilities = self.utilities.realize("utilities", Support::Probability, source)?;
        let annual_costs = self.annual_costs.realize("annual_costs", Support::NonNegative, source)?;
        let event_cost = source.value("event_cost", &self.event_cost, Support::NonNegative)?;
        let productivity_cost = source.value("productivity_cost", &self.productivity_cost, Support::NonNegative)?;
        let qalys_lost_per_event =
            source.value("qalys_lost_per_event", &self.qalys_lost_per_event, Support::NonNegative)?;

        let mut intervention_mask = [0.0; 5];
        for (slot, state) in intervention_mask.iter_mut().zip(STATES.iter()) {
            if self.intervention_states.contains(state) {
                *slot = 1.0;
            }
        }

        Ok(ProgressiveRealization {
            probabilities,
            utilities,
            annual_costs,
            event_cost,
            productivity_cost,
            qalys_lost_per_event,
            initial_occupancy: self.initial_occupancy,
            targets: self.targets.clone(),
            intervention_mask,
        })
    }

    #[cfg(test)]
    pub(crate) fn example_cardiovascular() -> Self {
        let f = Uncertain::fixed;
        Self {
            transitions: ProgressionProbabilities {
                healthy_to_at_risk: f(0.05),
                at_risk_to_diagnosed: f(0.12),
                diagnosed_to_complications: f(0.08),
                healthy_to_death: f(0.001),
                at_risk_to_death: f(0.002),
                diagnosed_to_death: f(0.05),
                complications_to_death: f(0.15),
            },
            utilities: StateValues {
                healthy: f(0.95),
                at_risk: f(0.88),
                diagnosed: f(0.75),
                complications: f(0.60),
            },
            annual_costs: StateValues {
                healthy: f(500.0),
                at_risk: f(2500.0),
                diagnosed: f(15000.0),
                complications: f(45000.0),
            },
            event_cost: Uncertain::zero(),
            productivity_cost: Uncertain::zero(),
            qalys_lost_per_event: Uncertain::zero(),
            initial_occupancy: InitialOccupancy::default(),
            targets: default_targets(),
            intervention_states: default_intervention_states(),
        }
    }
}

/// One realization of a progressive model
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressiveRealization {
    /// Transition probabilities in [`ProgressionProbabilities`] field order
    pub probabilities: [f64; 7],
    pub utilities: [f64; 5],
    pub annual_costs: [f64; 5],
    pub event_cost: f64,
    pub productivity_cost: f64,
    pub qalys_lost_per_event: f64,
    pub initial_occupancy: InitialOccupancy,
    pub targets: Vec<ProgressionStep>,
    pub intervention_mask: [f64; 5],
}

impl ProgressiveRealization {
    fn targeted(&self, step: ProgressionStep, p: f64, effect: Option<&EffectDraw>) -> Result<f64, ConfigError> {
        match effect {
            Some(effect) if self.targets.contains(&step) => effect.apply(step.label(), p),
            _ => Ok(p),
        }
    }
}

impl MarkovStructure for ProgressiveRealization {
    fn states(&self) -> &'static [HealthState] {
        &STATES
    }

    fn initial_occupancy(&self) -> Vec<f64> {
        self.initial_occupancy.to_vec()
    }

    fn arm(&self, effect: Option<&EffectDraw>) -> Result<ArmInputs, ConfigError> {
        use HealthState::*;

        let [h_ar, ar_dx, dx_cx, h_death, ar_death, dx_death, cx_death] = self.probabilities;
        let risk = self.targeted(ProgressionStep::RiskProgression, h_ar, effect)?;
        let onset = self.targeted(ProgressionStep::Onset, ar_dx, effect)?;
        let complication = self.targeted(ProgressionStep::Complication, dx_cx, effect)?;

        let mut builder = MatrixBuilder::new(&STATES);
        builder.set(Healthy, AtRisk, risk)?.set(Healthy, Death, h_death)?;
        builder.set(AtRisk, Diagnosed, onset)?.set(AtRisk, Death, ar_death)?;
        builder
            .set(Diagnosed, Complications, complication)?
            .set(Diagnosed, Death, dx_death)?;
        builder.set(Complications, Death, cx_death)?;

        Ok(ArmInputs {
            matrix: builder.build()?,
            event_probabilities: vec![0.0, onset, complication, 0.0, 0.0],
        })
    }

    fn rewards(&self) -> Rewards {
        let living = [1.0, 1.0, 1.0, 1.0, 0.0];
        Rewards {
            utilities: self.utilities.to_vec(),
            annual_costs: self.annual_costs.to_vec(),
            event_costs: living.iter().map(|l| l * self.event_cost).collect(),
            event_productivity_losses: living.iter().map(|l| l * self.productivity_cost).collect(),
            event_qaly_losses: living.iter().map(|l| l * self.qalys_lost_per_event).collect(),
            intervention_mask: self.intervention_mask.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointEstimates;
    use approx::assert_abs_diff_eq;

    fn realized() -> ProgressiveRealization {
        ProgressiveModel::example_cardiovascular()
            .realize(&mut PointEstimates)
            .unwrap()
    }

    #[test]
    fn test_rows_sum_to_one_for_both_arms() {
        let model = realized();
        let effect = EffectDraw::RelativeRiskReduction(0.3);
        for inputs in [model.arm(None).unwrap(), model.arm(Some(&effect)).unwrap()] {
            for sum in inputs.matrix.row_sums() {
                assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_rows_sum_to_one_for_sampled_parameters() {
        use crate::model::EffectSize;
        use crate::psa::ParameterSampler;

        let mut declared = ProgressiveModel::example_cardiovascular();
        declared.transitions = ProgressionProbabilities {
            healthy_to_at_risk: Uncertain::beta(5.0, 95.0),
            at_risk_to_diagnosed: Uncertain::beta(12.0, 88.0),
            diagnosed_to_complications: Uncertain::beta(8.0, 92.0),
            healthy_to_death: Uncertain::beta(1.0, 999.0),
            at_risk_to_death: Uncertain::beta(2.0, 998.0),
            diagnosed_to_death: Uncertain::beta(5.0, 95.0),
            complications_to_death: Uncertain::beta(15.0, 85.0),
        };
        declared.targets = vec![
            ProgressionStep::RiskProgression,
            ProgressionStep::Onset,
            ProgressionStep::Complication,
        ];
        let effect = EffectSize::RelativeRisk {
            rr: Uncertain::log_normal(-0.36, 0.25),
        };

        for iteration in 0..250 {
            let mut sampler = ParameterSampler::for_iteration(17, iteration);
            let model = declared.realize(&mut sampler).unwrap();
            let draw = effect.realize(&mut sampler).unwrap();

            let baseline = model.baseline_matrix().unwrap();
            let intervention = model.intervention_matrix(&draw).unwrap();
            for sum in baseline.row_sums().into_iter().chain(intervention.row_sums()) {
                assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
            }
            assert!(
                intervention.probability(HealthState::AtRisk, HealthState::Diagnosed)
                    <= baseline.probability(HealthState::AtRisk, HealthState::Diagnosed)
            );
            assert_eq!(baseline.probability(HealthState::Death, HealthState::Death), 1.0);
        }
    }

    #[test]
    fn test_default_targets_leave_risk_progression_untouched() {
        let model = realized();
        let effect = EffectDraw::RelativeRiskReduction(0.3);
        let m = model.intervention_matrix(&effect).unwrap();
        assert_abs_diff_eq!(m.probability(HealthState::Healthy, HealthState::AtRisk), 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(m.probability(HealthState::AtRisk, HealthState::Diagnosed), 0.084, epsilon = 1e-15);
        assert_abs_diff_eq!(
            m.probability(HealthState::Diagnosed, HealthState::Complications),
            0.056,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_risk_progression_target() {
        let mut declared = ProgressiveModel::example_cardiovascular();
        declared.targets = vec![ProgressionStep::RiskProgression];
        let model = declared.realize(&mut PointEstimates).unwrap();
        let m = model
            .intervention_matrix(&EffectDraw::RelativeRisk(0.5))
            .unwrap();
        assert_abs_diff_eq!(m.probability(HealthState::Healthy, HealthState::AtRisk), 0.025, epsilon = 1e-15);
        assert_abs_diff_eq!(m.probability(HealthState::AtRisk, HealthState::Diagnosed), 0.12, epsilon = 1e-15);
    }

    #[test]
    fn test_rewards_follow_state_order() {
        let rewards = realized().rewards();
        assert_eq!(rewards.utilities, vec![0.95, 0.88, 0.75, 0.60, 0.0]);
        assert_eq!(rewards.annual_costs[4], 0.0);
        assert_eq!(rewards.intervention_mask, vec![1.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overflowing_row_is_rejected() {
        let mut declared = ProgressiveModel::example_cardiovascular();
        declared.transitions.diagnosed_to_complications = Uncertain::fixed(0.7);
        declared.transitions.diagnosed_to_death = Uncertain::fixed(0.4);
        let model = declared.realize(&mut PointEstimates).unwrap();
        assert!(matches!(model.arm(None), Err(ConfigError::RowOverflow { .. })));
    }

    #[test]
    fn test_initial_occupancy_must_sum_to_one() {
        let mut declared = ProgressiveModel::example_cardiovascular();
        declared.initial_occupancy = InitialOccupancy {
            healthy: 0.6,
            at_risk: 0.3,
            diagnosed: 0.0,
            complications: 0.0,
        };
        assert!(matches!(
            declared.validate("cvd"),
            Err(ConfigError::InitialOccupancy { .. })
        ));
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{
            "transitions": {
                "healthy_to_at_risk": {"distribution": "beta", "alpha": 5.0, "beta": 95.0},
                "at_risk_to_diagnosed": {"distribution": "fixed", "value": 0.11},
                "diagnosed_to_complications": {"distribution": "fixed", "value": 0.06},
                "healthy_to_death": {"distribution": "fixed", "value": 0.001},
                "at_risk_to_death": {"distribution": "fixed", "value": 0.002},
                "diagnosed_to_death": {"distribution": "fixed", "value": 0.03},
                "complications_to_death": {"distribution": "fixed", "value": 0.12}
            },
            "utilities": {
                "healthy": {"distribution": "fixed", "value": 0.95},
                "at_risk": {"distribution": "fixed", "value": 0.9},
                "diagnosed": {"distribution": "fixed", "value": 0.8},
                "complications": {"distribution": "fixed", "value": 0.65}
            },
            "annual_costs": {
                "healthy": {"distribution": "gamma", "shape": 4.0, "scale": 100.0},
                "at_risk": {"distribution": "fixed", "value": 1500.0},
                "diagnosed": {"distribution": "fixed", "value": 9200.0},
                "complications": {"distribution": "fixed", "value": 55334.0}
            },
            "initial_occupancy": {"healthy": 0.7, "at_risk": 0.3}
        }"#;
        let model: ProgressiveModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.targets, default_targets());
        assert_eq!(model.intervention_states, default_intervention_states());
        assert_eq!(model.initial_occupancy.at_risk, 0.3);
        assert!(model.validate("diabetes").is_ok());
    }
}
