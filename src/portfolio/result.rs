//! Per-disease and portfolio results

use serde::{Deserialize, Serialize};

use super::adjustments::PortfolioAdjustments;
use super::outcome::RoiOutcome;
use crate::cohort::ArmComparison;
use crate::config::Perspective;
use crate::model::DiseaseKind;

/// Scaled incremental results of one disease programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub disease: DiseaseKind,
    pub label: String,

    /// Target population times uptake
    pub participants: f64,

    // Discounted
    pub investment: f64,
    pub healthcare_savings: f64,
    pub productivity_savings: f64,
    pub qalys_gained: f64,

    // Undiscounted
    pub events_prevented: f64,
    pub deaths_averted: f64,
}

impl SimulationResult {
    /// Scale per-person arm differences to the participating population.
    ///
    /// `fixed_investment` is a discounted total and replaces the
    /// population-scaled intervention cost.
    pub fn from_arms(
        disease: DiseaseKind,
        label: &str,
        participants: f64,
        fixed_investment: Option<f64>,
        arms: &ArmComparison,
        perspective: Perspective,
    ) -> Self {
        let (base, int) = (&arms.baseline, &arms.intervention);
        let investment = fixed_investment.unwrap_or(participants * int.intervention_cost);
        let productivity_savings = match perspective {
            Perspective::Societal => participants * (base.productivity_cost - int.productivity_cost),
            Perspective::HealthSystem => 0.0,
        };

        Self {
            disease,
            label: label.to_string(),
            participants,
            investment,
            healthcare_savings: participants * (base.healthcare_cost - int.healthcare_cost),
            productivity_savings,
            qalys_gained: participants * (int.qalys - base.qalys),
            events_prevented: participants * (base.events - int.events),
            deaths_averted: participants * (base.deaths - int.deaths),
        }
    }

    pub fn total_savings(&self) -> f64 {
        self.healthcare_savings + self.productivity_savings
    }

    /// Unadjusted snapshot of this programme on its own
    pub fn outcome(&self, willingness_to_pay: f64) -> RoiOutcome {
        RoiOutcome::calculate(
            self.investment,
            self.healthcare_savings,
            self.total_savings(),
            self.qalys_gained,
            willingness_to_pay,
        )
    }
}

/// Portfolio totals, before or after adjustment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub investment: f64,
    pub healthcare_savings: f64,
    pub productivity_savings: f64,
    pub total_savings: f64,
    pub qalys_gained: f64,
    pub events_prevented: f64,
    pub deaths_averted: f64,
}

impl PortfolioTotals {
    /// Plain sum over diseases
    pub fn sum(results: &[SimulationResult]) -> Self {
        let mut totals = results.iter().fold(Self::default(), |mut acc, r| {
            acc.investment += r.investment;
            acc.healthcare_savings += r.healthcare_savings;
            acc.productivity_savings += r.productivity_savings;
            acc.qalys_gained += r.qalys_gained;
            acc.events_prevented += r.events_prevented;
            acc.deaths_averted += r.deaths_averted;
            acc
        });
        totals.total_savings = totals.healthcare_savings + totals.productivity_savings;
        totals
    }
}

/// Aggregated portfolio result for one parameter realization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    /// Per-disease results, unscaled by portfolio adjustments
    pub diseases: Vec<SimulationResult>,

    /// Summed totals before adjustment
    pub unadjusted: PortfolioTotals,

    /// Totals after the adjustment factors
    pub totals: PortfolioTotals,
}

impl PortfolioResult {
    /// Sum first, then apply each adjustment factor exactly once
    pub fn aggregate(diseases: Vec<SimulationResult>, adjustments: &PortfolioAdjustments) -> Self {
        let unadjusted = PortfolioTotals::sum(&diseases);
        let totals = adjustments.apply(&unadjusted);
        Self {
            diseases,
            unadjusted,
            totals,
        }
    }

    pub fn outcome(&self, willingness_to_pay: f64) -> RoiOutcome {
        RoiOutcome::calculate(
            self.totals.investment,
            self.totals.healthcare_savings,
            self.totals.total_savings,
            self.totals.qalys_gained,
            willingness_to_pay,
        )
    }

    pub fn disease(&self, kind: DiseaseKind) -> Option<&SimulationResult> {
        self.diseases.iter().find(|r| r.disease == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortOutcome;
    use approx::assert_relative_eq;

    fn result(disease: DiseaseKind, qalys: f64) -> SimulationResult {
        SimulationResult {
            disease,
            label: disease.label().to_string(),
            participants: 1000.0,
            investment: 50.0,
            healthcare_savings: 40.0,
            productivity_savings: 30.0,
            qalys_gained: qalys,
            events_prevented: 10.0,
            deaths_averted: 2.0,
        }
    }

    #[test]
    fn test_synergy_applied_once_after_sum() {
        let adjustments = PortfolioAdjustments {
            qaly_synergy: 1.5,
            ..PortfolioAdjustments::default()
        };
        let portfolio = PortfolioResult::aggregate(
            vec![
                result(DiseaseKind::Cardiovascular, 100.0),
                result(DiseaseKind::Cancer, 200.0),
            ],
            &adjustments,
        );

        assert_relative_eq!(portfolio.totals.qalys_gained, 450.0);
        assert_relative_eq!(portfolio.unadjusted.qalys_gained, 300.0);
        assert_eq!(portfolio.disease(DiseaseKind::Cardiovascular).unwrap().qalys_gained, 100.0);
        assert_eq!(portfolio.disease(DiseaseKind::Cancer).unwrap().qalys_gained, 200.0);
    }

    #[test]
    fn test_from_arms_scaling_and_perspective() {
        let arms = ArmComparison {
            baseline: CohortOutcome {
                qalys: 8.0,
                healthcare_cost: 1000.0,
                productivity_cost: 500.0,
                events: 0.12,
                deaths: 0.02,
                ..CohortOutcome::default()
            },
            intervention: CohortOutcome {
                qalys: 8.1,
                healthcare_cost: 900.0,
                productivity_cost: 450.0,
                intervention_cost: 80.0,
                events: 0.08,
                deaths: 0.015,
                ..CohortOutcome::default()
            },
        };

        let societal = SimulationResult::from_arms(
            DiseaseKind::Osteoporosis,
            "osteo",
            2000.0,
            None,
            &arms,
            Perspective::Societal,
        );
        assert_relative_eq!(societal.investment, 160_000.0);
        assert_relative_eq!(societal.healthcare_savings, 200_000.0);
        assert_relative_eq!(societal.productivity_savings, 100_000.0);
        assert_relative_eq!(societal.qalys_gained, 200.0, max_relative = 1e-9);
        assert_relative_eq!(societal.events_prevented, 80.0, max_relative = 1e-9);
        assert_relative_eq!(societal.deaths_averted, 10.0, max_relative = 1e-9);

        let health_system = SimulationResult::from_arms(
            DiseaseKind::Osteoporosis,
            "osteo",
            2000.0,
            Some(1_000_000.0),
            &arms,
            Perspective::HealthSystem,
        );
        assert_eq!(health_system.productivity_savings, 0.0);
        assert_eq!(health_system.investment, 1_000_000.0);
    }
}
