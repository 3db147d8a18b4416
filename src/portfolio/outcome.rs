//! ROI and cost-effectiveness outcomes derived from aggregated totals

use serde::{Deserialize, Serialize};

/// Cost per QALY gained, or a dominance classification when a ratio is not
/// meaningful
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CostEffectiveness {
    /// Incremental cost per QALY gained (finite, non-negative)
    CostPerQaly(f64),
    /// Saves money and does not lose health
    Dominant,
    /// Loses health, or costs more for no gain
    Dominated,
}

impl CostEffectiveness {
    pub fn classify(incremental_cost: f64, qalys_gained: f64) -> Self {
        if qalys_gained > 0.0 {
            if incremental_cost < 0.0 {
                CostEffectiveness::Dominant
            } else if incremental_cost >= 0.0 {
                let ratio = incremental_cost / qalys_gained;
                if ratio.is_finite() {
                    CostEffectiveness::CostPerQaly(ratio)
                } else {
                    CostEffectiveness::Dominated
                }
            } else {
                CostEffectiveness::Dominated
            }
        } else if qalys_gained == 0.0 && incremental_cost <= 0.0 {
            CostEffectiveness::Dominant
        } else {
            CostEffectiveness::Dominated
        }
    }

    /// Numeric ratio, if any
    pub fn ratio(&self) -> Option<f64> {
        match *self {
            CostEffectiveness::CostPerQaly(ratio) => Some(ratio),
            _ => None,
        }
    }

    pub fn is_cost_effective(&self, willingness_to_pay: f64) -> bool {
        match *self {
            CostEffectiveness::Dominant => true,
            CostEffectiveness::Dominated => false,
            CostEffectiveness::CostPerQaly(ratio) => ratio <= willingness_to_pay,
        }
    }
}

/// Return-on-investment summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiOutcome {
    pub investment: f64,
    pub total_savings: f64,
    pub net_benefit: f64,
    /// Net benefit over investment, in percent (0 without investment)
    pub roi_percent: f64,
    /// Savings over investment (0 without investment)
    pub roi_ratio: f64,
    /// Investment less healthcare savings
    pub incremental_cost: f64,
    pub qalys_gained: f64,
    pub cost_per_qaly: CostEffectiveness,
    /// Cost-effective at the willingness-to-pay threshold used
    pub cost_effective: bool,
}

impl RoiOutcome {
    pub fn calculate(
        investment: f64,
        healthcare_savings: f64,
        total_savings: f64,
        qalys_gained: f64,
        willingness_to_pay: f64,
    ) -> Self {
        let net_benefit = total_savings - investment;
        let (roi_percent, roi_ratio) = if investment > 0.0 {
            (net_benefit / investment * 100.0, total_savings / investment)
        } else {
            (0.0, 0.0)
        };
        let incremental_cost = investment - healthcare_savings;
        let cost_per_qaly = CostEffectiveness::classify(incremental_cost, qalys_gained);

        Self {
            investment,
            total_savings,
            net_benefit,
            roi_percent,
            roi_ratio,
            incremental_cost,
            qalys_gained,
            cost_per_qaly,
            cost_effective: cost_per_qaly.is_cost_effective(willingness_to_pay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_saving_intervention_is_dominant() {
        let outcome = RoiOutcome::calculate(100.0, 250.0, 300.0, 12.0, 50_000.0);
        assert_eq!(outcome.cost_per_qaly, CostEffectiveness::Dominant);
        assert!(outcome.cost_effective);
        assert_relative_eq!(outcome.roi_percent, 200.0);
        assert_relative_eq!(outcome.roi_ratio, 3.0);
        assert_relative_eq!(outcome.incremental_cost, -150.0);
    }

    #[test]
    fn test_numeric_ratio_and_threshold() {
        let outcome = RoiOutcome::calculate(1_000_000.0, 400_000.0, 500_000.0, 10.0, 50_000.0);
        assert_eq!(outcome.cost_per_qaly, CostEffectiveness::CostPerQaly(60_000.0));
        assert!(!outcome.cost_effective);
        assert_relative_eq!(outcome.roi_percent, -50.0);
    }

    #[test]
    fn test_zero_investment_and_zero_qalys() {
        let outcome = RoiOutcome::calculate(0.0, 0.0, 0.0, 0.0, 50_000.0);
        assert_eq!(outcome.roi_percent, 0.0);
        assert_eq!(outcome.roi_ratio, 0.0);
        assert_eq!(outcome.cost_per_qaly, CostEffectiveness::Dominant);
        assert!(outcome.roi_percent.is_finite());
    }

    #[test]
    fn test_health_loss_is_dominated() {
        assert_eq!(CostEffectiveness::classify(-10.0, -1.0), CostEffectiveness::Dominated);
        assert_eq!(CostEffectiveness::classify(10.0, 0.0), CostEffectiveness::Dominated);
        assert_eq!(CostEffectiveness::classify(0.0, 2.0), CostEffectiveness::CostPerQaly(0.0));
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&CostEffectiveness::CostPerQaly(1500.0)).unwrap();
        assert_eq!(json, r#"{"kind":"cost_per_qaly","value":1500.0}"#);
        let json = serde_json::to_string(&CostEffectiveness::Dominant).unwrap();
        assert_eq!(json, r#"{"kind":"dominant"}"#);
    }
}
