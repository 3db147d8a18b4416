//! Built-in reference portfolio
//!
//! Five acute-event prevention programmes with calibrated event rates,
//! Gamma-distributed costs and Beta-distributed risk reductions. Usable
//! without any parameter file.

use super::{DiseaseConfig, GlobalSettings, InterventionSpec, PortfolioConfig, Uncertain};
use crate::model::{AcuteEventModel, DiseaseKind, DiseaseModel, EffectSize};
use crate::portfolio::PortfolioAdjustments;

/// Calibrated inputs of one reference programme
struct Programme {
    kind: DiseaseKind,
    population: f64,
    event_rate: f64,
    case_fatality: f64,
    /// Gamma scale of the per-person annual cost (shape 5)
    cost_scale: f64,
    /// Gamma scale of the event cost (shape 4)
    event_cost_scale: f64,
    /// Gamma scale of the productivity loss (shape 3)
    productivity_scale: f64,
    qalys_lost_per_event: f64,
    rrr: (f64, f64),
    utility: f64,
}

const PROGRAMMES: [Programme; 5] = [
    Programme {
        kind: DiseaseKind::Cardiovascular,
        population: 500_000.0,
        event_rate: 0.012,
        case_fatality: 0.15,
        cost_scale: 384.5160616649235,
        event_cost_scale: 174_610.1514382146,
        productivity_scale: 487_832.36345171503,
        qalys_lost_per_event: 0.061764705882353166,
        rrr: (103.75, 396.25),
        utility: 0.85,
    },
    Programme {
        kind: DiseaseKind::Type2Diabetes,
        population: 750_000.0,
        event_rate: 0.028,
        case_fatality: 0.05,
        cost_scale: 96.91055212693195,
        event_cost_scale: 4_718.275891686173,
        productivity_scale: 13_661.137974473053,
        qalys_lost_per_event: 0.06585365853658531,
        rrr: (303.57142857142856, 196.42857142857144),
        utility: 0.82,
    },
    Programme {
        kind: DiseaseKind::Cancer,
        population: 1_126_000.0,
        event_rate: 0.006,
        case_fatality: 0.2,
        cost_scale: 99.9478564306867,
        event_cost_scale: 144_919.35620687832,
        productivity_scale: 352_550.4219999648,
        qalys_lost_per_event: 0.1,
        rrr: (62.3149792776791, 437.6850207223209),
        utility: 0.84,
    },
    Programme {
        kind: DiseaseKind::Osteoporosis,
        population: 234_000.0,
        event_rate: 0.05,
        case_fatality: 0.02,
        cost_scale: 140.27581986942178,
        event_cost_scale: 35_833.005519283826,
        productivity_scale: 47_818.03284826455,
        qalys_lost_per_event: 0.3862988505747126,
        rrr: (45.0, 455.0),
        utility: 0.87,
    },
    Programme {
        kind: DiseaseKind::Alzheimers,
        population: 30_000.0,
        event_rate: 0.054,
        case_fatality: 0.05,
        cost_scale: 2_266.456461033086,
        event_cost_scale: 296_448.1195879286,
        productivity_scale: 397_995.6019110086,
        qalys_lost_per_event: 1.6736842105263157,
        rrr: (83.33333333333333, 416.6666666666667),
        utility: 0.76,
    },
];

impl Programme {
    fn to_config(&self) -> DiseaseConfig {
        DiseaseConfig {
            kind: self.kind,
            label: self.kind.label().to_string(),
            model: DiseaseModel::AcuteEvent(AcuteEventModel {
                annual_event_rate: Uncertain::fixed(self.event_rate),
                case_fatality_rate: Uncertain::fixed(self.case_fatality),
                background_mortality: Uncertain::zero(),
                utility_weight: Uncertain::fixed(self.utility),
                qalys_lost_per_event: Uncertain::fixed(self.qalys_lost_per_event),
                annual_cost: Uncertain::zero(),
                event_cost: Uncertain::gamma(4.0, self.event_cost_scale),
                productivity_cost: Uncertain::gamma(3.0, self.productivity_scale),
            }),
            intervention: InterventionSpec {
                target_population: self.population,
                uptake: 1.0,
                effect: EffectSize::RelativeRiskReduction {
                    rrr: Uncertain::beta(self.rrr.0, self.rrr.1),
                },
                // held at its calibrated mean in PSA
                cost_per_person: Uncertain::fixed(5.0 * self.cost_scale),
                fixed_investment: None,
            },
        }
    }
}

/// Calibrated cross-disease factors of the reference portfolio
pub(crate) fn reference_adjustments() -> PortfolioAdjustments {
    PortfolioAdjustments {
        event_overlap: 0.9782178217821782,
        mortality_synergy: 1.589256335121348,
        qaly_synergy: 4.865944050520814,
        healthcare_realization: 2.158984,
        productivity_realization: 0.353716,
        benefit_synergy: 1.063,
    }
}

pub(crate) fn reference_portfolio() -> PortfolioConfig {
    PortfolioConfig {
        global: GlobalSettings::default(),
        adjustments: reference_adjustments(),
        diseases: PROGRAMMES.iter().map(Programme::to_config).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_order_and_labels() {
        let config = reference_portfolio();
        let kinds: Vec<_> = config.diseases.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiseaseKind::Cardiovascular,
                DiseaseKind::Type2Diabetes,
                DiseaseKind::Cancer,
                DiseaseKind::Osteoporosis,
                DiseaseKind::Alzheimers,
            ]
        );
        assert_eq!(config.diseases[2].label, "Cancer Screening (Breast + CRC)");
    }

    #[test]
    fn test_reference_means() {
        let config = reference_portfolio();
        let cvd = &config.diseases[0];
        assert_relative_eq!(
            cvd.intervention.cost_per_person.point_estimate(),
            5.0 * 384.5160616649235,
            max_relative = 1e-12
        );
        assert!(matches!(cvd.intervention.cost_per_person, Uncertain::Fixed { .. }));
        match cvd.intervention.effect {
            EffectSize::RelativeRiskReduction { rrr } => {
                assert_relative_eq!(rrr.point_estimate(), 0.2075, max_relative = 1e-12)
            }
            _ => panic!("reference programmes use relative risk reductions"),
        }
    }
}
