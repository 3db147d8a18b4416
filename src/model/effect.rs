//! Intervention effect sizes and their application to transition probabilities
//!
//! An intervention carries exactly one effect representation:
//! - relative-risk reduction `rrr` in [0, 1], applied as `p * (1 - rrr)`
//! - relative risk `rr > 0`, applied as `p * rr`, clamped to the closed
//!   range [`RR_FLOOR`, `RR_CEILING`] after realization
//!
//! A relative risk whose mean already lies outside that range is rejected at
//! load time; only sampled draws are clamped.
//!
//! Effects are applied to baseline probabilities before a matrix is
//! assembled, never to a finished matrix.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{ParameterSource, Support, Uncertain};
use crate::error::ConfigError;

/// Lower clip for realized relative risks (inclusive)
pub const RR_FLOOR: f64 = 1e-6;

/// Upper clip for realized relative risks (inclusive)
pub const RR_CEILING: f64 = 0.999;

/// Declared intervention effect with its uncertainty distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectSize {
    /// Fractional decrease of the targeted probabilities (Beta or fixed)
    RelativeRiskReduction { rrr: Uncertain },
    /// Multiplicative relative risk (log-normal or fixed)
    RelativeRisk { rr: Uncertain },
}

impl EffectSize {
    /// Resolve the raw document fields into a single representation.
    ///
    /// When both are configured the relative risk wins and the dropped
    /// reduction is reported at `warn` level.
    pub fn resolve(
        disease: &str,
        relative_risk_reduction: Option<Uncertain>,
        relative_risk: Option<Uncertain>,
    ) -> Result<Self, ConfigError> {
        match (relative_risk_reduction, relative_risk) {
            (Some(_), Some(rr)) => {
                warn!(
                    "{}: both relative_risk_reduction and relative_risk are configured; using relative_risk",
                    disease
                );
                Ok(EffectSize::RelativeRisk { rr })
            }
            (None, Some(rr)) => Ok(EffectSize::RelativeRisk { rr }),
            (Some(rrr), None) => Ok(EffectSize::RelativeRiskReduction { rrr }),
            (None, None) => Err(ConfigError::MissingEffect {
                disease: disease.to_string(),
            }),
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        match self {
            EffectSize::RelativeRiskReduction { rrr } => {
                if !matches!(rrr, Uncertain::Fixed { .. } | Uncertain::Beta { .. }) {
                    return Err(ConfigError::InvalidDistribution {
                        name: name.to_string(),
                        reason: format!("relative risk reduction must be beta or fixed, got {}", rrr.family()),
                    });
                }
                rrr.validate(name, Support::Probability)
            }
            EffectSize::RelativeRisk { rr } => {
                if !matches!(rr, Uncertain::Fixed { .. } | Uncertain::LogNormal { .. }) {
                    return Err(ConfigError::InvalidDistribution {
                        name: name.to_string(),
                        reason: format!("relative risk must be log_normal or fixed, got {}", rr.family()),
                    });
                }
                rr.validate(name, Support::Positive)?;
                let mean = rr.point_estimate();
                if !(RR_FLOOR..=RR_CEILING).contains(&mean) {
                    return Err(ConfigError::parameter(
                        name,
                        format!(
                            "mean relative risk {:.4} is outside [{}, {}]; the intervention must reduce risk",
                            mean, RR_FLOOR, RR_CEILING
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Realize the effect for one model evaluation
    pub fn realize<S: ParameterSource>(&self, source: &mut S) -> Result<EffectDraw, ConfigError> {
        match self {
            EffectSize::RelativeRiskReduction { rrr } => {
                let value = source.value("effect.rrr", rrr, Support::Probability)?;
                Ok(EffectDraw::RelativeRiskReduction(value))
            }
            EffectSize::RelativeRisk { rr } => {
                let raw = source.value("effect.rr", rr, Support::Positive)?;
                let clipped = raw.clamp(RR_FLOOR, RR_CEILING);
                if clipped != raw {
                    source.record_clip("effect.rr");
                }
                Ok(EffectDraw::RelativeRisk(clipped))
            }
        }
    }
}

/// A realized effect size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectDraw {
    RelativeRiskReduction(f64),
    RelativeRisk(f64),
}

impl EffectDraw {
    /// Factor applied to each targeted probability
    pub fn multiplier(&self) -> f64 {
        match *self {
            EffectDraw::RelativeRiskReduction(rrr) => 1.0 - rrr,
            EffectDraw::RelativeRisk(rr) => rr,
        }
    }

    /// Equivalent relative-risk reduction (1 - rr)
    pub fn risk_reduction(&self) -> f64 {
        1.0 - self.multiplier()
    }

    /// Apply the effect to one baseline transition probability
    pub fn apply(&self, name: &str, p: f64) -> Result<f64, ConfigError> {
        let modified = p * self.multiplier();
        if !(0.0..=1.0).contains(&modified) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: format!("{} (with intervention effect)", name),
                value: modified,
            });
        }
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointEstimates;
    use approx::assert_relative_eq;

    #[test]
    fn test_rrr_application() {
        let effect = EffectDraw::RelativeRiskReduction(0.3);
        assert_relative_eq!(effect.apply("p", 0.012).unwrap(), 0.0084, epsilon = 1e-12);
    }

    #[test]
    fn test_rr_application() {
        let effect = EffectDraw::RelativeRisk(0.75);
        assert_relative_eq!(effect.apply("p", 0.2).unwrap(), 0.15, epsilon = 1e-12);
        assert_relative_eq!(effect.risk_reduction(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_risk_takes_precedence() {
        let resolved = EffectSize::resolve(
            "cvd",
            Some(Uncertain::beta(30.0, 70.0)),
            Some(Uncertain::log_normal(-0.36, 0.1)),
        )
        .unwrap();
        assert!(matches!(resolved, EffectSize::RelativeRisk { .. }));
    }

    #[test]
    fn test_missing_effect_is_error() {
        let err = EffectSize::resolve("cvd", None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEffect { .. }));
    }

    #[test]
    fn test_rr_realization_is_clamped_to_ceiling() {
        // exp(0.5) > RR_CEILING
        let effect = EffectSize::RelativeRisk {
            rr: Uncertain::log_normal(0.0, 1.0),
        };
        let draw = effect.realize(&mut PointEstimates).unwrap();
        assert_eq!(draw, EffectDraw::RelativeRisk(RR_CEILING));
    }

    #[test]
    fn test_harmful_mean_relative_risk_rejected() {
        // mean exp(0.05 + 0.005) ~ 1.057
        let harmful = EffectSize::RelativeRisk {
            rr: Uncertain::log_normal(0.05, 0.1),
        };
        let err = harmful.validate("cardiovascular.effect").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { .. }));

        let null = EffectSize::RelativeRisk {
            rr: Uncertain::fixed(1.0),
        };
        assert!(null.validate("cardiovascular.effect").is_err());

        let protective = EffectSize::RelativeRisk {
            rr: Uncertain::log_normal(-0.36, 0.1),
        };
        assert!(protective.validate("cardiovascular.effect").is_ok());
    }

    #[test]
    fn test_wrong_family_rejected() {
        let effect = EffectSize::RelativeRisk {
            rr: Uncertain::gamma(2.0, 0.4),
        };
        assert!(effect.validate("effect").is_err());
    }
}
