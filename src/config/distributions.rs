//! Uncertain parameter declarations
//!
//! Every model input is declared with the distribution family that describes
//! its uncertainty:
//! - Beta for bounded probabilities and utilities
//! - Gamma for non-negative, right-skewed costs
//! - Log-normal for multiplicative relative risks
//! - Fixed for inputs treated as known
//!
//! Point-estimate runs use the distribution mean; PSA runs draw from it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Uncertain model parameter and its distribution family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Uncertain {
    /// Known value, never sampled
    Fixed { value: f64 },
    /// Beta(alpha, beta) on [0, 1]
    Beta { alpha: f64, beta: f64 },
    /// Gamma with shape/scale parameterization, mean = shape * scale
    Gamma { shape: f64, scale: f64 },
    /// Log-normal with mean `mu` and standard deviation `sigma` on the log scale
    LogNormal { mu: f64, sigma: f64 },
}

/// Valid support of a parameter, used for validation and clipping of draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Closed interval [0, 1]
    Probability,
    /// [0, inf)
    NonNegative,
    /// (0, inf)
    Positive,
}

impl Support {
    /// Clip a value to this support. Returns the clipped value and whether
    /// clipping was needed.
    pub fn clip(&self, value: f64) -> (f64, bool) {
        if value.is_nan() {
            // NaN has no nearest boundary; fall to the lower edge
            return (self.lower(), true);
        }
        match self {
            Support::Probability => {
                let clipped = value.clamp(0.0, 1.0);
                (clipped, clipped != value)
            }
            Support::NonNegative => {
                if value < 0.0 {
                    (0.0, true)
                } else {
                    (value, false)
                }
            }
            Support::Positive => {
                if value <= 0.0 {
                    (f64::MIN_POSITIVE, true)
                } else {
                    (value, false)
                }
            }
        }
    }

    fn lower(&self) -> f64 {
        match self {
            Support::Positive => f64::MIN_POSITIVE,
            _ => 0.0,
        }
    }

    fn contains(&self, value: f64) -> bool {
        match self {
            Support::Probability => (0.0..=1.0).contains(&value),
            Support::NonNegative => value >= 0.0,
            Support::Positive => value > 0.0,
        }
    }
}

impl Uncertain {
    /// Fixed value shorthand
    pub fn fixed(value: f64) -> Self {
        Uncertain::Fixed { value }
    }

    /// Zero-valued fixed parameter (serde default for optional costs)
    pub fn zero() -> Self {
        Uncertain::Fixed { value: 0.0 }
    }

    pub fn beta(alpha: f64, beta: f64) -> Self {
        Uncertain::Beta { alpha, beta }
    }

    pub fn gamma(shape: f64, scale: f64) -> Self {
        Uncertain::Gamma { shape, scale }
    }

    pub fn log_normal(mu: f64, sigma: f64) -> Self {
        Uncertain::LogNormal { mu, sigma }
    }

    /// Gamma with the given shape and mean (scale = mean / shape)
    pub fn gamma_with_mean(shape: f64, mean: f64) -> Self {
        Uncertain::Gamma {
            shape,
            scale: mean / shape.max(1e-12),
        }
    }

    /// Distribution mean, used as the point estimate
    pub fn point_estimate(&self) -> f64 {
        match *self {
            Uncertain::Fixed { value } => value,
            Uncertain::Beta { alpha, beta } => alpha / (alpha + beta),
            Uncertain::Gamma { shape, scale } => shape * scale,
            Uncertain::LogNormal { mu, sigma } => (mu + 0.5 * sigma * sigma).exp(),
        }
    }

    /// Short family name for logs and error messages
    pub fn family(&self) -> &'static str {
        match self {
            Uncertain::Fixed { .. } => "fixed",
            Uncertain::Beta { .. } => "beta",
            Uncertain::Gamma { .. } => "gamma",
            Uncertain::LogNormal { .. } => "log_normal",
        }
    }

    /// Check distribution parameters and that the family suits the support
    pub fn validate(&self, name: &str, support: Support) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDistribution {
            name: name.to_string(),
            reason,
        };

        match *self {
            Uncertain::Fixed { value } => {
                if !value.is_finite() {
                    return Err(invalid(format!("fixed value {} is not finite", value)));
                }
                if !support.contains(value) {
                    return match support {
                        Support::Probability => Err(ConfigError::ProbabilityOutOfRange {
                            name: name.to_string(),
                            value,
                        }),
                        Support::NonNegative => Err(invalid(format!("value {} is negative", value))),
                        Support::Positive => Err(invalid(format!("value {} must be positive", value))),
                    };
                }
            }
            Uncertain::Beta { alpha, beta } => {
                if support != Support::Probability {
                    return Err(invalid("beta is only valid for probabilities and utilities".into()));
                }
                if !(alpha > 0.0 && alpha.is_finite() && beta > 0.0 && beta.is_finite()) {
                    return Err(invalid(format!(
                        "beta shape parameters must be positive (alpha={}, beta={})",
                        alpha, beta
                    )));
                }
            }
            Uncertain::Gamma { shape, scale } => {
                if support == Support::Probability {
                    return Err(invalid("gamma is unbounded; use beta for probabilities".into()));
                }
                if !(shape > 0.0 && shape.is_finite() && scale > 0.0 && scale.is_finite()) {
                    return Err(invalid(format!(
                        "gamma shape and scale must be positive (shape={}, scale={})",
                        shape, scale
                    )));
                }
            }
            Uncertain::LogNormal { mu, sigma } => {
                if support == Support::Probability {
                    return Err(invalid("log-normal is unbounded; use beta for probabilities".into()));
                }
                if !mu.is_finite() || !(sigma > 0.0 && sigma.is_finite()) {
                    return Err(invalid(format!(
                        "log-normal needs finite mu and positive sigma (mu={}, sigma={})",
                        mu, sigma
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for Uncertain {
    fn default() -> Self {
        Uncertain::zero()
    }
}
