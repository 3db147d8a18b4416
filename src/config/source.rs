//! Parameter realization
//!
//! A [`ParameterSource`] turns declared [`Uncertain`] parameters into the
//! concrete values used by one model evaluation. Deterministic runs use
//! [`PointEstimates`]; PSA iterations use the seeded sampler in `psa`.

use log::warn;

use super::distributions::{Support, Uncertain};
use crate::error::ConfigError;

/// Supplies one realization of each uncertain parameter
pub trait ParameterSource {
    /// Realize a parameter within its valid support
    fn value(&mut self, name: &str, param: &Uncertain, support: Support) -> Result<f64, ConfigError>;

    /// Record that the caller clipped a realized value to a narrower range
    fn record_clip(&mut self, _name: &str) {}

    /// Label subsequent parameters with the owning disease
    fn enter_scope(&mut self, _scope: &str) {}
}

/// Realizes every parameter at its distribution mean
#[derive(Debug, Clone, Copy, Default)]
pub struct PointEstimates;

impl ParameterSource for PointEstimates {
    fn value(&mut self, name: &str, param: &Uncertain, support: Support) -> Result<f64, ConfigError> {
        let value = param.point_estimate();
        let (clipped, was_clipped) = support.clip(value);
        if was_clipped {
            return Err(ConfigError::parameter(
                name,
                format!("point estimate {} is outside the valid range", value),
            ));
        }
        Ok(clipped)
    }

    fn record_clip(&mut self, name: &str) {
        warn!("point estimate of {} was clamped to its valid range", name);
    }
}
