//! Seeded Monte Carlo parameter sampler
//!
//! Each iteration owns an independent ChaCha8 stream selected from the run
//! seed by iteration index, so a draw never depends on which worker runs it
//! or in what order.
//!
//! Every non-fixed draw is kept under its scoped name so the runner can
//! relate parameter values to the iteration outcome.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, Gamma, LogNormal};
use std::collections::BTreeMap;

use crate::config::{ParameterSource, Support, Uncertain};
use crate::error::ConfigError;

/// Draws one realization of every uncertain parameter for one iteration
#[derive(Debug, Clone)]
pub struct ParameterSampler {
    rng: ChaCha8Rng,
    iteration: usize,
    scope: String,
    clips: BTreeMap<String, u64>,
    draws: BTreeMap<String, f64>,
}

/// Everything a sampler recorded during one iteration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerRecord {
    /// Clip counts keyed by `scope.parameter`
    pub clips: BTreeMap<String, u64>,
    /// Realized value of each sampled (non-fixed) parameter
    pub draws: BTreeMap<String, f64>,
}

impl ParameterSampler {
    pub fn for_iteration(seed: u64, iteration: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(iteration as u64);
        Self {
            rng,
            iteration,
            scope: String::new(),
            clips: BTreeMap::new(),
            draws: BTreeMap::new(),
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Clip counts keyed by `scope.parameter`
    pub fn clips(&self) -> &BTreeMap<String, u64> {
        &self.clips
    }

    /// Sampled values keyed by `scope.parameter`
    pub fn draws(&self) -> &BTreeMap<String, f64> {
        &self.draws
    }

    pub fn into_record(self) -> SamplerRecord {
        SamplerRecord {
            clips: self.clips,
            draws: self.draws,
        }
    }

    fn draw(&mut self, name: &str, param: &Uncertain) -> Result<f64, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDistribution {
            name: name.to_string(),
            reason,
        };

        let value = match *param {
            Uncertain::Fixed { value } => value,
            Uncertain::Beta { alpha, beta } => Beta::new(alpha, beta)
                .map_err(|e| invalid(e.to_string()))?
                .sample(&mut self.rng),
            Uncertain::Gamma { shape, scale } => Gamma::new(shape, scale)
                .map_err(|e| invalid(e.to_string()))?
                .sample(&mut self.rng),
            Uncertain::LogNormal { mu, sigma } => LogNormal::new(mu, sigma)
                .map_err(|e| invalid(e.to_string()))?
                .sample(&mut self.rng),
        };
        Ok(value)
    }

    fn key(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scope, name)
        }
    }
}

impl ParameterSource for ParameterSampler {
    fn value(&mut self, name: &str, param: &Uncertain, support: Support) -> Result<f64, ConfigError> {
        let raw = self.draw(name, param)?;
        let (value, clipped) = support.clip(raw);
        if clipped {
            self.record_clip(name);
        }
        if !matches!(param, Uncertain::Fixed { .. }) {
            let key = self.key(name);
            self.draws.insert(key, value);
        }
        Ok(value)
    }

    fn record_clip(&mut self, name: &str) {
        let key = self.key(name);
        *self.clips.entry(key).or_insert(0) += 1;
    }

    fn enter_scope(&mut self, scope: &str) {
        self.scope = scope.to_string();
    }
}
