//! Cross-disease correction factors
//!
//! Disease models are run independently, so their summed outcomes double
//! count people with several conditions and miss shared benefits. Six scalar
//! factors correct the portfolio totals, once, after summation.

use serde::{Deserialize, Serialize};

use super::result::PortfolioTotals;
use crate::error::ConfigError;

/// Portfolio-level correction factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAdjustments {
    /// Applied to summed events prevented
    pub event_overlap: f64,
    /// Applied to summed deaths averted
    pub mortality_synergy: f64,
    /// Applied to summed QALYs gained
    pub qaly_synergy: f64,
    /// Share of modelled healthcare savings actually realized
    pub healthcare_realization: f64,
    /// Share of modelled productivity savings actually realized
    pub productivity_realization: f64,
    /// Applied to both savings streams
    pub benefit_synergy: f64,
}

impl Default for PortfolioAdjustments {
    /// Neutral factors (all 1)
    fn default() -> Self {
        Self {
            event_overlap: 1.0,
            mortality_synergy: 1.0,
            qaly_synergy: 1.0,
            healthcare_realization: 1.0,
            productivity_realization: 1.0,
            benefit_synergy: 1.0,
        }
    }
}

impl PortfolioAdjustments {
    pub fn factors(&self) -> [(&'static str, f64); 6] {
        [
            ("event_overlap", self.event_overlap),
            ("mortality_synergy", self.mortality_synergy),
            ("qaly_synergy", self.qaly_synergy),
            ("healthcare_realization", self.healthcare_realization),
            ("productivity_realization", self.productivity_realization),
            ("benefit_synergy", self.benefit_synergy),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (factor, value) in self.factors() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidAdjustment { factor, value });
            }
        }
        Ok(())
    }

    /// Scale summed totals
    pub fn apply(&self, raw: &PortfolioTotals) -> PortfolioTotals {
        let healthcare_savings = raw.healthcare_savings * self.healthcare_realization * self.benefit_synergy;
        let productivity_savings = raw.productivity_savings * self.productivity_realization * self.benefit_synergy;
        PortfolioTotals {
            investment: raw.investment,
            healthcare_savings,
            productivity_savings,
            total_savings: healthcare_savings + productivity_savings,
            qalys_gained: raw.qalys_gained * self.qaly_synergy,
            events_prevented: raw.events_prevented * self.event_overlap,
            deaths_averted: raw.deaths_averted * self.mortality_synergy,
        }
    }
}
