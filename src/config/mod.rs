//! Engine configuration: global settings, interventions and the disease
//! portfolio
//!
//! A [`PortfolioConfig`] is only ever built through validation, either from
//! a JSON [`ParameterDocument`] or from the built-in reference portfolio, so
//! the engine never sees an unchecked parameter.

mod defaults;
mod distributions;
pub mod loader;
mod source;

pub use distributions::{Support, Uncertain};
pub use loader::ParameterDocument;
pub use source::{ParameterSource, PointEstimates};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::cohort::DiscountTiming;
use crate::error::ConfigError;
use crate::model::{DiseaseKind, DiseaseModel, EffectSize, MarkovStructure};
use crate::portfolio::PortfolioAdjustments;

/// Whose costs count as savings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    /// Healthcare and productivity savings
    #[default]
    Societal,
    /// Healthcare savings only
    HealthSystem,
}

/// Settings shared by every disease in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Number of annual cycles
    pub horizon_years: u32,

    /// Annual discount rate applied to costs and QALYs
    pub discount_rate: f64,

    pub perspective: Perspective,

    /// Cost-per-QALY threshold for cost-effectiveness
    pub willingness_to_pay: f64,

    pub discount_timing: DiscountTiming,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            discount_rate: 0.03,
            perspective: Perspective::Societal,
            willingness_to_pay: 150_000.0,
            discount_timing: DiscountTiming::EndOfCycle,
        }
    }
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_years == 0 {
            return Err(ConfigError::parameter("global.horizon_years", "horizon must be at least one year"));
        }
        if !(self.discount_rate.is_finite() && self.discount_rate >= 0.0) {
            return Err(ConfigError::parameter(
                "global.discount_rate",
                format!("discount rate {} must be finite and non-negative", self.discount_rate),
            ));
        }
        if !(self.willingness_to_pay.is_finite() && self.willingness_to_pay >= 0.0) {
            return Err(ConfigError::parameter(
                "global.willingness_to_pay",
                format!("threshold {} must be finite and non-negative", self.willingness_to_pay),
            ));
        }
        Ok(())
    }
}

/// Intervention attached to one disease
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionSpec {
    /// Eligible population
    pub target_population: f64,

    /// Fraction of the target population taking part, in (0, 1]
    pub uptake: f64,

    pub effect: EffectSize,

    /// Annual intervention cost per participant
    pub cost_per_person: Uncertain,

    /// Discounted total investment replacing population x per-person cost
    pub fixed_investment: Option<f64>,
}

impl InterventionSpec {
    /// Participating population
    pub fn participants(&self) -> f64 {
        self.target_population * self.uptake
    }

    pub fn validate(&self, disease: &str) -> Result<(), ConfigError> {
        if !(self.target_population > 0.0 && self.target_population.is_finite()) {
            return Err(ConfigError::parameter(
                format!("{}.target_population", disease),
                format!("population {} must be positive", self.target_population),
            ));
        }
        if !(self.uptake > 0.0 && self.uptake <= 1.0) {
            return Err(ConfigError::parameter(
                format!("{}.uptake", disease),
                format!("uptake {} must be in (0, 1]", self.uptake),
            ));
        }
        if let Some(total) = self.fixed_investment {
            if !(total >= 0.0 && total.is_finite()) {
                return Err(ConfigError::parameter(
                    format!("{}.fixed_investment", disease),
                    format!("investment {} must be non-negative", total),
                ));
            }
        }
        self.effect.validate(&format!("{}.effect", disease))?;
        self.cost_per_person
            .validate(&format!("{}.cost_per_person", disease), Support::NonNegative)
    }
}

/// One disease programme in the portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseConfig {
    pub kind: DiseaseKind,
    pub label: String,
    pub model: DiseaseModel,
    pub intervention: InterventionSpec,
}

impl DiseaseConfig {
    /// Validate parameters, then check that point-estimate matrices for both
    /// arms are well formed
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.kind.key();
        self.model.validate(name)?;
        self.intervention.validate(name)?;

        let realized = self.model.realize(&mut PointEstimates)?;
        let effect = self.intervention.effect.realize(&mut PointEstimates)?;
        realized.baseline_matrix()?;
        realized.intervention_matrix(&effect)?;
        Ok(())
    }
}

/// Validated engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub global: GlobalSettings,
    pub adjustments: PortfolioAdjustments,
    pub diseases: Vec<DiseaseConfig>,
}

impl PortfolioConfig {
    /// Build and validate
    pub fn new(
        global: GlobalSettings,
        adjustments: PortfolioAdjustments,
        diseases: Vec<DiseaseConfig>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            global,
            adjustments,
            diseases,
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in five-programme reference portfolio
    pub fn reference() -> Self {
        defaults::reference_portfolio()
    }

    /// Load and validate a JSON parameter document
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        ParameterDocument::from_path(path)?.into_config()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        ParameterDocument::from_json_str(json)?.into_config()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diseases.is_empty() {
            return Err(ConfigError::EmptyPortfolio);
        }
        self.global.validate()?;
        self.adjustments.validate()?;

        let mut seen = HashSet::new();
        for disease in &self.diseases {
            if !seen.insert(disease.kind) {
                return Err(ConfigError::DuplicateDisease {
                    disease: disease.kind.key().to_string(),
                });
            }
            disease.validate()?;
        }
        Ok(())
    }

    /// Sub-portfolio restricted to the given diseases, in configured order
    pub fn with_diseases(&self, kinds: &[DiseaseKind]) -> Result<Self, ConfigError> {
        let diseases = self
            .diseases
            .iter()
            .filter(|d| kinds.contains(&d.kind))
            .cloned()
            .collect::<Vec<_>>();
        Self::new(self.global, self.adjustments, diseases)
    }

    /// Same portfolio over a different horizon
    pub fn with_horizon(&self, horizon_years: u32) -> Result<Self, ConfigError> {
        let mut global = self.global;
        global.horizon_years = horizon_years;
        global.validate()?;
        Ok(Self {
            global,
            ..self.clone()
        })
    }

    pub fn disease(&self, kind: DiseaseKind) -> Option<&DiseaseConfig> {
        self.diseases.iter().find(|d| d.kind == kind)
    }
}
