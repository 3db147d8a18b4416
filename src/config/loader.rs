//! JSON parameter document loader
//!
//! The document mirrors the engine configuration with a few raw forms that
//! are resolved during conversion: both effect representations may be
//! present, adjustment factors are optional until checked, and labels
//! default to the disease's programme name.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{DiseaseConfig, GlobalSettings, InterventionSpec, PortfolioConfig, Uncertain};
use crate::error::ConfigError;
use crate::model::{DiseaseKind, DiseaseModel, EffectSize};
use crate::portfolio::PortfolioAdjustments;

fn one() -> f64 {
    1.0
}

/// Top-level parameter document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDocument {
    #[serde(default)]
    pub global: GlobalSettings,
    #[serde(default)]
    pub portfolio_adjustments: AdjustmentEntry,
    pub diseases: Vec<DiseaseEntry>,
}

/// Adjustment block as written; every factor is required before a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub event_overlap: Option<f64>,
    pub mortality_synergy: Option<f64>,
    pub qaly_synergy: Option<f64>,
    pub healthcare_realization: Option<f64>,
    pub productivity_realization: Option<f64>,
    pub benefit_synergy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseEntry {
    pub kind: DiseaseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub model: DiseaseModel,
    pub intervention: InterventionEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionEntry {
    pub target_population: f64,
    #[serde(default = "one")]
    pub uptake: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_risk_reduction: Option<Uncertain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_risk: Option<Uncertain>,
    pub cost_per_person: Uncertain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_investment: Option<f64>,
}

impl AdjustmentEntry {
    fn resolve(&self) -> Result<PortfolioAdjustments, ConfigError> {
        let require = |factor: &'static str, value: Option<f64>| value.ok_or(ConfigError::MissingAdjustment { factor });
        Ok(PortfolioAdjustments {
            event_overlap: require("event_overlap", self.event_overlap)?,
            mortality_synergy: require("mortality_synergy", self.mortality_synergy)?,
            qaly_synergy: require("qaly_synergy", self.qaly_synergy)?,
            healthcare_realization: require("healthcare_realization", self.healthcare_realization)?,
            productivity_realization: require("productivity_realization", self.productivity_realization)?,
            benefit_synergy: require("benefit_synergy", self.benefit_synergy)?,
        })
    }
}

impl From<&PortfolioAdjustments> for AdjustmentEntry {
    fn from(a: &PortfolioAdjustments) -> Self {
        Self {
            event_overlap: Some(a.event_overlap),
            mortality_synergy: Some(a.mortality_synergy),
            qaly_synergy: Some(a.qaly_synergy),
            healthcare_realization: Some(a.healthcare_realization),
            productivity_realization: Some(a.productivity_realization),
            benefit_synergy: Some(a.benefit_synergy),
        }
    }
}

impl DiseaseEntry {
    fn resolve(self) -> Result<DiseaseConfig, ConfigError> {
        let i = self.intervention;
        let effect = EffectSize::resolve(self.kind.key(), i.relative_risk_reduction, i.relative_risk)?;
        Ok(DiseaseConfig {
            kind: self.kind,
            label: self.label.unwrap_or_else(|| self.kind.label().to_string()),
            model: self.model,
            intervention: InterventionSpec {
                target_population: i.target_population,
                uptake: i.uptake,
                effect,
                cost_per_person: i.cost_per_person,
                fixed_investment: i.fixed_investment,
            },
        })
    }
}

impl From<&DiseaseConfig> for DiseaseEntry {
    fn from(d: &DiseaseConfig) -> Self {
        let (relative_risk_reduction, relative_risk) = match d.intervention.effect {
            EffectSize::RelativeRiskReduction { rrr } => (Some(rrr), None),
            EffectSize::RelativeRisk { rr } => (None, Some(rr)),
        };
        Self {
            kind: d.kind,
            label: Some(d.label.clone()),
            model: d.model.clone(),
            intervention: InterventionEntry {
                target_population: d.intervention.target_population,
                uptake: d.intervention.uptake,
                relative_risk_reduction,
                relative_risk,
                cost_per_person: d.intervention.cost_per_person,
                fixed_investment: d.intervention.fixed_investment,
            },
        }
    }
}

impl ParameterDocument {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve raw forms and validate
    pub fn into_config(self) -> Result<PortfolioConfig, ConfigError> {
        if self.diseases.is_empty() {
            return Err(ConfigError::EmptyPortfolio);
        }
        let adjustments = self.portfolio_adjustments.resolve()?;
        let diseases = self
            .diseases
            .into_iter()
            .map(DiseaseEntry::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        PortfolioConfig::new(self.global, adjustments, diseases)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&PortfolioConfig> for ParameterDocument {
    fn from(config: &PortfolioConfig) -> Self {
        Self {
            global: config.global,
            portfolio_adjustments: AdjustmentEntry::from(&config.adjustments),
            diseases: config.diseases.iter().map(DiseaseEntry::from).collect(),
        }
    }
}
