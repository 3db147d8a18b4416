//! Disease model definitions
//!
//! A disease model is one of a fixed set of Markov structures. Each structure
//! knows its states, how to assemble baseline and intervention transition
//! matrices from a parameter realization, and which rewards (utilities,
//! costs, per-event consequences) attach to each state.
//!
//! Structures are selected by the `structure` tag of the parameter document:
//! - `acute_event`: recurrent event hazard on an at-risk cohort
//! - `progressive`: Healthy -> AtRisk -> Diagnosed -> Complications

mod acute;
mod effect;
mod matrix;
mod progressive;

pub use acute::{AcuteEventModel, AcuteEventRealization};
pub use effect::{EffectDraw, EffectSize, RR_CEILING, RR_FLOOR};
pub use matrix::{MatrixBuilder, TransitionMatrix, ROW_SUM_TOLERANCE};
pub use progressive::{
    InitialOccupancy, ProgressionProbabilities, ProgressionStep, ProgressiveModel,
    ProgressiveRealization, StateValues,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ParameterSource;
use crate::error::ConfigError;

/// Health states used across all structures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    AtRisk,
    Diagnosed,
    Complications,
    Death,
}

impl HealthState {
    /// Death is the only absorbing state
    pub fn is_absorbing(&self) -> bool {
        matches!(self, HealthState::Death)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::AtRisk => "at_risk",
            HealthState::Diagnosed => "diagnosed",
            HealthState::Complications => "complications",
            HealthState::Death => "death",
        }
    }
}

/// Diseases covered by the prevention portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseKind {
    Cardiovascular,
    Type2Diabetes,
    Cancer,
    Osteoporosis,
    Alzheimers,
}

impl DiseaseKind {
    pub const ALL: [DiseaseKind; 5] = [
        DiseaseKind::Cardiovascular,
        DiseaseKind::Type2Diabetes,
        DiseaseKind::Cancer,
        DiseaseKind::Osteoporosis,
        DiseaseKind::Alzheimers,
    ];

    /// Stable identifier matching the document spelling
    pub fn key(&self) -> &'static str {
        match self {
            DiseaseKind::Cardiovascular => "cardiovascular",
            DiseaseKind::Type2Diabetes => "type2_diabetes",
            DiseaseKind::Cancer => "cancer",
            DiseaseKind::Osteoporosis => "osteoporosis",
            DiseaseKind::Alzheimers => "alzheimers",
        }
    }

    /// Default programme label
    pub fn label(&self) -> &'static str {
        match self {
            DiseaseKind::Cardiovascular => "Cardiovascular Disease Prevention",
            DiseaseKind::Type2Diabetes => "Type 2 Diabetes Prevention",
            DiseaseKind::Cancer => "Cancer Screening (Breast + CRC)",
            DiseaseKind::Osteoporosis => "Osteoporosis Fracture Prevention",
            DiseaseKind::Alzheimers => "Alzheimer's Multidomain Prevention",
        }
    }
}

impl fmt::Display for DiseaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DiseaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiseaseKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| ConfigError::parameter("disease", format!("unknown disease kind `{}`", s)))
    }
}

/// Per-state rewards attached to a cohort simulation.
///
/// All vectors are indexed by the structure's state order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewards {
    /// Utility weight per cycle spent in the state
    pub utilities: Vec<f64>,
    /// Healthcare cost per cycle spent in the state
    pub annual_costs: Vec<f64>,
    /// One-off healthcare cost of an event originating in the state
    pub event_costs: Vec<f64>,
    /// One-off productivity loss of an event originating in the state
    pub event_productivity_losses: Vec<f64>,
    /// One-off QALY decrement of an event originating in the state
    pub event_qaly_losses: Vec<f64>,
    /// 1.0 where the per-person intervention cost is charged
    pub intervention_mask: Vec<f64>,
}

/// Arm-specific inputs: the transition matrix and per-state event hazards
#[derive(Debug, Clone, PartialEq)]
pub struct ArmInputs {
    pub matrix: TransitionMatrix,
    /// Probability that a member of each state has a counted disease event
    /// during one cycle
    pub event_probabilities: Vec<f64>,
}

/// Capability set shared by every Markov structure
pub trait MarkovStructure {
    /// Ordered states, exactly one of which is absorbing
    fn states(&self) -> &'static [HealthState];

    /// Cohort distribution at cycle 0
    fn initial_occupancy(&self) -> Vec<f64>;

    /// Build arm inputs; `effect` is `None` for the status-quo arm
    fn arm(&self, effect: Option<&EffectDraw>) -> Result<ArmInputs, ConfigError>;

    /// Rewards, identical for both arms
    fn rewards(&self) -> Rewards;

    fn baseline_matrix(&self) -> Result<TransitionMatrix, ConfigError> {
        Ok(self.arm(None)?.matrix)
    }

    fn intervention_matrix(&self, effect: &EffectDraw) -> Result<TransitionMatrix, ConfigError> {
        Ok(self.arm(Some(effect))?.matrix)
    }
}

/// Declared disease model, tagged by structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "structure", rename_all = "snake_case")]
pub enum DiseaseModel {
    AcuteEvent(AcuteEventModel),
    Progressive(ProgressiveModel),
}

impl DiseaseModel {
    pub fn structure_name(&self) -> &'static str {
        match self {
            DiseaseModel::AcuteEvent(_) => "acute_event",
            DiseaseModel::Progressive(_) => "progressive",
        }
    }

    /// Validate declared parameters (distribution families, ranges)
    pub fn validate(&self, disease: &str) -> Result<(), ConfigError> {
        match self {
            DiseaseModel::AcuteEvent(model) => model.validate(disease),
            DiseaseModel::Progressive(model) => model.validate(disease),
        }
    }

    /// Realize all model parameters from a source
    pub fn realize<S: ParameterSource>(&self, source: &mut S) -> Result<RealizedModel, ConfigError> {
        match self {
            DiseaseModel::AcuteEvent(model) => Ok(RealizedModel::AcuteEvent(model.realize(source)?)),
            DiseaseModel::Progressive(model) => Ok(RealizedModel::Progressive(model.realize(source)?)),
        }
    }
}

/// A disease model with every parameter realized
#[derive(Debug, Clone, PartialEq)]
pub enum RealizedModel {
    AcuteEvent(AcuteEventRealization),
    Progressive(ProgressiveRealization),
}

impl MarkovStructure for RealizedModel {
    fn states(&self) -> &'static [HealthState] {
        match self {
            RealizedModel::AcuteEvent(m) => m.states(),
            RealizedModel::Progressive(m) => m.states(),
        }
    }

    fn initial_occupancy(&self) -> Vec<f64> {
        match self {
            RealizedModel::AcuteEvent(m) => m.initial_occupancy(),
            RealizedModel::Progressive(m) => m.initial_occupancy(),
        }
    }

    fn arm(&self, effect: Option<&EffectDraw>) -> Result<ArmInputs, ConfigError> {
        match self {
            RealizedModel::AcuteEvent(m) => m.arm(effect),
            RealizedModel::Progressive(m) => m.arm(effect),
        }
    }

    fn rewards(&self) -> Rewards {
        match self {
            RealizedModel::AcuteEvent(m) => m.rewards(),
            RealizedModel::Progressive(m) => m.rewards(),
        }
    }
}
