//! Prevention ROI - Markov cohort economic engine for preventive-health portfolios
//!
//! This library provides:
//! - Disease models (acute-event and progressive Markov structures)
//! - Transition matrix assembly with intervention effects (RRR or relative risk)
//! - Discounted cohort traces with configurable half-cycle timing
//! - Portfolio aggregation with overlap and synergy corrections
//! - ROI, cost-per-QALY and dominance outcomes
//! - Seeded, parallel probabilistic sensitivity analysis

pub mod cohort;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod portfolio;
pub mod psa;

// Re-export commonly used types
pub use cohort::{CohortOutcome, CohortSimulator, DiscountTiming};
pub use config::{ParameterDocument, Perspective, PortfolioConfig, Uncertain};
pub use engine::{DeterministicRun, EconomicEngine, HorizonScenario};
pub use error::{ConfigError, SimulationError};
pub use model::{DiseaseKind, DiseaseModel, HealthState};
pub use portfolio::{CostEffectiveness, PortfolioResult, RoiOutcome, SimulationResult};
pub use psa::{PsaConfig, PsaSummary};
