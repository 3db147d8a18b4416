//! Portfolio aggregation and ROI outcomes

mod adjustments;
mod outcome;
mod result;

pub use adjustments::PortfolioAdjustments;
pub use outcome::{CostEffectiveness, RoiOutcome};
pub use result::{PortfolioResult, PortfolioTotals, SimulationResult};
