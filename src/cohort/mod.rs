//! Cohort trace simulation and discounting

mod discount;
mod simulator;
mod trace;

pub use discount::{annuity_immediate, DiscountTiming};
pub use simulator::{ArmComparison, CohortConfig, CohortSimulator};
pub use trace::{CohortOutcome, CycleRow};
