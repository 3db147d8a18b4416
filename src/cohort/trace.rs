//! Cycle-level cohort output

use serde::{Deserialize, Serialize};

/// A single annual cycle of one arm, per member of the starting cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRow {
    /// Cycle index (1-indexed)
    pub cycle: u32,

    /// State occupancy after this cycle's transitions
    pub occupancy: Vec<f64>,

    /// Discount factor applied to this cycle
    pub discount_factor: f64,

    // Undiscounted per-cycle amounts
    pub qalys: f64,
    pub healthcare_cost: f64,
    pub productivity_cost: f64,
    pub intervention_cost: f64,
    pub events: f64,
    pub deaths: f64,
}

impl CycleRow {
    pub fn new(cycle: u32, discount_factor: f64) -> Self {
        Self {
            cycle,
            occupancy: Vec::new(),
            discount_factor,
            qalys: 0.0,
            healthcare_cost: 0.0,
            productivity_cost: 0.0,
            intervention_cost: 0.0,
            events: 0.0,
            deaths: 0.0,
        }
    }
}

/// Totals of one arm over the horizon, per member of the starting cohort.
///
/// QALYs and costs are discounted; events and deaths are not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CohortOutcome {
    pub qalys: f64,
    pub healthcare_cost: f64,
    pub productivity_cost: f64,
    pub intervention_cost: f64,
    pub events: f64,
    pub deaths: f64,

    /// Cycle-by-cycle trace, empty unless detailed output was requested
    pub trace: Vec<CycleRow>,
}

impl CohortOutcome {
    /// Fold one cycle into the totals
    pub fn accumulate(&mut self, row: &CycleRow) {
        let v = row.discount_factor;
        self.qalys += row.qalys * v;
        self.healthcare_cost += row.healthcare_cost * v;
        self.productivity_cost += row.productivity_cost * v;
        self.intervention_cost += row.intervention_cost * v;
        self.events += row.events;
        self.deaths += row.deaths;
    }

    /// Healthcare plus intervention cost
    pub fn total_cost(&self) -> f64 {
        self.healthcare_cost + self.intervention_cost
    }

    /// Occupancy at the end of the horizon, if the trace was kept
    pub fn final_occupancy(&self) -> Option<&[f64]> {
        self.trace.last().map(|row| row.occupancy.as_slice())
    }
}
