//! Probabilistic sensitivity analysis: seeded sampling, the parallel
//! Monte Carlo loop and streaming summaries

mod runner;
mod sampler;
mod stats;

pub use runner::{PsaConfig, PsaRunner, PsaSummary, MAX_ITERATIONS};
pub use sampler::{ParameterSampler, SamplerRecord};
pub use stats::{
    percentile, AcceptabilityCurve, AcceptabilityPoint, CostPerQalyStats, CostPerQalySummary, MetricSummary,
    PairedStats, ParameterSensitivity, RunningStats,
};
