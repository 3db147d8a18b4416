//! Probabilistic sensitivity analysis loop
//!
//! Iterations are evaluated in fixed-size chunks. Within a chunk they fan out
//! over the rayon pool; results are collected in iteration order and folded
//! into the running statistics sequentially, so the summary is bit-identical
//! for any pool size. A cancellation flag is checked between chunks.
//!
//! Per-iteration outputs live only for one chunk. The fold keeps one f64 per
//! metric per iteration for exact percentiles, plus constant-size paired
//! moments per sampled parameter for the sensitivity ranking.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::sampler::{ParameterSampler, SamplerRecord};
use super::stats::{
    AcceptabilityCurve, AcceptabilityPoint, CostPerQalyStats, CostPerQalySummary, MetricSummary, PairedStats,
    ParameterSensitivity, RunningStats,
};
use crate::error::SimulationError;
use crate::portfolio::{PortfolioResult, PortfolioTotals, RoiOutcome};

/// Largest accepted iteration count
pub const MAX_ITERATIONS: usize = 10_000_000;

/// Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsaConfig {
    pub iterations: usize,
    pub seed: u64,

    /// Iterations evaluated per parallel batch
    pub chunk_size: usize,

    /// Willingness-to-pay grid for the acceptability curve
    pub ceac_thresholds: Vec<f64>,
}

impl Default for PsaConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: 42,
            chunk_size: 256,
            ceac_thresholds: (0..=30).map(|k| k as f64 * 10_000.0).collect(),
        }
    }
}

/// Distributional summary of a PSA run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsaSummary {
    pub iterations: usize,
    pub seed: u64,
    pub willingness_to_pay: f64,

    pub roi_percent: MetricSummary,
    pub cost_per_qaly: CostPerQalySummary,
    pub events_prevented: MetricSummary,
    pub deaths_averted: MetricSummary,
    pub qalys_gained: MetricSummary,
    pub net_benefit: MetricSummary,
    pub investment: MetricSummary,
    pub total_savings: MetricSummary,

    /// Share of iterations cost-effective at the configured threshold
    pub probability_cost_effective: f64,
    pub acceptability: Vec<AcceptabilityPoint>,

    /// Draws clipped to their valid range, per parameter
    pub clipped_draws: BTreeMap<String, u64>,

    /// Sampled parameters ranked by absolute correlation with net benefit
    pub parameter_sensitivity: Vec<ParameterSensitivity>,
}

/// What one iteration contributes to the summary
struct IterationOutput {
    totals: PortfolioTotals,
    outcome: RoiOutcome,
    record: SamplerRecord,
}

struct Accumulator {
    roi_percent: RunningStats,
    cost_per_qaly: CostPerQalyStats,
    events_prevented: RunningStats,
    deaths_averted: RunningStats,
    qalys_gained: RunningStats,
    net_benefit: RunningStats,
    investment: RunningStats,
    total_savings: RunningStats,
    cost_effective: u64,
    acceptability: AcceptabilityCurve,
    clips: BTreeMap<String, u64>,
    sensitivity: BTreeMap<String, PairedStats>,
}

impl Accumulator {
    fn new(config: &PsaConfig) -> Self {
        let reserve = config.chunk_size.min(config.iterations);
        let stats = || RunningStats::with_capacity(reserve);
        Self {
            roi_percent: stats(),
            cost_per_qaly: CostPerQalyStats::default(),
            events_prevented: stats(),
            deaths_averted: stats(),
            qalys_gained: stats(),
            net_benefit: stats(),
            investment: stats(),
            total_savings: stats(),
            cost_effective: 0,
            acceptability: AcceptabilityCurve::new(&config.ceac_thresholds),
            clips: BTreeMap::new(),
            sensitivity: BTreeMap::new(),
        }
    }

    fn push(&mut self, output: IterationOutput) {
        let IterationOutput { totals, outcome, record } = output;
        self.roi_percent.push(outcome.roi_percent);
        self.cost_per_qaly.push(&outcome.cost_per_qaly);
        self.events_prevented.push(totals.events_prevented);
        self.deaths_averted.push(totals.deaths_averted);
        self.qalys_gained.push(totals.qalys_gained);
        self.net_benefit.push(outcome.net_benefit);
        self.investment.push(totals.investment);
        self.total_savings.push(totals.total_savings);
        if outcome.cost_effective {
            self.cost_effective += 1;
        }
        self.acceptability.push(&outcome.cost_per_qaly);
        for (name, count) in record.clips {
            *self.clips.entry(name).or_insert(0) += count;
        }
        for (name, value) in record.draws {
            self.sensitivity
                .entry(name)
                .or_default()
                .push(value, outcome.net_benefit);
        }
    }

    fn ranked_sensitivity(&self) -> Vec<ParameterSensitivity> {
        let mut ranked: Vec<_> = self
            .sensitivity
            .iter()
            .filter_map(|(name, stats)| {
                stats.correlation().map(|correlation| ParameterSensitivity {
                    parameter: name.clone(),
                    mean_draw: stats.mean_x(),
                    correlation,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
        ranked
    }

    fn finish(self, config: &PsaConfig, willingness_to_pay: f64) -> PsaSummary {
        for (name, count) in &self.clips {
            warn!("{} draws of {} were clipped to the valid range", count, name);
        }
        let summary = |stats: &RunningStats| stats.summary().unwrap_or_default();
        let parameter_sensitivity = self.ranked_sensitivity();

        PsaSummary {
            iterations: config.iterations,
            seed: config.seed,
            willingness_to_pay,
            roi_percent: summary(&self.roi_percent),
            cost_per_qaly: self.cost_per_qaly.summary(),
            events_prevented: summary(&self.events_prevented),
            deaths_averted: summary(&self.deaths_averted),
            qalys_gained: summary(&self.qalys_gained),
            net_benefit: summary(&self.net_benefit),
            investment: summary(&self.investment),
            total_savings: summary(&self.total_savings),
            probability_cost_effective: self.cost_effective as f64 / config.iterations as f64,
            acceptability: self.acceptability.points(),
            clipped_draws: self.clips,
            parameter_sensitivity,
        }
    }
}

/// Runs the Monte Carlo loop around a portfolio evaluation
#[derive(Debug, Clone, Default)]
pub struct PsaRunner {
    config: PsaConfig,
}

impl PsaRunner {
    pub fn new(config: PsaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PsaConfig {
        &self.config
    }

    /// Evaluate `evaluate` once per iteration with that iteration's sampler
    pub fn run<F>(
        &self,
        willingness_to_pay: f64,
        cancel: Option<&AtomicBool>,
        evaluate: F,
    ) -> Result<PsaSummary, SimulationError>
    where
        F: Fn(&mut ParameterSampler) -> Result<PortfolioResult, SimulationError> + Sync,
    {
        let config = &self.config;
        if config.iterations == 0 {
            return Err(SimulationError::NoIterations);
        }
        if config.iterations > MAX_ITERATIONS {
            return Err(SimulationError::TooManyIterations {
                requested: config.iterations,
                max: MAX_ITERATIONS,
            });
        }
        let chunk_size = config.chunk_size.max(1);
        info!(
            "Starting PSA: {} iterations, seed {}, chunk size {}",
            config.iterations, config.seed, chunk_size
        );

        let mut accumulator = Accumulator::new(config);
        let mut completed = 0;

        while completed < config.iterations {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!("PSA interrupted after {} iterations", completed);
                return Err(SimulationError::Interrupted { completed });
            }

            let end = (completed + chunk_size).min(config.iterations);
            let outputs = (completed..end)
                .into_par_iter()
                .map(|iteration| {
                    let mut sampler = ParameterSampler::for_iteration(config.seed, iteration);
                    let portfolio = evaluate(&mut sampler)?;
                    Ok(IterationOutput {
                        totals: portfolio.totals,
                        outcome: portfolio.outcome(willingness_to_pay),
                        record: sampler.into_record(),
                    })
                })
                .collect::<Result<Vec<_>, SimulationError>>()?;

            for output in outputs {
                accumulator.push(output);
            }
            completed = end;
            debug!("PSA progress: {}/{}", completed, config.iterations);
        }

        let summary = accumulator.finish(config, willingness_to_pay);
        info!(
            "PSA complete: mean ROI {:.1}%, P(cost-effective) {:.3}",
            summary.roi_percent.mean, summary.probability_cost_effective
        );
        Ok(summary)
    }
}
