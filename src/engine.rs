//! Economic engine for portfolio runs
//!
//! Holds one validated [`PortfolioConfig`] and runs deterministic,
//! horizon-scenario and PSA evaluations against it. The engine keeps no
//! mutable state, so one instance can serve concurrent runs.
//!
//! # Example
//! ```ignore
//! let engine = EconomicEngine::new(PortfolioConfig::reference())?;
//! let run = engine.run_deterministic()?;
//! println!("ROI {:.1}%", run.outcome.roi_percent);
//!
//! let psa = engine.run_psa(&PsaConfig::default())?;
//! println!("P(cost-effective) {:.3}", psa.probability_cost_effective);
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

use crate::cohort::{ArmComparison, CohortConfig, CohortSimulator};
use crate::config::{DiseaseConfig, ParameterSource, PointEstimates, PortfolioConfig, Support};
use crate::error::{ConfigError, SimulationError};
use crate::model::DiseaseKind;
use crate::portfolio::{PortfolioResult, RoiOutcome, SimulationResult};
use crate::psa::{PsaConfig, PsaRunner, PsaSummary};

/// One disease of a deterministic run with its arm-level detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRun {
    pub result: SimulationResult,
    /// Unadjusted stand-alone outcome of this programme
    pub outcome: RoiOutcome,
    /// Per-person outcomes of both arms
    pub arms: ArmComparison,
}

/// Point-estimate evaluation of the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicRun {
    pub horizon_years: u32,
    pub portfolio: PortfolioResult,
    pub outcome: RoiOutcome,
    pub diseases: Vec<DiseaseRun>,
}

/// Deterministic portfolio outcome at one alternative horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonScenario {
    pub horizon_years: u32,
    pub portfolio: PortfolioResult,
    pub outcome: RoiOutcome,
}

/// Portfolio evaluation engine
#[derive(Debug, Clone)]
pub struct EconomicEngine {
    config: PortfolioConfig,
    detailed_output: bool,
}

impl EconomicEngine {
    /// Validate the configuration and build an engine
    pub fn new(config: PortfolioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            detailed_output: false,
        })
    }

    /// Keep cycle-by-cycle traces in deterministic runs
    pub fn with_detailed_output(mut self, detailed_output: bool) -> Self {
        self.detailed_output = detailed_output;
        self
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Engine over a subset of the configured diseases
    pub fn with_diseases(&self, kinds: &[DiseaseKind]) -> Result<Self, ConfigError> {
        Ok(Self {
            config: self.config.with_diseases(kinds)?,
            detailed_output: self.detailed_output,
        })
    }

    fn simulator(&self, horizon_years: u32, detailed_output: bool) -> CohortSimulator {
        let global = &self.config.global;
        CohortSimulator::new(CohortConfig {
            horizon_years,
            discount_rate: global.discount_rate,
            discount_timing: global.discount_timing,
            detailed_output,
        })
    }

    /// Realize one disease from `source` (model parameters, intervention
    /// cost, then effect) and run both arms
    fn evaluate_disease<S: ParameterSource>(
        &self,
        disease: &DiseaseConfig,
        simulator: &CohortSimulator,
        source: &mut S,
    ) -> Result<(SimulationResult, ArmComparison), ConfigError> {
        source.enter_scope(disease.kind.key());
        let model = disease.model.realize(source)?;
        let cost_per_person = source.value(
            "cost_per_person",
            &disease.intervention.cost_per_person,
            Support::NonNegative,
        )?;
        let effect = disease.intervention.effect.realize(source)?;
        let arms = simulator.compare(&model, &effect, cost_per_person)?;

        let result = SimulationResult::from_arms(
            disease.kind,
            &disease.label,
            disease.intervention.participants(),
            disease.intervention.fixed_investment,
            &arms,
            self.config.global.perspective,
        );
        Ok((result, arms))
    }

    fn deterministic_at(&self, horizon_years: u32, detailed_output: bool) -> Result<DeterministicRun, SimulationError> {
        let simulator = self.simulator(horizon_years, detailed_output);
        let wtp = self.config.global.willingness_to_pay;

        let mut results = Vec::with_capacity(self.config.diseases.len());
        let mut diseases = Vec::with_capacity(self.config.diseases.len());
        for disease in &self.config.diseases {
            let (result, arms) = self.evaluate_disease(disease, &simulator, &mut PointEstimates)?;
            debug!(
                "{}: investment {:.0}, healthcare savings {:.0}, QALYs {:.1}, events prevented {:.1}",
                disease.kind, result.investment, result.healthcare_savings, result.qalys_gained, result.events_prevented
            );
            diseases.push(DiseaseRun {
                outcome: result.outcome(wtp),
                result: result.clone(),
                arms,
            });
            results.push(result);
        }

        let portfolio = PortfolioResult::aggregate(results, &self.config.adjustments);
        let outcome = portfolio.outcome(wtp);
        Ok(DeterministicRun {
            horizon_years,
            portfolio,
            outcome,
            diseases,
        })
    }

    /// Evaluate the portfolio at parameter point estimates
    pub fn run_deterministic(&self) -> Result<DeterministicRun, SimulationError> {
        let horizon = self.config.global.horizon_years;
        info!(
            "Deterministic run: {} diseases, {} years at {:.1}%",
            self.config.diseases.len(),
            horizon,
            self.config.global.discount_rate * 100.0
        );
        let run = self.deterministic_at(horizon, self.detailed_output)?;
        info!(
            "Portfolio ROI {:.1}%, net benefit {:.0}",
            run.outcome.roi_percent, run.outcome.net_benefit
        );
        Ok(run)
    }

    /// Re-run the deterministic portfolio at alternative horizons
    pub fn run_horizon_scenarios(&self, horizons: &[u32]) -> Result<Vec<HorizonScenario>, SimulationError> {
        horizons
            .iter()
            .map(|&horizon_years| {
                if horizon_years == 0 {
                    return Err(ConfigError::parameter("horizon_years", "horizon must be at least one year").into());
                }
                let run = self.deterministic_at(horizon_years, false)?;
                Ok(HorizonScenario {
                    horizon_years,
                    portfolio: run.portfolio,
                    outcome: run.outcome,
                })
            })
            .collect()
    }

    /// Monte Carlo PSA over every uncertain parameter
    pub fn run_psa(&self, psa: &PsaConfig) -> Result<PsaSummary, SimulationError> {
        self.psa(psa, None)
    }

    /// PSA that stops between chunks once `cancel` is set
    pub fn run_psa_with_cancel(&self, psa: &PsaConfig, cancel: &AtomicBool) -> Result<PsaSummary, SimulationError> {
        self.psa(psa, Some(cancel))
    }

    fn psa(&self, psa: &PsaConfig, cancel: Option<&AtomicBool>) -> Result<PsaSummary, SimulationError> {
        let simulator = self.simulator(self.config.global.horizon_years, false);
        let runner = PsaRunner::new(psa.clone());

        runner.run(self.config.global.willingness_to_pay, cancel, |sampler| {
            let mut results = Vec::with_capacity(self.config.diseases.len());
            for disease in &self.config.diseases {
                let (result, _) = self
                    .evaluate_disease(disease, &simulator, sampler)
                    .map_err(|source| SimulationError::InvalidDraw {
                        iteration: sampler.iteration(),
                        disease: disease.kind.key().to_string(),
                        source,
                    })?;
                results.push(result);
            }
            Ok(PortfolioResult::aggregate(results, &self.config.adjustments))
        })
    }
}
