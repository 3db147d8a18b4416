//! Prevention ROI CLI
//!
//! Runs the deterministic portfolio, optional horizon scenarios and a PSA
//! over the built-in reference portfolio or a JSON parameter document.

use anyhow::{Context, Result};
use clap::Parser;
use prevention_roi::{
    CostEffectiveness, DiseaseKind, EconomicEngine, ParameterDocument, Perspective, PortfolioConfig, PsaConfig,
};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "prevention-roi", version, about = "Preventive-health portfolio ROI with PSA")]
struct Cli {
    /// JSON parameter document (defaults to the built-in reference portfolio)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Monte Carlo iterations (0 skips the PSA)
    #[arg(short = 'n', long, default_value_t = 1000)]
    iterations: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Iterations evaluated per parallel batch
    #[arg(long, default_value_t = 256)]
    chunk_size: usize,

    /// Override the configured horizon in years
    #[arg(long)]
    horizon: Option<u32>,

    /// Restrict the run to these diseases (repeatable)
    #[arg(long = "disease")]
    diseases: Vec<DiseaseKind>,

    /// Count healthcare savings only
    #[arg(long)]
    health_system: bool,

    /// Alternative horizons for deterministic scenarios, e.g. 5,10,20
    #[arg(long, value_delimiter = ',')]
    scenarios: Vec<u32>,

    /// Write the PSA summary as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the per-intervention deterministic snapshot as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the active parameter document and exit
    #[arg(long)]
    write_template: Option<PathBuf>,
}

/// One row of the per-intervention snapshot
#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    disease: &'a str,
    label: &'a str,
    participants: f64,
    investment: f64,
    healthcare_savings: f64,
    productivity_savings: f64,
    net_benefit: f64,
    roi_percent: f64,
    roi_ratio: f64,
    qalys_gained: f64,
    cost_per_qaly: String,
    events_prevented: f64,
    deaths_averted: f64,
}

fn describe(ce: &CostEffectiveness) -> String {
    match ce {
        CostEffectiveness::CostPerQaly(ratio) => format!("{:.0}", ratio),
        CostEffectiveness::Dominant => "dominant".to_string(),
        CostEffectiveness::Dominated => "dominated".to_string(),
    }
}

fn load_config(cli: &Cli) -> Result<PortfolioConfig> {
    let mut config = match &cli.params {
        Some(path) => PortfolioConfig::from_path(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => PortfolioConfig::reference(),
    };
    if let Some(horizon) = cli.horizon {
        config = config.with_horizon(horizon)?;
    }
    if cli.health_system {
        config.global.perspective = Perspective::HealthSystem;
    }
    if !cli.diseases.is_empty() {
        config = config.with_diseases(&cli.diseases)?;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let config = load_config(&cli)?;

    if let Some(path) = &cli.write_template {
        let json = ParameterDocument::from(&config).to_json_pretty()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Parameter document written to {}", path.display());
        return Ok(());
    }

    let engine = EconomicEngine::new(config)?;
    let global = engine.config().global;

    println!("Prevention ROI v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");
    println!(
        "Horizon {} years, discount {:.1}%, perspective {:?}, WTP {:.0}",
        global.horizon_years,
        global.discount_rate * 100.0,
        global.perspective,
        global.willingness_to_pay
    );

    let run = engine.run_deterministic()?;

    println!("\nPer-intervention snapshot (unadjusted):");
    println!(
        "{:<38} {:>14} {:>14} {:>9} {:>10} {:>12}",
        "Programme", "Investment", "Savings", "ROI %", "QALYs", "Cost/QALY"
    );
    println!("{}", "-".repeat(102));
    for disease in &run.diseases {
        println!(
            "{:<38} {:>14.0} {:>14.0} {:>9.1} {:>10.1} {:>12}",
            disease.result.label,
            disease.result.investment,
            disease.result.total_savings(),
            disease.outcome.roi_percent,
            disease.result.qalys_gained,
            describe(&disease.outcome.cost_per_qaly),
        );
    }

    let totals = &run.portfolio.totals;
    println!("\nPortfolio (adjusted):");
    println!("  Investment:        {:.0}", totals.investment);
    println!("  Healthcare saved:  {:.0}", totals.healthcare_savings);
    println!("  Productivity:      {:.0}", totals.productivity_savings);
    println!("  Net benefit:       {:.0}", run.outcome.net_benefit);
    println!("  ROI:               {:.1}%", run.outcome.roi_percent);
    println!("  QALYs gained:      {:.1}", totals.qalys_gained);
    println!("  Cost per QALY:     {}", describe(&run.outcome.cost_per_qaly));
    println!("  Events prevented:  {:.0}", totals.events_prevented);
    println!("  Deaths averted:    {:.0}", totals.deaths_averted);

    if let Some(path) = &cli.csv {
        let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
        for disease in &run.diseases {
            let r = &disease.result;
            writer.serialize(SnapshotRow {
                disease: r.disease.key(),
                label: &r.label,
                participants: r.participants,
                investment: r.investment,
                healthcare_savings: r.healthcare_savings,
                productivity_savings: r.productivity_savings,
                net_benefit: disease.outcome.net_benefit,
                roi_percent: disease.outcome.roi_percent,
                roi_ratio: disease.outcome.roi_ratio,
                qalys_gained: r.qalys_gained,
                cost_per_qaly: describe(&disease.outcome.cost_per_qaly),
                events_prevented: r.events_prevented,
                deaths_averted: r.deaths_averted,
            })?;
        }
        writer.flush()?;
        println!("\nSnapshot written to {}", path.display());
    }

    if !cli.scenarios.is_empty() {
        println!("\nHorizon scenarios:");
        for scenario in engine.run_horizon_scenarios(&cli.scenarios)? {
            println!(
                "  {:>3} years: ROI {:>7.1}%, net benefit {:>16.0}, cost/QALY {}",
                scenario.horizon_years,
                scenario.outcome.roi_percent,
                scenario.outcome.net_benefit,
                describe(&scenario.outcome.cost_per_qaly)
            );
        }
    }

    if cli.iterations > 0 {
        let psa = PsaConfig {
            iterations: cli.iterations,
            seed: cli.seed,
            chunk_size: cli.chunk_size,
            ..PsaConfig::default()
        };
        let psa_start = Instant::now();
        let summary = engine.run_psa(&psa)?;

        println!("\nPSA ({} iterations, seed {}) in {:?}:", summary.iterations, summary.seed, psa_start.elapsed());
        let rows = [
            ("ROI %", &summary.roi_percent),
            ("Net benefit", &summary.net_benefit),
            ("QALYs gained", &summary.qalys_gained),
            ("Events prevented", &summary.events_prevented),
            ("Deaths averted", &summary.deaths_averted),
        ];
        for (name, m) in rows {
            println!(
                "  {:<17} mean {:>16.1}  95% [{:.1}, {:.1}]",
                name, m.mean, m.p2_5, m.p97_5
            );
        }
        println!(
            "  Dominant in {:.1}% of iterations, dominated in {:.1}%",
            summary.cost_per_qaly.dominant_share * 100.0,
            summary.cost_per_qaly.dominated_share * 100.0
        );
        println!(
            "  P(cost-effective at {:.0}) = {:.3}",
            summary.willingness_to_pay, summary.probability_cost_effective
        );

        if !summary.parameter_sensitivity.is_empty() {
            println!("\n  Top drivers of net benefit:");
            for driver in summary.parameter_sensitivity.iter().take(5) {
                println!("    {:<44} r = {:>6.3}", driver.parameter, driver.correlation);
            }
        }

        if let Some(path) = &cli.json {
            let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(&mut file, &summary)?;
            writeln!(file)?;
            println!("\nPSA summary written to {}", path.display());
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
