// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Command-Line Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ti_core::pipeline::run_with_progress;
use ti_core::solver::{ExternalSolver, FieldNaming, DEFAULT_SOLVER_PROGRAM};
use ti_types::config::{MontageConfig, RunConfig};
use ti_types::constants::{
    DEFAULT_CURRENT_MA, DEFAULT_HEAD_DIR, DEFAULT_OUT_DIR, DEFAULT_THRESHOLD_V_PER_M,
};
use ti_types::state::TiReport;

#[derive(Parser, Debug)]
#[command(
    name = "ti-envelope",
    version,
    about = "Temporal-interference envelope and gray-matter focality for a subject head model"
)]
struct Cli {
    /// Subject head model directory (m2m_<subject>)
    #[arg(long, default_value = DEFAULT_HEAD_DIR)]
    head: PathBuf,

    /// Output directory, created if missing
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out: PathBuf,

    /// Peak current per electrode in mA
    #[arg(long, default_value_t = DEFAULT_CURRENT_MA, allow_hyphen_values = true)]
    current: f64,

    /// Focality threshold in V/m
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_V_PER_M)]
    thr: f64,

    /// Region tags counted as gray matter (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "2")]
    gm_tags: Vec<i32>,

    /// Field solver executable
    #[arg(long, default_value = DEFAULT_SOLVER_PROGRAM)]
    solver: String,

    /// Extra argument passed to the solver before the session file (repeatable)
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    solver_args: Vec<String>,

    /// Montage JSON overriding the default F5/P5 + F6/P6 pairs
    #[arg(long)]
    montage: Option<PathBuf>,

    /// Precomputed field archive of pair 1 (skips the solver)
    #[arg(long, requires = "field2")]
    field1: Option<PathBuf>,

    /// Precomputed field archive of pair 2 (skips the solver)
    #[arg(long, requires = "field1")]
    field2: Option<PathBuf>,

    /// Also compute the envelope along a fixed direction, e.g. 0,0,1
    #[arg(long, value_parser = parse_direction, allow_hyphen_values = true)]
    direction: Option<[f64; 3]>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only, no progress banners
    #[arg(short, long)]
    quiet: bool,
}

fn parse_direction(s: &str) -> Result<[f64; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("invalid direction component: {e}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("direction needs 3 components, got {}", parts.len())),
    }
}

fn build_config(cli: &Cli) -> Result<RunConfig> {
    let montage = match &cli.montage {
        Some(path) => MontageConfig::from_file(path)
            .with_context(|| format!("loading montage {}", path.display()))?,
        None => MontageConfig::default(),
    };
    let field_paths = match (&cli.field1, &cli.field2) {
        (Some(a), Some(b)) => Some([a.clone(), b.clone()]),
        (None, None) => None,
        _ => bail!("--field1 and --field2 must be given together"),
    };
    Ok(RunConfig {
        head_dir: cli.head.clone(),
        out_dir: cli.out.clone(),
        current_ma: cli.current,
        threshold: cli.thr,
        gm_tags: cli.gm_tags.clone(),
        montage,
        direction: cli.direction,
        field_paths,
    })
}

fn print_report(report: &TiReport) {
    let focality = &report.focality;
    println!("Envelope:   {}", report.envelope_file.display());
    println!("Elements:   {}", report.n_elements);
    if focality.is_empty() {
        println!(
            "Focality:   no elements with tags {:?}, reported as 0",
            report.gm_tags
        );
    } else {
        println!(
            "Focality:   {:.2}% of {} gray-matter elements >= {} V/m",
            focality.fraction * 100.0,
            focality.n_masked,
            focality.threshold
        );
    }
    if let Some(vf) = focality.volume_fraction {
        println!("            {:.2}% by volume", vf * 100.0);
    }
    if let Some(s) = &report.summary {
        println!(
            "TImax (GM): max {:.4}  mean {:.4}  p99 {:.4}  p99.9 {:.4} V/m",
            s.max, s.mean, s.p99, s.p99_9
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let cfg = build_config(&cli)?;
    let naming = FieldNaming::default();
    let solver = ExternalSolver::new(cli.solver.clone())
        .with_args(cli.solver_args.clone())
        .with_naming(naming.clone());

    let quiet = cli.quiet;
    let report = run_with_progress(&cfg, &solver, &naming, |stage| {
        if !quiet {
            println!("==> {stage}");
        }
    })
    .with_context(|| format!("TI run for {} failed", cfg.head_dir.display()))?;

    print_report(&report);
    Ok(())
}
