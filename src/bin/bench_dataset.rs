use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use coremax::bench::run_dataset;
use coremax::search::config::SearchConfig;
use coremax::solver::Backend;
use coremax::solver::oracle::OraclePolicy;

#[derive(Debug, Parser)]
#[command(name = "bench_dataset")]
struct Cli {
    #[arg(long)]
    dir: String,
    #[arg(long, default_value = "varisat")]
    backend: String,
    #[arg(long, default_value = "incremental")]
    policy: String,
    #[arg(long)]
    budget: Option<u64>,
    #[arg(long = "timeout_ms", default_value_t = 30000)]
    timeout_ms: u64,
    #[arg(long)]
    csv: String,
    #[arg(long, default_value_t = false)]
    progress: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run_from_args(&cli)
}

fn run_from_args(cli: &Cli) -> Result<()> {
    let cfg = SearchConfig {
        backend: parse_backend(&cli.backend)?,
        policy: parse_policy(&cli.policy)?,
        decision_budget: cli.budget,
        max_oracle_calls: None,
    };
    let rows = run_dataset(
        &PathBuf::from(&cli.dir),
        cfg,
        Duration::from_millis(cli.timeout_ms),
        &PathBuf::from(&cli.csv),
        cli.progress,
    )?;
    println!("rows={}", rows.len());
    Ok(())
}

fn parse_backend(s: &str) -> Result<Backend> {
    match Backend::parse(s) {
        Some(b) => Ok(b),
        None => bail!("unknown backend '{}', expected dpll|varisat", s),
    }
}

fn parse_policy(s: &str) -> Result<OraclePolicy> {
    match OraclePolicy::parse(s) {
        Some(p) => Ok(p),
        None => bail!("unknown policy '{}', expected rebuild|incremental", s),
    }
}
