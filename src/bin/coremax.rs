use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use coremax::cnf::dimacs::{model_line, to_dimacs};
use coremax::cnf::wcnf::{parse_wcnf_reader, to_wcnf};
use coremax::generate::{GenOptions, random_instance};
use coremax::maxsat::core::Core;
use coremax::maxsat::core_file::{read_core_files, write_core_files};
use coremax::maxsat::formula::MaxSatFormula;
use coremax::search::config::SearchConfig;
use coremax::search::{Msu3, SearchObserver, Status};
use coremax::solver::Backend;
use coremax::solver::oracle::OraclePolicy;

#[derive(Debug, Parser)]
#[command(name = "coremax")]
#[command(about = "Core-guided MaxSAT for unit-weight instances")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    Solve {
        path: String,
        #[arg(long, default_value = "varisat")]
        backend: String,
        #[arg(long, default_value = "incremental")]
        policy: String,
        #[arg(long)]
        budget: Option<u64>,
        #[arg(long)]
        max_calls: Option<usize>,
        /// Seed with cores from a previous run: lengths file and cores file.
        #[arg(long, num_args = 2, value_names = ["LENGTHS", "CORES"])]
        seed_cores: Option<Vec<PathBuf>>,
        /// Write the cores found: lengths file and cores file.
        #[arg(long, num_args = 2, value_names = ["LENGTHS", "CORES"])]
        save_cores: Option<Vec<PathBuf>>,
        #[arg(long, default_value_t = false)]
        model: bool,
    },
    /// Write the relaxed instance as plain DIMACS CNF.
    Cnf {
        path: String,
        #[arg(long)]
        emit: String,
    },
    Gen {
        #[arg(long)]
        vars: u32,
        #[arg(long)]
        hard: usize,
        #[arg(long)]
        soft: usize,
        #[arg(long, default_value_t = 3)]
        width: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        out: String,
    },
}

struct PrintObserver;

impl SearchObserver for PrintObserver {
    fn on_bound_update(&mut self, k: usize) {
        println!("c lb {}", k);
    }

    fn on_core(&mut self, core: &Core) {
        log::debug!("core with {} new soft clauses", core.activated.len());
    }

    fn on_optimum(&mut self, cost: usize, _model: &[bool]) {
        println!("o {}", cost);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Cmd::Solve {
            path,
            backend,
            policy,
            budget,
            max_calls,
            seed_cores,
            save_cores,
            model,
        } => {
            let config = SearchConfig {
                policy: parse_policy(&policy)?,
                backend: parse_backend(&backend)?,
                decision_budget: budget,
                max_oracle_calls: max_calls,
            };
            solve_cmd(&path, config, seed_cores, save_cores, model)?
        }
        Cmd::Cnf { path, emit } => cnf_cmd(&path, &emit)?,
        Cmd::Gen {
            vars,
            hard,
            soft,
            width,
            seed,
            out,
        } => gen_cmd(
            GenOptions {
                vars,
                hard,
                soft,
                width,
                seed,
            },
            &out,
        )?,
    }
    Ok(())
}

fn solve_cmd(
    path: &str,
    config: SearchConfig,
    seed_cores: Option<Vec<PathBuf>>,
    save_cores: Option<Vec<PathBuf>>,
    print_model: bool,
) -> Result<()> {
    let formula = load_formula(path)?;
    println!(
        "c vars={} hard={} soft={} backend={} policy={}",
        formula.n_vars(),
        formula.n_hard(),
        formula.n_soft(),
        config.backend.name(),
        config.policy.name()
    );
    let num_vars = formula.n_vars();

    let mut search = Msu3::new(formula, config);
    if let Some([lengths, cores]) = seed_cores.as_deref() {
        let seeded = read_core_files(lengths, cores)?;
        let n = search.seed_cores(&seeded)?;
        println!("c seeded {} soft clauses from {} cores", n, seeded.len());
    }
    let report = search.run(&mut PrintObserver);

    if let Some([lengths, cores]) = save_cores.as_deref() {
        write_core_files(lengths, cores, &report.cores)?;
    }

    println!(
        "c oracle_calls={} decisions={} unsat_calls={} cores={} active={} card_clauses={} card_vars={}",
        report.oracle_calls,
        report.oracle_stats.decisions,
        report.oracle_stats.conflicts,
        report.cores.len(),
        report.active_soft,
        report.card_clauses,
        report.card_vars
    );
    match report.status {
        Status::Optimum => println!("s OPTIMUM FOUND"),
        Status::Unsatisfiable => println!("s UNSATISFIABLE"),
        Status::Unknown => println!("s UNKNOWN"),
        Status::Error => bail!("search stopped on an internal error"),
    }
    if print_model {
        if let Some(model) = &report.model {
            println!("{}", model_line(model, num_vars));
        }
    }
    Ok(())
}

fn cnf_cmd(path: &str, emit: &str) -> Result<()> {
    let mut formula = load_formula(path)?;
    formula.relax();
    let cnf = formula.to_cnf();
    std::fs::write(emit, to_dimacs(&cnf)).with_context(|| format!("failed to write {}", emit))?;
    println!("vars={} clauses={}", cnf.num_vars, cnf.clauses.len());
    Ok(())
}

fn gen_cmd(opts: GenOptions, out: &str) -> Result<()> {
    let formula = random_instance(opts)?;
    std::fs::write(out, to_wcnf(&formula)).with_context(|| format!("failed to write {}", out))?;
    println!(
        "GEN: wrote {} | vars={} hard={} soft={}",
        out,
        formula.n_vars(),
        formula.n_hard(),
        formula.n_soft()
    );
    Ok(())
}

fn load_formula(path: &str) -> Result<MaxSatFormula> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    parse_wcnf_reader(BufReader::new(file))
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
