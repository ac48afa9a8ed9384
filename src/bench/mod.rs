use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::cnf::wcnf::parse_wcnf_reader;
use crate::maxsat::formula::MaxSatFormula;
use crate::search::config::SearchConfig;
use crate::search::{Status, solve};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchRow {
    pub path: String,
    pub status: String,
    pub backend: String,
    pub policy: String,
    pub wall_ms: Option<u128>,
    pub oracle_calls: Option<usize>,
    pub cost: Option<usize>,
    pub lower_bound: Option<usize>,
    pub file_bytes: Option<u64>,
    pub vars: Option<u32>,
    pub hard: Option<usize>,
    pub soft: Option<usize>,
    pub card_clauses: Option<usize>,
}

impl BenchRow {
    pub fn csv_header() -> &'static str {
        "path,status,backend,policy,wall_ms,oracle_calls,cost,lower_bound,file_bytes,vars,hard,soft,card_clauses"
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            esc_csv(&self.path),
            self.status,
            self.backend,
            self.policy,
            opt_u128(self.wall_ms),
            opt_usize(self.oracle_calls),
            opt_usize(self.cost),
            opt_usize(self.lower_bound),
            opt_u64(self.file_bytes),
            opt_u32(self.vars),
            opt_usize(self.hard),
            opt_usize(self.soft),
            opt_usize(self.card_clauses),
        )
    }

    fn empty(path: &Path, status: &str, cfg: SearchConfig, file_bytes: Option<u64>) -> Self {
        BenchRow {
            path: path.to_string_lossy().to_string(),
            status: status.to_string(),
            backend: cfg.backend.name().to_string(),
            policy: cfg.policy.name().to_string(),
            wall_ms: None,
            oracle_calls: None,
            cost: None,
            lower_bound: None,
            file_bytes,
            vars: None,
            hard: None,
            soft: None,
            card_clauses: None,
        }
    }
}

/// Solves one file on a worker thread. Rows for runs that outlive `timeout`
/// are reported with status `timeout`; the worker is left to finish on its own.
pub fn run_one(path: &Path, cfg: SearchConfig, timeout: Duration) -> BenchRow {
    let file_bytes = fs::metadata(path).ok().map(|m| m.len());
    let start = Instant::now();
    let p = path.to_path_buf();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let row = run_one_inner(&p, cfg, file_bytes);
        let _ = tx.send(row);
    });

    match rx.recv_timeout(timeout) {
        Ok(mut row) => {
            row.wall_ms = Some(start.elapsed().as_millis());
            row
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            let mut row = BenchRow::empty(path, "timeout", cfg, file_bytes);
            row.wall_ms = Some(start.elapsed().as_millis());
            row
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let mut row = BenchRow::empty(path, "internal_error", cfg, file_bytes);
            row.wall_ms = Some(start.elapsed().as_millis());
            row
        }
    }
}

pub fn run_dataset(
    dir: &Path,
    cfg: SearchConfig,
    timeout: Duration,
    csv_path: &Path,
    progress: bool,
) -> std::io::Result<Vec<BenchRow>> {
    let paths = discover_paths(dir)?;
    let mut csv = File::create(csv_path)?;
    writeln!(csv, "{}", BenchRow::csv_header())?;
    csv.flush()?;

    let mut rows = Vec::new();
    for path in paths {
        let row = run_one(&path, cfg, timeout);
        if progress {
            println!(
                "path={} status={} wall_ms={} calls={} cost={}",
                row.path,
                row.status,
                row.wall_ms.unwrap_or_default(),
                row.oracle_calls.unwrap_or_default(),
                opt_usize(row.cost)
            );
        }
        writeln!(csv, "{}", row.to_csv_line())?;
        csv.flush()?;
        rows.push(row);
    }

    Ok(rows)
}

fn run_one_inner(path: &Path, cfg: SearchConfig, file_bytes: Option<u64>) -> BenchRow {
    let formula = match load_formula(path) {
        Ok(v) => v,
        Err(err) => {
            log::warn!("{}: {:#}", path.display(), err);
            return BenchRow::empty(path, "parse_error", cfg, file_bytes);
        }
    };

    let mut row = BenchRow::empty(path, "ok", cfg, file_bytes);
    row.vars = Some(formula.n_vars());
    row.hard = Some(formula.n_hard());
    row.soft = Some(formula.n_soft());

    let report = solve(formula, cfg);
    row.status = match report.status {
        Status::Optimum => "ok".to_string(),
        other => other.name().to_string(),
    };
    row.oracle_calls = Some(report.oracle_calls);
    row.cost = report.cost;
    row.lower_bound = Some(report.lower_bound);
    row.card_clauses = Some(report.card_clauses);
    row
}

fn load_formula(path: &Path) -> anyhow::Result<MaxSatFormula> {
    let file = File::open(path)?;
    parse_wcnf_reader(BufReader::new(file))
}

fn discover_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::<PathBuf>::new();
    collect_paths(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_paths(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let p = entry.path();
        if p.is_dir() {
            collect_paths(&p, out)?;
            continue;
        }
        let ext = p.extension().and_then(|x| x.to_str()).unwrap_or("");
        if ext == "wcnf" {
            out.push(p);
        }
    }
    Ok(())
}

fn opt_usize(v: Option<usize>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u32(v: Option<u32>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u64(v: Option<u64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u128(v: Option<u128>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn esc_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
