pub mod dpll_backend;
pub mod oracle;
pub mod varisat;

use thiserror::Error;

use crate::cnf::cnf::Lit;

use self::dpll_backend::DpllSolverBackend;
use self::varisat::VarisatSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    Sat,
    Unsat,
}

/// The oracle could not decide the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle aborted: {0}")]
    Aborted(String),
    #[error("oracle exhausted its budget of {0} decisions")]
    BudgetExhausted(u64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solve_calls: usize,
    /// Branching decisions. Only the DPLL backend counts them.
    pub decisions: usize,
    /// Calls answered unsatisfiable.
    pub conflicts: usize,
}

impl SolverStats {
    pub fn absorb(&mut self, other: SolverStats) {
        self.solve_calls += other.solve_calls;
        self.decisions += other.decisions;
        self.conflicts += other.conflicts;
    }
}

pub trait IncrementalSolver {
    fn new_var(&mut self) -> u32;
    fn add_clause(&mut self, clause: Vec<Lit>);
    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResult, OracleError>;
    fn model_value(&self, var: u32) -> Option<bool>;
    /// Assumptions sufficient for the last `Unsat` answer. Not necessarily
    /// minimal.
    fn failed_assumptions(&self) -> Vec<Lit>;
    fn num_vars(&self) -> u32;
    fn stats(&self) -> SolverStats;
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Dpll,
    Varisat,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Dpll => "dpll",
            Backend::Varisat => "varisat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dpll" => Some(Backend::Dpll),
            "varisat" => Some(Backend::Varisat),
            _ => None,
        }
    }

    /// Empty solver. The decision budget only applies to the DPLL backend.
    pub fn instantiate(self, decision_budget: Option<u64>) -> Box<dyn IncrementalSolver> {
        match self {
            Backend::Dpll => Box::new(DpllSolverBackend::with_budget(decision_budget)),
            Backend::Varisat => Box::new(VarisatSolver::new()),
        }
    }
}
