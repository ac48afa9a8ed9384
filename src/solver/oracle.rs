//! Oracle adapter: turns the formula plus the encoder's auxiliary clauses into
//! solver instances and answers queries under assumptions.
//!
//! Two strategies share the [`Oracle`] trait. [`RebuildOracle`] builds a fresh
//! instance for every call and drops it once the answer is read.
//! [`IncrementalOracle`] keeps one instance and only feeds it what was added
//! since the previous call.

use crate::cnf::cnf::{Cnf, Lit};
use crate::maxsat::formula::MaxSatFormula;
use crate::solver::{Backend, IncrementalSolver, OracleError, SolveResult, SolverStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OraclePolicy {
    Rebuild,
    Incremental,
}

impl OraclePolicy {
    pub fn name(self) -> &'static str {
        match self {
            OraclePolicy::Rebuild => "rebuild",
            OraclePolicy::Incremental => "incremental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rebuild" => Some(OraclePolicy::Rebuild),
            "incremental" => Some(OraclePolicy::Incremental),
            _ => None,
        }
    }

    pub fn create(self, backend: Backend, decision_budget: Option<u64>) -> Box<dyn Oracle> {
        match self {
            OraclePolicy::Rebuild => Box::new(RebuildOracle::new(backend, decision_budget)),
            OraclePolicy::Incremental => {
                Box::new(IncrementalOracle::new(backend, decision_budget))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    /// Total model indexed by variable, entry 0 unused.
    Sat(Vec<bool>),
    /// Subset of the assumptions explaining the conflict.
    Unsat(Vec<Lit>),
}

pub trait Oracle {
    fn solve(
        &mut self,
        formula: &MaxSatFormula,
        aux: &Cnf,
        assumptions: &[Lit],
    ) -> Result<OracleOutcome, OracleError>;

    /// Number of `solve` calls so far.
    fn calls(&self) -> usize;

    /// Backend counters summed over every instance this oracle created.
    fn stats(&self) -> SolverStats;

    fn policy(&self) -> OraclePolicy;
}

/// Fresh instance holding every variable, hard clause, relaxed soft clause and
/// auxiliary clause.
pub fn build_instance(
    formula: &MaxSatFormula,
    aux: &Cnf,
    backend: Backend,
    decision_budget: Option<u64>,
) -> Box<dyn IncrementalSolver> {
    let mut solver = backend.instantiate(decision_budget);
    let num_vars = formula.n_vars().max(aux.num_vars);
    while solver.num_vars() < num_vars {
        solver.new_var();
    }
    for clause in formula.hard_clauses() {
        solver.add_clause(clause.clone());
    }
    for idx in 0..formula.n_soft() {
        solver.add_clause(formula.relaxed_clause(idx));
    }
    for clause in &aux.clauses {
        solver.add_clause(clause.clone());
    }
    solver
}

fn run(
    solver: &mut dyn IncrementalSolver,
    assumptions: &[Lit],
) -> Result<OracleOutcome, OracleError> {
    match solver.solve(assumptions)? {
        SolveResult::Sat => {
            let model = (0..=solver.num_vars())
                .map(|v| solver.model_value(v).unwrap_or(false))
                .collect();
            Ok(OracleOutcome::Sat(model))
        }
        SolveResult::Unsat => Ok(OracleOutcome::Unsat(solver.failed_assumptions())),
    }
}

#[derive(Debug, Clone)]
pub struct RebuildOracle {
    backend: Backend,
    decision_budget: Option<u64>,
    calls: usize,
    stats: SolverStats,
}

impl RebuildOracle {
    pub fn new(backend: Backend, decision_budget: Option<u64>) -> Self {
        Self {
            backend,
            decision_budget,
            calls: 0,
            stats: SolverStats::default(),
        }
    }
}

impl Oracle for RebuildOracle {
    fn solve(
        &mut self,
        formula: &MaxSatFormula,
        aux: &Cnf,
        assumptions: &[Lit],
    ) -> Result<OracleOutcome, OracleError> {
        self.calls += 1;
        let mut solver = build_instance(formula, aux, self.backend, self.decision_budget);
        log::debug!(
            "rebuild oracle: fresh {} instance, {} vars, {} aux clauses",
            solver.backend_name(),
            solver.num_vars(),
            aux.clauses.len()
        );
        let outcome = run(solver.as_mut(), assumptions);
        self.stats.absorb(solver.stats());
        outcome
    }

    fn calls(&self) -> usize {
        self.calls
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn policy(&self) -> OraclePolicy {
        OraclePolicy::Rebuild
    }
}

/// Keeps one instance alive. The formula must not change between calls and
/// `aux` may only grow.
pub struct IncrementalOracle {
    backend: Backend,
    decision_budget: Option<u64>,
    solver: Option<Box<dyn IncrementalSolver>>,
    synced_aux: usize,
    calls: usize,
}

impl IncrementalOracle {
    pub fn new(backend: Backend, decision_budget: Option<u64>) -> Self {
        Self {
            backend,
            decision_budget,
            solver: None,
            synced_aux: 0,
            calls: 0,
        }
    }

    fn sync(&mut self, formula: &MaxSatFormula, aux: &Cnf) -> &mut dyn IncrementalSolver {
        let solver = match self.solver.take() {
            None => {
                self.synced_aux = aux.clauses.len();
                build_instance(formula, aux, self.backend, self.decision_budget)
            }
            Some(mut solver) => {
                while solver.num_vars() < aux.num_vars {
                    solver.new_var();
                }
                for clause in &aux.clauses[self.synced_aux..] {
                    solver.add_clause(clause.clone());
                }
                log::debug!(
                    "incremental oracle: {} new aux clauses",
                    aux.clauses.len() - self.synced_aux
                );
                self.synced_aux = aux.clauses.len();
                solver
            }
        };
        self.solver.insert(solver).as_mut()
    }
}

impl Oracle for IncrementalOracle {
    fn solve(
        &mut self,
        formula: &MaxSatFormula,
        aux: &Cnf,
        assumptions: &[Lit],
    ) -> Result<OracleOutcome, OracleError> {
        self.calls += 1;
        let solver = self.sync(formula, aux);
        run(solver, assumptions)
    }

    fn calls(&self) -> usize {
        self.calls
    }

    fn stats(&self) -> SolverStats {
        self.solver
            .as_ref()
            .map_or_else(SolverStats::default, |s| s.stats())
    }

    fn policy(&self) -> OraclePolicy {
        OraclePolicy::Incremental
    }
}
