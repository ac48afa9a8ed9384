use crate::cnf::cnf::{Cnf, Lit};
use crate::sat::dpll::{SatResult, solve_with_budget};
use crate::solver::{IncrementalSolver, OracleError, SolveResult, SolverStats};

/// Reference backend on top of the recursive DPLL search. It has no
/// assumption reasoning, so a failed call blames every assumption.
#[derive(Debug, Clone)]
pub struct DpllSolverBackend {
    cnf: Cnf,
    budget: Option<u64>,
    last_model: Option<Vec<bool>>,
    last_assumptions: Vec<Lit>,
    stats: SolverStats,
}

impl DpllSolverBackend {
    pub fn new() -> Self {
        Self::with_budget(None)
    }

    /// Each `solve` call may spend at most `budget` decisions.
    pub fn with_budget(budget: Option<u64>) -> Self {
        Self {
            cnf: Cnf::new(0),
            budget,
            last_model: None,
            last_assumptions: Vec::new(),
            stats: SolverStats::default(),
        }
    }

    /// Grows the variable range to the largest variable in `lits`, matching
    /// the varisat backend.
    fn cover(&mut self, lits: &[Lit]) {
        debug_assert!(lits.iter().all(|l| l.var != 0), "variable 0 in {:?}", lits);
        if let Some(max) = lits.iter().map(|l| l.var).max() {
            self.cnf.num_vars = self.cnf.num_vars.max(max);
        }
    }
}

impl Default for DpllSolverBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalSolver for DpllSolverBackend {
    fn new_var(&mut self) -> u32 {
        self.cnf.fresh_var()
    }

    fn add_clause(&mut self, clause: Vec<Lit>) {
        self.cover(&clause);
        self.cnf.add_clause(clause);
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResult, OracleError> {
        self.stats.solve_calls += 1;
        self.last_model = None;
        self.last_assumptions.clear();
        self.cover(assumptions);
        let mut work = self.cnf.clone();
        for &a in assumptions {
            work.add_clause(vec![a]);
        }
        let (result, decisions) = solve_with_budget(&work, self.budget);
        self.stats.decisions += decisions as usize;
        match result {
            SatResult::Sat(model) => {
                self.last_model = Some(model);
                Ok(SolveResult::Sat)
            }
            SatResult::Unsat => {
                self.stats.conflicts += 1;
                self.last_assumptions = assumptions.to_vec();
                Ok(SolveResult::Unsat)
            }
            SatResult::Unknown => Err(OracleError::BudgetExhausted(self.budget.unwrap_or_default())),
        }
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        let idx = var as usize;
        self.last_model
            .as_ref()
            .and_then(|m| if idx < m.len() { Some(m[idx]) } else { None })
    }

    fn failed_assumptions(&self) -> Vec<Lit> {
        self.last_assumptions.clone()
    }

    fn num_vars(&self) -> u32 {
        self.cnf.num_vars
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        "dpll"
    }
}
