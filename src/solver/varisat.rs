use crate::cnf::cnf::Lit;
use crate::solver::{IncrementalSolver, OracleError, SolveResult, SolverStats};
use varisat::ExtendFormula;

pub struct VarisatSolver {
    inner: varisat::Solver<'static>,
    vars: Vec<varisat::Var>,
    last_model: Option<Vec<Option<bool>>>,
    last_core: Vec<Lit>,
    stats: SolverStats,
}

impl VarisatSolver {
    pub fn new() -> Self {
        Self {
            inner: varisat::Solver::new(),
            vars: Vec::new(),
            last_model: None,
            last_core: Vec::new(),
            stats: SolverStats::default(),
        }
    }

    fn to_var(&self, v: u32) -> Option<varisat::Var> {
        if v == 0 {
            return None;
        }
        self.vars.get(v as usize - 1).copied()
    }

    fn to_lit(&self, lit: Lit) -> Option<varisat::Lit> {
        let var = self.to_var(lit.var)?;
        Some(varisat::Lit::from_var(var, lit.sign))
    }

    /// Allocates every variable up to the largest one in `lits`. Variable 0
    /// is not a variable and stays unmapped.
    fn cover(&mut self, lits: &[Lit]) {
        debug_assert!(lits.iter().all(|l| l.var != 0), "variable 0 in {:?}", lits);
        let max = lits.iter().map(|l| l.var).max().unwrap_or(0);
        while (self.vars.len() as u32) < max {
            self.new_var();
        }
    }

    fn from_lit(&self, lit: varisat::Lit) -> Option<Lit> {
        let idx = lit.var().index();
        if self.vars.get(idx) != Some(&lit.var()) {
            return None;
        }
        Some(Lit::new(idx as u32 + 1, lit.is_positive()))
    }

    fn store_model(&mut self) {
        let mut values = vec![None; self.vars.len() + 1];
        if let Some(model) = self.inner.model() {
            for lit in model {
                if let Some(ours) = self.from_lit(lit) {
                    values[ours.var as usize] = Some(ours.sign);
                }
            }
        }
        self.last_model = Some(values);
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalSolver for VarisatSolver {
    fn new_var(&mut self) -> u32 {
        let v = self.inner.new_var();
        self.vars.push(v);
        self.vars.len() as u32
    }

    fn add_clause(&mut self, clause: Vec<Lit>) {
        self.cover(&clause);
        let lits = clause
            .into_iter()
            .filter_map(|x| self.to_lit(x))
            .collect::<Vec<_>>();
        self.inner.add_clause(&lits);
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResult, OracleError> {
        self.stats.solve_calls += 1;
        self.last_model = None;
        self.last_core.clear();
        self.cover(assumptions);
        let assumps = assumptions
            .iter()
            .copied()
            .filter_map(|x| self.to_lit(x))
            .collect::<Vec<_>>();
        self.inner.assume(&assumps);
        match self.inner.solve() {
            Ok(true) => {
                self.store_model();
                Ok(SolveResult::Sat)
            }
            Ok(false) => {
                self.stats.conflicts += 1;
                let core = self.inner.failed_core().map(<[_]>::to_vec);
                self.last_core = core
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|x| self.from_lit(x))
                    .collect();
                Ok(SolveResult::Unsat)
            }
            Err(err) => Err(OracleError::Aborted(err.to_string())),
        }
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        let model = self.last_model.as_ref()?;
        model.get(var as usize).copied().flatten()
    }

    fn failed_assumptions(&self) -> Vec<Lit> {
        self.last_core.clone()
    }

    fn num_vars(&self) -> u32 {
        self.vars.len() as u32
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        "varisat"
    }
}
