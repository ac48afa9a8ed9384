use indexmap::IndexMap;

use crate::cnf::cnf::Lit;
use crate::maxsat::formula::MaxSatFormula;

/// The part of one unsatisfiable core that is new to the cardinality
/// constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Core {
    /// Relaxation literals of the constraints activated by this core, in
    /// conflict order.
    pub delta: Vec<Lit>,
    /// Soft indices matching `delta`.
    pub activated: Vec<usize>,
    /// Soft constraints in the conflict that were already active.
    pub already_active: usize,
    /// Conflict literals with no soft constraint behind them.
    pub foreign: usize,
}

impl Core {
    pub fn is_new(&self) -> bool {
        !self.delta.is_empty()
    }

    pub fn touched_soft(&self) -> usize {
        self.activated.len() + self.already_active
    }
}

/// Maps oracle conflicts back to soft constraint identities and tracks which
/// constraints are already folded into the cardinality constraint.
#[derive(Debug, Clone)]
pub struct CoreExtractor {
    by_assumption: IndexMap<Lit, usize>,
    relax: Vec<Option<Lit>>,
    active: Vec<bool>,
    n_active: usize,
}

impl CoreExtractor {
    /// Built once the formula is relaxed. Unrelaxed constraints have no
    /// assumption and are left out of the mapping.
    pub fn new(formula: &MaxSatFormula) -> Self {
        let mut by_assumption = IndexMap::with_capacity(formula.n_soft());
        let mut relax = Vec::with_capacity(formula.n_soft());
        for (idx, soft) in formula.soft_constraints().iter().enumerate() {
            if let Some(a) = soft.assumption {
                by_assumption.insert(a, idx);
            }
            relax.push(soft.relax.first().copied());
        }
        Self {
            by_assumption,
            relax,
            active: vec![false; formula.n_soft()],
            n_active: 0,
        }
    }

    pub fn soft_index(&self, assumption: Lit) -> Option<usize> {
        self.by_assumption.get(&assumption).copied()
    }

    pub fn is_active(&self, idx: usize) -> bool {
        self.active.get(idx).copied().unwrap_or(false)
    }

    pub fn n_active(&self) -> usize {
        self.n_active
    }

    /// Marks a relaxed constraint active. Returns its relaxation literal the
    /// first time only.
    pub fn activate(&mut self, idx: usize) -> Option<Lit> {
        let r = self.relax.get(idx).copied().flatten()?;
        if self.active[idx] {
            return None;
        }
        self.active[idx] = true;
        self.n_active += 1;
        Some(r)
    }

    pub fn extract(&mut self, conflict: &[Lit]) -> Core {
        let mut core = Core::default();
        for &lit in conflict {
            let Some(idx) = self.soft_index(lit) else {
                core.foreign += 1;
                continue;
            };
            match self.activate(idx) {
                Some(r) => {
                    core.delta.push(r);
                    core.activated.push(idx);
                }
                None => core.already_active += 1,
            }
        }
        core
    }

    /// Assumption literals of every constraint not yet folded, in soft order.
    pub fn inactive_assumptions(&self) -> Vec<Lit> {
        self.by_assumption
            .iter()
            .filter(|(_, idx)| !self.active[**idx])
            .map(|(lit, _)| *lit)
            .collect()
    }
}
