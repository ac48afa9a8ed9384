use crate::cnf::cnf::{Cnf, Lit};

/// One unit-cost soft clause together with its relaxation bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftConstraint {
    pub clause: Vec<Lit>,
    /// Literals appended to the clause when it is relaxed. Asserting any of
    /// them satisfies the clause without satisfying its original literals.
    pub relax: Vec<Lit>,
    /// Asserted while the clause is required to hold; always `¬relax[0]`.
    pub assumption: Option<Lit>,
}

impl SoftConstraint {
    fn new(clause: Vec<Lit>) -> Self {
        Self {
            clause,
            relax: Vec::new(),
            assumption: None,
        }
    }

    pub fn is_relaxed(&self) -> bool {
        !self.relax.is_empty()
    }

    pub fn violated_by(&self, model: &[bool]) -> bool {
        !Cnf::clause_satisfied(&self.clause, model)
    }
}

/// Hard clauses, unit-weight soft clauses and the variable allocator.
///
/// Soft constraints are identified by their insertion index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxSatFormula {
    hard: Vec<Vec<Lit>>,
    soft: Vec<SoftConstraint>,
    num_vars: u32,
}

impl MaxSatFormula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(num_vars: u32) -> Self {
        Self {
            num_vars,
            ..Self::default()
        }
    }

    pub fn add_hard(&mut self, clause: Vec<Lit>) {
        self.cover_vars(&clause);
        self.hard.push(clause);
    }

    pub fn add_soft(&mut self, clause: Vec<Lit>) -> usize {
        self.cover_vars(&clause);
        self.soft.push(SoftConstraint::new(clause));
        self.soft.len() - 1
    }

    /// Raises the variable counter to at least `num_vars`.
    pub fn reserve_vars(&mut self, num_vars: u32) {
        self.num_vars = self.num_vars.max(num_vars);
    }

    pub fn new_literal(&mut self) -> Lit {
        self.num_vars = self.num_vars.saturating_add(1);
        Lit::pos(self.num_vars)
    }

    pub fn n_hard(&self) -> usize {
        self.hard.len()
    }

    pub fn n_soft(&self) -> usize {
        self.soft.len()
    }

    pub fn n_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn hard(&self, idx: usize) -> &[Lit] {
        &self.hard[idx]
    }

    pub fn hard_clauses(&self) -> &[Vec<Lit>] {
        &self.hard
    }

    pub fn soft(&self, idx: usize) -> &SoftConstraint {
        &self.soft[idx]
    }

    pub fn soft_constraints(&self) -> &[SoftConstraint] {
        &self.soft
    }

    /// Gives every soft constraint without one a fresh relaxation literal `r`
    /// and the assumption `¬r`. Returns how many constraints were relaxed.
    pub fn relax(&mut self) -> usize {
        let mut relaxed = 0usize;
        for idx in 0..self.soft.len() {
            if self.soft[idx].is_relaxed() {
                continue;
            }
            let r = self.new_literal();
            let soft = &mut self.soft[idx];
            soft.relax.push(r);
            soft.assumption = Some(r.neg());
            relaxed += 1;
        }
        relaxed
    }

    pub fn is_relaxed(&self) -> bool {
        self.soft.iter().all(SoftConstraint::is_relaxed)
    }

    /// The soft clause as handed to the oracle: original literals followed by
    /// the relaxation literals.
    pub fn relaxed_clause(&self, idx: usize) -> Vec<Lit> {
        let soft = &self.soft[idx];
        let mut clause = Vec::with_capacity(soft.clause.len() + soft.relax.len());
        clause.extend_from_slice(&soft.clause);
        clause.extend_from_slice(&soft.relax);
        clause
    }

    /// Number of soft clauses whose original literals are all false.
    pub fn cost_of(&self, model: &[bool]) -> usize {
        self.soft.iter().filter(|s| s.violated_by(model)).count()
    }

    pub fn hard_satisfied(&self, model: &[bool]) -> bool {
        self.hard
            .iter()
            .all(|clause| Cnf::clause_satisfied(clause, model))
    }

    /// Hard clauses plus relaxed soft clauses as one plain CNF.
    pub fn to_cnf(&self) -> Cnf {
        let mut cnf = Cnf::new(self.num_vars);
        for clause in &self.hard {
            cnf.add_clause(clause.clone());
        }
        for idx in 0..self.soft.len() {
            cnf.add_clause(self.relaxed_clause(idx));
        }
        cnf
    }

    fn cover_vars(&mut self, clause: &[Lit]) {
        debug_assert!(
            clause.iter().all(|l| l.var != 0),
            "variable 0 in clause {:?}",
            clause
        );
        if let Some(max) = clause.iter().map(|l| l.var).max() {
            self.num_vars = self.num_vars.max(max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "variable 0")]
    fn variable_zero_is_rejected() {
        let mut f = MaxSatFormula::new();
        f.add_hard(vec![Lit::new(0, true)]);
    }

    #[test]
    fn adding_clauses_covers_their_vars() {
        let mut f = MaxSatFormula::new();
        f.add_hard(vec![Lit::pos(3), Lit::new(1, false)]);
        assert_eq!(f.n_vars(), 3);
        f.add_soft(vec![Lit::pos(2)]);
        assert_eq!(f.n_vars(), 3);
        assert_eq!(f.new_literal(), Lit::pos(4));
        assert_eq!(f.n_vars(), 4);
    }

    #[test]
    fn relax_runs_once_per_soft() {
        let mut f = MaxSatFormula::new();
        f.add_soft(vec![Lit::pos(1)]);
        f.add_soft(vec![Lit::new(1, false)]);
        assert_eq!(f.relax(), 2);
        assert_eq!(f.relax(), 0);
        assert_eq!(f.n_vars(), 3);
        let s = f.soft(1);
        assert_eq!(s.relax, vec![Lit::pos(3)]);
        assert_eq!(s.assumption, Some(Lit::new(3, false)));
        assert_eq!(f.relaxed_clause(1), vec![Lit::new(1, false), Lit::pos(3)]);
    }

    #[test]
    fn cost_ignores_relaxation_literals() {
        let mut f = MaxSatFormula::new();
        f.add_soft(vec![Lit::pos(1)]);
        f.add_soft(vec![Lit::new(1, false)]);
        f.relax();
        // x1 = true, both relaxation vars true
        let model = vec![false, true, true, true];
        assert_eq!(f.cost_of(&model), 1);
    }
}
