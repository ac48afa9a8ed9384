use crate::cnf::cnf::{Cnf, Lit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResult {
    Sat(Vec<bool>),
    Unsat,
    /// The decision budget ran out first.
    Unknown,
}

pub fn solve(cnf: &Cnf) -> SatResult {
    solve_with_budget(cnf, None).0
}

/// Runs the search with at most `budget` branching decisions. Also returns the
/// number of decisions spent.
pub fn solve_with_budget(cnf: &Cnf, budget: Option<u64>) -> (SatResult, u64) {
    let mut assignment = vec![None; cnf.num_vars as usize + 1];
    let mut search = Search {
        cnf,
        budget,
        decisions: 0,
    };
    let result = match search.run(&mut assignment) {
        Some(true) => {
            // fill free vars deterministically
            let model = assignment
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect::<Vec<_>>();
            SatResult::Sat(model)
        }
        Some(false) => SatResult::Unsat,
        None => SatResult::Unknown,
    };
    (result, search.decisions)
}

pub fn is_sat(cnf: &Cnf) -> bool {
    matches!(solve(cnf), SatResult::Sat(_))
}

struct Search<'a> {
    cnf: &'a Cnf,
    budget: Option<u64>,
    decisions: u64,
}

impl Search<'_> {
    /// `None` once the budget is spent.
    fn run(&mut self, assignment: &mut [Option<bool>]) -> Option<bool> {
        if !unit_propagate(self.cnf, assignment) {
            return Some(false);
        }
        match self.cnf.eval_formula_partial(assignment) {
            Some(true) => return Some(true),
            Some(false) => return Some(false),
            None => {}
        }

        let Some(var) = first_unassigned(assignment) else {
            return Some(false);
        };

        for value in [true, false] {
            if self.budget.is_some_and(|b| self.decisions >= b) {
                return None;
            }
            self.decisions += 1;
            let mut branch = assignment.to_vec();
            branch[var] = Some(value);
            if self.run(&mut branch)? {
                assignment.copy_from_slice(&branch);
                return Some(true);
            }
        }

        Some(false)
    }
}

fn unit_propagate(cnf: &Cnf, assignment: &mut [Option<bool>]) -> bool {
    loop {
        let mut changed = false;

        for clause in &cnf.clauses {
            let mut open_count = 0usize;
            let mut last_open = Lit::new(0, true);
            let mut has_true = false;

            for &lit in clause {
                match Cnf::eval_lit_partial(lit, assignment) {
                    Some(true) => {
                        has_true = true;
                        break;
                    }
                    Some(false) => {}
                    None => {
                        open_count += 1;
                        last_open = lit;
                    }
                }
            }

            if has_true {
                continue;
            }
            if open_count == 0 {
                return false;
            }
            if open_count == 1 {
                let var = last_open.var as usize;
                let need = last_open.sign;
                match assignment[var] {
                    Some(v) if v != need => return false,
                    Some(_) => {}
                    None => {
                        assignment[var] = Some(need);
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return true;
        }
    }
}

fn first_unassigned(assignment: &[Option<bool>]) -> Option<usize> {
    (1..assignment.len()).find(|&i| assignment[i].is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_gives_unknown_when_branching_is_needed() {
        let mut cnf = Cnf::new(2);
        cnf.add_clause(vec![Lit::pos(1), Lit::pos(2)]);
        let (res, spent) = solve_with_budget(&cnf, Some(0));
        assert_eq!(res, SatResult::Unknown);
        assert_eq!(spent, 0);
    }

    #[test]
    fn propagation_alone_needs_no_budget() {
        let mut cnf = Cnf::new(2);
        cnf.add_clause(vec![Lit::pos(1)]);
        cnf.add_clause(vec![Lit::new(1, false), Lit::pos(2)]);
        let (res, _) = solve_with_budget(&cnf, Some(0));
        assert_eq!(res, SatResult::Sat(vec![false, true, true]));
    }
}
