use anyhow::{Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cnf::cnf::Lit;
use crate::maxsat::formula::MaxSatFormula;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenOptions {
    pub vars: u32,
    pub hard: usize,
    pub soft: usize,
    /// Literals per hard clause. Soft clauses get between one and this many.
    pub width: usize,
    pub seed: u64,
}

/// Random unit-weight instance. Hard clauses are planted: they are all
/// satisfied by one hidden assignment, so the instance always has a finite
/// optimum.
pub fn random_instance(opts: GenOptions) -> Result<MaxSatFormula> {
    if opts.vars == 0 {
        bail!("vars must be >= 1");
    }
    if opts.width == 0 {
        bail!("width must be >= 1");
    }
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let planted = (0..=opts.vars)
        .map(|_| rng.random::<bool>())
        .collect::<Vec<_>>();

    let mut formula = MaxSatFormula::with_vars(opts.vars);
    for _ in 0..opts.hard {
        let mut clause = random_clause(&mut rng, opts.vars, opts.width);
        if !clause.iter().any(|l| l.eval(&planted)) {
            // flip one literal so the planted assignment survives
            let pick = rng.random_range(0..clause.len());
            clause[pick] = clause[pick].neg();
        }
        formula.add_hard(clause);
    }
    for _ in 0..opts.soft {
        let width = rng.random_range(1..=opts.width);
        formula.add_soft(random_clause(&mut rng, opts.vars, width));
    }
    Ok(formula)
}

fn random_clause(rng: &mut ChaCha8Rng, vars: u32, width: usize) -> Vec<Lit> {
    let mut clause = Vec::with_capacity(width);
    for _ in 0..width {
        let var = rng.random_range(1..=vars);
        clause.push(Lit::new(var, rng.random::<bool>()));
    }
    clause.sort_unstable();
    clause.dedup();
    clause
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_instance() {
        let opts = GenOptions {
            vars: 6,
            hard: 5,
            soft: 8,
            width: 3,
            seed: 11,
        };
        let a = random_instance(opts).expect("gen");
        let b = random_instance(opts).expect("gen");
        assert_eq!(a, b);
        assert_eq!(a.n_hard(), 5);
        assert_eq!(a.n_soft(), 8);
        assert_eq!(a.n_vars(), 6);
    }
}
