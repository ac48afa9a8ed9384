use coremax::card::totalizer::Totalizer;
use coremax::cnf::cnf::{Cnf, Lit};
use coremax::sat::dpll::is_sat;

fn inputs(range: std::ops::RangeInclusive<u32>) -> Vec<Lit> {
    range.map(Lit::pos).collect()
}

/// Checks that fixing inputs 1..=n is consistent with the encoding exactly
/// when at most `k` of them are true.
fn assert_at_most(aux: &Cnf, assumptions: &[Lit], n: u32, k: usize) {
    for bits in 0u32..(1 << n) {
        let mut cnf = aux.clone();
        for v in 1..=n {
            cnf.add_clause(vec![Lit::new(v, bits & (1 << (v - 1)) != 0)]);
        }
        for &a in assumptions {
            cnf.add_clause(vec![a]);
        }
        let ones = bits.count_ones() as usize;
        assert_eq!(is_sat(&cnf), ones <= k, "bits={:b} k={}", bits, k);
    }
}

#[test]
fn build_then_raise_bound() {
    let mut aux = Cnf::new(4);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &inputs(1..=4), 0).expect("build");
    tot.tighten(&mut aux, 0, &mut assumps);
    assert_at_most(&aux, &assumps, 4, 0);

    for k in 1..4 {
        tot.tighten(&mut aux, k, &mut assumps);
        assert_at_most(&aux, &assumps, 4, k);
    }
}

#[test]
fn join_counts_old_and_new_together() {
    let mut aux = Cnf::new(5);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &inputs(1..=3), 1).expect("build");
    tot.tighten(&mut aux, 1, &mut assumps);
    assert_at_most(&aux, &assumps, 3, 1);

    tot.join(&mut aux, &inputs(4..=5), 2);
    tot.tighten(&mut aux, 2, &mut assumps);
    assert_at_most(&aux, &assumps, 5, 2);

    tot.tighten(&mut aux, 3, &mut assumps);
    assert_at_most(&aux, &assumps, 5, 3);
}

#[test]
fn vacuous_build_is_picked_up_by_join() {
    let mut aux = Cnf::new(4);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &inputs(1..=2), 2).expect("build");
    tot.tighten(&mut aux, 2, &mut assumps);
    assert!(!tot.has_encoding());
    assert!(assumps.is_empty());

    tot.join(&mut aux, &inputs(3..=4), 2);
    tot.tighten(&mut aux, 2, &mut assumps);
    assert!(tot.has_encoding());
    assert_eq!(tot.n_lits(), 4);
    assert_at_most(&aux, &assumps, 4, 2);
}

#[test]
fn single_input_bound_zero_uses_the_input() {
    let mut aux = Cnf::new(1);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &[Lit::pos(1)], 0).expect("build");
    tot.tighten(&mut aux, 0, &mut assumps);
    assert!(aux.clauses.is_empty());
    assert_eq!(assumps, vec![Lit::new(1, false)]);
}

#[test]
fn empty_join_changes_nothing() {
    let mut aux = Cnf::new(5);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &inputs(1..=5), 2).expect("build");
    tot.tighten(&mut aux, 2, &mut assumps);
    let snapshot = aux.clone();
    let before = assumps.clone();

    tot.join(&mut aux, &[], 2);
    tot.tighten(&mut aux, 2, &mut assumps);
    assert_eq!(aux, snapshot);
    assert_eq!(assumps, before);
    assert_at_most(&aux, &assumps, 5, 2);
}

#[test]
fn bound_at_or_above_input_count_emits_nothing() {
    let mut aux = Cnf::new(3);
    let mut tot = Totalizer::new();
    let mut assumps = Vec::new();
    tot.build(&mut aux, &inputs(1..=3), 3).expect("build");
    tot.tighten(&mut aux, 3, &mut assumps);
    tot.tighten(&mut aux, 7, &mut assumps);
    assert!(aux.clauses.is_empty());
    assert_eq!(aux.num_vars, 3);
    assert!(assumps.is_empty());
    assert_eq!(tot.n_clauses(), 0);
}
