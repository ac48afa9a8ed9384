use coremax::cnf::cnf::Lit;
use coremax::maxsat::core::Core;
use coremax::maxsat::formula::MaxSatFormula;
use coremax::search::config::SearchConfig;
use coremax::search::{Msu3, SearchObserver, Status, solve};
use coremax::solver::Backend;
use coremax::solver::oracle::OraclePolicy;

fn all_configs() -> Vec<SearchConfig> {
    let mut out = Vec::new();
    for backend in [Backend::Varisat, Backend::Dpll] {
        for policy in [OraclePolicy::Incremental, OraclePolicy::Rebuild] {
            out.push(SearchConfig {
                policy,
                backend,
                ..SearchConfig::default()
            });
        }
    }
    out
}

fn x(v: u32) -> Lit {
    Lit::pos(v)
}

fn nx(v: u32) -> Lit {
    Lit::new(v, false)
}

fn two_contradictory_pairs() -> MaxSatFormula {
    let mut f = MaxSatFormula::new();
    f.add_soft(vec![x(1)]);
    f.add_soft(vec![nx(1)]);
    f.add_soft(vec![x(2)]);
    f.add_soft(vec![nx(2)]);
    f
}

#[test]
fn contradictory_pairs_cost_two() {
    for cfg in all_configs() {
        let report = solve(two_contradictory_pairs(), cfg);
        assert_eq!(report.status, Status::Optimum, "{:?}", cfg);
        assert_eq!(report.cost, Some(2));
        assert_eq!(report.lower_bound, 2);
        assert!(report.oracle_calls <= 3, "{:?}: {}", cfg, report.oracle_calls);
        assert_eq!(report.bounds, vec![1, 2]);
        assert_eq!(report.oracle_stats.solve_calls, report.oracle_calls);
        assert_eq!(report.oracle_stats.conflicts, report.oracle_calls - 1);
        let model = report.model.expect("model");
        assert_eq!(two_contradictory_pairs().cost_of(&model), 2);
    }
}

#[test]
fn satisfiable_softs_cost_zero_on_first_call() {
    for cfg in all_configs() {
        let mut f = MaxSatFormula::new();
        f.add_hard(vec![x(1), x(2)]);
        f.add_soft(vec![x(1)]);
        f.add_soft(vec![x(2)]);
        let report = solve(f, cfg);
        assert_eq!(report.status, Status::Optimum);
        assert_eq!(report.cost, Some(0));
        assert_eq!(report.oracle_calls, 1);
        assert!(report.cores.is_empty());
        assert_eq!(report.card_clauses, 0);
        let model = report.model.expect("model");
        assert!(x(1).eval(&model) && x(2).eval(&model));
    }
}

#[test]
fn duplicated_units_cost_two() {
    for cfg in all_configs() {
        let mut f = MaxSatFormula::new();
        f.add_soft(vec![x(1)]);
        f.add_soft(vec![nx(1)]);
        f.add_soft(vec![x(1)]);
        f.add_soft(vec![nx(1)]);
        let report = solve(f, cfg);
        assert_eq!(report.status, Status::Optimum, "{:?}", cfg);
        assert_eq!(report.cost, Some(2));
        let mut seen = report.cores.concat();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), report.active_soft);
    }
}

#[test]
fn hard_conflict_is_unsatisfiable() {
    for cfg in all_configs() {
        let mut f = MaxSatFormula::new();
        f.add_hard(vec![x(1)]);
        f.add_hard(vec![nx(1)]);
        f.add_soft(vec![x(2)]);
        f.add_soft(vec![nx(2)]);
        let report = solve(f, cfg);
        assert_eq!(report.status, Status::Unsatisfiable, "{:?}", cfg);
        assert_eq!(report.cost, None);
        assert!(report.model.is_none());
    }
}

#[test]
fn soft_forced_false_by_hard_clauses() {
    for cfg in all_configs() {
        let mut f = MaxSatFormula::new();
        f.add_hard(vec![nx(1), nx(2)]);
        f.add_hard(vec![nx(2), nx(3)]);
        f.add_hard(vec![nx(1), nx(3)]);
        f.add_soft(vec![x(1)]);
        f.add_soft(vec![x(2)]);
        f.add_soft(vec![x(3)]);
        let report = solve(f, cfg);
        assert_eq!(report.status, Status::Optimum, "{:?}", cfg);
        assert_eq!(report.cost, Some(2));
    }
}

#[test]
fn exhausted_budget_is_unknown() {
    let mut f = MaxSatFormula::new();
    f.add_hard(vec![x(1), x(2)]);
    f.add_soft(vec![x(3), x(4)]);
    let cfg = SearchConfig {
        backend: Backend::Dpll,
        decision_budget: Some(0),
        ..SearchConfig::default()
    };
    let report = solve(f, cfg);
    assert_eq!(report.status, Status::Unknown);
    assert_eq!(report.oracle_calls, 1);
    assert_eq!(report.cost, None);
}

#[test]
fn call_limit_is_unknown() {
    let cfg = SearchConfig {
        max_oracle_calls: Some(1),
        ..SearchConfig::default()
    };
    let report = solve(two_contradictory_pairs(), cfg);
    assert_eq!(report.status, Status::Unknown);
    assert_eq!(report.oracle_calls, 1);
    assert_eq!(report.lower_bound, 1);
}

#[derive(Default)]
struct Recorder {
    bounds: Vec<usize>,
    cores: usize,
    optimum: Option<usize>,
}

impl SearchObserver for Recorder {
    fn on_bound_update(&mut self, k: usize) {
        self.bounds.push(k);
    }

    fn on_core(&mut self, _core: &Core) {
        self.cores += 1;
    }

    fn on_optimum(&mut self, cost: usize, _model: &[bool]) {
        self.optimum = Some(cost);
    }
}

#[test]
fn observer_sees_monotone_bounds() {
    let mut f = two_contradictory_pairs();
    f.add_soft(vec![x(3)]);
    f.add_soft(vec![nx(3)]);
    let mut rec = Recorder::default();
    let report = Msu3::new(f, SearchConfig::default()).run(&mut rec);
    assert_eq!(report.status, Status::Optimum);
    assert_eq!(rec.optimum, Some(3));
    assert_eq!(rec.bounds, vec![1, 2, 3]);
    assert_eq!(rec.cores, 3);
    assert!(rec.bounds.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn seeded_cores_keep_the_optimum() {
    for cfg in all_configs() {
        let mut search = Msu3::new(two_contradictory_pairs(), cfg);
        let seeded = search.seed_cores(&[vec![0, 1], vec![2, 3]]).expect("seed");
        assert_eq!(seeded, 4);
        assert_eq!(search.bound(), 0);
        let mut rec = Recorder::default();
        let report = search.run(&mut rec);
        assert_eq!(report.status, Status::Optimum);
        assert_eq!(report.cost, Some(2));
        assert_eq!(report.oracle_calls, 3);
        assert!(report.cores.is_empty());
        assert_eq!(rec.bounds, vec![1, 2]);
    }
}
