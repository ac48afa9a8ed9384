//! Core-guided MaxSAT search (MSU3).
//!
//! Every soft constraint starts out inactive: its assumption literal is passed
//! to the oracle so the clause must hold. An unsatisfiable answer yields a
//! core. The constraints in it become active, their relaxation literals join
//! the at-most-k constraint and the bound `k` grows by one. The first
//! satisfiable answer is optimal with cost `k`.

pub mod config;

use thiserror::Error;

use crate::card::totalizer::{CardError, Totalizer};
use crate::cnf::cnf::{Cnf, Lit};
use crate::maxsat::core::{Core, CoreExtractor};
use crate::maxsat::formula::MaxSatFormula;
use crate::solver::SolverStats;
use crate::solver::oracle::OracleOutcome;

use self::config::SearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The hard clauses alone are unsatisfiable.
    Unsatisfiable,
    Optimum,
    /// The oracle failed or the call limit was reached.
    Unknown,
    /// An internal invariant did not hold.
    Error,
}

impl Status {
    pub fn name(self) -> &'static str {
        match self {
            Status::Unsatisfiable => "unsatisfiable",
            Status::Optimum => "optimum",
            Status::Unknown => "unknown",
            Status::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("core names soft clause {index}, formula has {n_soft}")]
    UnknownSoft { index: usize, n_soft: usize },
    #[error(transparent)]
    Card(#[from] CardError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub status: Status,
    pub cost: Option<usize>,
    /// Largest bound proven infeasible plus one.
    pub lower_bound: usize,
    pub model: Option<Vec<bool>>,
    pub oracle_calls: usize,
    pub oracle_stats: SolverStats,
    /// Bound after each refinement, in order.
    pub bounds: Vec<usize>,
    /// Soft indices activated by each core, in discovery order.
    pub cores: Vec<Vec<usize>>,
    pub active_soft: usize,
    pub card_clauses: usize,
    pub card_vars: u32,
}

/// Progress callbacks. Every method defaults to doing nothing.
pub trait SearchObserver {
    fn on_bound_update(&mut self, _k: usize) {}
    fn on_core(&mut self, _core: &Core) {}
    fn on_optimum(&mut self, _cost: usize, _model: &[bool]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

pub struct Msu3 {
    formula: MaxSatFormula,
    config: SearchConfig,
    extractor: CoreExtractor,
    totalizer: Totalizer,
    aux: Cnf,
    card_assumptions: Vec<Lit>,
    bound: usize,
    bounds: Vec<usize>,
    cores: Vec<Vec<usize>>,
}

impl Msu3 {
    /// Relaxes the formula and sets up empty cardinality state at bound 0.
    pub fn new(mut formula: MaxSatFormula, config: SearchConfig) -> Self {
        let relaxed = formula.relax();
        log::debug!(
            "relaxed {} soft clauses, {} vars, {} hard clauses",
            relaxed,
            formula.n_vars(),
            formula.n_hard()
        );
        let extractor = CoreExtractor::new(&formula);
        let aux = Cnf::new(formula.n_vars());
        Self {
            formula,
            config,
            extractor,
            totalizer: Totalizer::new(),
            aux,
            card_assumptions: Vec::new(),
            bound: 0,
            bounds: Vec::new(),
            cores: Vec::new(),
        }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Folds the soft constraints named by earlier cores into the cardinality
    /// constraint before the first oracle call. The bound is left alone, so
    /// cores from a different run cannot make the result unsound. Returns how
    /// many constraints became active.
    pub fn seed_cores(&mut self, cores: &[Vec<usize>]) -> Result<usize, SearchError> {
        let n_soft = self.formula.n_soft();
        if let Some(&index) = cores.iter().flatten().find(|&&idx| idx >= n_soft) {
            return Err(SearchError::UnknownSoft { index, n_soft });
        }
        let delta = cores
            .iter()
            .flatten()
            .filter_map(|&idx| self.extractor.activate(idx))
            .collect::<Vec<_>>();
        self.fold(&delta)?;
        log::info!("seeded {} soft clauses from {} cores", delta.len(), cores.len());
        Ok(delta.len())
    }

    pub fn run(mut self, observer: &mut dyn SearchObserver) -> SearchReport {
        let mut oracle = self
            .config
            .policy
            .create(self.config.backend, self.config.decision_budget);
        let mut model = None;
        let mut cost = None;

        let status = loop {
            if let Some(limit) = self.config.max_oracle_calls {
                if oracle.calls() >= limit {
                    log::info!("oracle call limit {} reached at bound {}", limit, self.bound);
                    break Status::Unknown;
                }
            }

            let mut assumptions = self.extractor.inactive_assumptions();
            assumptions.extend_from_slice(&self.card_assumptions);
            log::debug!(
                "call {}: bound {}, {} assumptions, {} active",
                oracle.calls() + 1,
                self.bound,
                assumptions.len(),
                self.extractor.n_active()
            );

            let outcome = match oracle.solve(&self.formula, &self.aux, &assumptions) {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::warn!("oracle failed at bound {}: {}", self.bound, err);
                    break Status::Unknown;
                }
            };

            match outcome {
                OracleOutcome::Sat(found) => {
                    let realized = self.formula.cost_of(&found);
                    if realized != self.bound || !self.formula.hard_satisfied(&found) {
                        log::warn!(
                            "model cost {} does not match proven bound {}",
                            realized,
                            self.bound
                        );
                        break Status::Error;
                    }
                    log::info!("optimum {} after {} oracle calls", realized, oracle.calls());
                    observer.on_optimum(realized, &found);
                    cost = Some(realized);
                    model = Some(found);
                    break Status::Optimum;
                }
                OracleOutcome::Unsat(conflict) => {
                    let blames_bound = conflict
                        .iter()
                        .any(|lit| self.card_assumptions.contains(lit));
                    let core = self.extractor.extract(&conflict);
                    observer.on_core(&core);
                    if core.touched_soft() == 0 && !blames_bound {
                        log::info!("hard clauses are unsatisfiable");
                        break Status::Unsatisfiable;
                    }
                    log::debug!(
                        "core: {} new, {} already active, {} foreign",
                        core.activated.len(),
                        core.already_active,
                        core.foreign
                    );
                    if core.is_new() {
                        self.cores.push(core.activated.clone());
                    }

                    self.bound += 1;
                    if self.bound > self.formula.n_soft() {
                        log::info!("bound exceeds soft clause count, hard clauses unsatisfiable");
                        break Status::Unsatisfiable;
                    }
                    self.bounds.push(self.bound);
                    log::info!("lower bound {}", self.bound);
                    observer.on_bound_update(self.bound);

                    if let Err(err) = self.fold(&core.delta) {
                        log::warn!("cardinality update failed: {}", err);
                        break Status::Error;
                    }
                }
            }
        };

        SearchReport {
            status,
            cost,
            lower_bound: self.bound,
            model,
            oracle_calls: oracle.calls(),
            oracle_stats: oracle.stats(),
            bounds: self.bounds,
            cores: self.cores,
            active_soft: self.extractor.n_active(),
            card_clauses: self.totalizer.n_clauses(),
            card_vars: self.totalizer.n_vars(),
        }
    }

    /// Adds newly active relaxation literals to the cardinality constraint
    /// and refreshes the bound assumptions.
    fn fold(&mut self, delta: &[Lit]) -> Result<(), CardError> {
        if self.totalizer.has_encoding() {
            self.totalizer.join(&mut self.aux, delta, self.bound);
        } else {
            self.totalizer.build(&mut self.aux, delta, self.bound)?;
        }
        self.totalizer
            .tighten(&mut self.aux, self.bound, &mut self.card_assumptions);
        Ok(())
    }
}

/// Runs MSU3 on `formula` without progress callbacks.
pub fn solve(formula: MaxSatFormula, config: SearchConfig) -> SearchReport {
    Msu3::new(formula, config).run(&mut NoopObserver)
}
