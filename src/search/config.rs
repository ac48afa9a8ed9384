use crate::solver::Backend;
use crate::solver::oracle::OraclePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub policy: OraclePolicy,
    pub backend: Backend,
    /// Per-call decision limit handed to the DPLL backend.
    pub decision_budget: Option<u64>,
    /// The search gives up with `Unknown` after this many oracle calls.
    pub max_oracle_calls: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            policy: OraclePolicy::Incremental,
            backend: Backend::Varisat,
            decision_budget: None,
            max_oracle_calls: None,
        }
    }
}
