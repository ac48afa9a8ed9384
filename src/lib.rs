//! Core-guided MaxSAT (MSU3) over an incremental totalizer.

pub mod bench;
pub mod generate;
pub mod search;
pub mod solver;

pub mod card {
    pub mod totalizer;
}

pub mod cnf {
    #[allow(clippy::module_inception)]
    pub mod cnf;
    pub mod dimacs;
    pub mod wcnf;
}

pub mod maxsat {
    pub mod core;
    pub mod core_file;
    pub mod formula;
}

pub mod sat {
    pub mod dpll;
}
