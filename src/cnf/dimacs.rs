use super::cnf::{Cnf, Lit};

pub fn to_dimacs(cnf: &Cnf) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", cnf.num_vars, cnf.clauses.len()));
    for clause in &cnf.clauses {
        push_clause_line(&mut out, clause);
    }
    out
}

pub(crate) fn push_clause_line(out: &mut String, clause: &[Lit]) {
    for &lit in clause {
        out.push_str(&format!("{} ", lit.to_dimacs()));
    }
    out.push_str("0\n");
}

/// Model line in the `v` format of the MaxSAT evaluations.
pub fn model_line(model: &[bool], num_vars: u32) -> String {
    let mut out = String::from("v");
    for var in 1..=num_vars {
        let lit = Lit::new(var, Lit::pos(var).eval(model));
        out.push_str(&format!(" {}", lit.to_dimacs()));
    }
    out
}
