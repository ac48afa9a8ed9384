use std::io::BufRead;

use anyhow::{Context, Result, bail};

use super::cnf::Lit;
use super::dimacs::push_clause_line;
use crate::maxsat::formula::MaxSatFormula;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    /// `p wcnf <vars> <clauses> <top>`
    Weighted { top: u64 },
    /// `p cnf <vars> <clauses>`, every clause is soft
    Plain,
    /// no header, `h` marks hard clauses
    Modern,
}

pub fn parse_wcnf_str(s: &str) -> Result<MaxSatFormula> {
    parse_wcnf_reader(std::io::Cursor::new(s.as_bytes()))
}

/// Reads a unit-weight MaxSAT instance. Accepts the classic `p wcnf` format
/// (weight equal to top is hard), the header-less format with `h` for hard
/// clauses, and `p cnf` where every clause is soft. Weights other than 1 on
/// soft clauses are rejected.
pub fn parse_wcnf_reader<R: BufRead>(r: R) -> Result<MaxSatFormula> {
    let mut formula = MaxSatFormula::new();
    let mut header = None::<Header>;
    let mut declared_vars = 0u32;

    for (idx, line) in r.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_no))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('%') {
            continue;
        }

        if line.starts_with('p') {
            if header.is_some() {
                bail!("duplicate header on line {}", line_no);
            }
            let parts = line.split_whitespace().collect::<Vec<_>>();
            let (h, vars) = parse_header(&parts, line_no)?;
            header = Some(h);
            declared_vars = vars;
            continue;
        }

        let mode = *header.get_or_insert(Header::Modern);
        let mut tokens = line.split_whitespace();
        let hard = match mode {
            Header::Plain => false,
            Header::Modern => {
                let first = tokens
                    .next()
                    .with_context(|| format!("empty clause line {}", line_no))?;
                if first == "h" {
                    true
                } else {
                    check_unit_weight(parse_weight(first, line_no)?, line_no)?;
                    false
                }
            }
            Header::Weighted { top } => {
                let first = tokens
                    .next()
                    .with_context(|| format!("empty clause line {}", line_no))?;
                let w = parse_weight(first, line_no)?;
                if w >= top {
                    true
                } else {
                    check_unit_weight(w, line_no)?;
                    false
                }
            }
        };

        let clause = parse_clause(tokens, line_no)?;
        if hard {
            formula.add_hard(clause);
        } else {
            formula.add_soft(clause);
        }
    }

    // declared but unused variables still belong to the instance
    formula.reserve_vars(declared_vars);
    Ok(formula)
}

/// Writes the header-less format with `h` for hard clauses and weight 1 for
/// soft clauses. Relaxation literals are not written.
pub fn to_wcnf(formula: &MaxSatFormula) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "c vars={} hard={} soft={}\n",
        formula.n_vars(),
        formula.n_hard(),
        formula.n_soft()
    ));
    for clause in formula.hard_clauses() {
        out.push_str("h ");
        push_clause_line(&mut out, clause);
    }
    for soft in formula.soft_constraints() {
        out.push_str("1 ");
        push_clause_line(&mut out, &soft.clause);
    }
    out
}

fn parse_header(parts: &[&str], line_no: usize) -> Result<(Header, u32)> {
    match parts {
        ["p", "wcnf", vars, _clauses, top] => {
            let vars = parse_u32_token(vars, "vars", line_no)?;
            let top = parse_weight(top, line_no)?;
            Ok((Header::Weighted { top }, vars))
        }
        ["p", "wcnf", vars, _clauses] => {
            // no top given, every clause is soft
            let vars = parse_u32_token(vars, "vars", line_no)?;
            Ok((Header::Weighted { top: u64::MAX }, vars))
        }
        ["p", "cnf", vars, _clauses] => {
            let vars = parse_u32_token(vars, "vars", line_no)?;
            Ok((Header::Plain, vars))
        }
        _ => bail!(
            "invalid header on line {}, expected: p wcnf V C TOP or p cnf V C",
            line_no
        ),
    }
}

fn parse_clause<'a>(tokens: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vec<Lit>> {
    let mut clause = Vec::new();
    let mut terminated = false;
    for tok in tokens {
        if terminated {
            bail!("literal after terminating 0 on line {}", line_no);
        }
        let value = tok
            .parse::<i64>()
            .with_context(|| format!("invalid literal '{}' on line {}", tok, line_no))?;
        if value == 0 {
            terminated = true;
            continue;
        }
        let lit = Lit::from_dimacs(value)
            .with_context(|| format!("literal {} out of range on line {}", value, line_no))?;
        clause.push(lit);
    }
    if !terminated {
        bail!("clause on line {} is missing the terminating 0", line_no);
    }
    Ok(clause)
}

fn parse_weight(tok: &str, line_no: usize) -> Result<u64> {
    tok.parse::<u64>()
        .with_context(|| format!("invalid weight '{}' on line {}", tok, line_no))
}

fn check_unit_weight(w: u64, line_no: usize) -> Result<()> {
    if w != 1 {
        bail!(
            "soft clause on line {} has weight {}, only unit weights are supported",
            line_no,
            w
        );
    }
    Ok(())
}

fn parse_u32_token(tok: &str, name: &str, line_no: usize) -> Result<u32> {
    tok.parse::<u32>()
        .with_context(|| format!("invalid {} value '{}' on line {}", name, tok, line_no))
}
