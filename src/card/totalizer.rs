//! Incremental totalizer for at-most-k constraints.
//!
//! The inputs sit at the leaves of a binary tree. Every internal node counts
//! the true inputs below it in unary: output `i` (0-based) is forced true once
//! at least `i + 1` inputs below the node are true. Nodes only encode the
//! outputs the current bound needs, so raising the bound or adding inputs
//! extends the existing clauses instead of rebuilding them.

use std::cmp;
use std::slice;

use thiserror::Error;

use crate::cnf::cnf::{Cnf, Lit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("cardinality network already built over {0} literals, use join")]
    AlreadyBuilt(usize),
}

#[derive(Debug, Clone, Default)]
pub struct Totalizer {
    in_lits: Vec<Lit>,
    /// Index of the first input not yet in the tree.
    not_enc_idx: usize,
    root: Option<Node>,
    n_vars: u32,
    n_clauses: usize,
}

impl Totalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_encoding(&self) -> bool {
        self.root.is_some()
    }

    pub fn n_lits(&self) -> usize {
        self.in_lits.len()
    }

    pub fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    pub fn n_vars(&self) -> u32 {
        self.n_vars
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    /// First construction over `lits` with bound `k`. Inputs passed to
    /// earlier vacuous calls are included. Nothing is emitted while `k` is at
    /// least the number of inputs.
    pub fn build(&mut self, aux: &mut Cnf, lits: &[Lit], k: usize) -> Result<(), CardError> {
        if self.has_encoding() {
            return Err(CardError::AlreadyBuilt(self.in_lits.len()));
        }
        self.in_lits.extend_from_slice(lits);
        self.encode(aux, k);
        Ok(())
    }

    /// Adds `new_lits` to the constraint. The new inputs form their own
    /// subtree under a new root, so only that subtree and the root get
    /// clauses.
    pub fn join(&mut self, aux: &mut Cnf, new_lits: &[Lit], k: usize) {
        self.in_lits.extend_from_slice(new_lits);
        self.encode(aux, k);
    }

    /// Makes sure the network can express bound `k` and writes the assumptions
    /// enforcing "at most `k` inputs true" into `out`. `out` stays empty when
    /// the bound is vacuous.
    pub fn tighten(&mut self, aux: &mut Cnf, k: usize, out: &mut Vec<Lit>) {
        out.clear();
        self.encode(aux, k);
        if k >= self.in_lits.len() {
            return;
        }
        if let Some(root) = &self.root {
            if let Some(&gt_k) = root.outputs().get(k) {
                out.push(gt_k.neg());
            }
        }
    }

    fn encode(&mut self, aux: &mut Cnf, k: usize) {
        if k >= self.in_lits.len() {
            return;
        }
        self.extend_tree();
        let vars_before = aux.num_vars;
        let clauses_before = aux.clauses.len();
        if let Some(root) = &mut self.root {
            root.encode_ub(k + 1, aux);
        }
        self.n_vars += aux.num_vars - vars_before;
        self.n_clauses += aux.clauses.len() - clauses_before;
        log::trace!(
            "totalizer: bound {} over {} inputs, {} clauses total",
            k,
            self.in_lits.len(),
            self.n_clauses
        );
    }

    fn extend_tree(&mut self) {
        if self.not_enc_idx == self.in_lits.len() {
            return;
        }
        let subtree = Node::build(&self.in_lits[self.not_enc_idx..]);
        self.root = Some(match self.root.take() {
            None => subtree,
            Some(old) => Node::internal(old, subtree),
        });
        self.not_enc_idx = self.in_lits.len();
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Lit),
    Internal {
        /// Unary outputs encoded so far, `out_lits.len()` is the encoded end.
        out_lits: Vec<Lit>,
        max_val: usize,
        depth: usize,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn build(lits: &[Lit]) -> Node {
        debug_assert!(!lits.is_empty());
        if lits.len() == 1 {
            return Node::Leaf(lits[0]);
        }
        let split = lits.len() / 2;
        Node::internal(Node::build(&lits[..split]), Node::build(&lits[split..]))
    }

    fn internal(left: Node, right: Node) -> Node {
        Node::Internal {
            out_lits: Vec::new(),
            max_val: left.max_val() + right.max_val(),
            depth: cmp::max(left.depth(), right.depth()) + 1,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn max_val(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { max_val, .. } => *max_val,
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { depth, .. } => *depth,
        }
    }

    fn outputs(&self) -> &[Lit] {
        match self {
            Node::Leaf(lit) => slice::from_ref(lit),
            Node::Internal { out_lits, .. } => out_lits,
        }
    }

    /// Extends the encoded outputs of this subtree up to value `end`.
    /// Children go first; this node only adds clauses for sums above what it
    /// had encoded already.
    fn encode_ub(&mut self, end: usize, aux: &mut Cnf) {
        let Node::Internal {
            out_lits,
            max_val,
            left,
            right,
            ..
        } = self
        else {
            return;
        };
        let end = end.min(*max_val);
        let old_end = out_lits.len();
        if end <= old_end {
            return;
        }
        left.encode_ub(end, aux);
        right.encode_ub(end, aux);

        for _ in old_end..end {
            out_lits.push(Lit::pos(aux.fresh_var()));
        }
        let l = left.outputs();
        let r = right.outputs();
        for a in 0..=l.len() {
            for b in 0..=r.len() {
                let sum = a + b;
                if sum <= old_end || sum > end {
                    continue;
                }
                // (left >= a) & (right >= b) -> (node >= a + b)
                let mut clause = Vec::with_capacity(3);
                if a > 0 {
                    clause.push(l[a - 1].neg());
                }
                if b > 0 {
                    clause.push(r[b - 1].neg());
                }
                clause.push(out_lits[sum - 1]);
                aux.add_clause(clause);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(n: u32) -> Vec<Lit> {
        (1..=n).map(Lit::pos).collect()
    }

    #[test]
    fn vacuous_bound_emits_nothing() {
        let mut aux = Cnf::new(4);
        let mut tot = Totalizer::new();
        tot.build(&mut aux, &inputs(4), 4).expect("build");
        let mut assumps = vec![Lit::pos(1)];
        tot.tighten(&mut aux, 4, &mut assumps);
        assert!(!tot.has_encoding());
        assert!(aux.clauses.is_empty());
        assert!(assumps.is_empty());
        assert_eq!(aux.num_vars, 4);
    }

    #[test]
    fn build_twice_is_rejected() {
        let mut aux = Cnf::new(3);
        let mut tot = Totalizer::new();
        tot.build(&mut aux, &inputs(3), 1).expect("build");
        assert_eq!(
            tot.build(&mut aux, &inputs(3), 1),
            Err(CardError::AlreadyBuilt(3))
        );
    }

    #[test]
    fn join_grows_depth_by_one() {
        let mut aux = Cnf::new(6);
        let mut tot = Totalizer::new();
        tot.build(&mut aux, &inputs(4), 1).expect("build");
        assert_eq!(tot.depth(), 3);
        tot.join(&mut aux, &[Lit::pos(5), Lit::pos(6)], 1);
        assert_eq!(tot.depth(), 4);
        assert_eq!(tot.n_lits(), 6);
        assert_eq!(tot.n_clauses(), aux.clauses.len());
    }

    #[test]
    fn tighten_reuses_encoded_outputs() {
        let mut aux = Cnf::new(4);
        let mut tot = Totalizer::new();
        let mut assumps = Vec::new();
        tot.build(&mut aux, &inputs(4), 2).expect("build");
        tot.tighten(&mut aux, 2, &mut assumps);
        let before = aux.clauses.len();
        tot.tighten(&mut aux, 2, &mut assumps);
        assert_eq!(aux.clauses.len(), before);
        assert_eq!(assumps.len(), 1);
        tot.tighten(&mut aux, 3, &mut assumps);
        assert!(aux.clauses.len() > before);
        assert_eq!(assumps.len(), 1);
    }
}
