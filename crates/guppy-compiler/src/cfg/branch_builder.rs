//! Branch construction: turns a boolean
//! expression used in test position into a pair of successor blocks
//! instead of a single materialized `bool` value, so `and`/`or` short
//! circuit at the CFG level.
//!
//! Grounded on `examples/original_source/guppy/cfg.py`'s `BranchBuilder`.

use super::builder::Builder;
use super::BbId;
use guppy_core::ast::{BoolOpKind, Expr};

/// True for expression kinds `BranchBuilder` handles specially rather than
/// materializing into a plain boolean value first.
pub fn is_short_circuit_expr(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BoolOp { .. }
            | Expr::UnaryOp {
                op: guppy_core::ast::UnaryOpKind::Not,
                ..
            }
            | Expr::IfExp { .. }
    ) || matches!(expr, Expr::Compare { ops, .. } if ops.len() > 1)
}

impl Builder {
    /// Compiles `expr` as a branch condition from `bb`, returning
    /// `(true_successor, false_successor)`. Short-circuiting operators
    /// produce extra basic blocks rather than a single boolean temporary.
    pub(crate) fn build_branch(&mut self, bb: BbId, expr: Expr) -> (BbId, BbId) {
        match expr {
            Expr::UnaryOp {
                op: guppy_core::ast::UnaryOpKind::Not,
                operand,
                ..
            } => {
                let (t, f) = self.build_branch(bb, *operand);
                (f, t)
            }

            Expr::BoolOp {
                op: BoolOpKind::And,
                node,
                values,
            } => {
                let (first, rest) = split_first(values);
                let (t1, f1) = self.build_branch(bb, first);
                match rest {
                    None => (t1, f1),
                    Some(rest_expr) => {
                        let rest_expr = rebuild_boolop(node, BoolOpKind::And, rest_expr);
                        let (t2, f2) = self.build_branch(t1, rest_expr);
                        let false_merge = self.cfg.new_bb();
                        self.cfg.link(f1, false_merge);
                        self.cfg.link(f2, false_merge);
                        (t2, false_merge)
                    }
                }
            }

            Expr::BoolOp {
                op: BoolOpKind::Or,
                node,
                values,
            } => {
                let (first, rest) = split_first(values);
                let (t1, f1) = self.build_branch(bb, first);
                match rest {
                    None => (t1, f1),
                    Some(rest_expr) => {
                        let rest_expr = rebuild_boolop(node, BoolOpKind::Or, rest_expr);
                        let (t2, f2) = self.build_branch(f1, rest_expr);
                        let true_merge = self.cfg.new_bb();
                        self.cfg.link(t1, true_merge);
                        self.cfg.link(t2, true_merge);
                        (true_merge, f2)
                    }
                }
            }

            Expr::IfExp { test, body, orelse, .. } => {
                let (tt, tf) = self.build_branch(bb, *test);
                let (bt, bf) = self.build_branch(tt, *body);
                let (ot, of) = self.build_branch(tf, *orelse);
                let true_merge = self.cfg.new_bb();
                self.cfg.link(bt, true_merge);
                self.cfg.link(ot, true_merge);
                let false_merge = self.cfg.new_bb();
                self.cfg.link(bf, false_merge);
                self.cfg.link(of, false_merge);
                (true_merge, false_merge)
            }

            Expr::Compare { ref ops, .. } if ops.len() > 1 => {
                let (bb, rewritten) = self.rewrite_chained_compare(bb, expr);
                self.build_branch(bb, rewritten)
            }

            other => {
                let (bb, simple) = self.build_expr(bb, other);
                self.cfg.bb_mut(bb).branch_pred = Some(simple);
                let true_bb = self.cfg.new_bb();
                let false_bb = self.cfg.new_bb();
                self.cfg.link(bb, true_bb);
                self.cfg.link(bb, false_bb);
                (true_bb, false_bb)
            }
        }
    }

    /// Rewrites a chained comparison (`a < b < c`) into
    /// `BoolOp(And, [a < b, b < c])`, materializing shared middle operands
    /// into temporaries first so they are evaluated exactly once.
    pub(crate) fn rewrite_chained_compare(&mut self, bb: BbId, expr: Expr) -> (BbId, Expr) {
        let Expr::Compare { node, left, ops, comparators } = expr else {
            return (bb, expr);
        };
        let mut operands = Vec::with_capacity(comparators.len() + 1);
        operands.push(*left);
        operands.extend(comparators);
        let n = operands.len();

        let mut bb = bb;
        let mut materialized = Vec::with_capacity(n);
        for (i, operand) in operands.into_iter().enumerate() {
            let (next_bb, value) = if i == 0 || i == n - 1 {
                self.build_expr(bb, operand)
            } else {
                self.materialize(bb, operand)
            };
            bb = next_bb;
            materialized.push(value);
        }

        let comparisons = ops
            .into_iter()
            .enumerate()
            .map(|(i, op)| Expr::Compare {
                node: node.clone(),
                left: Box::new(materialized[i].clone()),
                ops: vec![op],
                comparators: vec![materialized[i + 1].clone()],
            })
            .collect();

        (
            bb,
            Expr::BoolOp {
                node,
                op: BoolOpKind::And,
                values: comparisons,
            },
        )
    }
}

fn split_first(mut values: Vec<Expr>) -> (Expr, Option<Vec<Expr>>) {
    let first = values.remove(0);
    if values.is_empty() {
        (first, None)
    } else {
        (first, Some(values))
    }
}

fn rebuild_boolop(node: guppy_core::ast::AstNode, op: BoolOpKind, mut values: Vec<Expr>) -> Expr {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Expr::BoolOp { node, op, values }
    }
}
