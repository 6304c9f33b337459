//! Expression flattening: reduces an
//! arbitrary expression to one with no control-flow-bearing subexpression,
//! introducing `%tmp` temporaries and new basic blocks for walrus
//! assignments, ternaries, and short-circuit boolean operators.
//!
//! Grounded on `examples/original_source/guppy/cfg.py`'s `ExprBuilder`.

use super::builder::Builder;
use super::BbId;
use guppy_core::ast::{Expr, Target};

impl Builder {
    /// Rewrites `expr`, threading `bb` forward through any new blocks the
    /// rewrite introduces. The returned expression contains no
    /// `NamedExpr`/`IfExp`/`BoolOp` node and no multi-comparator `Compare`
    /// node; those are replaced by a `Name` referencing a temporary whose
    /// value was computed across the now-branching control flow.
    pub(crate) fn build_expr(&mut self, bb: BbId, expr: Expr) -> (BbId, Expr) {
        match expr {
            Expr::Name { .. } | Expr::Constant { .. } => (bb, expr),

            Expr::NamedExpr {
                node,
                target,
                target_node,
                value,
            } => {
                let (bb, value) = self.build_expr(bb, *value);
                self.emit_assign(
                    bb,
                    Target::Name {
                        node: target_node.clone(),
                        id: target.clone(),
                    },
                    value,
                    node,
                );
                (
                    bb,
                    Expr::Name {
                        node: target_node,
                        id: target,
                    },
                )
            }

            Expr::IfExp { node, test, body, orelse } => {
                let tmp = self.fresh_tmp();
                let (true_bb, false_bb) = self.build_branch(bb, *test);

                let (true_bb, body_v) = self.build_expr(true_bb, *body);
                self.emit_assign(
                    true_bb,
                    Target::Name {
                        node: node.clone(),
                        id: tmp.clone(),
                    },
                    body_v,
                    node.clone(),
                );

                let (false_bb, orelse_v) = self.build_expr(false_bb, *orelse);
                self.emit_assign(
                    false_bb,
                    Target::Name {
                        node: node.clone(),
                        id: tmp.clone(),
                    },
                    orelse_v,
                    node.clone(),
                );

                let merge = self.cfg.new_bb();
                self.cfg.link(true_bb, merge);
                self.cfg.link(false_bb, merge);
                (merge, Expr::Name { node, id: tmp })
            }

            Expr::BoolOp { .. } => {
                let node = expr.node().clone();
                let tmp = self.fresh_tmp();
                let (true_bb, false_bb) = self.build_branch(bb, expr);
                self.emit_assign(
                    true_bb,
                    Target::Name {
                        node: node.clone(),
                        id: tmp.clone(),
                    },
                    Expr::Constant {
                        node: node.clone(),
                        value: guppy_core::ast::Constant::Bool(true),
                    },
                    node.clone(),
                );
                self.emit_assign(
                    false_bb,
                    Target::Name {
                        node: node.clone(),
                        id: tmp.clone(),
                    },
                    Expr::Constant {
                        node: node.clone(),
                        value: guppy_core::ast::Constant::Bool(false),
                    },
                    node.clone(),
                );
                let merge = self.cfg.new_bb();
                self.cfg.link(true_bb, merge);
                self.cfg.link(false_bb, merge);
                (merge, Expr::Name { node, id: tmp })
            }

            Expr::Compare { ref ops, .. } if ops.len() > 1 => {
                let (bb, rewritten) = self.rewrite_chained_compare(bb, expr);
                self.build_expr(bb, rewritten)
            }

            Expr::Tuple { node, elts } => {
                let (bb, elts) = self.build_expr_list(bb, elts);
                (bb, Expr::Tuple { node, elts })
            }
            Expr::List { node, elts } => {
                let (bb, elts) = self.build_expr_list(bb, elts);
                (bb, Expr::List { node, elts })
            }
            Expr::Call { node, func, args } => {
                let (bb, func) = self.build_expr(bb, *func);
                let (bb, args) = self.build_expr_list(bb, args);
                (bb, Expr::Call { node, func: Box::new(func), args })
            }
            Expr::Attribute { node, value, attr } => {
                let (bb, value) = self.build_expr(bb, *value);
                (bb, Expr::Attribute { node, value: Box::new(value), attr })
            }
            Expr::Subscript { node, value, index } => {
                let (bb, value) = self.build_expr(bb, *value);
                let (bb, index) = self.build_expr(bb, *index);
                (
                    bb,
                    Expr::Subscript {
                        node,
                        value: Box::new(value),
                        index: Box::new(index),
                    },
                )
            }
            Expr::BinOp { node, left, op, right } => {
                let (bb, left) = self.build_expr(bb, *left);
                let (bb, right) = self.build_expr(bb, *right);
                (
                    bb,
                    Expr::BinOp {
                        node,
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    },
                )
            }
            Expr::UnaryOp { node, op, operand } => {
                let (bb, operand) = self.build_expr(bb, *operand);
                (bb, Expr::UnaryOp { node, op, operand: Box::new(operand) })
            }
            Expr::Compare { node, left, ops, comparators } => {
                let (bb, left) = self.build_expr(bb, *left);
                let (bb, comparators) = self.build_expr_list(bb, comparators);
                (
                    bb,
                    Expr::Compare {
                        node,
                        left: Box::new(left),
                        ops,
                        comparators,
                    },
                )
            }
        }
    }

    fn build_expr_list(&mut self, mut bb: BbId, exprs: Vec<Expr>) -> (BbId, Vec<Expr>) {
        let mut out = Vec::with_capacity(exprs.len());
        for e in exprs {
            let (next, e) = self.build_expr(bb, e);
            bb = next;
            out.push(e);
        }
        (bb, out)
    }

    /// Forces `expr` to be materialized into a fresh temporary, even if it
    /// is already simple. Used to evaluate a chained comparison's shared
    /// middle operands exactly once.
    pub(crate) fn materialize(&mut self, bb: BbId, expr: Expr) -> (BbId, Expr) {
        let (bb, expr) = self.build_expr(bb, expr);
        if matches!(expr, Expr::Name { .. }) {
            return (bb, expr);
        }
        let node = expr.node().clone();
        let tmp = self.fresh_tmp();
        self.emit_assign(
            bb,
            Target::Name {
                node: node.clone(),
                id: tmp.clone(),
            },
            expr,
            node.clone(),
        );
        (bb, Expr::Name { node, id: tmp })
    }
}
