//! Collecting variable uses and definitions from expressions and
//! straight-line statements, shared by the CFG builder's row computation
//! and the program analyses' transfer functions.

use guppy_core::ast::{Expr, Stmt, Target};
use std::collections::HashSet;

/// Every name read by `expr`, in the sense relevant to liveness: a
/// `NamedExpr`'s target counts as a definition elsewhere, not a use here.
pub fn expr_uses(expr: &Expr, out: &mut HashSet<String>) {
    match expr {
        Expr::Name { id, .. } => {
            out.insert(id.clone());
        }
        Expr::Constant { .. } => {}
        Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
            for e in elts {
                expr_uses(e, out);
            }
        }
        Expr::Call { func, args, .. } => {
            expr_uses(func, out);
            for a in args {
                expr_uses(a, out);
            }
        }
        Expr::Attribute { value, .. } => expr_uses(value, out),
        Expr::Subscript { value, index, .. } => {
            expr_uses(value, out);
            expr_uses(index, out);
        }
        Expr::BinOp { left, right, .. } => {
            expr_uses(left, out);
            expr_uses(right, out);
        }
        Expr::UnaryOp { operand, .. } => expr_uses(operand, out),
        Expr::BoolOp { values, .. } => {
            for v in values {
                expr_uses(v, out);
            }
        }
        Expr::Compare { left, comparators, .. } => {
            expr_uses(left, out);
            for c in comparators {
                expr_uses(c, out);
            }
        }
        Expr::IfExp { test, body, orelse, .. } => {
            expr_uses(test, out);
            expr_uses(body, out);
            expr_uses(orelse, out);
        }
        Expr::NamedExpr { value, .. } => expr_uses(value, out),
    }
}

fn target_uses(target: &Target, out: &mut HashSet<String>) {
    if let Target::Subscript { value, index, .. } = target {
        expr_uses(value, out);
        expr_uses(index, out);
    }
}

/// The `(defs, uses)` pair for a single straight-line statement: `defs`
/// are names bound by this statement, `uses` are names read by it.
/// Control-flow statements (`If`, `While`, `Return`, …) never
/// appear inside a basic block's statement list; they are represented as
/// CFG edges instead (see `cfg::builder`).
pub fn stmt_vars(stmt: &Stmt) -> (HashSet<String>, HashSet<String>) {
    let mut defs = HashSet::new();
    let mut uses = HashSet::new();
    match stmt {
        Stmt::Assign { targets, value, .. } => {
            expr_uses(value, &mut uses);
            for t in targets {
                target_uses(t, &mut uses);
                for (name, _) in t.names() {
                    defs.insert(name.to_string());
                }
            }
        }
        Stmt::AugAssign { target, value, .. } => {
            expr_uses(value, &mut uses);
            target_uses(target, &mut uses);
            for (name, _) in target.names() {
                // Read-modify-write: the target is both used and defined.
                uses.insert(name.to_string());
                defs.insert(name.to_string());
            }
        }
        Stmt::AnnAssign { target, value, .. } => {
            if let Some(v) = value {
                expr_uses(v, &mut uses);
                for (name, _) in target.names() {
                    defs.insert(name.to_string());
                }
            }
            target_uses(target, &mut uses);
        }
        Stmt::Expr { value, .. } => expr_uses(value, &mut uses),
        Stmt::Pass { .. } | Stmt::FunctionalAnnotation { .. } => {}
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                expr_uses(v, &mut uses);
            }
        }
        Stmt::If { .. } | Stmt::While { .. } | Stmt::For { .. } => {
            unreachable!("control-flow statements are lowered to CFG edges before analysis")
        }
    }
    (defs, uses)
}
