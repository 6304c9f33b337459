//! Statement checking within a single basic block.
//!
//! By the time a CFG reaches the checker, `if`/`while` no longer appear in
//! a block's statement list *except* the `@functional`-annotated ones
//! `cfg::builder` deliberately left untouched; those are
//! checked here as small nested sub-compilations rather than via CFG
//! edges.

use super::context::Context;
use super::expr::synth_expr;
use crate::reconcile::check_rows_match;
use guppy_core::ast::{Stmt, Target};
use guppy_core::diagnostics::Diagnostics;
use guppy_core::types::Type;
use guppy_core::variable::Variable;

pub struct StmtChecker<'a, 'g> {
    pub ctx: &'a mut Context<'g>,
    pub diags: &'a mut Diagnostics,
}

impl<'a, 'g> StmtChecker<'a, 'g> {
    pub fn new(ctx: &'a mut Context<'g>, diags: &'a mut Diagnostics) -> Self {
        Self { ctx, diags }
    }

    pub fn check_stmts(&mut self, stmts: &[Stmt]) -> Option<()> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Some(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Option<()> {
        match stmt {
            Stmt::Assign { node, targets, value } => {
                let (_, ty) = synth_expr(self.ctx, self.diags, value.clone())?;
                for t in targets {
                    self.assign_target(t, ty.clone(), node)?;
                }
                Some(())
            }
            Stmt::Expr { value, .. } => {
                synth_expr(self.ctx, self.diags, value.clone())?;
                Some(())
            }
            Stmt::If { node, test, body, orelse } => self.check_functional_if(node, test, body, orelse),
            Stmt::While { node, test, body } => self.check_functional_while(node, test, body),
            Stmt::Pass { .. } | Stmt::FunctionalAnnotation { .. } => Some(()),
            Stmt::AugAssign { node, .. }
            | Stmt::AnnAssign { node, .. }
            | Stmt::Return { node, .. }
            | Stmt::Break { node }
            | Stmt::Continue { node }
            | Stmt::For { node, .. } => {
                self.diags
                    .bug("internal: control-flow statement reached the checker unflattened", node.span())
                    .emit();
                None
            }
        }
    }

    fn assign_target(&mut self, target: &Target, ty: Type, node: &guppy_core::ast::AstNode) -> Option<()> {
        match target {
            Target::Name { node: tnode, id } => {
                if let Some(existing) = self.ctx.get(id) {
                    if existing.is_linear() && !existing.owned {
                        self.diags
                            .error(
                                format!("cannot reassign `{id}`: it is borrowed, not owned by this function"),
                                tnode.span(),
                            )
                            .related_to("borrowed here", existing.defined_at.first().map(|n| n.span()).unwrap_or(tnode.span()))
                            .emit();
                        return None;
                    }
                    if existing.is_linear() && existing.owned && !existing.is_synthetic() && existing.used.is_none() {
                        self.diags
                            .error(
                                format!("value of `{id}` (type `{}`) is overwritten before being consumed", existing.ty),
                                tnode.span(),
                            )
                            .related_to("previous value bound here", existing.defined_at.first().map(|n| n.span()).unwrap_or(tnode.span()))
                            .emit();
                        return None;
                    }
                }
                self.ctx.assign(Variable::new(id.clone(), ty, tnode.clone()));
                Some(())
            }
            Target::Tuple { elts, .. } => match ty {
                Type::Tuple(tys) if tys.len() == elts.len() => {
                    for (t, ty) in elts.iter().zip(tys) {
                        self.assign_target(t, ty, node)?;
                    }
                    Some(())
                }
                other => {
                    self.diags
                        .error(
                            format!("cannot unpack `{other}` into a {}-element tuple pattern", elts.len()),
                            node.span(),
                        )
                        .emit();
                    None
                }
            },
            Target::Subscript { value, index, .. } => {
                synth_expr(self.ctx, self.diags, (**value).clone())?;
                let (_, ity) = synth_expr(self.ctx, self.diags, (**index).clone())?;
                if !ity.is_numeric() {
                    self.diags
                        .error(format!("array index must be numeric, found `{ity}`"), node.span())
                        .emit();
                    return None;
                }
                Some(())
            }
        }
    }

    /// `@functional` `if`: both branches must leave the same row behind,
    /// exactly as a CFG join would require.
    fn check_functional_if(
        &mut self,
        node: &guppy_core::ast::AstNode,
        test: &guppy_core::ast::Expr,
        body: &[Stmt],
        orelse: &[Stmt],
    ) -> Option<()> {
        let (_, test_ty) = synth_expr(self.ctx, self.diags, test.clone())?;
        if test_ty != Type::Bool {
            self.diags
                .error(format!("functional `if` condition must be `bool`, found `{test_ty}`"), node.span())
                .emit();
            return None;
        }

        let saved = self.ctx.locals.clone();
        StmtChecker::new(self.ctx, self.diags).check_stmts(body)?;
        let body_row = std::mem::replace(&mut self.ctx.locals, saved.clone());

        self.ctx.locals = saved;
        StmtChecker::new(self.ctx, self.diags).check_stmts(orelse)?;
        let orelse_row = std::mem::replace(&mut self.ctx.locals, body_row.clone());

        if !check_rows_match(&body_row, &orelse_row, self.diags) {
            return None;
        }
        Some(())
    }

    /// `@functional` `while`: the body must map the pre-loop row back to
    /// itself, since it may run zero or many times.
    fn check_functional_while(&mut self, node: &guppy_core::ast::AstNode, test: &guppy_core::ast::Expr, body: &[Stmt]) -> Option<()> {
        let (_, test_ty) = synth_expr(self.ctx, self.diags, test.clone())?;
        if test_ty != Type::Bool {
            self.diags
                .error(format!("functional `while` condition must be `bool`, found `{test_ty}`"), node.span())
                .emit();
            return None;
        }

        let before = self.ctx.locals.clone();
        StmtChecker::new(self.ctx, self.diags).check_stmts(body)?;
        let after = std::mem::replace(&mut self.ctx.locals, before.clone());

        if !check_rows_match(&before, &after, self.diags) {
            return None;
        }
        self.ctx.locals = before;
        Some(())
    }
}
