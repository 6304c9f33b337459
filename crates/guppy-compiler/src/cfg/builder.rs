//! The CFG builder: turns a function body's statement list
//! into a [`Cfg`], threading control flow into basic-block edges instead
//! of nested `if`/`while` syntax.
//!
//! Grounded on `examples/original_source/guppy/cfg.py`'s `CFGBuilder`.

use super::{BasicBlock, BbId, Cfg};
use guppy_core::ast::{AstNode, Constant, Expr, Stmt, Target};
use guppy_core::diagnostics::Diagnostics;
use std::collections::HashSet;

struct LoopCtx {
    /// Where `continue` jumps: the loop's head (re-evaluates the test).
    continue_bb: BbId,
    /// Where `break` jumps: the block after the loop.
    break_bb: BbId,
}

/// Builder state threaded through statement, expression, and branch
/// construction. `cfg::expr_builder` and `cfg::branch_builder` extend this
/// type with `build_expr`/`build_branch`.
pub struct Builder {
    pub(crate) cfg: Cfg,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) tmp_counter: u32,
    loop_stack: Vec<LoopCtx>,
    return_arity: usize,
    /// `@functional`-annotated `if`/`while` statements, kept as ordinary
    /// AST nodes inside a basic block's statement list rather than
    /// flattened into CFG edges; the dataflow lowering stage compiles them
    /// directly.
    pub functional_nodes: HashSet<AstNode>,
}

/// Result of building a function body's CFG.
pub struct BuildResult {
    pub cfg: Cfg,
    pub functional_nodes: HashSet<AstNode>,
    pub diagnostics: Diagnostics,
}

/// Entry point: builds the CFG for a function body with `return_arity`
/// output values.
pub fn build(body: &[Stmt], return_arity: usize) -> BuildResult {
    let mut b = Builder {
        cfg: Cfg::new(),
        diagnostics: Diagnostics::new(),
        tmp_counter: 0,
        loop_stack: Vec::new(),
        return_arity,
        functional_nodes: HashSet::new(),
    };
    let entry = b.cfg.entry;
    let last = b.visit_stmts(entry, body);
    // Fall off the end of the function: treat as an implicit `return ()`
    // when there are no declared outputs; otherwise the type checker will
    // report the missing-return error the underlying row reconciliation
    // against the exit block would surface.
    b.cfg.link(last, b.cfg.exit);
    BuildResult {
        cfg: b.cfg,
        functional_nodes: b.functional_nodes,
        diagnostics: b.diagnostics,
    }
}

impl Builder {
    pub(crate) fn fresh_tmp(&mut self) -> String {
        let n = self.tmp_counter;
        self.tmp_counter += 1;
        format!("%tmp{n}")
    }

    pub(crate) fn emit_assign(&mut self, bb: BbId, target: Target, value: Expr, node: AstNode) {
        self.cfg.bb_mut(bb).statements.push(Stmt::Assign {
            node,
            targets: vec![target],
            value,
        });
    }

    /// Visits a statement list, returning the block execution falls
    /// through to after the last statement (or the block it was already
    /// redirected to by a `return`/`break`/`continue`).
    fn visit_stmts(&mut self, mut bb: BbId, stmts: &[Stmt]) -> BbId {
        let mut i = 0;
        while i < stmts.len() {
            let stmt = &stmts[i];
            if let Stmt::FunctionalAnnotation { node } = stmt {
                let Some(next) = stmts.get(i + 1) else {
                    self.diagnostics
                        .error(
                            "`@functional` must be followed by an `if` or `while` statement",
                            node.span(),
                        )
                        .emit();
                    break;
                };
                match next {
                    Stmt::If { .. } | Stmt::While { .. } => {
                        self.functional_nodes.insert(next.node().clone());
                        self.cfg.bb_mut(bb).statements.push(next.clone());
                        i += 2;
                        continue;
                    }
                    other => {
                        self.diagnostics
                            .error(
                                "`@functional` must be followed by an `if` or `while` statement",
                                other.span(),
                            )
                            .emit();
                        i += 2;
                        continue;
                    }
                }
            }
            bb = self.visit_stmt(bb, stmt);
            i += 1;
        }
        bb
    }

    fn visit_stmt(&mut self, bb: BbId, stmt: &Stmt) -> BbId {
        match stmt {
            Stmt::Assign { node, targets, value } => {
                let (bb, value) = self.build_expr(bb, value.clone());
                for t in targets {
                    self.emit_assign(bb, t.clone(), value.clone(), node.clone());
                }
                bb
            }
            Stmt::AugAssign { node, target, op, value } => {
                let (bb, value) = self.build_expr(bb, value.clone());
                let read = target_as_expr(target);
                let combined = Expr::BinOp {
                    node: node.clone(),
                    left: Box::new(read),
                    op: *op,
                    right: Box::new(value),
                };
                self.emit_assign(bb, target.clone(), combined, node.clone());
                bb
            }
            Stmt::AnnAssign { node, target, value, .. } => {
                if let Some(value) = value {
                    let (bb, value) = self.build_expr(bb, value.clone());
                    self.emit_assign(bb, target.clone(), value, node.clone());
                    bb
                } else {
                    bb
                }
            }
            Stmt::Expr { node, value } => {
                let (bb, value) = self.build_expr(bb, value.clone());
                self.cfg.bb_mut(bb).statements.push(Stmt::Expr {
                    node: node.clone(),
                    value,
                });
                bb
            }
            Stmt::Pass { .. } => bb,
            Stmt::If { test, body, orelse, .. } => {
                let (true_bb, false_bb) = self.build_branch(bb, test.clone());
                let true_end = self.visit_stmts(true_bb, body);
                let false_end = self.visit_stmts(false_bb, orelse);
                let merge = self.cfg.new_bb();
                self.cfg.link(true_end, merge);
                self.cfg.link(false_end, merge);
                merge
            }
            Stmt::While { test, body, .. } => {
                let head = self.cfg.new_bb();
                self.cfg.link(bb, head);
                let (true_bb, false_bb) = self.build_branch(head, test.clone());
                self.loop_stack.push(LoopCtx {
                    continue_bb: head,
                    break_bb: false_bb,
                });
                let body_end = self.visit_stmts(true_bb, body);
                self.loop_stack.pop();
                self.cfg.link(body_end, head);
                false_bb
            }
            Stmt::For { node, .. } => {
                self.diagnostics
                    .error("`for` loops are not part of the compiled subset", node.span())
                    .emit();
                bb
            }
            Stmt::Break { node } => {
                match self.loop_stack.last() {
                    Some(ctx) => {
                        self.cfg.link(bb, ctx.break_bb);
                    }
                    None => {
                        self.diagnostics.error("`break` outside of a loop", node.span()).emit();
                    }
                }
                self.dead_bb()
            }
            Stmt::Continue { node } => {
                match self.loop_stack.last() {
                    Some(ctx) => {
                        self.cfg.link(bb, ctx.continue_bb);
                    }
                    None => {
                        self.diagnostics
                            .error("`continue` outside of a loop", node.span())
                            .emit();
                    }
                }
                self.dead_bb()
            }
            Stmt::Return { node, value } => {
                let values = match value {
                    Some(Expr::Tuple { elts, .. }) => elts.clone(),
                    Some(other) => vec![other.clone()],
                    None => vec![],
                };
                if values.len() != self.return_arity {
                    self.diagnostics
                        .error(
                            format!(
                                "expected {} return value(s), found {}",
                                self.return_arity,
                                values.len()
                            ),
                            node.span(),
                        )
                        .emit();
                }
                let mut cur = bb;
                for (i, v) in values.into_iter().enumerate() {
                    let (next, v) = self.build_expr(cur, v);
                    cur = next;
                    self.emit_assign(
                        cur,
                        Target::Name {
                            node: node.clone(),
                            id: format!("%ret_{i}"),
                        },
                        v,
                        node.clone(),
                    );
                }
                self.cfg.link(cur, self.cfg.exit);
                self.dead_bb()
            }
            Stmt::FunctionalAnnotation { .. } => bb,
        }
    }

    /// Allocates a fresh, unreachable block to serve as the nominal
    /// "continuation" after a statement that always transfers control
    /// elsewhere (`return`/`break`/`continue`); any statements following
    /// it in source are simply dead code appended there.
    fn dead_bb(&mut self) -> BbId {
        self.cfg.new_bb()
    }
}

fn target_as_expr(target: &Target) -> Expr {
    match target {
        Target::Name { node, id } => Expr::Name {
            node: node.clone(),
            id: id.clone(),
        },
        Target::Subscript { node, value, index } => Expr::Subscript {
            node: node.clone(),
            value: value.clone(),
            index: index.clone(),
        },
        Target::Tuple { node, .. } => {
            // Augmented assignment to a tuple pattern is not meaningful
            // Python either; surfaced as a checker error downstream via
            // type mismatch rather than here.
            Expr::Constant {
                node: node.clone(),
                value: Constant::None,
            }
        }
    }
}
