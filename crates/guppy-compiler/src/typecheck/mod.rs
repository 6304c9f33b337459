//! The type checker: a BFS walk of
//! the CFG from its entry block, checking each block once and verifying
//! row agreement on every subsequent visit.
//!
//! Grounded on `examples/original_source/guppy/checker/cfg_checker.py`.

pub mod context;
pub mod expr;
pub mod stmt;
pub mod unify;

#[cfg(test)]
mod type_check_tests;

use crate::analyses::{self, AnalysisResults};
use crate::cfg::{BasicBlock, BbId, Cfg};
use crate::linearity::{check_all_consumed, check_not_dropped};
use crate::reconcile::check_rows_match;
use context::Context;
use expr::synth_expr;
use guppy_core::diagnostics::Diagnostics;
use guppy_core::types::Type;
use guppy_core::variable::Row;
use guppy_core::{Globals, Span};
use std::collections::{HashMap, VecDeque};
use stmt::StmtChecker;

/// The checked input/output rows and (if the block branches) the
/// predicate's type, recorded once per block the first time it is
/// visited.
#[derive(Debug, Clone)]
pub struct CheckedBb {
    pub id: BbId,
    pub input_row: Row,
    pub output_row: Row,
}

#[derive(Debug, Clone)]
pub struct CheckedCfg {
    pub cfg: Cfg,
    pub blocks: HashMap<BbId, CheckedBb>,
    pub analyses: AnalysisResults,
}

fn bb_span(bb: &BasicBlock) -> Span {
    bb.statements
        .first()
        .map(|s| s.span())
        .or_else(|| bb.branch_pred.as_ref().map(|e| e.span()))
        .unwrap_or_else(|| Span::synthetic(bb.id.0 as u32))
}

/// Type-checks every block of `cfg` reachable from its entry, given
/// `params` as the entry row and `return_arity` output values. Returns
/// `None` once a diagnostic has already been emitted for an unrecoverable
/// error: the first error aborts compilation.
pub fn check_cfg(cfg: &Cfg, globals: &Globals, params: Row, return_arity: usize, diags: &mut Diagnostics) -> Option<CheckedCfg> {
    let param_names: Vec<String> = params.names().map(String::from).collect();
    let analyses = analyses::run(cfg, &param_names, return_arity);

    // `compiled` doubles as both "already visited" and the block's
    // signature (its input row) for checking later edges into it.
    let mut compiled: HashMap<BbId, Row> = HashMap::new();
    let mut checked_blocks: HashMap<BbId, CheckedBb> = HashMap::new();
    let mut queue: VecDeque<(BbId, Row)> = VecDeque::new();
    queue.push_back((cfg.entry, params));

    while let Some((id, input_row)) = queue.pop_front() {
        if let Some(signature) = compiled.get(&id) {
            if !check_rows_match(signature, &input_row, diags) {
                return None;
            }
            continue;
        }
        compiled.insert(id, input_row.clone());

        let bb = cfg.bb(id);
        let mut ctx = Context::new(globals, input_row.clone());
        StmtChecker::new(&mut ctx, diags).check_stmts(&bb.statements)?;

        if let Some(pred) = &bb.branch_pred {
            let (_, ty) = synth_expr(&mut ctx, diags, pred.clone())?;
            if ty != Type::Bool {
                diags
                    .error(format!("branch condition must be `bool`, found `{ty}`"), pred.span())
                    .emit();
                return None;
            }
        }

        let span = bb_span(bb);
        let mut output_row = Row::new();
        for succ in &bb.successors {
            let live = &analyses.live_before[succ];
            for name in live {
                if ctx.get(name).is_none() {
                    if analyses.is_partially_assigned(*succ, name) {
                        diags
                            .error(format!("`{name}` is not assigned on all control-flow paths reaching this point"), span)
                            .emit();
                    } else {
                        diags.error(format!("`{name}` is not defined"), span).emit();
                    }
                    return None;
                }
            }
            let out_row: Row = live.iter().filter_map(|n| ctx.get(n).cloned()).collect();
            if !check_not_dropped(&ctx.locals, &out_row, diags, span) {
                return None;
            }
            // `output_row` is the union across every successor's live set,
            // not just the first: two successors of the same block may need
            // different name subsets (e.g. a variable dead on the `else`
            // edge but live on the `then` edge), and the lowering stage's
            // single `Output` node needs every one of them available.
            for var in out_row.iter() {
                if !output_row.contains(&var.name) {
                    output_row.insert(var.clone());
                }
            }
            queue.push_back((*succ, out_row));
        }

        checked_blocks.insert(
            id,
            CheckedBb {
                id,
                input_row,
                output_row,
            },
        );
    }

    if let Some(exit) = checked_blocks.get(&cfg.exit) {
        if !check_all_consumed(&exit.input_row, diags) {
            return None;
        }
    }

    Some(CheckedCfg {
        cfg: cfg.clone(),
        blocks: checked_blocks,
        analyses,
    })
}
