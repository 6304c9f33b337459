//! The top-level driver stitching together all six stages: CFG building,
//! program analyses, type/linearity checking, row reconciliation (woven
//! into the type checker), and dataflow lowering.
//!
//! The first stage to emit an error aborts the whole compilation — a
//! partially-checked CFG is never handed to the next stage, and
//! unreachable blocks are discarded after type checking rather than
//! lowered, since `check_cfg`'s BFS never visits them.

use std::collections::HashMap;

use guppy_core::diagnostics::Diagnostics;
use guppy_core::variable::Row;
use guppy_core::{ast::Stmt, Error, Globals, PassResult};

use crate::cfg::{self, BbId, Cfg};
use crate::compile_options::CompileOptions;
use crate::lower::{self, Region};
use crate::typecheck::{self, CheckedCfg};

/// Everything produced by compiling one function body: the CFG, the
/// checked rows/analyses, and one dataflow region per reachable block.
#[derive(Debug)]
pub struct CompiledFunction {
    pub cfg: Cfg,
    pub checked: CheckedCfg,
    pub regions: HashMap<BbId, Region>,
}

/// Compiles a function body of `return_arity` outputs, given its formal
/// parameters as the entry row.
pub fn compile_function_body(
    body: &[Stmt],
    return_arity: usize,
    params: Row,
    globals: &Globals,
    options: &CompileOptions,
) -> PassResult<CompiledFunction> {
    if body.len() as u32 > options.recursion_limit {
        return Err(Error::RecursionLimitExceeded);
    }

    let build = cfg::builder::build(body, return_arity);
    let mut diags = build.diagnostics;
    if diags.has_errors() {
        return Err(Error::CompileFailed(diags));
    }

    let block_count = build.cfg.blocks().count() as u32;
    if block_count > options.analysis_fuel {
        return Err(Error::FuelExhausted);
    }

    if !build.functional_nodes.is_empty() && !options.allow_functional_lowering {
        for node in &build.functional_nodes {
            diags
                .error("`@functional` lowering is disabled by this compile configuration", node.span())
                .emit();
        }
        return Err(Error::CompileFailed(diags));
    }

    let Some(checked) = typecheck::check_cfg(&build.cfg, globals, params, return_arity, &mut diags) else {
        return Err(Error::CompileFailed(diags));
    };

    let mut regions = HashMap::new();
    for bb in checked.cfg.blocks() {
        let Some(info) = checked.blocks.get(&bb.id) else {
            // Unreachable from entry; discarded rather than lowered.
            continue;
        };
        let region = lower::lower_block(bb, &info.input_row, &info.output_row, globals, &build.functional_nodes, &mut diags);
        regions.insert(bb.id, region);
    }

    if diags.has_errors() {
        return Err(Error::CompileFailed(diags));
    }

    Ok((CompiledFunction { cfg: build.cfg, checked, regions }, diags))
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use guppy_core::ast::builder::*;

    #[test]
    fn compiles_a_straight_line_function() {
        let body = vec![
            assign(0, target_name(0, "x"), int(0, 1)),
            return_stmt(1, Some(name(1, "x"))),
        ];
        let globals = Globals::new();
        let options = CompileOptions::default();
        let (compiled, diags) = compile_function_body(&body, 1, Row::new(), &globals, &options).expect("compiles");
        assert!(diags.is_empty());
        assert_eq!(compiled.regions.len(), 2); // entry + exit
    }

    #[test]
    fn undefined_name_aborts_before_lowering() {
        let body = vec![return_stmt(0, Some(name(0, "missing")))];
        let globals = Globals::new();
        let options = CompileOptions::default();
        let err = compile_function_body(&body, 1, Row::new(), &globals, &options).unwrap_err();
        assert!(matches!(err, Error::CompileFailed(_)));
    }

    #[test]
    fn oversized_body_hits_the_recursion_limit() {
        let body: Vec<Stmt> = (0..10).map(|i| pass_stmt(i)).collect();
        let globals = Globals::new();
        let options = CompileOptions { recursion_limit: 5, ..CompileOptions::default() };
        let err = compile_function_body(&body, 0, Row::new(), &globals, &options).unwrap_err();
        assert!(matches!(err, Error::RecursionLimitExceeded));
    }
}
