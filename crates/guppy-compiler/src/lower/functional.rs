//! Lowering for `@functional`-annotated `if`/`while`: these
//! never got CFG edges, so they lower straight from their nested AST into
//! structured primitives instead of basic-block regions.
//!
//! The source's own `_ @ functional` handling is left an open question
//! (a `NotImplementedError` for anything but the shallow, no-jump case);
//! we resolve it here by rejecting `break`/`continue`/`return` inside the
//! annotated statement and any nesting of one functional block inside
//! another, rather than silently accepting a construct whose lowering
//! would be unclear.

use std::collections::HashSet;

use guppy_core::ast::{AstNode, Stmt};
use guppy_core::diagnostics::Diagnostics;
use guppy_core::types::Type;
use guppy_core::variable::Row;

use super::{lexical_order, lower_expr, Op, Region, RegionBuilder};
use crate::reconcile::check_rows_match;
use crate::typecheck::context::Context;

pub fn lower_functional(
    b: &mut RegionBuilder,
    ctx: &mut Context,
    stmt: &Stmt,
    functional_nodes: &HashSet<AstNode>,
    diags: &mut Diagnostics,
) {
    match stmt {
        Stmt::If { test, body, orelse, node } => {
            if !check_no_jumps(body, node, diags) || !check_no_jumps(orelse, node, diags) {
                return;
            }
            let test_wire = lower_expr(b, ctx, test);
            let before = ctx.locals.clone();

            let (true_region, true_row) = lower_arm(body, &before, ctx, functional_nodes, diags);
            let (false_region, false_row) = lower_arm(orelse, &before, ctx, functional_nodes, diags);
            if !check_rows_match(&true_row, &false_row, diags) {
                return;
            }

            let mut inputs = vec![test_wire];
            inputs.extend(lexical_order(&before).iter().map(|v| b.wire_of(&v.name).expect("captured variable has no wire")));
            let node_id = b.push(Op::Conditional { cases: vec![true_region, false_region] }, &inputs);

            ctx.locals = true_row.clone();
            for (port, var) in lexical_order(&true_row).iter().enumerate() {
                b.bind(var.name.clone(), (node_id, port));
            }
        }

        Stmt::While { test, body, node } => {
            if !check_no_jumps(body, node, diags) {
                return;
            }
            let before = ctx.locals.clone();

            let mut inner = RegionBuilder::new();
            let mut inner_ctx = Context::new(ctx.globals, before.clone());
            let carried = lexical_order(&before);
            let input_id = inner.push(Op::Input { types: carried.iter().map(|v| v.ty.clone()).collect() }, &[]);
            inner.region_mut().input = Some(input_id);
            for (port, var) in carried.iter().enumerate() {
                inner.bind(var.name.clone(), (input_id, port));
            }

            let pred_wire = lower_expr(&mut inner, &mut inner_ctx, test);
            for s in body {
                super::lower_stmt(&mut inner, &mut inner_ctx, s, functional_nodes, diags);
            }
            if !check_rows_match(&before, &inner_ctx.locals, diags) {
                return;
            }

            let mut out_inputs = vec![pred_wire];
            out_inputs.extend(lexical_order(&inner_ctx.locals).iter().map(|v| inner.wire_of(&v.name).expect("loop-carried variable has no wire")));
            let mut out_types = vec![Type::Bool];
            out_types.extend(lexical_order(&inner_ctx.locals).iter().map(|v| v.ty.clone()));
            let output_id = inner.push(Op::Output { types: out_types }, &out_inputs);
            inner.region_mut().output = Some(output_id);

            let mut loop_inputs = Vec::new();
            for var in &carried {
                loop_inputs.push(b.wire_of(&var.name).expect("loop-entry variable has no wire"));
            }
            let node_id = b.push(Op::TailLoop { body: inner.into_region() }, &loop_inputs);
            for (port, var) in carried.iter().enumerate() {
                b.bind(var.name.clone(), (node_id, port));
            }
        }

        other => {
            diags.bug("internal: non-if/while statement reached functional lowering", other.span()).emit();
        }
    }
}

/// Lowers one `if` arm as its own region, seeded with `before`'s row, and
/// returns the region plus the row it leaves behind.
fn lower_arm(
    stmts: &[Stmt],
    before: &Row,
    ctx: &Context,
    functional_nodes: &HashSet<AstNode>,
    diags: &mut Diagnostics,
) -> (Region, Row) {
    let mut inner = RegionBuilder::new();
    let mut inner_ctx = Context::new(ctx.globals, before.clone());
    let input_vars = lexical_order(before);
    let input_id = inner.push(Op::Input { types: input_vars.iter().map(|v| v.ty.clone()).collect() }, &[]);
    inner.region_mut().input = Some(input_id);
    for (port, var) in input_vars.iter().enumerate() {
        inner.bind(var.name.clone(), (input_id, port));
    }

    for s in stmts {
        super::lower_stmt(&mut inner, &mut inner_ctx, s, functional_nodes, diags);
    }

    let out_vars = lexical_order(&inner_ctx.locals);
    let out_wires: Vec<_> = out_vars.iter().map(|v| inner.wire_of(&v.name).expect("arm variable has no wire")).collect();
    let out_types: Vec<_> = out_vars.iter().map(|v| v.ty.clone()).collect();
    let output_id = inner.push(Op::Output { types: out_types }, &out_wires);
    inner.region_mut().output = Some(output_id);

    let row = inner_ctx.locals.clone();
    (inner.into_region(), row)
}

/// Rejects `break`/`continue`/`return`/`for` and nested `@functional`
/// blocks anywhere inside `stmts`: this structured-lowering path only
/// handles the shallow, jump-free case.
fn check_no_jumps(stmts: &[Stmt], outer: &AstNode, diags: &mut Diagnostics) -> bool {
    for s in stmts {
        let bad = match s {
            Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Return { .. } | Stmt::For { .. } => true,
            Stmt::FunctionalAnnotation { .. } => true,
            _ => false,
        };
        if bad {
            diags
                .error("`@functional` blocks may not contain `break`, `continue`, `return`, `for`, or nested `@functional` blocks", s.span())
                .related_to("inside this block", outer.span())
                .emit();
            return false;
        }
        let nested_ok = match s {
            Stmt::If { body, orelse, .. } => check_no_jumps(body, outer, diags) && check_no_jumps(orelse, outer, diags),
            Stmt::While { body, .. } => check_no_jumps(body, outer, diags),
            _ => true,
        };
        if !nested_ok {
            return false;
        }
    }
    true
}
