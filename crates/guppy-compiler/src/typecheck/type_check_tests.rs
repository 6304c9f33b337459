use super::check_cfg;
use crate::cfg::builder::build;
use guppy_core::ast::builder::*;
use guppy_core::diagnostics::Diagnostics;
use guppy_core::globals::{FunctionSig, TypeKey};
use guppy_core::types::{NumericKind, Type};
use guppy_core::variable::Row;
use guppy_core::Globals;

fn globals_with_float_coercions() -> Globals {
    let mut g = Globals::new();
    for kind in [NumericKind::Nat, NumericKind::Int] {
        let def = g.fresh_def_id();
        g.register_function(FunctionSig {
            def,
            name: "__float__".to_string(),
            params: vec![],
            inputs: vec![Type::Numeric(kind)],
            outputs: vec![Type::Numeric(NumericKind::Float)],
        });
        g.register_impl(TypeKey::Numeric(kind), "__float__", def);
    }
    g
}

#[test]
fn straight_line_function_type_checks() {
    let body = vec![
        assign(0, target_name(0, "x"), int(0, 1)),
        return_stmt(1, Some(name(1, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, Row::new(), 1, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags);
    assert!(checked.is_some());
}

#[test]
fn entry_output_row_carries_the_return_slot_to_the_exit_edge() {
    let body = vec![
        assign(0, target_name(0, "x"), int(0, 1)),
        return_stmt(1, Some(name(1, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, Row::new(), 1, &mut diags).expect("type-checks");
    let entry = checked.blocks.get(&result.cfg.entry).unwrap();
    assert!(entry.output_row.contains("%ret_0"), "{:?}", entry.output_row);
    assert_eq!(entry.output_row.get("%ret_0").unwrap().ty, Type::Numeric(NumericKind::Int));
}

#[test]
fn if_else_with_matching_assignment_on_both_branches_checks() {
    let body = vec![
        if_stmt(
            0,
            name(0, "cond"),
            vec![assign(1, target_name(1, "x"), int(1, 1))],
            vec![assign(2, target_name(2, "x"), int(2, 2))],
        ),
        return_stmt(3, Some(name(3, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("cond", Type::Bool, node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 1, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags);
    assert!(checked.is_some());
}

#[test]
fn variable_assigned_on_only_one_branch_is_an_error() {
    let body = vec![
        if_stmt(0, name(0, "cond"), vec![assign(1, target_name(1, "x"), int(1, 1))], vec![]),
        return_stmt(2, Some(name(2, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("cond", Type::Bool, node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 1, &mut diags);
    assert!(checked.is_none());
    assert!(diags.has_errors());
}

#[test]
fn mismatched_types_on_rejoin_is_an_error() {
    let body = vec![
        if_stmt(
            0,
            name(0, "cond"),
            vec![assign(1, target_name(1, "x"), int(1, 1))],
            vec![assign(2, target_name(2, "x"), boolean(2, true))],
        ),
        return_stmt(3, None),
    ];
    let result = build(&body, 0);
    let globals = Globals::new();
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("cond", Type::Bool, node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 0, &mut diags);
    assert!(checked.is_none());
    assert!(diags.has_errors());
}

fn qubit_type() -> Type {
    Type::Opaque { def: guppy_core::types::OpaqueDefId(0), args: vec![], bound: guppy_core::types::Bound::Any }
}

#[test]
fn reassigning_a_borrowed_linear_parameter_is_an_error() {
    let body = vec![assign(0, target_name(0, "q"), guppy_core::ast::Expr::Call {
        node: node_at(0),
        func: Box::new(name(0, "fresh_qubit")),
        args: vec![],
    })];
    let result = build(&body, 0);
    let mut globals = Globals::new();
    let def = globals.fresh_def_id();
    globals.register_function(FunctionSig { def, name: "fresh_qubit".to_string(), params: vec![], inputs: vec![], outputs: vec![qubit_type()] });
    let mut params = Row::new();
    params.insert(guppy_core::Variable::borrowed("q", qubit_type(), node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 0, &mut diags);
    assert!(checked.is_none());
    assert!(diags.has_errors());
}

#[test]
fn reassigning_an_owned_linear_parameter_after_it_is_consumed_is_allowed() {
    let body = vec![
        expr_stmt(0, guppy_core::ast::Expr::Call { node: node_at(0), func: Box::new(name(0, "sink")), args: vec![name(0, "q")] }),
        assign(1, target_name(1, "q"), guppy_core::ast::Expr::Call {
            node: node_at(1),
            func: Box::new(name(1, "fresh_qubit")),
            args: vec![],
        }),
        expr_stmt(2, guppy_core::ast::Expr::Call { node: node_at(2), func: Box::new(name(2, "sink")), args: vec![name(2, "q")] }),
    ];
    let result = build(&body, 0);
    let mut globals = Globals::new();
    let fresh = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: fresh, name: "fresh_qubit".to_string(), params: vec![], inputs: vec![], outputs: vec![qubit_type()] });
    let sink = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: sink, name: "sink".to_string(), params: vec![], inputs: vec![qubit_type()], outputs: vec![] });
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("q", qubit_type(), node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 0, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags);
    assert!(checked.is_some());
}

#[test]
fn reassigning_an_owned_linear_parameter_before_it_is_consumed_is_an_error() {
    let body = vec![
        assign(0, target_name(0, "q"), guppy_core::ast::Expr::Call {
            node: node_at(0),
            func: Box::new(name(0, "fresh_qubit")),
            args: vec![],
        }),
        expr_stmt(1, guppy_core::ast::Expr::Call { node: node_at(1), func: Box::new(name(1, "sink")), args: vec![name(1, "q")] }),
    ];
    let result = build(&body, 0);
    let mut globals = Globals::new();
    let fresh = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: fresh, name: "fresh_qubit".to_string(), params: vec![], inputs: vec![], outputs: vec![qubit_type()] });
    let sink = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: sink, name: "sink".to_string(), params: vec![], inputs: vec![qubit_type()], outputs: vec![] });
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("q", qubit_type(), node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 0, &mut diags);
    assert!(checked.is_none());
    assert!(diags.has_errors());
}

#[test]
fn shadowing_an_owned_linear_parameter_inside_a_branch_is_an_error() {
    // def f(b: bool, q: qubit @owned) -> qubit:
    //     if b:
    //         q = fresh_qubit()
    //     return q
    let body = vec![
        if_stmt(
            0,
            name(0, "b"),
            vec![assign(1, target_name(1, "q"), guppy_core::ast::Expr::Call {
                node: node_at(1),
                func: Box::new(name(1, "fresh_qubit")),
                args: vec![],
            })],
            vec![],
        ),
        return_stmt(2, Some(name(2, "q"))),
    ];
    let result = build(&body, 1);
    let mut globals = Globals::new();
    let fresh = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: fresh, name: "fresh_qubit".to_string(), params: vec![], inputs: vec![], outputs: vec![qubit_type()] });
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("b", Type::Bool, node_at(0)));
    params.insert(guppy_core::Variable::new("q", qubit_type(), node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 1, &mut diags);
    assert!(checked.is_none());
    assert!(diags.has_errors());
}

#[test]
fn a_borrowed_linear_parameter_may_be_read_more_than_once() {
    let body = vec![
        expr_stmt(0, guppy_core::ast::Expr::Call { node: node_at(0), func: Box::new(name(0, "sink")), args: vec![name(0, "q")] }),
        expr_stmt(1, guppy_core::ast::Expr::Call { node: node_at(1), func: Box::new(name(1, "sink")), args: vec![name(1, "q")] }),
    ];
    let result = build(&body, 0);
    let mut globals = Globals::new();
    let sink = globals.fresh_def_id();
    globals.register_function(FunctionSig { def: sink, name: "sink".to_string(), params: vec![], inputs: vec![qubit_type()], outputs: vec![] });
    let mut params = Row::new();
    params.insert(guppy_core::Variable::borrowed("q", qubit_type(), node_at(0)));
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 0, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags);
    assert!(checked.is_some());
}

#[test]
fn numeric_coercion_unifies_int_and_float() {
    let body = vec![assign(
        0,
        target_name(0, "z"),
        guppy_core::ast::Expr::BinOp {
            node: node_at(0),
            left: Box::new(int(0, 1)),
            op: guppy_core::ast::BinOpKind::Add,
            right: Box::new(guppy_core::ast::Expr::Constant {
                node: node_at(1),
                value: guppy_core::ast::Constant::Float(2.0),
            }),
        },
    )];
    let result = build(&body, 0);
    let globals = globals_with_float_coercions();
    let mut diags = Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, Row::new(), 0, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags);
    assert!(checked.is_some());
}
