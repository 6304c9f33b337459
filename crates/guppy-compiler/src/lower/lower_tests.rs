use super::*;
use crate::cfg::builder::build;
use crate::typecheck::check_cfg;
use guppy_core::ast::builder::*;
use guppy_core::variable::Row;
use guppy_core::Globals;

#[test]
fn straight_line_block_has_matching_input_and_output_port_counts() {
    let body = vec![
        assign(0, target_name(0, "x"), int(0, 1)),
        return_stmt(1, Some(name(1, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut diags = guppy_core::diagnostics::Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, Row::new(), 1, &mut diags).expect("type-checks");

    let entry = checked.blocks.get(&result.cfg.entry).unwrap();
    let region = lower_block(
        result.cfg.bb(result.cfg.entry),
        &entry.input_row,
        &entry.output_row,
        &globals,
        &result.functional_nodes,
        &mut diags,
    );

    let Op::Input { types } = &region.nodes.first().unwrap().op else {
        panic!("first node must be Input");
    };
    assert!(types.is_empty());
    let Op::Output { types } = &region.nodes.last().unwrap().op else {
        panic!("last node must be Output");
    };
    assert_eq!(types.len(), 1);
}

#[test]
fn dump_renders_a_node_per_line_with_its_wire_sources() {
    let body = vec![
        assign(0, target_name(0, "x"), int(0, 1)),
        return_stmt(1, Some(name(1, "x"))),
    ];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut diags = guppy_core::diagnostics::Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, Row::new(), 1, &mut diags).expect("type-checks");

    let entry = checked.blocks.get(&result.cfg.entry).unwrap();
    let region = lower_block(
        result.cfg.bb(result.cfg.entry),
        &entry.input_row,
        &entry.output_row,
        &globals,
        &result.functional_nodes,
        &mut diags,
    );

    let dump = region.dump();
    assert!(dump.contains("Input ()"));
    assert!(dump.contains("LoadConstant"));
    assert!(dump.contains("Output"));
    assert!(dump.lines().any(|l| l.contains("<-")));
}

#[test]
fn dump_of_a_single_param_passthrough_matches_snapshot() {
    let body = vec![return_stmt(0, Some(name(0, "x")))];
    let result = build(&body, 1);
    let globals = Globals::new();
    let mut params = Row::new();
    params.insert(guppy_core::Variable::new("x", guppy_core::types::Type::Numeric(guppy_core::types::NumericKind::Int), node_at(0)));
    let mut diags = guppy_core::diagnostics::Diagnostics::new();
    let checked = check_cfg(&result.cfg, &globals, params, 1, &mut diags).expect("type-checks");

    let entry = checked.blocks.get(&result.cfg.entry).unwrap();
    let region = lower_block(
        result.cfg.bb(result.cfg.entry),
        &entry.input_row,
        &entry.output_row,
        &globals,
        &result.functional_nodes,
        &mut diags,
    );

    insta::assert_snapshot!(region.dump(), @r###"
    n0: Input (int)
    n1: Output (int) <- n0.0
    "###);
}

#[test]
fn ports_are_ordered_lexically_by_name() {
    let mut row = Row::new();
    row.insert(guppy_core::Variable::new("zebra", guppy_core::types::Type::Bool, node_at(0)));
    row.insert(guppy_core::Variable::new("apple", guppy_core::types::Type::Bool, node_at(1)));
    let ordered = lexical_order(&row);
    assert_eq!(ordered[0].name, "apple");
    assert_eq!(ordered[1].name, "zebra");
}
