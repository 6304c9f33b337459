//! Dataflow lowering: turns a checked CFG into a typed dataflow graph, one
//! region per basic block.
//!
//! A region has an `Input` node whose ports, in lexical-name order, mirror
//! the block's input row, a body of operator nodes wired from those ports,
//! and an `Output` node whose ports are the branch predicate (if any)
//! followed by the output row, again lexical. Arithmetic, comparison, and
//! field/index access all lower through `CustomOp`, mirroring how the
//! original system resolves them as dunder-method calls against the
//! prelude registry (`guppylang/std/_internal/checker.py`'s
//! `CallChecker` classes) rather than giving each operator its own IR node
//! kind.
//!
//! `@functional` blocks lower separately, straight from their nested AST,
//! in `functional`.

pub mod functional;
#[cfg(test)]
mod lower_tests;

use std::collections::HashMap;

use guppy_core::ast::{BinOpKind, CmpOp, Constant, Expr, Stmt, Target, UnaryOpKind};
use guppy_core::types::Type;
use guppy_core::variable::{Row, Variable};
use guppy_core::Globals;

use crate::cfg::BasicBlock;
use crate::typecheck::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

pub type Wire = (NodeId, usize);

#[derive(Debug, Clone)]
pub enum Op {
    Input { types: Vec<Type> },
    Output { types: Vec<Type> },
    LoadConstant { value: Constant, ty: Type },
    MakeTuple { elem_types: Vec<Type> },
    UnpackTuple { elem_types: Vec<Type> },
    Call { name: String, inputs: Vec<Type>, outputs: Vec<Type> },
    IndirectCall { inputs: Vec<Type>, outputs: Vec<Type> },
    CustomOp { name: String, inputs: Vec<Type>, outputs: Vec<Type> },
    /// `@functional` `if`: one [`Region`] per arm, each ending in the same
    /// loop-carried row.
    Conditional { cases: Vec<Region> },
    /// `@functional` `while`: a region whose `Output` is the continuation
    /// predicate followed by the (possibly updated) loop-carried row.
    TailLoop { body: Region },
}

impl Op {
    pub fn outputs(&self) -> &[Type] {
        match self {
            Op::Input { types } => types,
            Op::Output { .. } => &[],
            Op::LoadConstant { ty, .. } => std::slice::from_ref(ty),
            Op::MakeTuple { .. } => &[],
            Op::UnpackTuple { elem_types } => elem_types,
            Op::Call { outputs, .. } | Op::IndirectCall { outputs, .. } | Op::CustomOp { outputs, .. } => outputs,
            Op::Conditional { .. } | Op::TailLoop { .. } => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub op: Op,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub source: Wire,
    pub target: (NodeId, usize),
}

/// One dataflow region: a basic block's `Input`/body/`Output` nodes plus
/// the value edges wiring them together.
#[derive(Debug, Clone, Default)]
pub struct Region {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub input: Option<NodeId>,
    pub output: Option<NodeId>,
}

impl Region {
    /// Renders this region's nodes and wiring as indented text, for
    /// `guppy emit-ir` and test snapshots.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    fn format_at(&self, indent: usize, w: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pad = "  ".repeat(indent);
        for node in &self.nodes {
            let mut sources: Vec<&Edge> = self.edges.iter().filter(|e| e.target.0 == node.id).collect();
            sources.sort_by_key(|e| e.target.1);
            let wires: Vec<String> = sources.iter().map(|e| format!("n{}.{}", e.source.0.0, e.source.1)).collect();

            write!(w, "{pad}n{}: {}", node.id.0, format_op(&node.op))?;
            if !wires.is_empty() {
                write!(w, " <- {}", wires.join(", "))?;
            }
            writeln!(w)?;

            match &node.op {
                Op::Conditional { cases } => {
                    for (i, case) in cases.iter().enumerate() {
                        writeln!(w, "{pad}  case {i}:")?;
                        case.format_at(indent + 2, w)?;
                    }
                }
                Op::TailLoop { body } => {
                    body.format_at(indent + 1, w)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format_at(0, f)
    }
}

fn format_op(op: &Op) -> String {
    match op {
        Op::Input { types } => format!("Input {}", format_types(types)),
        Op::Output { types } => format!("Output {}", format_types(types)),
        Op::LoadConstant { value, ty } => format!("LoadConstant {value:?}: {ty}"),
        Op::MakeTuple { elem_types } => format!("MakeTuple {}", format_types(elem_types)),
        Op::UnpackTuple { elem_types } => format!("UnpackTuple {}", format_types(elem_types)),
        Op::Call { name, .. } => format!("Call {name}"),
        Op::IndirectCall { .. } => "IndirectCall".to_string(),
        Op::CustomOp { name, .. } => format!("CustomOp {name}"),
        Op::Conditional { cases } => format!("Conditional ({} cases)", cases.len()),
        Op::TailLoop { .. } => "TailLoop".to_string(),
    }
}

fn format_types(types: &[Type]) -> String {
    format!("({})", types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", "))
}

/// Builds one [`Region`], threading a `name -> current wire` map so that
/// reassigning a name updates what later reads see, just as `Context`
/// does for the type checker.
pub struct RegionBuilder {
    region: Region,
    next_id: u32,
    wires: HashMap<String, Wire>,
}

impl RegionBuilder {
    pub(crate) fn new() -> Self {
        Self { region: Region::default(), next_id: 0, wires: HashMap::new() }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn push(&mut self, op: Op, inputs: &[Wire]) -> NodeId {
        let id = self.fresh_id();
        for (port, source) in inputs.iter().enumerate() {
            self.region.edges.push(Edge { source: *source, target: (id, port) });
        }
        self.region.nodes.push(Node { id, op });
        id
    }

    pub(crate) fn single(&mut self, op: Op, inputs: &[Wire]) -> Wire {
        let id = self.push(op, inputs);
        (id, 0)
    }

    pub(crate) fn wire_of(&self, name: &str) -> Option<Wire> {
        self.wires.get(name).copied()
    }

    pub(crate) fn bind(&mut self, name: String, wire: Wire) {
        self.wires.insert(name, wire);
    }

    pub(crate) fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub(crate) fn into_region(self) -> Region {
        self.region
    }
}

/// Names live input/output ports in lexical order, so a row's port
/// assignment is stable regardless of insertion order.
pub(crate) fn lexical_order(row: &Row) -> Vec<&Variable> {
    let mut vars: Vec<&Variable> = row.iter().collect();
    vars.sort_by(|a, b| a.name.cmp(&b.name));
    vars
}

/// Lowers one basic block into a [`Region`], given its checked input row
/// and the output row selected for one particular successor.
///
/// Re-synthesizes each statement's expression types against `globals` and
/// `input_row` rather than threading a separately-retained typed AST
/// through from the checker: by construction every name this pass looks up
/// already type-checked successfully, so the lookups here cannot fail.
pub fn lower_block(
    bb: &BasicBlock,
    input_row: &Row,
    output_row: &Row,
    globals: &Globals,
    functional_nodes: &std::collections::HashSet<guppy_core::ast::AstNode>,
    diags: &mut guppy_core::diagnostics::Diagnostics,
) -> Region {
    let mut ctx = Context::new(globals, input_row.clone());
    let mut b = RegionBuilder::new();

    let input_vars = lexical_order(input_row);
    let input_id = b.push(
        Op::Input { types: input_vars.iter().map(|v| v.ty.clone()).collect() },
        &[],
    );
    b.region.input = Some(input_id);
    for (port, var) in input_vars.iter().enumerate() {
        b.wires.insert(var.name.clone(), (input_id, port));
    }

    for stmt in &bb.statements {
        lower_stmt(&mut b, &mut ctx, stmt, functional_nodes, diags);
    }

    let mut output_inputs = Vec::new();
    let mut output_types = Vec::new();
    if let Some(pred) = &bb.branch_pred {
        let wire = lower_expr(&mut b, &mut ctx, pred);
        output_inputs.push(wire);
        output_types.push(Type::Bool);
    }
    for var in lexical_order(output_row) {
        let wire = *b.wires.get(&var.name).expect("output row variable was never bound in this region");
        output_inputs.push(wire);
        output_types.push(var.ty.clone());
    }
    let output_id = b.push(Op::Output { types: output_types }, &output_inputs);
    b.region.output = Some(output_id);

    b.region
}

fn lower_stmt(
    b: &mut RegionBuilder,
    ctx: &mut Context,
    stmt: &Stmt,
    functional_nodes: &std::collections::HashSet<guppy_core::ast::AstNode>,
    diags: &mut guppy_core::diagnostics::Diagnostics,
) {
    match stmt {
        Stmt::Assign { targets, value, .. } => {
            let wire = lower_expr(b, ctx, value);
            for t in targets {
                bind_target(b, ctx, t, wire);
            }
        }
        Stmt::Expr { value, .. } => {
            lower_expr(b, ctx, value);
        }
        Stmt::Pass { .. } | Stmt::FunctionalAnnotation { .. } => {}
        Stmt::If { node, .. } | Stmt::While { node, .. } if functional_nodes.contains(node) => {
            functional::lower_functional(b, ctx, stmt, functional_nodes, diags);
        }
        Stmt::If { node, .. } | Stmt::While { node, .. } => {
            diags.bug("internal: non-functional if/while reached lowering unflattened", node.span()).emit();
        }
        Stmt::AugAssign { .. } | Stmt::AnnAssign { .. } | Stmt::Return { .. } | Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::For { .. } => {
            unreachable!("control-flow statement reached lowering unflattened")
        }
    }
}

fn bind_target(b: &mut RegionBuilder, ctx: &mut Context, target: &Target, wire: Wire) {
    match target {
        Target::Name { id, .. } => {
            b.wires.insert(id.clone(), wire);
            if let Some(var) = ctx.get(id) {
                ctx.assign(var.clone());
            }
        }
        Target::Tuple { elts, .. } => {
            let elem_types: Vec<Type> = elts
                .iter()
                .map(|t| match t {
                    Target::Name { id, .. } => ctx.get(id).map(|v| v.ty.clone()).unwrap_or(Type::None),
                    _ => Type::None,
                })
                .collect();
            let unpack = b.push(Op::UnpackTuple { elem_types }, &[wire]);
            for (i, elt) in elts.iter().enumerate() {
                bind_target(b, ctx, elt, (unpack, i));
            }
        }
        Target::Subscript { .. } => {
            // Index assignment has no bound name to rewire; the written
            // array value itself is not re-threaded in this simplified
            // lowering (no in-place array mutation exists at this scope).
        }
    }
}

fn lower_expr(b: &mut RegionBuilder, ctx: &mut Context, expr: &Expr) -> Wire {
    match expr {
        Expr::Name { id, .. } => *b.wires.get(id).unwrap_or_else(|| panic!("`{id}` has no wire at lowering time")),

        Expr::Constant { value, .. } => {
            let ty = match value {
                Constant::Bool(_) => Type::Bool,
                Constant::Int(_) => Type::Numeric(guppy_core::types::NumericKind::Int),
                Constant::Float(_) => Type::Numeric(guppy_core::types::NumericKind::Float),
                Constant::None => Type::None,
            };
            b.single(Op::LoadConstant { value: value.clone(), ty }, &[])
        }

        Expr::Tuple { elts, .. } => {
            let wires: Vec<Wire> = elts.iter().map(|e| lower_expr(b, ctx, e)).collect();
            let elem_types = elts.iter().map(|e| expr_type(ctx, e)).collect();
            b.single(Op::MakeTuple { elem_types }, &wires)
        }

        Expr::List { elts, .. } => {
            let wires: Vec<Wire> = elts.iter().map(|e| lower_expr(b, ctx, e)).collect();
            let elem_ty = elts.first().map(|e| expr_type(ctx, e)).unwrap_or(Type::None);
            let length = wires.len() as u64;
            b.single(
                Op::CustomOp {
                    name: "array.make".to_string(),
                    inputs: vec![elem_ty.clone(); wires.len()],
                    outputs: vec![Type::Array { elem: Box::new(elem_ty), length: guppy_core::types::Const::Nat(length) }],
                },
                &wires,
            )
        }

        Expr::BinOp { left, op, right, .. } => {
            let lw = lower_expr(b, ctx, left);
            let rw = lower_expr(b, ctx, right);
            let lty = expr_type(ctx, left);
            let rty = expr_type(ctx, right);
            b.single(
                Op::CustomOp { name: binop_dunder(*op).to_string(), inputs: vec![lty, rty.clone()], outputs: vec![rty] },
                &[lw, rw],
            )
        }

        Expr::UnaryOp { op, operand, .. } => {
            let w = lower_expr(b, ctx, operand);
            let ty = expr_type(ctx, operand);
            b.single(
                Op::CustomOp { name: unaryop_dunder(*op).to_string(), inputs: vec![ty.clone()], outputs: vec![ty] },
                &[w],
            )
        }

        Expr::BoolOp { values, .. } => {
            // By construction the CFG builder already flattened any real
            // short-circuit `BoolOp`; a surviving one is a single-value
            // passthrough (defensive only, should not occur).
            lower_expr(b, ctx, values.first().expect("empty BoolOp"))
        }

        Expr::Compare { left, ops, comparators, .. } => {
            let lw = lower_expr(b, ctx, left);
            let rw = lower_expr(b, ctx, comparators.first().expect("Compare with no comparator"));
            let lty = expr_type(ctx, left);
            b.single(
                Op::CustomOp { name: cmp_dunder(ops[0]).to_string(), inputs: vec![lty, expr_type(ctx, &comparators[0])], outputs: vec![Type::Bool] },
                &[lw, rw],
            )
        }

        Expr::Attribute { value, attr, .. } => {
            let w = lower_expr(b, ctx, value);
            let vty = expr_type(ctx, value);
            let result_ty = field_result_type(ctx, &vty, attr).unwrap_or(Type::None);
            b.single(
                Op::CustomOp { name: format!("{vty}.{attr}.get"), inputs: vec![vty], outputs: vec![result_ty] },
                &[w],
            )
        }

        Expr::Subscript { value, index, .. } => {
            let vw = lower_expr(b, ctx, value);
            let iw = lower_expr(b, ctx, index);
            let vty = expr_type(ctx, value);
            let elem_ty = match &vty {
                Type::Array { elem, .. } => (**elem).clone(),
                _ => Type::None,
            };
            b.single(
                Op::CustomOp { name: "array.__getitem__".to_string(), inputs: vec![vty, expr_type(ctx, index)], outputs: vec![elem_ty] },
                &[vw, iw],
            )
        }

        Expr::Call { func, args, .. } => lower_call(b, ctx, func, args),

        Expr::IfExp { .. } | Expr::NamedExpr { .. } => {
            unreachable!("ternary/walrus expression reached lowering unflattened")
        }
    }
}

fn lower_call(b: &mut RegionBuilder, ctx: &mut Context, func: &Expr, args: &[Expr]) -> Wire {
    let arg_wires: Vec<Wire> = args.iter().map(|a| lower_expr(b, ctx, a)).collect();
    let mut arg_types: Vec<Type> = args.iter().map(|a| expr_type(ctx, a)).collect();

    let (name, inputs, outputs) = match func {
        Expr::Attribute { value, attr, .. } => {
            let recv_wire = lower_expr(b, ctx, value);
            let recv_ty = expr_type(ctx, value);
            let sig = ctx
                .globals
                .lookup_method(guppy_core::globals::TypeKey::of(&recv_ty).expect("receiver has no dispatch key"), attr)
                .and_then(|def| ctx.globals.function(def))
                .cloned();
            let mut wires = vec![recv_wire];
            wires.extend(arg_wires.iter().copied());
            let (inputs, outputs) = match sig {
                Some(sig) => (sig.inputs, sig.outputs),
                None => {
                    let mut inputs = vec![recv_ty];
                    inputs.append(&mut arg_types);
                    (inputs, vec![Type::None])
                }
            };
            let id = b.push(Op::Call { name: attr.clone(), inputs: inputs.clone(), outputs: outputs.clone() }, &wires);
            return (id, 0);
        }
        Expr::Name { id, .. } => {
            if let Some(def) = ctx.globals.lookup_name(id) {
                let sig = ctx.globals.function(def).cloned().expect("resolved name has no signature");
                (id.clone(), sig.inputs, sig.outputs)
            } else {
                // A local variable of function type, called through its
                // value rather than a global definition.
                let fn_wire = lower_expr(b, ctx, func);
                let fn_ty = expr_type(ctx, func);
                let (mut inputs, outputs) = match &fn_ty {
                    Type::Function { inputs, outputs, .. } => (inputs.clone(), outputs.clone()),
                    _ => (Vec::new(), vec![Type::None]),
                };
                let mut wires = vec![fn_wire];
                wires.extend(arg_wires.iter().copied());
                inputs.insert(0, fn_ty);
                let id = b.push(Op::IndirectCall { inputs, outputs }, &wires);
                return (id, 0);
            }
        }
        _ => {
            let fn_wire = lower_expr(b, ctx, func);
            let mut wires = vec![fn_wire];
            wires.extend(arg_wires.iter().copied());
            let id = b.push(Op::IndirectCall { inputs: arg_types.clone(), outputs: vec![Type::None] }, &wires);
            return (id, 0);
        }
    };
    let id = b.push(Op::Call { name, inputs, outputs }, &arg_wires);
    (id, 0)
}

/// Re-synthesizes `expr`'s type against the current context. Lowering runs
/// only after type checking has already accepted the function, so these
/// lookups always succeed; diagnostics are discarded.
fn expr_type(ctx: &mut Context, expr: &Expr) -> Type {
    let mut sink = guppy_core::diagnostics::Diagnostics::new();
    crate::typecheck::expr::synth_expr(ctx, &mut sink, expr.clone())
        .map(|(_, ty)| ty)
        .unwrap_or(Type::None)
}

fn field_result_type(ctx: &Context, ty: &Type, name: &str) -> Option<Type> {
    if let Type::Struct { def, args } = ty {
        let info = ctx.globals.struct_info(*def)?;
        let (_, field_ty) = info.fields.iter().find(|(n, _)| n == name)?;
        return Some(crate::typecheck::unify::substitute(field_ty, args));
    }
    None
}

fn binop_dunder(op: BinOpKind) -> &'static str {
    match op {
        BinOpKind::Add => "__add__",
        BinOpKind::Sub => "__sub__",
        BinOpKind::Mult => "__mul__",
        BinOpKind::Div => "__truediv__",
        BinOpKind::FloorDiv => "__floordiv__",
        BinOpKind::Mod => "__mod__",
        BinOpKind::Pow => "__pow__",
    }
}

fn unaryop_dunder(op: UnaryOpKind) -> &'static str {
    match op {
        UnaryOpKind::Not => "__not__",
        UnaryOpKind::Neg => "__neg__",
        UnaryOpKind::Pos => "__pos__",
    }
}

fn cmp_dunder(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "__eq__",
        CmpOp::NotEq => "__ne__",
        CmpOp::Lt => "__lt__",
        CmpOp::Le => "__le__",
        CmpOp::Gt => "__gt__",
        CmpOp::Ge => "__ge__",
    }
}
