//! JSON fixture intake.
//!
//! The real surface-syntax parser is an external collaborator and out of
//! scope here, so this driver reads a pre-parsed function body straight out
//! of JSON instead. The fixture grammar mirrors `guppy_core::ast` directly,
//! except it only accepts the post-flattening shapes the type checker
//! expects: a single comparator per `Compare`, no ternary `IfExp`, no
//! walrus `NamedExpr` — the constructs `cfg::expr_builder` would otherwise
//! flatten out of a real parse tree.

use guppy_core::ast::builder::node_at;
use guppy_core::ast::{AstNode, BinOpKind, BoolOpKind, CmpOp, Constant, Expr, Stmt, Target, UnaryOpKind};
use guppy_core::globals::Globals;
use guppy_core::types::{Const, NumericKind, Type};
use guppy_core::variable::{Row, Variable};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("unknown opaque type `{0}`")]
    UnknownOpaque(String),
    #[error("unknown struct type `{0}`")]
    UnknownStruct(String),
}

#[derive(Debug, Deserialize)]
pub struct FunctionFixture {
    #[serde(default)]
    pub params: Vec<ParamDto>,
    pub return_arity: usize,
    pub body: Vec<StmtDto>,
}

#[derive(Debug, Deserialize)]
pub struct ParamDto {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDto,
    /// Whether this parameter is passed by ownership transfer (`@owned`)
    /// rather than by borrow. Only meaningful for linear types; defaults
    /// to `true` since non-linear types have no borrow/owned distinction.
    #[serde(default = "default_owned")]
    pub owned: bool,
}

fn default_owned() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDto {
    Bool,
    Nat,
    Int,
    Float,
    None,
    Tuple { elems: Vec<TypeDto> },
    Array { elem: Box<TypeDto>, length: u64 },
    Opaque { name: String },
    Struct { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetDto {
    Name { id: String },
    Tuple { elts: Vec<TargetDto> },
    Subscript { value: ExprDto, index: ExprDto },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprDto {
    Name { id: String },
    IntConst { value: i64 },
    FloatConst { value: f64 },
    BoolConst { value: bool },
    NoneConst,
    Tuple { elts: Vec<ExprDto> },
    List { elts: Vec<ExprDto> },
    Call { func: Box<ExprDto>, args: Vec<ExprDto> },
    Attribute { value: Box<ExprDto>, attr: String },
    Subscript { value: Box<ExprDto>, index: Box<ExprDto> },
    BinOp { left: Box<ExprDto>, op: BinOpDto, right: Box<ExprDto> },
    UnaryOp { op: UnaryOpDto, operand: Box<ExprDto> },
    BoolOp { op: BoolOpDto, values: Vec<ExprDto> },
    Compare { left: Box<ExprDto>, op: CmpOpDto, right: Box<ExprDto> },
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BinOpDto {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOpDto {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BoolOpDto {
    And,
    Or,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CmpOpDto {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtDto {
    Assign { targets: Vec<TargetDto>, value: ExprDto },
    Expr { value: ExprDto },
    If { test: ExprDto, body: Vec<StmtDto>, orelse: Vec<StmtDto> },
    While { test: ExprDto, body: Vec<StmtDto> },
    Return { value: Option<ExprDto> },
    Pass,
    Break,
    Continue,
    FunctionalAnnotation,
}

/// Assigns every fixture-built node a fresh, increasing synthetic offset,
/// so spans still order the way real source positions would.
#[derive(Default)]
struct NodeIds(u32);

impl NodeIds {
    fn next(&mut self) -> AstNode {
        let node = node_at(self.0);
        self.0 += 1;
        node
    }
}

pub struct Lowered {
    pub params: Row,
    pub return_arity: usize,
    pub body: Vec<Stmt>,
}

pub fn lower_fixture(fixture: FunctionFixture, globals: &Globals) -> Result<Lowered, FixtureError> {
    let mut ids = NodeIds::default();
    let mut params = Row::new();
    for p in fixture.params {
        let ty = lower_type(&p.ty, globals)?;
        let var = if p.owned { Variable::new(p.name, ty, ids.next()) } else { Variable::borrowed(p.name, ty, ids.next()) };
        params.insert(var);
    }
    let body = fixture.body.iter().map(|s| lower_stmt(s, &mut ids)).collect();
    Ok(Lowered { params, return_arity: fixture.return_arity, body })
}

fn lower_type(ty: &TypeDto, globals: &Globals) -> Result<Type, FixtureError> {
    Ok(match ty {
        TypeDto::Bool => Type::Bool,
        TypeDto::Nat => Type::Numeric(NumericKind::Nat),
        TypeDto::Int => Type::Numeric(NumericKind::Int),
        TypeDto::Float => Type::Numeric(NumericKind::Float),
        TypeDto::None => Type::None,
        TypeDto::Tuple { elems } => {
            let elems = elems.iter().map(|e| lower_type(e, globals)).collect::<Result<_, _>>()?;
            Type::Tuple(elems)
        }
        TypeDto::Array { elem, length } => Type::Array {
            elem: Box::new(lower_type(elem, globals)?),
            length: Const::Nat(*length),
        },
        TypeDto::Opaque { name } => {
            let info = globals.opaque_by_name(name).ok_or_else(|| FixtureError::UnknownOpaque(name.clone()))?;
            Type::Opaque { def: info.def, args: vec![], bound: info.bound }
        }
        TypeDto::Struct { name } => {
            let info = globals.struct_by_name(name).ok_or_else(|| FixtureError::UnknownStruct(name.clone()))?;
            Type::Struct { def: info.def, args: vec![] }
        }
    })
}

fn lower_target(t: &TargetDto, ids: &mut NodeIds) -> Target {
    match t {
        TargetDto::Name { id } => Target::Name { node: ids.next(), id: id.clone() },
        TargetDto::Tuple { elts } => Target::Tuple {
            node: ids.next(),
            elts: elts.iter().map(|e| lower_target(e, ids)).collect(),
        },
        TargetDto::Subscript { value, index } => Target::Subscript {
            node: ids.next(),
            value: Box::new(lower_expr(value, ids)),
            index: Box::new(lower_expr(index, ids)),
        },
    }
}

fn lower_expr(e: &ExprDto, ids: &mut NodeIds) -> Expr {
    match e {
        ExprDto::Name { id } => Expr::Name { node: ids.next(), id: id.clone() },
        ExprDto::IntConst { value } => Expr::Constant { node: ids.next(), value: Constant::Int(*value) },
        ExprDto::FloatConst { value } => Expr::Constant { node: ids.next(), value: Constant::Float(*value) },
        ExprDto::BoolConst { value } => Expr::Constant { node: ids.next(), value: Constant::Bool(*value) },
        ExprDto::NoneConst => Expr::Constant { node: ids.next(), value: Constant::None },
        ExprDto::Tuple { elts } => Expr::Tuple { node: ids.next(), elts: elts.iter().map(|e| lower_expr(e, ids)).collect() },
        ExprDto::List { elts } => Expr::List { node: ids.next(), elts: elts.iter().map(|e| lower_expr(e, ids)).collect() },
        ExprDto::Call { func, args } => Expr::Call {
            node: ids.next(),
            func: Box::new(lower_expr(func, ids)),
            args: args.iter().map(|a| lower_expr(a, ids)).collect(),
        },
        ExprDto::Attribute { value, attr } => Expr::Attribute {
            node: ids.next(),
            value: Box::new(lower_expr(value, ids)),
            attr: attr.clone(),
        },
        ExprDto::Subscript { value, index } => Expr::Subscript {
            node: ids.next(),
            value: Box::new(lower_expr(value, ids)),
            index: Box::new(lower_expr(index, ids)),
        },
        ExprDto::BinOp { left, op, right } => Expr::BinOp {
            node: ids.next(),
            left: Box::new(lower_expr(left, ids)),
            op: lower_binop(*op),
            right: Box::new(lower_expr(right, ids)),
        },
        ExprDto::UnaryOp { op, operand } => Expr::UnaryOp {
            node: ids.next(),
            op: lower_unaryop(*op),
            operand: Box::new(lower_expr(operand, ids)),
        },
        ExprDto::BoolOp { op, values } => Expr::BoolOp {
            node: ids.next(),
            op: lower_boolop(*op),
            values: values.iter().map(|v| lower_expr(v, ids)).collect(),
        },
        ExprDto::Compare { left, op, right } => Expr::Compare {
            node: ids.next(),
            left: Box::new(lower_expr(left, ids)),
            ops: vec![lower_cmpop(*op)],
            comparators: vec![lower_expr(right, ids)],
        },
    }
}

fn lower_binop(op: BinOpDto) -> BinOpKind {
    match op {
        BinOpDto::Add => BinOpKind::Add,
        BinOpDto::Sub => BinOpKind::Sub,
        BinOpDto::Mult => BinOpKind::Mult,
        BinOpDto::Div => BinOpKind::Div,
        BinOpDto::FloorDiv => BinOpKind::FloorDiv,
        BinOpDto::Mod => BinOpKind::Mod,
        BinOpDto::Pow => BinOpKind::Pow,
    }
}

fn lower_unaryop(op: UnaryOpDto) -> UnaryOpKind {
    match op {
        UnaryOpDto::Not => UnaryOpKind::Not,
        UnaryOpDto::Neg => UnaryOpKind::Neg,
        UnaryOpDto::Pos => UnaryOpKind::Pos,
    }
}

fn lower_boolop(op: BoolOpDto) -> BoolOpKind {
    match op {
        BoolOpDto::And => BoolOpKind::And,
        BoolOpDto::Or => BoolOpKind::Or,
    }
}

fn lower_cmpop(op: CmpOpDto) -> CmpOp {
    match op {
        CmpOpDto::Lt => CmpOp::Lt,
        CmpOpDto::Le => CmpOp::Le,
        CmpOpDto::Gt => CmpOp::Gt,
        CmpOpDto::Ge => CmpOp::Ge,
        CmpOpDto::Eq => CmpOp::Eq,
        CmpOpDto::NotEq => CmpOp::NotEq,
    }
}

fn lower_stmt(s: &StmtDto, ids: &mut NodeIds) -> Stmt {
    match s {
        StmtDto::Assign { targets, value } => Stmt::Assign {
            node: ids.next(),
            targets: targets.iter().map(|t| lower_target(t, ids)).collect(),
            value: lower_expr(value, ids),
        },
        StmtDto::Expr { value } => Stmt::Expr { node: ids.next(), value: lower_expr(value, ids) },
        StmtDto::If { test, body, orelse } => Stmt::If {
            node: ids.next(),
            test: lower_expr(test, ids),
            body: body.iter().map(|s| lower_stmt(s, ids)).collect(),
            orelse: orelse.iter().map(|s| lower_stmt(s, ids)).collect(),
        },
        StmtDto::While { test, body } => Stmt::While {
            node: ids.next(),
            test: lower_expr(test, ids),
            body: body.iter().map(|s| lower_stmt(s, ids)).collect(),
        },
        StmtDto::Return { value } => Stmt::Return {
            node: ids.next(),
            value: value.as_ref().map(|v| lower_expr(v, ids)),
        },
        StmtDto::Pass => Stmt::Pass { node: ids.next() },
        StmtDto::Break => Stmt::Break { node: ids.next() },
        StmtDto::Continue => Stmt::Continue { node: ids.next() },
        StmtDto::FunctionalAnnotation => Stmt::FunctionalAnnotation { node: ids.next() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_straight_line_function() {
        let json = r#"{
            "params": [{"name": "x", "type": {"kind": "int"}}],
            "return_arity": 1,
            "body": [
                {"kind": "return", "value": {"kind": "name", "id": "x"}}
            ]
        }"#;
        let fixture: FunctionFixture = serde_json::from_str(json).expect("valid fixture");
        let globals = Globals::prelude();
        let lowered = lower_fixture(fixture, &globals).expect("lowers");
        assert_eq!(lowered.return_arity, 1);
        assert_eq!(lowered.body.len(), 1);
        assert_eq!(lowered.params.len(), 1);
    }

    #[test]
    fn a_param_with_no_owned_flag_is_borrowed() {
        let json = r#"{
            "params": [{"name": "q", "type": {"kind": "opaque", "name": "qubit"}}],
            "return_arity": 0,
            "body": [{"kind": "pass"}]
        }"#;
        let fixture: FunctionFixture = serde_json::from_str(json).expect("valid fixture");
        let globals = Globals::prelude();
        let lowered = lower_fixture(fixture, &globals).expect("lowers");
        assert!(!lowered.params.get("q").unwrap().owned);
    }

    #[test]
    fn rejects_an_unknown_opaque_type() {
        let json = r#"{
            "params": [{"name": "q", "type": {"kind": "opaque", "name": "frobnicator"}}],
            "return_arity": 0,
            "body": [{"kind": "pass"}]
        }"#;
        let fixture: FunctionFixture = serde_json::from_str(json).expect("valid fixture");
        let globals = Globals::prelude();
        assert!(lower_fixture(fixture, &globals).is_err());
    }
}
