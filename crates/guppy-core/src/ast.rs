//! AST intake.
//!
//! The surface-syntax parser is an external collaborator: it is assumed to
//! produce a tree shaped like the variants below, each node carrying a
//! source [`Span`]. The core crate treats this tree as read-only input.

use crate::span::Span;
use std::rc::Rc;

/// Opaque handle to a parsed syntactic construct.
///
/// Diagnostics and `Variable::defined_at`/`used` carry this handle rather
/// than a raw `Span` so that two uses of the same node compare equal by
/// identity, matching the Python original's use of the `ast` node object
/// itself as a dictionary key.
#[derive(Debug, Clone)]
pub struct AstNode(Rc<NodeData>);

#[derive(Debug)]
struct NodeData {
    span: Span,
}

impl AstNode {
    pub fn new(span: Span) -> Self {
        Self(Rc::new(NodeData { span }))
    }

    pub fn span(&self) -> Span {
        self.0.span
    }
}

impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for AstNode {}

impl std::hash::Hash for AstNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
    Pos,
}

/// Boolean `and`/`or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOpKind {
    And,
    Or,
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Float(f64),
    None,
}

/// Expression variants.
#[derive(Debug, Clone)]
pub enum Expr {
    Name {
        node: AstNode,
        id: String,
    },
    Constant {
        node: AstNode,
        value: Constant,
    },
    Tuple {
        node: AstNode,
        elts: Vec<Expr>,
    },
    List {
        node: AstNode,
        elts: Vec<Expr>,
    },
    Call {
        node: AstNode,
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        node: AstNode,
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        node: AstNode,
        value: Box<Expr>,
        index: Box<Expr>,
    },
    BinOp {
        node: AstNode,
        left: Box<Expr>,
        op: BinOpKind,
        right: Box<Expr>,
    },
    UnaryOp {
        node: AstNode,
        op: UnaryOpKind,
        operand: Box<Expr>,
    },
    BoolOp {
        node: AstNode,
        op: BoolOpKind,
        values: Vec<Expr>,
    },
    Compare {
        node: AstNode,
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    IfExp {
        node: AstNode,
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    NamedExpr {
        node: AstNode,
        target: String,
        target_node: AstNode,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn node(&self) -> &AstNode {
        match self {
            Expr::Name { node, .. }
            | Expr::Constant { node, .. }
            | Expr::Tuple { node, .. }
            | Expr::List { node, .. }
            | Expr::Call { node, .. }
            | Expr::Attribute { node, .. }
            | Expr::Subscript { node, .. }
            | Expr::BinOp { node, .. }
            | Expr::UnaryOp { node, .. }
            | Expr::BoolOp { node, .. }
            | Expr::Compare { node, .. }
            | Expr::IfExp { node, .. }
            | Expr::NamedExpr { node, .. } => node,
        }
    }

    pub fn span(&self) -> Span {
        self.node().span()
    }
}

/// An assignment target, recursively unpacked for tuple patterns: each
/// bound name, however deeply nested, is marked assigned.
#[derive(Debug, Clone)]
pub enum Target {
    Name { node: AstNode, id: String },
    Tuple { node: AstNode, elts: Vec<Target> },
    Subscript { node: AstNode, value: Box<Expr>, index: Box<Expr> },
}

impl Target {
    /// Collects every bound name in this (possibly nested) pattern.
    pub fn names(&self) -> Vec<(&str, &AstNode)> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<(&'a str, &'a AstNode)>) {
        match self {
            Target::Name { node, id } => out.push((id.as_str(), node)),
            Target::Tuple { elts, .. } => {
                for e in elts {
                    e.collect_names(out);
                }
            }
            Target::Subscript { .. } => {}
        }
    }
}

/// Statement variants dispatched by the CFG builder. `For` is part of the
/// surface grammar but outside the compiled subset; the builder reports a
/// diagnostic and discards it rather than building a loop (see
/// `guppy_compiler::cfg::builder`).
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        node: AstNode,
        targets: Vec<Target>,
        value: Expr,
    },
    AugAssign {
        node: AstNode,
        target: Target,
        op: BinOpKind,
        value: Expr,
    },
    AnnAssign {
        node: AstNode,
        target: Target,
        annotation: TypeExpr,
        value: Option<Expr>,
    },
    Expr {
        node: AstNode,
        value: Expr,
    },
    If {
        node: AstNode,
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        node: AstNode,
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        node: AstNode,
        target: Target,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Break {
        node: AstNode,
    },
    Continue {
        node: AstNode,
    },
    Return {
        node: AstNode,
        value: Option<Expr>,
    },
    Pass {
        node: AstNode,
    },
    /// The `_ @ functional` pseudo-annotation.
    FunctionalAnnotation {
        node: AstNode,
    },
}

impl Stmt {
    pub fn node(&self) -> &AstNode {
        match self {
            Stmt::Assign { node, .. }
            | Stmt::AugAssign { node, .. }
            | Stmt::AnnAssign { node, .. }
            | Stmt::Expr { node, .. }
            | Stmt::If { node, .. }
            | Stmt::While { node, .. }
            | Stmt::For { node, .. }
            | Stmt::Break { node }
            | Stmt::Continue { node }
            | Stmt::Return { node, .. }
            | Stmt::Pass { node }
            | Stmt::FunctionalAnnotation { node } => node,
        }
    }

    pub fn span(&self) -> Span {
        self.node().span()
    }
}

/// A constant expression appearing in a type annotation (e.g. an array
/// length), either a literal or a generic constant parameter name.
#[derive(Debug, Clone)]
pub enum ConstExpr {
    Literal(u64),
    Name(String),
}

/// Type-annotation sub-language: a restricted subset of
/// expressions used only in annotation position.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Name {
        node: AstNode,
        id: String,
    },
    Subscript {
        node: AstNode,
        base: String,
        args: Vec<TypeExprArg>,
    },
    Tuple {
        node: AstNode,
        elts: Vec<TypeExpr>,
    },
    Callable {
        node: AstNode,
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    Array {
        node: AstNode,
        elem: Box<TypeExpr>,
        length: ConstExpr,
    },
}

#[derive(Debug, Clone)]
pub enum TypeExprArg {
    Type(TypeExpr),
    Const(ConstExpr),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { node, .. }
            | TypeExpr::Subscript { node, .. }
            | TypeExpr::Tuple { node, .. }
            | TypeExpr::Callable { node, .. }
            | TypeExpr::Array { node, .. } => node.span(),
        }
    }
}

/// Hand-building constructors for fixtures and tests, since the surface
/// parser (which would normally produce these trees) is out of scope.
pub mod builder {
    use super::*;

    fn span_at(offset: u32) -> Span {
        Span::new(
            rowan::TextRange::new(offset.into(), (offset + 1).into()),
            1,
            offset,
            1,
            offset + 1,
        )
    }

    pub fn node_at(offset: u32) -> AstNode {
        AstNode::new(span_at(offset))
    }

    pub fn name(offset: u32, id: &str) -> Expr {
        Expr::Name {
            node: node_at(offset),
            id: id.to_string(),
        }
    }

    pub fn int(offset: u32, v: i64) -> Expr {
        Expr::Constant {
            node: node_at(offset),
            value: Constant::Int(v),
        }
    }

    pub fn boolean(offset: u32, v: bool) -> Expr {
        Expr::Constant {
            node: node_at(offset),
            value: Constant::Bool(v),
        }
    }

    pub fn binop(offset: u32, left: Expr, op: BinOpKind, right: Expr) -> Expr {
        Expr::BinOp {
            node: node_at(offset),
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn target_name(offset: u32, id: &str) -> Target {
        Target::Name {
            node: node_at(offset),
            id: id.to_string(),
        }
    }

    pub fn type_name(offset: u32, id: &str) -> TypeExpr {
        TypeExpr::Name {
            node: node_at(offset),
            id: id.to_string(),
        }
    }

    pub fn assign(offset: u32, target: Target, value: Expr) -> Stmt {
        Stmt::Assign {
            node: node_at(offset),
            targets: vec![target],
            value,
        }
    }

    pub fn expr_stmt(offset: u32, value: Expr) -> Stmt {
        Stmt::Expr {
            node: node_at(offset),
            value,
        }
    }

    pub fn if_stmt(offset: u32, test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
        Stmt::If {
            node: node_at(offset),
            test,
            body,
            orelse,
        }
    }

    pub fn while_stmt(offset: u32, test: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::While {
            node: node_at(offset),
            test,
            body,
        }
    }

    pub fn return_stmt(offset: u32, value: Option<Expr>) -> Stmt {
        Stmt::Return {
            node: node_at(offset),
            value,
        }
    }

    pub fn pass_stmt(offset: u32) -> Stmt {
        Stmt::Pass { node: node_at(offset) }
    }

    pub fn break_stmt(offset: u32) -> Stmt {
        Stmt::Break { node: node_at(offset) }
    }

    pub fn continue_stmt(offset: u32) -> Stmt {
        Stmt::Continue { node: node_at(offset) }
    }

    pub fn boolop(offset: u32, op: BoolOpKind, values: Vec<Expr>) -> Expr {
        Expr::BoolOp {
            node: node_at(offset),
            op,
            values,
        }
    }

    pub fn compare(offset: u32, left: Expr, ops: Vec<CmpOp>, comparators: Vec<Expr>) -> Expr {
        Expr::Compare {
            node: node_at(offset),
            left: Box::new(left),
            ops,
            comparators,
        }
    }
}
