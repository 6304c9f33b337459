//! Expression type synthesis.
//!
//! By the time a CFG reaches the checker, `cfg::expr_builder` has already
//! eliminated `NamedExpr`/`IfExp`/multi-comparator `Compare` nodes, so this
//! module only needs to handle the "plain" expression shapes.

use super::context::Context;
use crate::linearity::mark_used;
use crate::typecheck::unify::{infer_args, substitute};
use guppy_core::ast::{CmpOp, Constant, Expr, UnaryOpKind};
use guppy_core::diagnostics::Diagnostics;
use guppy_core::globals::TypeKey;
use guppy_core::types::{Bound, NumericKind, Type};

/// Synthesizes `expr`'s type, returning a (possibly rewritten, to insert
/// numeric coercions) expression paired with its type. Returns `None` once
/// a diagnostic has already been emitted for this expression.
pub fn synth_expr(ctx: &mut Context, diags: &mut Diagnostics, expr: Expr) -> Option<(Expr, Type)> {
    match expr {
        Expr::Name { node, id } => match ctx.get(&id) {
            Some(var) => {
                let ty = var.ty.clone();
                if !mark_used(ctx, diags, &id, &node) {
                    return None;
                }
                Some((Expr::Name { node, id }, ty))
            }
            None => {
                diags.error(format!("undefined name `{id}`"), node.span()).emit();
                None
            }
        },

        Expr::Constant { node, value } => {
            let ty = match &value {
                Constant::Bool(_) => Type::Bool,
                Constant::Int(_) => Type::Numeric(NumericKind::Int),
                Constant::Float(_) => Type::Numeric(NumericKind::Float),
                Constant::None => Type::None,
            };
            Some((Expr::Constant { node, value }, ty))
        }

        Expr::Tuple { node, elts } => {
            let mut out = Vec::with_capacity(elts.len());
            let mut tys = Vec::with_capacity(elts.len());
            for e in elts {
                let (e, t) = synth_expr(ctx, diags, e)?;
                out.push(e);
                tys.push(t);
            }
            Some((Expr::Tuple { node, elts: out }, Type::Tuple(tys)))
        }

        Expr::List { node, elts } => {
            let mut out = Vec::with_capacity(elts.len());
            let mut elem_ty: Option<Type> = None;
            for e in elts {
                let (e, t) = synth_expr(ctx, diags, e)?;
                if let Some(prev) = &elem_ty {
                    if *prev != t {
                        diags
                            .error(
                                format!("array elements must share one type (found `{prev}` and `{t}`)"),
                                e.span(),
                            )
                            .emit();
                        return None;
                    }
                } else {
                    elem_ty = Some(t);
                }
                out.push(e);
            }
            let length = out.len() as u64;
            let elem_ty = elem_ty.unwrap_or(Type::None);
            Some((
                Expr::List { node, elts: out },
                Type::Array {
                    elem: Box::new(elem_ty),
                    length: guppy_core::types::Const::Nat(length),
                },
            ))
        }

        Expr::BinOp { node, left, op, right } => {
            let (left, lty) = synth_expr(ctx, diags, *left)?;
            let (right, rty) = synth_expr(ctx, diags, *right)?;
            let (left, right, result_kind) = coerce_numeric_pair(ctx, diags, left, lty, right, rty)?;
            Some((
                Expr::BinOp {
                    node,
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                Type::Numeric(result_kind),
            ))
        }

        Expr::UnaryOp { node, op, operand } => {
            let (operand, ty) = synth_expr(ctx, diags, *operand)?;
            match op {
                UnaryOpKind::Not => {
                    if ty != Type::Bool {
                        diags
                            .error(format!("`not` requires `bool`, found `{ty}`"), node.span())
                            .emit();
                        return None;
                    }
                    Some((Expr::UnaryOp { node, op, operand: Box::new(operand) }, Type::Bool))
                }
                UnaryOpKind::Neg | UnaryOpKind::Pos => {
                    if !ty.is_numeric() {
                        diags
                            .error(format!("unary `+`/`-` requires a numeric type, found `{ty}`"), node.span())
                            .emit();
                        return None;
                    }
                    Some((Expr::UnaryOp { node, op, operand: Box::new(operand) }, ty))
                }
            }
        }

        Expr::BoolOp { node, op, values } => {
            let mut out = Vec::with_capacity(values.len());
            for v in values {
                let (v, ty) = synth_expr(ctx, diags, v)?;
                if ty != Type::Bool {
                    diags
                        .error(format!("boolean operator requires `bool`, found `{ty}`"), v.span())
                        .emit();
                    return None;
                }
                out.push(v);
            }
            Some((Expr::BoolOp { node, op, values: out }, Type::Bool))
        }

        Expr::Compare { node, left, ops, comparators } => {
            if ops.len() != 1 {
                diags
                    .bug("internal: chained comparison reached the type checker unrewritten", node.span())
                    .emit();
                return None;
            }
            let (left, lty) = synth_expr(ctx, diags, *left)?;
            let (right, rty) = synth_expr(ctx, diags, comparators.into_iter().next().unwrap())?;
            let op = ops[0];
            check_compare_operands(diags, &node.span(), op, &lty, &rty)?;
            Some((
                Expr::Compare {
                    node,
                    left: Box::new(left),
                    ops: vec![op],
                    comparators: vec![right],
                },
                Type::Bool,
            ))
        }

        Expr::Attribute { node, value, attr } => {
            let (value, vty) = synth_expr(ctx, diags, *value)?;
            match field_type(ctx, &vty, &attr) {
                Some(ty) => Some((Expr::Attribute { node, value: Box::new(value), attr }, ty)),
                None => {
                    diags
                        .error(format!("no field or method `{attr}` on type `{vty}`"), node.span())
                        .emit();
                    None
                }
            }
        }

        Expr::Subscript { node, value, index } => {
            let (value, vty) = synth_expr(ctx, diags, *value)?;
            let (index, ity) = synth_expr(ctx, diags, *index)?;
            if !ity.is_numeric() {
                diags
                    .error(format!("array index must be numeric, found `{ity}`"), index.span())
                    .emit();
                return None;
            }
            let Type::Array { elem, .. } = &vty else {
                diags
                    .error(format!("cannot index into non-array type `{vty}`"), node.span())
                    .emit();
                return None;
            };
            let elem = (**elem).clone();
            Some((
                Expr::Subscript { node, value: Box::new(value), index: Box::new(index) },
                elem,
            ))
        }

        Expr::Call { node, func, args } => synth_call(ctx, diags, node, *func, args),

        Expr::IfExp { node, .. } | Expr::NamedExpr { node, .. } => {
            diags
                .bug("internal: ternary/walrus expression reached the type checker unflattened", node.span())
                .emit();
            None
        }
    }
}

fn field_type(ctx: &Context, ty: &Type, name: &str) -> Option<Type> {
    if let Type::Struct { def, args } = ty {
        let info = ctx.globals.struct_info(*def)?;
        let (_, field_ty) = info.fields.iter().find(|(n, _)| n == name)?;
        return Some(substitute(field_ty, args));
    }
    None
}

fn numeric_rank(kind: NumericKind) -> u8 {
    match kind {
        NumericKind::Nat => 0,
        NumericKind::Int => 1,
        NumericKind::Float => 2,
    }
}

/// Unifies two numeric operand types, inserting a `__float__` coercion
/// call on whichever side is not already the winning kind. A side that
/// already synthesizes as the target kind is left untouched — coercion
/// insertion is idempotent.
fn coerce_numeric_pair(
    ctx: &Context,
    diags: &mut Diagnostics,
    left: Expr,
    lty: Type,
    right: Expr,
    rty: Type,
) -> Option<(Expr, Expr, NumericKind)> {
    let (Some(lk), Some(rk)) = (lty.numeric_kind(), rty.numeric_kind()) else {
        diags
            .error(
                format!("arithmetic requires numeric operands, found `{lty}` and `{rty}`"),
                left.span(),
            )
            .emit();
        return None;
    };
    let target = if numeric_rank(lk) >= numeric_rank(rk) { lk } else { rk };
    let left = coerce_to(ctx, diags, left, lk, target)?;
    let right = coerce_to(ctx, diags, right, rk, target)?;
    Some((left, right, target))
}

fn coerce_to(ctx: &Context, diags: &mut Diagnostics, expr: Expr, from: NumericKind, to: NumericKind) -> Option<Expr> {
    if from == to {
        return Some(expr);
    }
    if to != NumericKind::Float {
        diags
            .error(
                format!("cannot unify numeric types `{from}` and `{to}` without an explicit conversion"),
                expr.span(),
            )
            .emit();
        return None;
    }
    let key = TypeKey::Numeric(from);
    if !ctx.globals.has_method(key, "__float__") {
        diags
            .bug(format!("internal: no `__float__` registered for `{from}`"), expr.span())
            .emit();
        return None;
    }
    let node = expr.node().clone();
    Some(Expr::Call {
        node: node.clone(),
        func: Box::new(Expr::Attribute {
            node: node.clone(),
            value: Box::new(expr),
            attr: "__float__".to_string(),
        }),
        args: vec![],
    })
}

fn check_compare_operands(
    diags: &mut Diagnostics,
    span: &guppy_core::Span,
    op: CmpOp,
    lty: &Type,
    rty: &Type,
) -> Option<()> {
    match op {
        CmpOp::Eq | CmpOp::NotEq => {
            if lty != rty || lty.bound() == Bound::Any {
                diags
                    .error(format!("`==`/`!=` requires two equatable values of the same type, found `{lty}` and `{rty}`"), *span)
                    .emit();
                return None;
            }
        }
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            if !lty.is_numeric() || !rty.is_numeric() {
                diags
                    .error(format!("ordering comparison requires numeric operands, found `{lty}` and `{rty}`"), *span)
                    .emit();
                return None;
            }
        }
    }
    Some(())
}

fn synth_call(
    ctx: &mut Context,
    diags: &mut Diagnostics,
    node: guppy_core::ast::AstNode,
    func: Expr,
    args: Vec<Expr>,
) -> Option<(Expr, Type)> {
    let mut arg_exprs = Vec::with_capacity(args.len());
    let mut arg_tys = Vec::with_capacity(args.len());
    for a in args {
        let (a, t) = synth_expr(ctx, diags, a)?;
        arg_exprs.push(a);
        arg_tys.push(t);
    }

    // `receiver` holds the already-checked expression and synthesized type
    // of `value` in `value.attr(...)`, prepended to the argument list as
    // the signature's implicit first input.
    let (sig, attr_name, receiver) = match func {
        Expr::Attribute { value, attr, .. } => {
            let (value, vty) = synth_expr(ctx, diags, *value)?;
            let Some(key) = TypeKey::of(&vty) else {
                diags.error(format!("type `{vty}` has no methods"), node.span()).emit();
                return None;
            };
            let Some(def) = ctx.globals.lookup_method(key, &attr) else {
                diags.error(format!("no method `{attr}` on type `{vty}`"), node.span()).emit();
                return None;
            };
            let sig = ctx.globals.function(def)?.clone();
            (sig, attr, Some((value, vty)))
        }
        Expr::Name { id, .. } => {
            let Some(def) = ctx.globals.lookup_name(&id) else {
                diags.error(format!("undefined function `{id}`"), node.span()).emit();
                return None;
            };
            let sig = ctx.globals.function(def)?.clone();
            (sig, id, None)
        }
        other => {
            diags.error("expression is not callable", other.span()).emit();
            return None;
        }
    };

    let mut full_actual = Vec::with_capacity(arg_tys.len() + 1);
    if let Some((_, vty)) = &receiver {
        full_actual.push(vty.clone());
    }
    full_actual.extend(arg_tys.iter().cloned());

    let expected_arity = sig.inputs.len();
    let actual_arity = full_actual.len();
    if expected_arity != actual_arity {
        diags
            .error(format!("expected {expected_arity} argument(s), found {actual_arity}"), node.span())
            .emit();
        return None;
    }

    let out_tys = if sig.params.is_empty() {
        sig.outputs
    } else {
        match infer_args(&sig.params, &sig.inputs, &full_actual) {
            Some(callee_args) => sig.outputs.iter().map(|t| substitute(t, &callee_args)).collect(),
            None => {
                diags.error("could not infer generic arguments for this call", node.span()).emit();
                return None;
            }
        }
    };

    let func_expr = match receiver {
        Some((recv, _)) => Expr::Attribute {
            node: node.clone(),
            value: Box::new(recv),
            attr: attr_name,
        },
        None => Expr::Name { node: node.clone(), id: attr_name },
    };

    let result_ty = if out_tys.len() == 1 {
        out_tys.into_iter().next().unwrap()
    } else {
        Type::Tuple(out_tys)
    };
    Some((
        Expr::Call {
            node,
            func: Box::new(func_expr),
            args: arg_exprs,
        },
        result_ty,
    ))
}
