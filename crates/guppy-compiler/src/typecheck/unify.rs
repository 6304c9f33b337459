//! Generic instantiation: substituting a function's formal
//! `Parameter`s with concrete `Argument`s, and inferring those arguments
//! from a call site's actual argument types when they are not given
//! explicitly (e.g. `Array[T, N]`'s `N` inferred from the array value
//! passed in).

use guppy_core::types::{Argument, Const, Parameter, Type};

/// Replaces every `Type::Var`/`Const::Var` in `ty` with the corresponding
/// entry of `args`.
pub fn substitute(ty: &Type, args: &[Argument]) -> Type {
    match ty {
        Type::Var { index, .. } => match args.get(*index) {
            Some(Argument::Type(t)) => t.clone(),
            _ => ty.clone(),
        },
        Type::Tuple(elems) => Type::Tuple(elems.iter().map(|t| substitute(t, args)).collect()),
        Type::Function { inputs, outputs, params } => Type::Function {
            inputs: inputs.iter().map(|t| substitute(t, args)).collect(),
            outputs: outputs.iter().map(|t| substitute(t, args)).collect(),
            params: params.clone(),
        },
        Type::Struct { def, args: sargs } => Type::Struct {
            def: *def,
            args: sargs.iter().map(|a| substitute_arg(a, args)).collect(),
        },
        Type::Opaque { def, args: oargs, bound } => Type::Opaque {
            def: *def,
            args: oargs.iter().map(|a| substitute_arg(a, args)).collect(),
            bound: *bound,
        },
        Type::Array { elem, length } => Type::Array {
            elem: Box::new(substitute(elem, args)),
            length: substitute_const(length, args),
        },
        Type::Bool | Type::Numeric(_) | Type::None => ty.clone(),
    }
}

fn substitute_arg(arg: &Argument, args: &[Argument]) -> Argument {
    match arg {
        Argument::Type(t) => Argument::Type(substitute(t, args)),
        Argument::BoundedNat(c) => Argument::BoundedNat(substitute_const(c, args)),
        Argument::Opaque(d) => Argument::Opaque(*d),
    }
}

fn substitute_const(c: &Const, args: &[Argument]) -> Const {
    match c {
        Const::Var(i) => match args.get(*i) {
            Some(Argument::BoundedNat(c2)) => c2.clone(),
            _ => c.clone(),
        },
        Const::Nat(_) => c.clone(),
    }
}

/// Attempts to infer the `Argument` for each of `params` from matching
/// `expected` (the generic signature's formal input types) against
/// `actual` (the synthesized types of the call's arguments), positionally.
///
/// Returns `None` if two occurrences of the same parameter infer
/// conflicting arguments, or a parameter is never mentioned in `expected`
/// and so cannot be inferred.
pub fn infer_args(params: &[Parameter], expected: &[Type], actual: &[Type]) -> Option<Vec<Argument>> {
    let mut slots: Vec<Option<Argument>> = vec![None; params.len()];
    if expected.len() != actual.len() {
        return None;
    }
    for (e, a) in expected.iter().zip(actual.iter()) {
        unify_one(e, a, &mut slots)?;
    }
    slots.into_iter().collect()
}

fn unify_one(expected: &Type, actual: &Type, slots: &mut [Option<Argument>]) -> Option<()> {
    match (expected, actual) {
        (Type::Var { index, .. }, _) => bind(slots, *index, Argument::Type(actual.clone())),
        (Type::Tuple(es), Type::Tuple(as_)) if es.len() == as_.len() => {
            for (e, a) in es.iter().zip(as_.iter()) {
                unify_one(e, a, slots)?;
            }
            Some(())
        }
        (Type::Array { elem: ee, length: el }, Type::Array { elem: ae, length: al }) => {
            unify_one(ee, ae, slots)?;
            if let Const::Var(i) = el {
                bind(slots, *i, Argument::BoundedNat(al.clone()))?;
            } else if el != al {
                return None;
            }
            Some(())
        }
        (Type::Struct { def: ed, args: eargs }, Type::Struct { def: ad, args: aargs })
            if ed == ad && eargs.len() == aargs.len() =>
        {
            Some(())
        }
        (Type::Opaque { def: ed, .. }, Type::Opaque { def: ad, .. }) if ed == ad => Some(()),
        _ if expected == actual => Some(()),
        _ => None,
    }
}

fn bind(slots: &mut [Option<Argument>], index: usize, value: Argument) -> Option<()> {
    match slots.get(index) {
        Some(Some(existing)) if *existing == value => Some(()),
        Some(Some(_)) => None,
        Some(None) => {
            slots[index] = Some(value);
            Some(())
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guppy_core::types::{Bound, NumericKind};

    #[test]
    fn infers_array_length_from_actual_type() {
        let params = vec![Parameter::Type { bound: Bound::Copyable }, Parameter::BoundedNat];
        let expected = vec![Type::Array {
            elem: Box::new(Type::Var { index: 0, bound: Bound::Copyable }),
            length: Const::Var(1),
        }];
        let actual = vec![Type::Array {
            elem: Box::new(Type::Numeric(NumericKind::Nat)),
            length: Const::Nat(3),
        }];
        let args = infer_args(&params, &expected, &actual).unwrap();
        assert_eq!(args[0], Argument::Type(Type::Numeric(NumericKind::Nat)));
        assert_eq!(args[1], Argument::BoundedNat(Const::Nat(3)));
    }

    #[test]
    fn conflicting_instantiations_fail() {
        let params = vec![Parameter::Type { bound: Bound::Copyable }];
        let var = Type::Var { index: 0, bound: Bound::Copyable };
        let expected = vec![var.clone(), var];
        let actual = vec![Type::Bool, Type::Numeric(NumericKind::Int)];
        assert!(infer_args(&params, &expected, &actual).is_none());
    }
}
