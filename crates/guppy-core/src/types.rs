//! The Guppy type system.
//!
//! Types are plain recursive data (not interned): equality is structural,
//! and the function-body pipeline never compares enough types for interning
//! to matter.

use std::fmt;

/// Definition id for a user struct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructDefId(pub u32);

/// Definition id for an opaque (prelude/extension) type, e.g. `qubit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpaqueDefId(pub u32);

/// Definition id shared by functions, struct constructors, and prelude
/// symbols registered in `Globals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

/// Kind of numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Nat,
    Int,
    Float,
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericKind::Nat => write!(f, "nat"),
            NumericKind::Int => write!(f, "int"),
            NumericKind::Float => write!(f, "float"),
        }
    }
}

/// A type's linearity bound.
///
/// `linear = not Copyable`. `Eq` types additionally support `__eq__`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bound {
    Eq,
    Copyable,
    Any,
}

impl Bound {
    pub fn is_linear(self) -> bool {
        !matches!(self, Bound::Copyable)
    }
}

/// A constant appearing at the type level (e.g. an `Array` length).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Const {
    Nat(u64),
    /// A generic constant parameter, referred to by its de Bruijn index.
    Var(usize),
}

/// A formal generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    Type { bound: Bound },
    BoundedNat,
    Opaque { def: OpaqueDefId },
}

/// An instantiation of a `Parameter` at a call/construction site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    Type(Type),
    BoundedNat(Const),
    Opaque(OpaqueDefId),
}

/// The Guppy type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Numeric(NumericKind),
    None,
    Tuple(Vec<Type>),
    Function {
        inputs: Vec<Type>,
        outputs: Vec<Type>,
        params: Vec<Parameter>,
    },
    Struct {
        def: StructDefId,
        args: Vec<Argument>,
    },
    Opaque {
        def: OpaqueDefId,
        args: Vec<Argument>,
        bound: Bound,
    },
    Array {
        elem: Box<Type>,
        length: Const,
    },
    Var {
        index: usize,
        bound: Bound,
    },
}

impl Type {
    pub fn bound(&self) -> Bound {
        match self {
            Type::Bool | Type::Numeric(_) | Type::None => Bound::Copyable,
            Type::Tuple(elems) => elems
                .iter()
                .map(Type::bound)
                .max_by_key(|b| linearity_rank(*b))
                .unwrap_or(Bound::Copyable),
            Type::Function { .. } => Bound::Copyable,
            Type::Struct { .. } => Bound::Any,
            Type::Opaque { bound, .. } => *bound,
            Type::Array { elem, .. } => elem.bound(),
            Type::Var { bound, .. } => *bound,
        }
    }

    /// `linear = not Copyable`.
    pub fn is_linear(&self) -> bool {
        self.bound().is_linear()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Numeric(_))
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Type::Numeric(k) => Some(*k),
            _ => None,
        }
    }
}

/// `Copyable < Eq < Any` in the sense that a `Tuple`'s bound is the least
/// permissive (most linear) of its elements.
fn linearity_rank(bound: Bound) -> u8 {
    match bound {
        Bound::Copyable => 0,
        Bound::Eq => 1,
        Bound::Any => 2,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Numeric(k) => write!(f, "{k}"),
            Type::None => write!(f, "None"),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Function { inputs, outputs, .. } => {
                write!(f, "(")?;
                for (i, t) in inputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ") -> (")?;
                for (i, t) in outputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            Type::Struct { def, args } => write_generic(f, &format!("struct#{}", def.0), args),
            Type::Opaque { def, args, .. } => write_generic(f, &format!("opaque#{}", def.0), args),
            Type::Array { elem, length } => match length {
                Const::Nat(n) => write!(f, "array[{elem}, {n}]"),
                Const::Var(i) => write!(f, "array[{elem}, ?{i}]"),
            },
            Type::Var { index, .. } => write!(f, "?{index}"),
        }
    }
}

fn write_generic(f: &mut fmt::Formatter<'_>, name: &str, args: &[Argument]) -> fmt::Result {
    write!(f, "{name}")?;
    if !args.is_empty() {
        write!(f, "[")?;
        for (i, a) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match a {
                Argument::Type(t) => write!(f, "{t}")?,
                Argument::BoundedNat(Const::Nat(n)) => write!(f, "{n}")?,
                Argument::BoundedNat(Const::Var(i)) => write!(f, "?{i}")?,
                Argument::Opaque(d) => write!(f, "opaque#{}", d.0)?,
            }
        }
        write!(f, "]")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_bound_is_least_permissive_member() {
        let qubit = Type::Opaque {
            def: OpaqueDefId(0),
            args: vec![],
            bound: Bound::Any,
        };
        let t = Type::Tuple(vec![Type::Bool, qubit]);
        assert!(t.is_linear());
    }

    #[test]
    fn numeric_types_are_copyable() {
        assert!(!Type::Numeric(NumericKind::Int).is_linear());
        assert!(!Type::Bool.is_linear());
    }

    #[test]
    fn display_is_structural() {
        let t = Type::Array {
            elem: Box::new(Type::Numeric(NumericKind::Nat)),
            length: Const::Nat(4),
        };
        assert_eq!(t.to_string(), "array[nat, 4]");
    }
}
