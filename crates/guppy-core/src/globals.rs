//! The `Globals` registry: prelude/extension definitions and
//! the static dunder-dispatch table, built once per module and passed by
//! reference into every checker rather than kept as mutable global state.

use crate::types::{Bound, DefId, NumericKind, OpaqueDefId, Parameter, StructDefId, Type};
use std::collections::HashMap;

/// Identifies a type for the purposes of instance-method ("dunder")
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Bool,
    Numeric(NumericKind),
    Struct(StructDefId),
    Opaque(OpaqueDefId),
}

impl TypeKey {
    /// Returns `None` for types with no fixed identity to dispatch on
    /// (tuples, functions, arrays, type variables).
    pub fn of(ty: &Type) -> Option<TypeKey> {
        match ty {
            Type::Bool => Some(TypeKey::Bool),
            Type::Numeric(k) => Some(TypeKey::Numeric(*k)),
            Type::Struct { def, .. } => Some(TypeKey::Struct(*def)),
            Type::Opaque { def, .. } => Some(TypeKey::Opaque(*def)),
            _ => None,
        }
    }
}

/// A registered function signature, generic over `params`.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub def: DefId,
    pub name: String,
    pub params: Vec<Parameter>,
    pub inputs: Vec<Type>,
    pub outputs: Vec<Type>,
}

/// A registered struct definition.
#[derive(Debug, Clone)]
pub struct StructInfo {
    pub def: StructDefId,
    pub name: String,
    pub params: Vec<Parameter>,
    pub fields: Vec<(String, Type)>,
}

/// A registered opaque (prelude/extension) type, e.g. `qubit`, `array`.
#[derive(Debug, Clone)]
pub struct OpaqueInfo {
    pub def: OpaqueDefId,
    pub name: String,
    pub params: Vec<Parameter>,
    pub bound: Bound,
}

/// Prelude/module-level definitions plus the dunder dispatch table.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    functions: HashMap<DefId, FunctionSig>,
    structs: HashMap<StructDefId, StructInfo>,
    opaques: HashMap<OpaqueDefId, OpaqueInfo>,
    names: HashMap<String, DefId>,
    /// `impls: TypeKey → (method name → DefId)`, a static lookup table
    /// with no runtime method-resolution order.
    impls: HashMap<TypeKey, HashMap<String, DefId>>,
    next_def: u32,
    next_struct: u32,
    next_opaque: u32,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `Globals` with the numeric coercion methods the checker's
    /// `__float__` insertion relies on already registered, mirroring
    /// `guppylang.std`'s numeric tower (`nat -> int -> float`).
    ///
    /// A real module's `Globals` would additionally hold its own function
    /// and struct definitions; this only seeds the prelude every function
    /// body implicitly depends on.
    pub fn prelude() -> Self {
        let mut g = Self::new();
        for kind in [NumericKind::Nat, NumericKind::Int] {
            let def = g.fresh_def_id();
            g.register_function(FunctionSig {
                def,
                name: format!("{kind}.__float__"),
                params: vec![],
                inputs: vec![Type::Numeric(kind)],
                outputs: vec![Type::Numeric(NumericKind::Float)],
            });
            g.register_impl(TypeKey::Numeric(kind), "__float__", def);
        }
        let qubit = g.fresh_opaque_id();
        g.register_opaque(OpaqueInfo {
            def: qubit,
            name: "qubit".to_string(),
            params: vec![],
            bound: Bound::Any,
        });
        g
    }

    pub fn fresh_def_id(&mut self) -> DefId {
        let id = DefId(self.next_def);
        self.next_def += 1;
        id
    }

    pub fn fresh_struct_id(&mut self) -> StructDefId {
        let id = StructDefId(self.next_struct);
        self.next_struct += 1;
        id
    }

    pub fn fresh_opaque_id(&mut self) -> OpaqueDefId {
        let id = OpaqueDefId(self.next_opaque);
        self.next_opaque += 1;
        id
    }

    pub fn register_function(&mut self, sig: FunctionSig) {
        self.names.insert(sig.name.clone(), sig.def);
        self.functions.insert(sig.def, sig);
    }

    pub fn register_struct(&mut self, info: StructInfo) {
        self.structs.insert(info.def, info);
    }

    pub fn register_opaque(&mut self, info: OpaqueInfo) {
        self.opaques.insert(info.def, info);
    }

    /// Registers an instance method reachable via `<receiver>.<name>(...)`.
    pub fn register_impl(&mut self, on: TypeKey, name: impl Into<String>, def: DefId) {
        self.impls.entry(on).or_default().insert(name.into(), def);
    }

    pub fn lookup_name(&self, name: &str) -> Option<DefId> {
        self.names.get(name).copied()
    }

    pub fn function(&self, def: DefId) -> Option<&FunctionSig> {
        self.functions.get(&def)
    }

    pub fn struct_info(&self, def: StructDefId) -> Option<&StructInfo> {
        self.structs.get(&def)
    }

    pub fn opaque_info(&self, def: OpaqueDefId) -> Option<&OpaqueInfo> {
        self.opaques.get(&def)
    }

    /// Looks an opaque type up by its surface name, e.g. `"qubit"`.
    pub fn opaque_by_name(&self, name: &str) -> Option<&OpaqueInfo> {
        self.opaques.values().find(|o| o.name == name)
    }

    /// Looks a struct type up by its surface name.
    pub fn struct_by_name(&self, name: &str) -> Option<&StructInfo> {
        self.structs.values().find(|s| s.name == name)
    }

    /// Static dunder-method lookup: the receiver's syntactic type
    /// determines the method, never a runtime class hierarchy.
    pub fn lookup_method(&self, on: TypeKey, name: &str) -> Option<DefId> {
        self.impls.get(&on)?.get(name).copied()
    }

    pub fn has_method(&self, on: TypeKey, name: &str) -> bool {
        self.lookup_method(on, name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_dispatch_is_static_per_type() {
        let mut g = Globals::new();
        let def = g.fresh_def_id();
        g.register_impl(TypeKey::Numeric(NumericKind::Int), "__float__", def);
        assert_eq!(g.lookup_method(TypeKey::Numeric(NumericKind::Int), "__float__"), Some(def));
        assert_eq!(g.lookup_method(TypeKey::Numeric(NumericKind::Nat), "__float__"), None);
    }

    #[test]
    fn prelude_registers_float_coercion_for_nat_and_int() {
        let g = Globals::prelude();
        assert!(g.has_method(TypeKey::Numeric(NumericKind::Nat), "__float__"));
        assert!(g.has_method(TypeKey::Numeric(NumericKind::Int), "__float__"));
        assert!(!g.has_method(TypeKey::Numeric(NumericKind::Float), "__float__"));
    }

    #[test]
    fn prelude_registers_qubit_as_a_linear_opaque_type() {
        let g = Globals::prelude();
        let qubit = g.opaque_by_name("qubit").expect("qubit registered");
        assert_eq!(qubit.bound, Bound::Any);
        assert!(g.struct_by_name("qubit").is_none());
    }

    #[test]
    fn struct_and_opaque_ids_are_independent_namespaces() {
        let mut g = Globals::new();
        let s = g.fresh_struct_id();
        let o = g.fresh_opaque_id();
        assert_eq!(s.0, 0);
        assert_eq!(o.0, 0);
    }
}
