//! Variables and rows.

use crate::ast::AstNode;
use crate::types::Type;
use indexmap::IndexMap;

/// A local variable as tracked by the program analyses and type checker.
///
/// `defined_at` holds every assigning node that can reach this use of the
/// variable (a single name may be (re)assigned at several points along
/// different paths); `used` is set once the linearity checker has observed
/// a consuming use.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub defined_at: Vec<AstNode>,
    pub used: Option<AstNode>,
    /// `false` for a parameter passed by borrow (no `@owned` annotation):
    /// the linearity checker rejects reassigning such a name at all, since
    /// the caller expects the original value back unchanged.
    pub owned: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, defined_at: AstNode) -> Self {
        Self {
            name: name.into(),
            ty,
            defined_at: vec![defined_at],
            used: None,
            owned: true,
        }
    }

    /// A linear parameter passed by borrow rather than by ownership
    /// transfer (the default for a linear-typed parameter with no
    /// `@owned` annotation).
    pub fn borrowed(name: impl Into<String>, ty: Type, defined_at: AstNode) -> Self {
        Self { owned: false, ..Self::new(name, ty, defined_at) }
    }

    /// A temporary or return-slot name is CFG-introduced rather than
    /// user-written; these render as "Expression" rather than by name in
    /// row-reconciliation diagnostics.
    pub fn is_synthetic(&self) -> bool {
        self.name.starts_with('%')
    }

    pub fn is_linear(&self) -> bool {
        self.ty.is_linear()
    }

    pub fn is_used(&self) -> bool {
        self.used.is_some()
    }
}

/// An ordered collection of live variables at a point in the CFG: an
/// ordered list plus a name index, so joins can walk both rows in
/// lockstep and an individual variable can be looked up without a linear
/// scan.
#[derive(Debug, Clone, Default)]
pub struct Row {
    vars: Vec<Variable>,
    index: IndexMap<String, usize>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            index: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.vars[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.vars[i]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Inserts or overwrites (by name) a variable, preserving the position
    /// of an existing entry so row order reflects first-definition order.
    pub fn insert(&mut self, var: Variable) {
        match self.index.get(&var.name) {
            Some(&i) => self.vars[i] = var,
            None => {
                self.index.insert(var.name.clone(), self.vars.len());
                self.vars.push(var);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.vars.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.name.as_str())
    }

    /// Builds a row containing only the given names, in the order they
    /// appear in `self` (used to compute a basic block's output row as the
    /// subset of live-after variables).
    pub fn filter_live<'a>(&self, live: impl Iterator<Item = &'a str>) -> Row {
        let wanted: std::collections::HashSet<&str> = live.collect();
        let mut out = Row::new();
        for v in &self.vars {
            if wanted.contains(v.name.as_str()) {
                out.insert(v.clone());
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

impl FromIterator<Variable> for Row {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        let mut row = Row::new();
        for v in iter {
            row.insert(v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::node_at;
    use crate::types::Type;

    #[test]
    fn row_preserves_insertion_order() {
        let mut row = Row::new();
        row.insert(Variable::new("b", Type::Bool, node_at(0)));
        row.insert(Variable::new("a", Type::Bool, node_at(1)));
        let names: Vec<_> = row.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn reinsert_overwrites_in_place() {
        let mut row = Row::new();
        row.insert(Variable::new("x", Type::Bool, node_at(0)));
        row.insert(Variable::new("y", Type::Bool, node_at(1)));
        row.insert(Variable::new("x", Type::Numeric(crate::types::NumericKind::Int), node_at(2)));
        let names: Vec<_> = row.names().collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(row.get("x").unwrap().ty, Type::Numeric(crate::types::NumericKind::Int));
    }

    #[test]
    fn synthetic_names_are_tmp_prefixed() {
        let v = Variable::new("%tmp0", Type::Bool, node_at(0));
        assert!(v.is_synthetic());
        let v2 = Variable::new("x", Type::Bool, node_at(0));
        assert!(!v2.is_synthetic());
    }
}
