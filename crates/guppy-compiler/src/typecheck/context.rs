//! Per-block checking context: the row of
//! locals visible at a point in the CFG, checked against a shared
//! `Globals` registry.

use guppy_core::variable::{Row, Variable};
use guppy_core::Globals;

pub struct Context<'g> {
    pub globals: &'g Globals,
    pub locals: Row,
}

impl<'g> Context<'g> {
    pub fn new(globals: &'g Globals, locals: Row) -> Self {
        Self { globals, locals }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.locals.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.locals.get_mut(name)
    }

    pub fn assign(&mut self, var: Variable) {
        self.locals.insert(var);
    }
}
