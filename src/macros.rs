//! Macro (template function) table.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Container;
use crate::error::Location;

/// A named, parameterized body declared with `:func name(a, b)`.
#[derive(Debug)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub body: Container,
    pub at: Location,
}

#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, Rc<Macro>>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later declarations replace earlier ones with the same name.
    pub fn insert(&mut self, declared: Macro) {
        if let Some(previous) = self.macros.get(&declared.name) {
            tracing::debug!(
                name = %declared.name,
                previous = %previous.at,
                at = %declared.at,
                "macro redeclared"
            );
        }
        self.macros.insert(declared.name.clone(), Rc::new(declared));
    }

    pub fn get(&self, name: &str) -> Option<Rc<Macro>> {
        self.macros.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Copies every macro of `other` into this table, replacing same-named ones.
    pub fn extend(&mut self, other: &MacroTable) {
        for (name, declared) in &other.macros {
            self.macros.insert(name.clone(), Rc::clone(declared));
        }
    }
}
