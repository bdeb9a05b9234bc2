//! Variable environment with snapshot scoping.
//!
//! Entering a scope copies the whole variable state onto a stack; leaving it
//! restores that copy, discarding every change made in between (including
//! variables introduced inside the scope).

use indexmap::IndexMap;

use crate::value::Value;

pub type Variables = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: Variables,
    snapshots: Vec<Variables>,
}

impl Scope {
    pub fn new(vars: Variables) -> Self {
        Self {
            vars,
            snapshots: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// `object.attribute`, routed through the object's attribute capability.
    pub fn get_path(&self, object: &str, attribute: &str) -> Option<Value> {
        self.vars.get(object)?.attribute(attribute)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn variables(&self) -> &Variables {
        &self.vars
    }

    /// Number of snapshots currently pushed.
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn push_snapshot(&mut self) {
        self.snapshots.push(self.vars.clone());
    }

    /// Restores the state saved by the matching [`Scope::push_snapshot`].
    ///
    /// # Panics
    ///
    /// Panics if no snapshot is pushed; pushes and pops must be balanced.
    pub fn pop_snapshot(&mut self) {
        match self.snapshots.pop() {
            Some(saved) => self.vars = saved,
            None => panic!("pop_snapshot called without a matching push_snapshot"),
        }
    }
}
