//! Per-render execution state.

use std::ops::{Deref, DerefMut};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EvalError, Location};
use crate::expr::Evaluator;
use crate::macros::MacroTable;
use crate::scope::Scope;
use crate::value::Value;

/// State owned by one in-flight render: the variable scope and the macros
/// visible to `call`.
pub struct Context<'e> {
    engine: &'e Engine,
    scope: Scope,
    macros: MacroTable,
    calls: usize,
}

impl<'e> Context<'e> {
    pub fn new(engine: &'e Engine, scope: Scope, macros: MacroTable) -> Self {
        Self {
            engine,
            scope,
            macros,
            calls: 0,
        }
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    pub fn config(&self) -> &'e EngineConfig {
        self.engine.config()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn into_scope(self) -> Scope {
        self.scope
    }

    pub fn evaluator<'c>(&'c self, at: &'c Location) -> Evaluator<'c> {
        Evaluator::new(&self.scope, self.engine.operators(), at)
    }

    pub fn evaluate(&self, expr: &str, at: &Location) -> Result<Value, EvalError> {
        self.evaluator(at).evaluate(expr)
    }

    pub fn condition(&self, expr: &str, at: &Location) -> Result<bool, EvalError> {
        self.evaluator(at).condition(expr)
    }

    /// Snapshots the scope; the snapshot is restored when the guard drops,
    /// on the error path as well.
    pub fn enter_scope(&mut self) -> ScopeGuard<'_, 'e> {
        self.scope.push_snapshot();
        ScopeGuard { ctx: self, call: false }
    }

    /// Like [`enter_scope`](Self::enter_scope), for the body of macro `name`.
    /// Fails once `max_call_depth` calls are already in flight.
    pub fn enter_call(&mut self, name: &str, at: &Location) -> Result<ScopeGuard<'_, 'e>, EvalError> {
        let limit = self.config().max_call_depth;
        if self.calls >= limit {
            return Err(EvalError::CallDepth {
                at: at.clone(),
                name: name.to_string(),
                limit,
            });
        }
        self.calls += 1;
        self.scope.push_snapshot();
        Ok(ScopeGuard { ctx: self, call: true })
    }

    /// Number of macro calls currently executing.
    pub fn call_depth(&self) -> usize {
        self.calls
    }
}

pub struct ScopeGuard<'c, 'e> {
    ctx: &'c mut Context<'e>,
    call: bool,
}

impl<'e> Deref for ScopeGuard<'_, 'e> {
    type Target = Context<'e>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        if self.call {
            self.ctx.calls -= 1;
        }
        self.ctx.scope.pop_snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_scope_on_every_exit() {
        let engine = Engine::new();
        let mut ctx = Context::new(&engine, Scope::default(), MacroTable::default());
        ctx.scope_mut().set("outer", Value::Int(1));

        let failed: Result<(), EvalError> = (|| {
            let mut inner = ctx.enter_scope();
            inner.scope_mut().set("outer", Value::Int(2));
            inner.scope_mut().set("local", Value::Int(3));
            inner.evaluate("missing", &Location::new("t", 1))?;
            Ok(())
        })();

        assert!(failed.is_err());
        assert_eq!(ctx.scope().get("outer"), Some(&Value::Int(1)));
        assert!(!ctx.scope().contains("local"));
        assert_eq!(ctx.scope().depth(), 0);
    }

    #[test]
    fn call_depth_is_bounded() {
        let engine = Engine::with_config(EngineConfig {
            max_call_depth: 2,
            ..EngineConfig::default()
        })
        .unwrap();
        let at = Location::new("t", 1);
        let mut ctx = Context::new(&engine, Scope::default(), MacroTable::default());
        {
            let mut first = ctx.enter_call("m", &at).unwrap();
            let mut second = first.enter_call("m", &at).unwrap();
            assert_eq!(second.call_depth(), 2);
            let err = second.enter_call("m", &at).err().unwrap();
            assert_eq!(
                err,
                EvalError::CallDepth { at: at.clone(), name: "m".into(), limit: 2 }
            );
        }
        assert_eq!(ctx.call_depth(), 0);
        assert_eq!(ctx.scope().depth(), 0);
    }
}
