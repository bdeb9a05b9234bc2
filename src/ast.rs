//! The statement tree built by the parser.

use std::fmt;

use crate::context::Context;
use crate::error::{EvalError, Location, RenderError};

/// Output of executing a statement: `None` when it produced no content.
pub type Output = Result<Option<String>, RenderError>;

/// A node of the statement tree.
///
/// Nodes are immutable once parsed and may be executed any number of times.
pub trait Statement: fmt::Debug {
    fn execute(&self, ctx: &mut Context<'_>) -> Output;

    fn location(&self) -> &Location;
}

/// An ordered list of statements, executed in document order.
#[derive(Debug, Default)]
pub struct Container {
    statements: Vec<Box<dyn Statement>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Box<dyn Statement>) {
        self.statements.push(statement);
    }

    pub fn prepend(&mut self, statements: Vec<Box<dyn Statement>>) {
        self.statements.splice(0..0, statements);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Concatenates the output of every child. Returns `None` only if no
    /// child produced content.
    pub fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let mut output: Option<String> = None;
        for statement in &self.statements {
            if let Some(text) = statement.execute(ctx)? {
                output.get_or_insert_with(String::new).push_str(&text);
            }
        }
        Ok(output)
    }
}

/// A directive whose keyword matched nothing in the registry.
///
/// Directly inside a multi-block statement an unknown keyword is a parse
/// error, so placeholders only appear at top level and in ordinary block
/// bodies. Executing one is an error.
#[derive(Debug)]
pub struct Unidentified {
    pub at: Location,
    pub keyword: String,
    pub text: String,
}

impl Statement for Unidentified {
    fn execute(&self, _ctx: &mut Context<'_>) -> Output {
        Err(EvalError::Unidentified {
            at: self.at.clone(),
            keyword: self.keyword.clone(),
            text: self.text.clone(),
        }
        .into())
    }

    fn location(&self) -> &Location {
        &self.at
    }
}
