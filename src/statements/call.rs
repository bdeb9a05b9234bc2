//! `:call name(arg: <expr>, ...)`

use crate::ast::{Output, Statement};
use crate::context::Context;
use crate::error::{EvalError, Location, ParseError};
use crate::lexer::{is_identifier, split_top_level};
use crate::parser::{BoxedStatement, Directive, ParseEnv};
use crate::value::Value;

#[derive(Debug)]
pub struct CallStatement {
    name: String,
    args: Vec<(String, String)>,
    at: Location,
}

pub fn build(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    let text = directive.args.as_str();
    let (name, inner) = match text.find('(') {
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| env.malformed(directive, "unclosed argument list"))?;
            (text[..open].trim(), inner.trim())
        }
        None => (text, ""),
    };
    if !is_identifier(name) {
        return Err(env.malformed(directive, "expected `name(arg: <expression>, ...)`"));
    }

    let mut args = Vec::new();
    if !inner.is_empty() {
        for arg in split_top_level(inner, ',') {
            let (param, expr) = arg
                .split_once(':')
                .map(|(param, expr)| (param.trim(), expr.trim()))
                .filter(|(param, expr)| is_identifier(param) && !expr.is_empty())
                .ok_or_else(|| {
                    env.malformed(directive, format!("expected `name: <expression>`, found `{}`", arg.trim()))
                })?;
            args.push((param.to_string(), expr.to_string()));
        }
    }

    Ok(Some(Box::new(CallStatement {
        name: name.to_string(),
        args,
        at: directive.at.clone(),
    })))
}

impl Statement for CallStatement {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let declared = ctx.macros().get(&self.name).ok_or_else(|| EvalError::UnknownMacro {
            at: self.at.clone(),
            name: self.name.clone(),
        })?;

        let values = self
            .args
            .iter()
            .map(|(param, expr)| Ok((param.as_str(), ctx.evaluate(expr, &self.at)?)))
            .collect::<Result<Vec<_>, EvalError>>()?;

        tracing::trace!(name = %self.name, at = %self.at, args = values.len(), "calling macro");
        let mut scope = ctx.enter_call(&self.name, &self.at)?;
        for param in &declared.params {
            if !values.iter().any(|(name, _)| name == param) {
                scope.scope_mut().set(param.as_str(), Value::Nil);
            }
        }
        for (param, value) in values {
            if !declared.params.iter().any(|p| p == param) {
                tracing::debug!(name = %self.name, param, at = %self.at, "argument is not a declared parameter");
            }
            scope.scope_mut().set(param, value);
        }
        declared.body.execute(&mut scope)
    }

    fn location(&self) -> &Location {
        &self.at
    }
}
