//! Assignment: `:set`, `:set-str` and front-matter entries.
//!
//! ```text
//! :set name = <expr> [| modifier[(args)]]*
//! :set object.attribute = <expr>
//! :set name [| modifiers]        block form, value is the trimmed body
//! ...
//! :end-set
//! :set-str name = text with {{ inline }} expressions
//! ```

use crate::ast::{Container, Output, Statement};
use crate::context::Context;
use crate::error::{EvalError, Location, ParseError};
use crate::lexer::is_identifier;
use crate::modifiers::Pipeline;
use crate::parser::{BoxedStatement, Directive, ParseEnv};
use crate::reader::Line;
use crate::statements::content::Interpolation;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Var(String),
    /// `object.attribute`; `object` may itself be a dotted path.
    Attr { object: String, attribute: String },
}

impl Target {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.split('.').all(is_identifier) {
            return None;
        }
        Some(match text.rsplit_once('.') {
            Some((object, attribute)) => Target::Attr {
                object: object.to_string(),
                attribute: attribute.to_string(),
            },
            None => Target::Var(text.to_string()),
        })
    }

    fn path(&self) -> String {
        match self {
            Target::Var(name) => name.clone(),
            Target::Attr { object, attribute } => format!("{object}.{attribute}"),
        }
    }
}

#[derive(Debug)]
enum SetValue {
    Expr(String),
    Text(Interpolation),
    Body { body: Container, trim: bool },
}

#[derive(Debug)]
pub struct SetStatement {
    target: Target,
    value: SetValue,
    pipeline: Pipeline,
    at: Location,
}

/// Splits `target = value` at the first `=` that is not part of a
/// comparison operator.
fn split_assignment(args: &str) -> Option<(&str, &str)> {
    let bytes = args.as_bytes();
    let idx = (0..bytes.len()).find(|&i| {
        bytes[i] == b'='
            && !matches!(i.checked_sub(1).map(|p| bytes[p]), Some(b'=' | b'!' | b'<' | b'>'))
            && bytes.get(i + 1) != Some(&b'=')
    })?;
    Some((args[..idx].trim(), args[idx + 1..].trim()))
}

fn target(directive: &Directive, text: &str, env: &ParseEnv<'_>) -> Result<Target, ParseError> {
    Target::parse(text).ok_or_else(|| env.malformed(directive, format!("`{text}` is not an assignable name")))
}

pub fn build_line(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    let Some((lhs, rhs)) = split_assignment(&directive.args) else {
        return Ok(None);
    };
    let target = target(directive, lhs, env)?;
    let (expr, pipeline) = Pipeline::split(rhs, env.modifiers, &directive.at)?;
    if expr.is_empty() {
        return Err(env.malformed(directive, "missing value"));
    }
    Ok(Some(Box::new(SetStatement {
        target,
        value: SetValue::Expr(expr.to_string()),
        pipeline,
        at: directive.at.clone(),
    })))
}

pub fn build_block(directive: &Directive, body: Container, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    block(directive, body, true, env)
}

pub fn build_str_line(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    let Some((lhs, rhs)) = split_assignment(&directive.args) else {
        return Ok(None);
    };
    let target = target(directive, lhs, env)?;
    Ok(Some(Box::new(SetStatement {
        target,
        value: SetValue::Text(Interpolation::parse(rhs, env, &directive.at)?),
        pipeline: Pipeline::default(),
        at: directive.at.clone(),
    })))
}

/// Block `set-str` keeps the body as rendered, minus its final line break.
pub fn build_str_block(directive: &Directive, body: Container, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    block(directive, body, false, env)
}

fn block(directive: &Directive, body: Container, trim: bool, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    let (lhs, pipeline) = Pipeline::split(&directive.args, env.modifiers, &directive.at)?;
    if lhs.is_empty() {
        return Err(env.malformed(directive, "missing assignment target"));
    }
    Ok(Box::new(SetStatement {
        target: target(directive, lhs, env)?,
        value: SetValue::Body { body, trim },
        pipeline,
        at: directive.at.clone(),
    }))
}

/// A `name: <expr>` line of the front matter, assigned like a line `set`.
pub fn front_matter_entry(line: &Line, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    let at = env.at(line);
    let malformed = |reason: &str| ParseError::Malformed {
        at: at.clone(),
        keyword: env.config.front_matter_fence.clone(),
        text: line.trimmed().to_string(),
        reason: reason.to_string(),
    };

    let (name, rhs) = line
        .trimmed()
        .split_once(':')
        .ok_or_else(|| malformed("expected `name: <expression>`"))?;
    let target = Target::parse(name).ok_or_else(|| malformed("invalid variable name"))?;
    let (expr, pipeline) = Pipeline::split(rhs, env.modifiers, &at)?;
    if expr.is_empty() {
        return Err(malformed("missing value"));
    }
    Ok(Box::new(SetStatement {
        target,
        value: SetValue::Expr(expr.to_string()),
        pipeline,
        at,
    }))
}

impl SetStatement {
    fn assign(&self, ctx: &mut Context<'_>, value: Value) -> Result<(), EvalError> {
        match &self.target {
            Target::Var(name) => {
                let config = ctx.config();
                if !value.is_nil() {
                    ctx.scope_mut().set(name.as_str(), value);
                } else if *name == config.working_dir_var {
                    let reset = Value::Str(config.working_dir_default.clone());
                    ctx.scope_mut().set(name.as_str(), reset);
                } else {
                    ctx.scope_mut().remove(name);
                }
                Ok(())
            }
            Target::Attr { object, attribute } => {
                let holder = ctx.evaluator(&self.at).reference(object, &self.target.path())?;
                let assigned = match &holder {
                    Value::Object(target) => target.set_attribute(attribute, value),
                    _ => false,
                };
                if assigned {
                    Ok(())
                } else {
                    Err(EvalError::NotAssignable {
                        at: self.at.clone(),
                        attribute: self.target.path(),
                        found: match &holder {
                            Value::Object(target) => target.type_name().to_string(),
                            other => other.type_name().to_string(),
                        },
                    })
                }
            }
        }
    }
}

impl Statement for SetStatement {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let value = match &self.value {
            SetValue::Expr(expr) => ctx.evaluate(expr, &self.at)?,
            SetValue::Text(text) => Value::Str(text.render(ctx, &self.at)?),
            SetValue::Body { body, trim } => {
                let text = body.execute(ctx)?.unwrap_or_default();
                let text = if *trim {
                    text.trim()
                } else {
                    text.strip_suffix('\n').unwrap_or(&text)
                };
                Value::Str(text.to_string())
            }
        };
        let value = self.pipeline.apply(value, &ctx.evaluator(&self.at))?;
        self.assign(ctx, value)?;
        Ok(None)
    }

    fn location(&self) -> &Location {
        &self.at
    }
}
