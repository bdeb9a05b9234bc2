//! Author-facing control directives: `:console-log`, `:fatal-error`,
//! `:stop-render` and `:exclude-file`.

use crate::ast::{Output, Statement};
use crate::context::Context;
use crate::error::{DirectiveSignal, Location, ParseError};
use crate::modifiers::Pipeline;
use crate::parser::{BoxedStatement, Directive, ParseEnv};
use crate::statements::content::Interpolation;

/// Evaluates an expression and logs the result at info level.
#[derive(Debug)]
pub struct ConsoleLog {
    expr: String,
    pipeline: Pipeline,
    at: Location,
}

pub fn build_console_log(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    let (expr, pipeline) = Pipeline::split(&directive.args, env.modifiers, &directive.at)?;
    if expr.is_empty() {
        return Err(env.malformed(directive, "missing expression"));
    }
    Ok(Some(Box::new(ConsoleLog {
        expr: expr.to_string(),
        pipeline,
        at: directive.at.clone(),
    })))
}

impl Statement for ConsoleLog {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let eval = ctx.evaluator(&self.at);
        let value = self.pipeline.apply(eval.evaluate(&self.expr)?, &eval)?;
        tracing::info!(at = %self.at, "{value}");
        Ok(None)
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

/// Fails the render with an author-supplied message.
#[derive(Debug)]
pub struct FatalError {
    message: Interpolation,
    at: Location,
}

pub fn build_fatal_error(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    Ok(Some(Box::new(FatalError {
        message: Interpolation::parse(&directive.args, env, &directive.at)?,
        at: directive.at.clone(),
    })))
}

impl Statement for FatalError {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let message = self.message.render(ctx, &self.at)?;
        Err(DirectiveSignal::Fatal {
            at: self.at.clone(),
            message,
        }
        .into())
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stop,
    Exclude,
}

/// `:stop-render` or `:exclude-file`.
#[derive(Debug)]
pub struct Signal {
    kind: Kind,
    at: Location,
}

fn signal(kind: Kind, directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    if !directive.args.is_empty() {
        return Err(env.malformed(directive, "takes no arguments"));
    }
    Ok(Some(Box::new(Signal {
        kind,
        at: directive.at.clone(),
    })))
}

pub fn build_stop_render(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    signal(Kind::Stop, directive, env)
}

pub fn build_exclude_file(directive: &Directive, env: &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError> {
    signal(Kind::Exclude, directive, env)
}

impl Statement for Signal {
    fn execute(&self, _ctx: &mut Context<'_>) -> Output {
        let at = self.at.clone();
        Err(match self.kind {
            Kind::Stop => DirectiveSignal::StopRender { at },
            Kind::Exclude => DirectiveSignal::ExcludeFile { at },
        }
        .into())
    }

    fn location(&self) -> &Location {
        &self.at
    }
}
