//! Literal text lines and inline `{{ expr }}` interpolation.

use crate::ast::{Output, Statement};
use crate::context::Context;
use crate::error::{EvalError, Location, ParseError};
use crate::lexer::{split_inline, Segment};
use crate::modifiers::Pipeline;
use crate::parser::{BoxedStatement, ParseEnv};
use crate::reader::Line;

/// Builds the node for a non-directive line.
pub fn text_line(line: &Line, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    let at = env.at(line);
    let interpolation = Interpolation::parse(&line.text, env, &at)?;
    if interpolation.is_literal() {
        return Ok(Box::new(TextLine {
            text: line.text.clone(),
            terminated: line.terminated,
            at,
        }));
    }
    Ok(Box::new(InlineLine {
        interpolation,
        terminated: line.terminated,
        at,
    }))
}

fn terminate(mut text: String, terminated: bool) -> String {
    if terminated {
        text.push('\n');
    }
    text
}

/// A line emitted as written.
#[derive(Debug)]
pub struct TextLine {
    text: String,
    terminated: bool,
    at: Location,
}

impl Statement for TextLine {
    fn execute(&self, _ctx: &mut Context<'_>) -> Output {
        Ok(Some(terminate(self.text.clone(), self.terminated)))
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

/// A line with at least one inline expression.
#[derive(Debug)]
pub struct InlineLine {
    interpolation: Interpolation,
    terminated: bool,
    at: Location,
}

impl Statement for InlineLine {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let text = self.interpolation.render(ctx, &self.at)?;
        Ok(Some(terminate(text, self.terminated)))
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Expr { expr: String, pipeline: Pipeline },
}

/// Text with embedded `{{ expr | modifier }}` segments, parsed once and
/// rendered on every execution.
#[derive(Debug, Clone)]
pub struct Interpolation {
    parts: Vec<Part>,
}

impl Interpolation {
    pub fn parse(text: &str, env: &ParseEnv<'_>, at: &Location) -> Result<Self, ParseError> {
        let config = env.config;
        let mut parts = Vec::new();
        for segment in split_inline(text, &config.inline_open, &config.inline_close) {
            match segment {
                Segment::Text(text) => parts.push(Part::Text(text.to_string())),
                Segment::Expr(inner) => {
                    let (expr, pipeline) = Pipeline::split(inner, env.modifiers, at)?;
                    parts.push(Part::Expr {
                        expr: expr.to_string(),
                        pipeline,
                    });
                }
            }
        }
        Ok(Self { parts })
    }

    /// No inline expressions at all.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|part| matches!(part, Part::Text(_)))
    }

    pub fn render(&self, ctx: &Context<'_>, at: &Location) -> Result<String, EvalError> {
        let eval = ctx.evaluator(at);
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Expr { expr, pipeline } => {
                    let value = pipeline.apply(eval.evaluate(expr)?, &eval)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}
