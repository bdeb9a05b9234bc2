//! `:raw` ... `:end-raw`: lines emitted without parsing.
//!
//! The body is read with the line reader's block read, so blank and comment
//! lines inside it are dropped like everywhere else.

use crate::ast::{Output, Statement};
use crate::context::Context;
use crate::error::{Location, ParseError};
use crate::parser::{BoxedStatement, Directive, ParseEnv};
use crate::reader::Line;

#[derive(Debug)]
pub struct Verbatim {
    text: String,
    at: Location,
}

pub fn build(directive: &Directive, lines: Vec<Line>, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    if !directive.args.is_empty() {
        return Err(env.malformed(directive, "takes no arguments"));
    }
    let mut text = String::new();
    for line in &lines {
        text.push_str(&line.text);
        if line.terminated {
            text.push('\n');
        }
    }
    Ok(Box::new(Verbatim {
        text,
        at: directive.at.clone(),
    }))
}

impl Statement for Verbatim {
    fn execute(&self, _ctx: &mut Context<'_>) -> Output {
        if self.text.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.text.clone()))
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, Rendered};
    use crate::scope::Variables;

    #[test]
    fn emits_directives_and_expressions_untouched() {
        let text = ":raw\n:if x\n{{ y }}\n:end-raw\nafter\n";
        let out = Engine::new().render("raw.tmpl", text, Variables::new()).unwrap();
        assert_eq!(out, Rendered::Text(":if x\n{{ y }}\nafter\n".into()));
    }

    #[test]
    fn unterminated() {
        let err = Engine::new().parse("raw.tmpl", ":raw\nabc\n").unwrap_err();
        assert!(matches!(err, crate::error::ParseError::Unterminated { ref expected, .. } if expected == "end-raw"));
    }
}
