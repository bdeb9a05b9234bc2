//! `:spaceless` ... `:end-spaceless`

use crate::ast::{Container, Output, Statement};
use crate::context::Context;
use crate::error::{Location, ParseError};
use crate::parser::{BoxedStatement, Directive, ParseEnv};

/// Collapses every whitespace run of the rendered body, line breaks
/// included, into one space and trims the ends.
#[derive(Debug)]
pub struct Spaceless {
    body: Container,
    at: Location,
}

pub fn build(directive: &Directive, body: Container, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    if !directive.args.is_empty() {
        return Err(env.malformed(directive, "takes no arguments"));
    }
    Ok(Box::new(Spaceless {
        body,
        at: directive.at.clone(),
    }))
}

impl Statement for Spaceless {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        Ok(self
            .body
            .execute(ctx)?
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" ")))
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
    fn collapses_whitespace() {
        let text = "fn f(\n:spaceless\n    a: u8,\n\n    b:   u8\n:end-spaceless\n)\n";
        let out = Engine::new().render("s.tmpl", text, Variables::new()).unwrap();
        assert_eq!(out, Rendered::Text("fn f(\na: u8, b: u8)\n".into()));
    }
}
