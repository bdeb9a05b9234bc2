//! `:for item in <expr>` ... `:end-for`

use crate::ast::{Container, Output, Statement};
use crate::context::Context;
use crate::error::{EvalError, Location, ParseError};
use crate::lexer::is_identifier;
use crate::parser::{BoxedStatement, Directive, ParseEnv};
use crate::value::{Record, Value};

/// Name of the per-iteration record bound inside the loop body.
pub const LOOP_VAR: &str = "loop";

#[derive(Debug)]
pub struct ForStatement {
    item: String,
    source: String,
    body: Container,
    at: Location,
}

pub fn build(directive: &Directive, body: Container, env: &ParseEnv<'_>) -> Result<BoxedStatement, ParseError> {
    let (item, source) = directive
        .args
        .split_once(" in ")
        .map(|(item, source)| (item.trim(), source.trim()))
        .ok_or_else(|| env.malformed(directive, "expected `<name> in <expression>`"))?;
    if !is_identifier(item) || item == LOOP_VAR {
        return Err(env.malformed(directive, format!("`{item}` cannot be a loop variable")));
    }
    if source.is_empty() {
        return Err(env.malformed(directive, "missing sequence expression"));
    }
    Ok(Box::new(ForStatement {
        item: item.to_string(),
        source: source.to_string(),
        body,
        at: directive.at.clone(),
    }))
}

impl Statement for ForStatement {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        let items = match ctx.evaluate(&self.source, &self.at)? {
            Value::Seq(items) => items,
            other => {
                return Err(EvalError::NotASequence {
                    at: self.at.clone(),
                    expr: self.source.clone(),
                    found: other.type_name(),
                }
                .into())
            }
        };

        let count = items.len();
        let mut out = String::new();
        let mut scope = ctx.enter_scope();
        for (index, item) in items.into_iter().enumerate() {
            let state = Record::named(LOOP_VAR)
                .with("index", index as i64)
                .with("count", count as i64)
                .with("first", index == 0)
                .with("last", index + 1 == count);
            scope.scope_mut().set(self.item.as_str(), item);
            scope.scope_mut().set(LOOP_VAR, Value::from(state));
            if let Some(text) = self.body.execute(&mut scope)? {
                out.push_str(&text);
            }
        }
        Ok(Some(out))
    }

    fn location(&self) -> &Location {
        &self.at
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, Rendered};
    use crate::error::{EvalError, RenderError};
    use crate::scope::Variables;
    use crate::value::Value;

    #[test]
    fn binds_loop_state() {
        let text = ":for x in ['a', 'b', 'c']\n{{ loop.index }}{{ x }}\n:if loop.last\ndone\n:end-if\n:end-for\n";
        let out = Engine::new().render("for.tmpl", text, Variables::new()).unwrap();
        assert_eq!(out, Rendered::Text("0a\n1b\n2c\ndone\n".into()));
    }

    #[test]
    fn body_bindings_do_not_leak() {
        let text = ":for x in [1, 2]\n:set inner = x\n:end-for\n{{ inner }}\n";
        let err = Engine::new().render("for.tmpl", text, Variables::new()).unwrap_err();
        assert!(matches!(err, RenderError::Eval(EvalError::UnknownVariable { ref name, .. }) if name == "inner"));
    }

    #[test]
    fn non_sequence_source_fails() {
        let mut vars = Variables::new();
        vars.insert("n".into(), Value::Int(3));
        let err = Engine::new()
            .render("for.tmpl", "\n:for x in n\n{{x}}\n:end-for\n", vars)
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::Eval(EvalError::NotASequence {
                at: crate::error::Location::new("for.tmpl", 2),
                expr: "n".into(),
                found: "integer",
            })
        );
    }

    #[test]
    fn malformed_header() {
        let err = Engine::new().parse("for.tmpl", ":for x of xs\n:end-for").unwrap_err();
        assert!(matches!(err, crate::error::ParseError::Malformed { .. }));
    }
}
