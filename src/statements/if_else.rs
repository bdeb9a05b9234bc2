//! `:if` / `:elseif` / `:else` / `:end-if`

use crate::ast::{Container, Output, Statement};
use crate::context::Context;
use crate::error::{Location, ParseError};
use crate::parser::{BoxedStatement, Directive, ParseEnv, Section};

#[derive(Debug)]
struct Branch {
    condition: String,
    at: Location,
    body: Container,
}

/// A conditional chain. At most one section runs per execution: the first
/// branch whose condition holds, else the `else` body if there is one.
#[derive(Debug)]
pub struct IfStatement {
    branches: Vec<Branch>,
    otherwise: Option<Container>,
    at: Location,
}

pub fn build(
    directive: &Directive,
    primary: Container,
    sections: Vec<Section>,
    env: &ParseEnv<'_>,
) -> Result<BoxedStatement, ParseError> {
    if directive.args.is_empty() {
        return Err(env.malformed(directive, "missing condition"));
    }
    let mut branches = vec![Branch {
        condition: directive.args.clone(),
        at: directive.at.clone(),
        body: primary,
    }];
    let mut otherwise = None;

    for section in sections {
        match section.keyword.as_str() {
            "elseif" => {
                if section.header.args.is_empty() {
                    return Err(env.malformed(&section.header, "missing condition"));
                }
                branches.push(Branch {
                    condition: section.header.args.clone(),
                    at: section.header.at.clone(),
                    body: section.body,
                });
            }
            _ => {
                if !section.header.args.is_empty() {
                    return Err(env.malformed(&section.header, "`else` takes no condition"));
                }
                otherwise = Some(section.body);
            }
        }
    }

    Ok(Box::new(IfStatement {
        branches,
        otherwise,
        at: directive.at.clone(),
    }))
}

impl Statement for IfStatement {
    fn execute(&self, ctx: &mut Context<'_>) -> Output {
        for branch in &self.branches {
            if ctx.condition(&branch.condition, &branch.at)? {
                return branch.body.execute(ctx);
            }
        }
        match &self.otherwise {
            Some(body) => body.execute(ctx),
            None => Ok(None),
        }
    }

    fn location(&self) -> &Location {
        &self.at
    }
}
