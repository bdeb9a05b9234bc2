//! Modifier registry and modifier pipelines (`value | trim | default("x")`).
//!
//! Pipelines are resolved against the registry while the template is parsed,
//! so an unknown modifier or a wrong argument count is a parse error. Argument
//! expressions are evaluated each time the pipeline runs.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

use crate::error::{EvalError, Location, ModifierError, ParseError};
use crate::expr::Evaluator;
use crate::lexer::split_top_level;
use crate::value::Value;

pub type ModifierFn = dyn Fn(Value, &[Value]) -> Result<Value, ModifierError>;

pub struct Modifier {
    name: String,
    arity: RangeInclusive<usize>,
    apply: Box<ModifierFn>,
}

impl Modifier {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> &RangeInclusive<usize> {
        &self.arity
    }

    pub fn apply(&self, value: Value, args: &[Value]) -> Result<Value, ModifierError> {
        (self.apply)(value, args)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Rc<Modifier>>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("uppercase", 0..=0, |v, _| Ok(map_str(v, |s| s.to_uppercase())));
        registry.register("lowercase", 0..=0, |v, _| Ok(map_str(v, |s| s.to_lowercase())));
        registry.register("capitalize", 0..=0, |v, _| {
            Ok(map_str(v, |s| map_first(s, char::to_uppercase)))
        });
        registry.register("lowercase-first", 0..=0, |v, _| {
            Ok(map_str(v, |s| map_first(s, char::to_lowercase)))
        });
        registry.register("trim", 0..=0, |v, _| Ok(map_str(v, |s| s.trim().to_string())));
        registry.register("length", 0..=0, length);
        registry.register("default", 1..=1, |v, args| {
            Ok(if v.is_truthy() { v } else { args[0].clone() })
        });
        registry.register("join", 0..=1, join);
        registry.register("first", 0..=0, |v, _| pick(v, |items| items.first().cloned()));
        registry.register("last", 0..=0, |v, _| pick(v, |items| items.last().cloned()));
        registry.register("replace", 2..=2, |v, args| {
            let (from, to) = (args[0].to_string(), args[1].to_string());
            if from.is_empty() {
                return Err(ModifierError::new("cannot replace an empty string"));
            }
            Ok(map_str(v, |s| s.replace(&from, &to)))
        });
        registry
    }

    /// Registers `name`, replacing any modifier already registered under it.
    pub fn register<F>(&mut self, name: &str, arity: RangeInclusive<usize>, apply: F)
    where
        F: Fn(Value, &[Value]) -> Result<Value, ModifierError> + 'static,
    {
        self.modifiers.insert(
            name.to_string(),
            Rc::new(Modifier {
                name: name.to_string(),
                arity,
                apply: Box::new(apply),
            }),
        );
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Modifier>> {
        self.modifiers.get(name).cloned()
    }
}

/// Applies `f` to string values; other present values are formatted first.
/// `Nil` passes through untouched.
fn map_str(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::Nil => Value::Nil,
        Value::Str(s) => Value::Str(f(&s)),
        other => Value::Str(f(&other.to_string())),
    }
}

fn map_first<I: Iterator<Item = char>>(s: &str, f: fn(char) -> I) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first).chain(chars).collect(),
        None => String::new(),
    }
}

fn length(value: Value, _: &[Value]) -> Result<Value, ModifierError> {
    match value {
        Value::Nil => Ok(Value::Int(0)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Seq(items) => Ok(Value::Int(items.len() as i64)),
        other => Err(ModifierError::new(format!(
            "cannot take the length of a {}",
            other.type_name()
        ))),
    }
}

fn join(value: Value, args: &[Value]) -> Result<Value, ModifierError> {
    let separator = args.first().map(Value::to_string).unwrap_or_default();
    match value {
        Value::Seq(items) => Ok(Value::Str(
            items
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(&separator),
        )),
        other => Err(ModifierError::new(format!(
            "cannot join a {}",
            other.type_name()
        ))),
    }
}

fn pick(value: Value, f: impl FnOnce(&[Value]) -> Option<Value>) -> Result<Value, ModifierError> {
    match value {
        Value::Seq(items) => Ok(f(&items).unwrap_or_default()),
        Value::Str(s) => {
            let chars: Vec<Value> = s.chars().map(|c| Value::Str(c.to_string())).collect();
            Ok(f(&chars).unwrap_or_default())
        }
        Value::Nil => Ok(Value::Nil),
        other => Err(ModifierError::new(format!(
            "cannot pick an element of a {}",
            other.type_name()
        ))),
    }
}

#[derive(Debug, Clone)]
struct Step {
    modifier: Rc<Modifier>,
    args: Vec<String>,
}

/// An ordered list of modifiers applied left to right.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Splits `expr | m1 | m2(a)` into the leading text and a parsed pipeline.
    pub fn split<'s>(
        text: &'s str,
        registry: &ModifierRegistry,
        at: &Location,
    ) -> Result<(&'s str, Pipeline), ParseError> {
        let mut parts = split_top_level(text, '|').into_iter();
        let head = parts.next().unwrap_or_default().trim();
        let calls: Vec<&str> = parts.collect();
        Ok((head, Pipeline::parse(&calls, registry, at)?))
    }

    pub fn parse(calls: &[&str], registry: &ModifierRegistry, at: &Location) -> Result<Self, ParseError> {
        let mut steps = Vec::with_capacity(calls.len());
        for call in calls {
            let call = call.trim();
            let (name, args) = match call.find('(') {
                Some(open) if call.ends_with(')') => {
                    let inner = call[open + 1..call.len() - 1].trim();
                    let args = if inner.is_empty() {
                        Vec::new()
                    } else {
                        split_top_level(inner, ',')
                            .into_iter()
                            .map(|arg| arg.trim().to_string())
                            .collect()
                    };
                    (call[..open].trim(), args)
                }
                _ => (call, Vec::new()),
            };

            let modifier = registry.lookup(name).ok_or_else(|| ParseError::UnknownModifier {
                at: at.clone(),
                name: name.to_string(),
            })?;
            if !modifier.arity().contains(&args.len()) {
                let (min, max) = (modifier.arity().start(), modifier.arity().end());
                return Err(ParseError::ModifierArity {
                    at: at.clone(),
                    name: name.to_string(),
                    expected: if min == max {
                        min.to_string()
                    } else {
                        format!("{min} to {max}")
                    },
                    found: args.len(),
                });
            }
            steps.push(Step { modifier, args });
        }
        Ok(Self { steps })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn apply(&self, mut value: Value, eval: &Evaluator<'_>) -> Result<Value, EvalError> {
        for step in &self.steps {
            let args = step
                .args
                .iter()
                .map(|arg| eval.evaluate(arg))
                .collect::<Result<Vec<_>, _>>()?;
            value = step
                .modifier
                .apply(value, &args)
                .map_err(|source| EvalError::Modifier {
                    at: eval.location().clone(),
                    name: step.modifier.name().to_string(),
                    source,
                })?;
        }
        Ok(value)
    }
}
