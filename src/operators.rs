//! Infix operator registry.
//!
//! The evaluator never hard-codes operator semantics: every infix token is
//! looked up here by name. [`OperatorRegistry::with_defaults`] installs the
//! arithmetic, comparison and boolean operators most templates expect.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::OperandError;
use crate::value::Value;

pub type OperatorFn = dyn Fn(&Value, &Value) -> Result<Value, OperandError>;

pub struct Operator {
    name: String,
    apply: Box<OperatorFn>,
}

impl Operator {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Both operands are already evaluated; operators never short-circuit.
    pub fn apply(&self, lhs: &Value, rhs: &Value) -> Result<Value, OperandError> {
        (self.apply)(lhs, rhs)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").field("name", &self.name).finish()
    }
}

#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("+", add);
        registry.register("-", |l, r| arithmetic(l, r, i64::checked_sub, |a, b| a - b));
        registry.register("*", |l, r| arithmetic(l, r, i64::checked_mul, |a, b| a * b));
        registry.register("/", divide);
        registry.register("%", remainder);
        registry.register("==", |l, r| Ok(Value::Bool(l == r)));
        registry.register("!=", |l, r| Ok(Value::Bool(l != r)));
        registry.register("<", |l, r| compare(l, r).map(|o| Value::Bool(o == Ordering::Less)));
        registry.register("<=", |l, r| compare(l, r).map(|o| Value::Bool(o != Ordering::Greater)));
        registry.register(">", |l, r| compare(l, r).map(|o| Value::Bool(o == Ordering::Greater)));
        registry.register(">=", |l, r| compare(l, r).map(|o| Value::Bool(o != Ordering::Less)));
        registry.register("and", |l, r| Ok(Value::Bool(l.is_truthy() && r.is_truthy())));
        registry.register("or", |l, r| Ok(Value::Bool(l.is_truthy() || r.is_truthy())));
        registry
    }

    /// Registers `name`, replacing any operator already registered under it.
    pub fn register<F>(&mut self, name: &str, apply: F)
    where
        F: Fn(&Value, &Value) -> Result<Value, OperandError> + 'static,
    {
        self.operators.insert(
            name.to_string(),
            Operator {
                name: name.to_string(),
                apply: Box::new(apply),
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, OperandError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Str(_), other) => Err(OperandError::Right {
            found: other.type_name(),
        }),
        (Value::Seq(a), Value::Seq(b)) => Ok(Value::Seq(a.iter().chain(b).cloned().collect())),
        (Value::Seq(_), other) => Err(OperandError::Right {
            found: other.type_name(),
        }),
        _ => arithmetic(lhs, rhs, i64::checked_add, |a, b| a + b),
    }
}

fn arithmetic(
    lhs: &Value,
    rhs: &Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value, OperandError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int(*a, *b).map(Value::Int).ok_or(OperandError::Overflow),
        _ => {
            let (a, b) = numbers(lhs, rhs)?;
            Ok(Value::Float(float(a, b)))
        }
    }
}

fn divide(lhs: &Value, rhs: &Value) -> Result<Value, OperandError> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(OperandError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => a.checked_div(*b).map(Value::Int).ok_or(OperandError::Overflow),
        _ => {
            let (a, b) = numbers(lhs, rhs)?;
            if b == 0.0 {
                return Err(OperandError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
    }
}

fn remainder(lhs: &Value, rhs: &Value) -> Result<Value, OperandError> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(OperandError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => a.checked_rem(*b).map(Value::Int).ok_or(OperandError::Overflow),
        _ => {
            let (a, b) = numbers(lhs, rhs)?;
            if b == 0.0 {
                return Err(OperandError::DivisionByZero);
            }
            Ok(Value::Float(a % b))
        }
    }
}

fn numbers(lhs: &Value, rhs: &Value) -> Result<(f64, f64), OperandError> {
    let a = lhs.as_f64().ok_or(OperandError::Left {
        found: lhs.type_name(),
    })?;
    let b = rhs.as_f64().ok_or(OperandError::Right {
        found: rhs.type_name(),
    })?;
    Ok((a, b))
}

fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering, OperandError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        (Value::Str(_) | Value::Date(_), other) => Err(OperandError::Right {
            found: other.type_name(),
        }),
        _ => {
            let (a, b) = numbers(lhs, rhs)?;
            a.partial_cmp(&b).ok_or(OperandError::Right { found: "NaN" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: &str, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Value, OperandError> {
        let registry = OperatorRegistry::with_defaults();
        registry.lookup(op).unwrap().apply(&lhs.into(), &rhs.into())
    }

    #[test]
    fn arithmetic_keeps_integers_integral() {
        assert_eq!(apply("+", 1, 1), Ok(Value::Int(2)));
        assert_eq!(apply("*", 3, 4), Ok(Value::Int(12)));
        assert_eq!(apply("/", 7, 2), Ok(Value::Int(3)));
        assert_eq!(apply("%", 7, 2), Ok(Value::Int(1)));
        assert_eq!(apply("-", 1, 0.5), Ok(Value::Float(0.5)));
    }

    #[test]
    fn string_and_sequence_concatenation() {
        assert_eq!(apply("+", "get", "Name"), Ok(Value::from("getName")));
        assert_eq!(apply("+", vec![1], vec![2]), Ok(Value::from(vec![1, 2])));
    }

    #[test]
    fn operand_errors_name_the_side() {
        assert_eq!(apply("+", "a", 1), Err(OperandError::Right { found: "integer" }));
        assert_eq!(apply("-", true, 1), Err(OperandError::Left { found: "boolean" }));
        assert_eq!(apply("<", 1, "x"), Err(OperandError::Right { found: "string" }));
        assert_eq!(apply("/", 1, 0), Err(OperandError::DivisionByZero));
        assert_eq!(apply("+", i64::MAX, 1), Err(OperandError::Overflow));
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply("==", 2, 2.0), Ok(Value::Bool(true)));
        assert_eq!(apply("!=", "a", "b"), Ok(Value::Bool(true)));
        assert_eq!(apply("<=", 2, 3), Ok(Value::Bool(true)));
        assert_eq!(apply(">", "b", "a"), Ok(Value::Bool(true)));
    }

    #[test]
    fn boolean_operators_use_truthiness() {
        assert_eq!(apply("and", "x", 0), Ok(Value::Bool(false)));
        assert_eq!(apply("or", "", 1), Ok(Value::Bool(true)));
    }

    #[test]
    fn custom_operators_can_be_registered() {
        let mut registry = OperatorRegistry::new();
        assert!(registry.lookup("max").is_none());
        registry.register("max", |l, r| {
            let (a, b) = numbers(l, r)?;
            Ok(Value::Float(a.max(b)))
        });
        let max = registry.lookup("max").unwrap();
        assert_eq!(max.name(), "max");
        assert_eq!(max.apply(&Value::Int(1), &Value::Int(4)), Ok(Value::Float(4.0)));
    }
}
