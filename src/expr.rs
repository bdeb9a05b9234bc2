//! Expression evaluation.
//!
//! An expression is a flat list of terms joined by infix operators:
//!
//! ```text
//! [not] group (op group)*
//! group := term (op term)* | '(' term (op term)* ')'
//! term  := 'string' | "string" | number | true | false | [t, ...] | name(.attr)*
//! ```
//!
//! Each group is reduced left to right, then the group results are combined
//! left to right with the operators that sit between them. There is no
//! precedence and no short-circuiting, and a parenthesis may not contain
//! another one. A leading `not` negates the truthiness of the whole result.
//!
//! Expressions are kept as source text and parsed every time they are
//! evaluated.

use crate::error::{EvalError, Location};
use crate::lexer::{is_identifier, split_top_level, tokenize, Token};
use crate::operators::OperatorRegistry;
use crate::scope::Scope;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Group(Vec<Token>),
    Op(String),
}

/// Splits a token stream into groups and the operators joining them.
fn groups(tokens: Vec<Token>) -> Result<Vec<Item>, String> {
    let mut items = Vec::new();
    let mut bare: Vec<Token> = Vec::new();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token {
            Token::LParen => {
                if let Some(last) = bare.pop() {
                    let Token::Word(op) = last else {
                        return Err("expected an operator before `(`".into());
                    };
                    if bare.is_empty() {
                        return Err(format!("operator `{op}` has no left operand"));
                    }
                    items.push(Item::Group(std::mem::take(&mut bare)));
                    items.push(Item::Op(op));
                }

                let mut inner = Vec::new();
                loop {
                    match iter.next() {
                        Some(Token::RParen) => break,
                        Some(Token::LParen) => {
                            return Err("nested parentheses are not supported".into())
                        }
                        Some(token) => inner.push(token),
                        None => return Err("unbalanced parenthesis".into()),
                    }
                }
                if inner.is_empty() {
                    return Err("empty parentheses".into());
                }
                items.push(Item::Group(inner));

                match iter.next() {
                    None => {}
                    Some(Token::Word(op)) => items.push(Item::Op(op)),
                    Some(_) => return Err("expected an operator after `)`".into()),
                }
            }
            Token::RParen => return Err("unbalanced parenthesis".into()),
            token => bare.push(token),
        }
    }

    if !bare.is_empty() {
        items.push(Item::Group(bare));
    }
    match items.last() {
        None => Err("empty expression".into()),
        Some(Item::Op(op)) => Err(format!("operator `{op}` has no right operand")),
        Some(Item::Group(_)) => Ok(items),
    }
}

/// Evaluates expressions against a variable scope.
pub struct Evaluator<'a> {
    scope: &'a Scope,
    operators: &'a OperatorRegistry,
    at: &'a Location,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a Scope, operators: &'a OperatorRegistry, at: &'a Location) -> Self {
        Self { scope, operators, at }
    }

    pub fn location(&self) -> &Location {
        self.at
    }

    pub fn evaluate(&self, expr: &str) -> Result<Value, EvalError> {
        let grouping = |reason: String| EvalError::Grouping {
            at: self.at.clone(),
            expr: expr.to_string(),
            reason,
        };

        let mut tokens = tokenize(expr).map_err(grouping)?;
        let negate = matches!(tokens.first(), Some(Token::Word(w)) if w == "not");
        if negate {
            tokens.remove(0);
        }

        let mut items = groups(tokens).map_err(grouping)?.into_iter();
        let mut value = match items.next() {
            Some(Item::Group(group)) => self.reduce(group, expr)?,
            _ => return Err(grouping("empty expression".into())),
        };
        while let Some(item) = items.next() {
            let (Item::Op(op), Some(Item::Group(group))) = (item, items.next()) else {
                return Err(grouping("groups must be joined by operators".into()));
            };
            let rhs = self.reduce(group, expr)?;
            value = self.apply(&op, &value, &rhs, expr)?;
        }

        Ok(if negate {
            Value::Bool(!value.is_truthy())
        } else {
            value
        })
    }

    /// Evaluates a condition. A condition made of one reference that does not
    /// resolve is false instead of an error.
    pub fn condition(&self, expr: &str) -> Result<bool, EvalError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value.is_truthy()),
            Err(EvalError::UnknownVariable { .. } | EvalError::UnknownAttribute { .. })
                if is_single_reference(expr) =>
            {
                let negated = expr.trim_start().starts_with("not ");
                Ok(negated)
            }
            Err(err) => Err(err),
        }
    }

    fn reduce(&self, group: Vec<Token>, expr: &str) -> Result<Value, EvalError> {
        let mut tokens = group.into_iter();
        let Some(first) = tokens.next() else {
            return Err(self.grouping(expr, "empty group"));
        };
        let mut value = self.term(first, expr)?;
        while let Some(op) = tokens.next() {
            let Token::Word(op) = op else {
                return Err(self.grouping(expr, "expected an operator between terms"));
            };
            let Some(rhs) = tokens.next() else {
                return Err(self.grouping(expr, &format!("operator `{op}` has no right operand")));
            };
            let rhs = self.term(rhs, expr)?;
            value = self.apply(&op, &value, &rhs, expr)?;
        }
        Ok(value)
    }

    fn apply(&self, op: &str, lhs: &Value, rhs: &Value, expr: &str) -> Result<Value, EvalError> {
        let operator = self
            .operators
            .lookup(op)
            .ok_or_else(|| EvalError::UnknownOperator {
                at: self.at.clone(),
                name: op.to_string(),
                expr: expr.to_string(),
            })?;
        operator.apply(lhs, rhs).map_err(|source| EvalError::Operand {
            at: self.at.clone(),
            op: op.to_string(),
            expr: expr.to_string(),
            source,
        })
    }

    fn term(&self, token: Token, expr: &str) -> Result<Value, EvalError> {
        match token {
            Token::Str(s) => Ok(Value::Str(s)),
            Token::List(inner) => self.sequence(&inner, expr),
            Token::Word(word) => {
                if let Some(number) = parse_number(&word) {
                    return Ok(number);
                }
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => self.reference(&word, expr),
                }
            }
            Token::LParen | Token::RParen => Err(self.grouping(expr, "unexpected parenthesis")),
        }
    }

    fn sequence(&self, inner: &str, expr: &str) -> Result<Value, EvalError> {
        if inner.trim().is_empty() {
            return Ok(Value::Seq(Vec::new()));
        }
        let mut items = Vec::new();
        for element in split_top_level(inner, ',') {
            let mut tokens = tokenize(element)
                .map_err(|reason| self.grouping(expr, &reason))?
                .into_iter();
            match (tokens.next(), tokens.next()) {
                (Some(token), None) => items.push(self.term(token, expr)?),
                _ => {
                    return Err(self.grouping(
                        expr,
                        &format!("sequence element `{}` must be a single term", element.trim()),
                    ))
                }
            }
        }
        Ok(Value::Seq(items))
    }

    /// Resolves `name` or `name.attr.attr`.
    pub fn reference(&self, path: &str, expr: &str) -> Result<Value, EvalError> {
        if !path.split('.').all(is_identifier) {
            return Err(self.grouping(expr, &format!("`{path}` is not a literal or a variable reference")));
        }
        let mut parts = path.split('.');
        let name = parts.next().unwrap_or_default();
        let mut value = self
            .scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable {
                at: self.at.clone(),
                name: name.to_string(),
                expr: expr.to_string(),
            })?;

        let mut resolved = name.to_string();
        for attribute in parts {
            value = value
                .attribute(attribute)
                .ok_or_else(|| EvalError::UnknownAttribute {
                    at: self.at.clone(),
                    object: resolved.clone(),
                    attribute: attribute.to_string(),
                    expr: expr.to_string(),
                })?;
            resolved.push('.');
            resolved.push_str(attribute);
        }
        Ok(value)
    }

    fn grouping(&self, expr: &str, reason: &str) -> EvalError {
        EvalError::Grouping {
            at: self.at.clone(),
            expr: expr.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_number(word: &str) -> Option<Value> {
    let digits = word.strip_prefix(['-', '+']).unwrap_or(word);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if let Ok(int) = word.parse::<i64>() {
        return Some(Value::Int(int));
    }
    word.parse::<f64>().ok().map(Value::Float)
}

fn is_single_reference(expr: &str) -> bool {
    let mut words = expr.split_whitespace();
    let first = words.next();
    let word = if first == Some("not") { words.next() } else { first };
    match (word, words.next()) {
        (Some(word), None) => word.split('.').all(is_identifier),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn scope() -> Scope {
        let mut scope = Scope::default();
        scope.set("a", Value::Bool(true));
        scope.set("b", Value::Bool(false));
        scope.set("c", Value::Bool(true));
        scope.set("n", Value::Int(4));
        scope.set("name", Value::from("order"));
        scope.set(
            "entity",
            Record::new()
                .with("name", "Customer")
                .with("fields", vec!["id", "email"])
                .into(),
        );
        scope
    }

    fn eval(expr: &str) -> Result<Value, EvalError> {
        let scope = scope();
        let operators = OperatorRegistry::with_defaults();
        let at = Location::new("test", 1);
        Evaluator::new(&scope, &operators, &at).evaluate(expr)
    }

    fn condition(expr: &str) -> Result<bool, EvalError> {
        let scope = scope();
        let operators = OperatorRegistry::with_defaults();
        let at = Location::new("test", 1);
        Evaluator::new(&scope, &operators, &at).condition(expr)
    }

    #[test]
    fn literals() {
        assert_eq!(eval("'it'").unwrap(), Value::from("it"));
        assert_eq!(eval("\"text\"").unwrap(), Value::from("text"));
        assert_eq!(eval("42").unwrap(), Value::Int(42));
        assert_eq!(eval("-1.5").unwrap(), Value::Float(-1.5));
        assert_eq!(eval("false").unwrap(), Value::Bool(false));
        assert_eq!(eval("[1, 'x', n]").unwrap(), Value::from(vec![Value::Int(1), "x".into(), Value::Int(4)]));
        assert_eq!(eval("[]").unwrap(), Value::Seq(vec![]));
    }

    #[test]
    fn operators_apply_left_to_right_without_precedence() {
        assert_eq!(eval("1 + 1").unwrap(), Value::Int(2));
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Int(9));
        assert_eq!(eval("1 + (2 * 3)").unwrap(), Value::Int(7));
        assert_eq!(eval("(1 + 2) * (3 + 1)").unwrap(), Value::Int(12));
        assert_eq!(eval("n * 2 == 8").unwrap(), Value::Bool(true));
    }

    #[test]
    fn references_and_attributes() {
        assert_eq!(eval("entity.name").unwrap(), Value::from("Customer"));
        assert_eq!(eval("entity.fields.count").unwrap(), Value::Int(2));
        assert_eq!(eval("'get' + name").unwrap(), Value::from("getorder"));
    }

    #[test]
    fn not_negates_the_whole_expression() {
        assert_eq!(eval("not a").unwrap(), Value::Bool(false));
        assert_eq!(eval("not b or b").unwrap(), Value::Bool(true));
        assert_eq!(eval("not (a and b)").unwrap(), Value::Bool(true));
    }

    #[test]
    fn grouped_conditions() {
        assert_eq!(eval("(a and b) or c").unwrap(), Value::Bool(true));
        assert_eq!(eval("a and (b or c)").unwrap(), Value::Bool(true));
        assert_eq!(eval("b or (a and b)").unwrap(), Value::Bool(false));
    }

    #[test]
    fn nested_parentheses_are_rejected() {
        let err = eval("(a and (b or c))").unwrap_err();
        assert!(
            matches!(&err, EvalError::Grouping { reason, .. } if reason.contains("nested")),
            "{err}"
        );
    }

    #[test]
    fn malformed_groupings() {
        for expr in ["", "(a", "a)", "()", "a +", "(a) (b)", "a b"] {
            assert!(eval(expr).is_err(), "`{expr}` should fail");
        }
    }

    #[test]
    fn unknown_names_are_distinct_errors() {
        assert!(matches!(eval("missing"), Err(EvalError::UnknownVariable { name, .. }) if name == "missing"));
        assert!(matches!(
            eval("entity.nope"),
            Err(EvalError::UnknownAttribute { object, attribute, .. }) if object == "entity" && attribute == "nope"
        ));
        assert!(matches!(eval("a xor b"), Err(EvalError::UnknownOperator { name, .. }) if name == "xor"));
        assert!(matches!(eval("name - 1"), Err(EvalError::Operand { .. })));
    }

    #[test]
    fn words_that_cannot_be_names_are_malformed() {
        for expr in ["a == == b", "1_000", "n + +", "entity..name", "a == 'x' +"] {
            assert!(matches!(eval(expr), Err(EvalError::Grouping { .. })), "{expr}");
        }
        assert!(matches!(condition("a == == b"), Err(EvalError::Grouping { .. })));
    }

    #[test]
    fn conditions_treat_unset_references_as_false() {
        assert!(!condition("missing").unwrap());
        assert!(condition("not missing").unwrap());
        assert!(!condition("entity.nope").unwrap());
        assert!(condition("a").unwrap());
        assert!(condition("missing and a").is_err());
    }
}
