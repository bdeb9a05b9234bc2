use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Objects that expose named attributes to `object.attribute` lookups and
/// assignments.
///
/// Implementations use interior mutability for `set_attribute`; values are
/// shared by reference, so attribute changes are visible through every copy
/// of the handle.
pub trait AttributeBearing: fmt::Debug {
    fn type_name(&self) -> &str {
        "object"
    }

    fn get_attribute(&self, name: &str) -> Option<Value>;

    /// Assigns an attribute, clearing it when `value` is [`Value::Nil`].
    /// Returns `false` if the object does not accept the assignment.
    fn set_attribute(&self, _name: &str, _value: Value) -> bool {
        false
    }

    fn display(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// A dynamically typed template value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value. Renders as nothing and is falsy.
    #[default]
    Nil,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Seq(Vec<Value>),
    Object(Rc<dyn AttributeBearing>),
}

impl Value {
    pub fn object(object: impl AttributeBearing + 'static) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::Seq(_) => "sequence",
            Value::Object(_) => "object",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truthiness used by conditions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Str(s) => !s.trim().is_empty(),
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Date(d) => d.timestamp() > 0 || (d.timestamp() == 0 && d.timestamp_subsec_nanos() > 0),
            Value::Seq(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attribute lookup for `value.name`.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(object) => object.get_attribute(name),
            Value::Seq(items) => match name {
                "count" => Some(Value::Int(items.len() as i64)),
                "first" => Some(items.first().cloned().unwrap_or_default()),
                "last" => Some(items.last().cloned().unwrap_or_default()),
                "is_empty" => Some(Value::Bool(items.is_empty())),
                _ => None,
            },
            Value::Str(s) => match name {
                "count" => Some(Value::Int(s.chars().count() as i64)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts a JSON document into a value. Objects become [`Record`]s.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let record = Record::new();
                for (key, value) in map {
                    record.set_attribute(&key, Value::from_json(value));
                }
                Value::object(record)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => f.write_str(&d.to_rfc3339()),
            Value::Seq(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(object) => f.write_str(&object.display()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::object(record)
    }
}

/// A plain attribute bag, the default object shape.
#[derive(Debug, Default)]
pub struct Record {
    kind: Option<String>,
    attrs: RefCell<IndexMap<String, Value>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record that reports `kind` as its type name.
    pub fn named(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            attrs: RefCell::default(),
        }
    }

    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.attrs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.borrow().is_empty()
    }
}

impl AttributeBearing for Record {
    fn type_name(&self) -> &str {
        self.kind.as_deref().unwrap_or("record")
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attrs.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: Value) -> bool {
        let mut attrs = self.attrs.borrow_mut();
        if value.is_nil() {
            attrs.shift_remove(name);
        } else {
            attrs.insert(name.to_string(), value);
        }
        true
    }
}
