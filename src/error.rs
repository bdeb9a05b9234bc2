//! Error types for parsing, evaluation and rendering.
//!
//! Every error raised while reading a document carries a [`Location`]: the
//! source identifier handed to the engine plus the 1-based line number of the
//! offending logical line.

use std::fmt;

use thiserror::Error;

/// Where in a document an error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

impl Location {
    pub fn new(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Errors found while turning source text into a statement tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{at}: unknown directive `{keyword}`: {text}")]
    UnknownDirective {
        at: Location,
        keyword: String,
        text: String,
    },

    #[error("{at}: malformed `{keyword}` directive ({reason}): {text}")]
    Malformed {
        at: Location,
        keyword: String,
        text: String,
        reason: String,
    },

    #[error("{at}: `{keyword}` block is never closed (expected `{expected}`)")]
    Unterminated {
        at: Location,
        keyword: String,
        expected: String,
    },

    #[error("{at}: `{keyword}` is not a valid continuation here: {text}")]
    InvalidContinuation {
        at: Location,
        keyword: String,
        text: String,
    },

    #[error("{at}: unknown modifier `{name}`")]
    UnknownModifier { at: Location, name: String },

    #[error("{at}: modifier `{name}` expects {expected} argument(s), got {found}")]
    ModifierArity {
        at: Location,
        name: String,
        expected: String,
        found: usize,
    },
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            Self::UnknownDirective { at, .. }
            | Self::Malformed { at, .. }
            | Self::Unterminated { at, .. }
            | Self::InvalidContinuation { at, .. }
            | Self::UnknownModifier { at, .. }
            | Self::ModifierArity { at, .. } => at,
        }
    }
}

/// An operator refused one of its operands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("left operand of type {found} is not supported")]
    Left { found: &'static str },

    #[error("right operand of type {found} is not supported")]
    Right { found: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

/// A modifier could not transform its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModifierError {
    pub message: String,
}

impl ModifierError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while executing a parsed statement tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{at}: unknown variable `{name}` in `{expr}`")]
    UnknownVariable {
        at: Location,
        name: String,
        expr: String,
    },

    #[error("{at}: `{object}` has no attribute `{attribute}` in `{expr}`")]
    UnknownAttribute {
        at: Location,
        object: String,
        attribute: String,
        expr: String,
    },

    #[error("{at}: unknown operator `{name}` in `{expr}`")]
    UnknownOperator {
        at: Location,
        name: String,
        expr: String,
    },

    #[error("{at}: operator `{op}` failed in `{expr}`: {source}")]
    Operand {
        at: Location,
        op: String,
        expr: String,
        #[source]
        source: OperandError,
    },

    #[error("{at}: invalid expression `{expr}`: {reason}")]
    Grouping {
        at: Location,
        expr: String,
        reason: String,
    },

    #[error("{at}: `{expr}` is not a sequence (found {found})")]
    NotASequence {
        at: Location,
        expr: String,
        found: &'static str,
    },

    #[error("{at}: `{name}` is not a declared macro")]
    UnknownMacro { at: Location, name: String },

    #[error("{at}: calling `{name}` exceeds the call depth limit of {limit}")]
    CallDepth {
        at: Location,
        name: String,
        limit: usize,
    },

    #[error("{at}: modifier `{name}` failed: {source}")]
    Modifier {
        at: Location,
        name: String,
        #[source]
        source: ModifierError,
    },

    #[error("{at}: cannot assign attribute `{attribute}` on {found}")]
    NotAssignable {
        at: Location,
        attribute: String,
        found: String,
    },

    #[error("{at}: unrecognized directive `{keyword}`: {text}")]
    Unidentified {
        at: Location,
        keyword: String,
        text: String,
    },
}

impl EvalError {
    pub fn location(&self) -> &Location {
        match self {
            Self::UnknownVariable { at, .. }
            | Self::UnknownAttribute { at, .. }
            | Self::UnknownOperator { at, .. }
            | Self::Operand { at, .. }
            | Self::Grouping { at, .. }
            | Self::NotASequence { at, .. }
            | Self::UnknownMacro { at, .. }
            | Self::CallDepth { at, .. }
            | Self::Modifier { at, .. }
            | Self::NotAssignable { at, .. }
            | Self::Unidentified { at, .. } => at,
        }
    }
}

/// Control-flow requests written by the template author.
///
/// These are not engine failures. `ExcludeFile` and `StopRender` are turned
/// into a [`crate::Rendered`] outcome by the render entry point; `Fatal` is
/// surfaced to the caller as [`RenderError::Directive`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveSignal {
    #[error("{at}: file excluded")]
    ExcludeFile { at: Location },

    #[error("{at}: rendering stopped")]
    StopRender { at: Location },

    #[error("{at}: {message}")]
    Fatal { at: Location, message: String },
}

impl DirectiveSignal {
    pub fn location(&self) -> &Location {
        match self {
            Self::ExcludeFile { at } | Self::StopRender { at } | Self::Fatal { at, .. } => at,
        }
    }
}

/// Anything that aborts a render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Directive(#[from] DirectiveSignal),
}

impl RenderError {
    pub fn location(&self) -> &Location {
        match self {
            Self::Parse(e) => e.location(),
            Self::Eval(e) => e.location(),
            Self::Directive(e) => e.location(),
        }
    }

    /// True for defects in the template or its data, false for author-triggered
    /// directive errors.
    pub fn is_engine_failure(&self) -> bool {
        !matches!(self, Self::Directive(_))
    }
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}
