//! linetmpl: a line-oriented directive template engine for code generation.
//!
//! A template is ordinary text in which lines starting with the directive
//! marker (`:` by default) are statements, and `{{ expr }}` segments inside
//! other lines are replaced by the value of `expr`.
//!
//! ```text
//! ---
//! kind: 'struct'
//! ---
//! :// comment lines and blank lines are skipped
//! :func field(name, ty)
//!     pub {{ name }}: {{ ty }},
//! :end-func
//! pub {{ kind }} {{ entity.name | capitalize }} {
//! :for f in entity.fields
//! :call field(name: f.name, ty: f.ty)
//! :end-for
//! }
//! ```
//!
//! Supported statements:
//! - `:if` / `:elseif` / `:else` / `:end-if`.
//! - `:for item in <expr>` ... `:end-for`, with `loop.first`, `loop.last`,
//!   `loop.index` and `loop.count`.
//! - `:set` and `:set-str`, in line and block form, with modifier pipelines.
//! - `:func` macros and `:call`.
//! - `:spaceless`, `:raw`, `:console-log`, `:fatal-error`, `:stop-render`,
//!   `:exclude-file`.
//!
//! Expressions are flat: terms joined by operators, reduced left to right,
//! with no precedence, no short-circuiting and at most one level of
//! parentheses. Operators and modifiers are looked up by name in registries
//! owned by the [`Engine`], which applications may extend.
//!
//! Newline semantics:
//! - Every text line keeps the line terminator it had in the source (`\r\n`
//!   becomes `\n`).
//! - Directive lines, blank lines and comment lines produce no output.
//! - The engine never injects separators of its own.

pub mod ast;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod macros;
pub mod modifiers;
pub mod operators;
pub mod parser;
pub mod reader;
pub mod scope;
pub mod statements;
pub mod value;

pub use config::EngineConfig;
pub use engine::{variables_from_json, Engine, Rendered, Template};
pub use error::{
    ConfigError, DirectiveSignal, EvalError, Location, ModifierError, OperandError, ParseError, RenderError,
};
pub use scope::{Scope, Variables};
pub use value::{AttributeBearing, Record, Value};

/// Renders `text` with a default [`Engine`].
pub fn render(source: &str, text: &str, vars: Variables) -> Result<Rendered, RenderError> {
    Engine::new().render(source, text, vars)
}
