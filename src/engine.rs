//! The engine: registries, configuration and the render entry points.

use crate::ast::Container;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{ConfigError, DirectiveSignal, ParseError, RenderError};
use crate::macros::MacroTable;
use crate::modifiers::ModifierRegistry;
use crate::operators::OperatorRegistry;
use crate::parser::{Parser, StatementRegistry};
use crate::scope::{Scope, Variables};
use crate::value::Value;

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    /// The template asked to be excluded (`:exclude-file`).
    Excluded,
    /// The template stopped rendering (`:stop-render`).
    Stopped,
}

impl Rendered {
    pub fn text(&self) -> Option<&str> {
        match self {
            Rendered::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Rendered::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Holds everything a render needs besides the template and its data.
///
/// An engine is not meant to be shared between threads; give each concurrent
/// render its own engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    statements: StatementRegistry,
    operators: OperatorRegistry,
    modifiers: ModifierRegistry,
    macros: MacroTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl Engine {
    /// Default configuration with the built-in statements, operators and
    /// modifiers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            config,
            statements: StatementRegistry::with_defaults(),
            operators: OperatorRegistry::with_defaults(),
            modifiers: ModifierRegistry::with_defaults(),
            macros: MacroTable::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn statements(&self) -> &StatementRegistry {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut StatementRegistry {
        &mut self.statements
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn operators_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.operators
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    pub fn modifiers_mut(&mut self) -> &mut ModifierRegistry {
        &mut self.modifiers
    }

    /// Macros available to every template rendered by this engine.
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn parse(&self, source: &str, text: &str) -> Result<Template, ParseError> {
        let (body, macros) = Parser::new(self, source, text).parse_document()?;
        tracing::debug!(source, statements = body.len(), macros = macros.len(), "parsed template");
        Ok(Template {
            source: source.to_string(),
            body,
            macros,
        })
    }

    /// Parses a macro library and makes its macros available to every
    /// template. Anything but macro declarations in `text` is ignored.
    /// Returns the number of macros declared.
    pub fn load_macros(&mut self, source: &str, text: &str) -> Result<usize, ParseError> {
        let template = self.parse(source, text)?;
        let count = template.macros.len();
        self.macros.extend(&template.macros);
        Ok(count)
    }

    pub fn render(&self, source: &str, text: &str, vars: Variables) -> Result<Rendered, RenderError> {
        self.parse(source, text)?.render(self, vars)
    }

    pub fn render_lines(&self, source: &str, lines: &[&str], vars: Variables) -> Result<Rendered, RenderError> {
        self.render(source, &lines.join("\n"), vars)
    }

    /// Renders with variables taken from the members of a JSON object.
    pub fn render_json(
        &self,
        source: &str,
        text: &str,
        data: serde_json::Value,
    ) -> Result<Rendered, RenderError> {
        self.render(source, text, variables_from_json(data))
    }
}

/// Turns the members of a JSON object into variables. Anything other than an
/// object yields no variables.
pub fn variables_from_json(data: serde_json::Value) -> Variables {
    match data {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| (name, Value::from_json(value)))
            .collect(),
        other => {
            tracing::warn!(kind = ?other, "template data is not a JSON object; ignoring it");
            Variables::new()
        }
    }
}

/// A parsed document. Immutable; render it as often as needed.
#[derive(Debug)]
pub struct Template {
    source: String,
    body: Container,
    macros: MacroTable,
}

impl Template {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Macros declared in this document.
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn render(&self, engine: &Engine, mut vars: Variables) -> Result<Rendered, RenderError> {
        let config = engine.config();
        vars.entry(config.working_dir_var.clone())
            .or_insert_with(|| Value::Str(config.working_dir_default.clone()));

        let mut macros = engine.macros().clone();
        macros.extend(&self.macros);
        let mut ctx = Context::new(engine, Scope::new(vars), macros);

        tracing::debug!(source = %self.source, "render start");
        let result = self.body.execute(&mut ctx);
        debug_assert_eq!(ctx.scope().depth(), 0, "unbalanced scope snapshots");

        match result {
            Ok(text) => {
                let text = text.unwrap_or_default();
                tracing::debug!(source = %self.source, bytes = text.len(), "render finished");
                Ok(Rendered::Text(text))
            }
            Err(RenderError::Directive(DirectiveSignal::ExcludeFile { at })) => {
                tracing::debug!(%at, "template excluded itself");
                Ok(Rendered::Excluded)
            }
            Err(RenderError::Directive(DirectiveSignal::StopRender { at })) => {
                tracing::debug!(%at, "template stopped rendering");
                Ok(Rendered::Stopped)
            }
            Err(err) => {
                tracing::debug!(source = %self.source, error = %err, "render failed");
                Err(err)
            }
        }
    }
}
