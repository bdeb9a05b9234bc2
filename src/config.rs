//! Engine configuration: the lexical conventions of the directive language.

use serde::Deserialize;

use crate::error::ConfigError;

/// Markers and reserved names used by the reader and parser.
///
/// All fields have defaults, so a JSON document only needs to name the ones
/// it overrides:
///
/// ```
/// let config = linetmpl::EngineConfig::from_json(r#"{ "directive_marker": "%" }"#).unwrap();
/// assert_eq!(config.directive_marker, "%");
/// assert_eq!(config.inline_open, "{{");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leading token that turns a line into a directive.
    pub directive_marker: String,
    /// Comment marker. `<marker><comment>` at the start of a line makes it a
    /// comment line; ` <comment>` truncates a directive line.
    pub comment_marker: String,
    pub inline_open: String,
    pub inline_close: String,
    pub front_matter_fence: String,
    pub macro_start: String,
    pub macro_end: String,
    /// Variable reset to `working_dir_default` instead of being removed when
    /// assigned nothing.
    pub working_dir_var: String,
    pub working_dir_default: String,
    /// Reject unknown directive keywords while parsing instead of leaving a
    /// placeholder that fails when executed.
    pub strict_directives: bool,
    /// How deeply `call` may nest, counting recursive calls.
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            directive_marker: ":".into(),
            comment_marker: "//".into(),
            inline_open: "{{".into(),
            inline_close: "}}".into(),
            front_matter_fence: "---".into(),
            macro_start: "func".into(),
            macro_end: "end-func".into(),
            working_dir_var: "working_dir".into(),
            working_dir_default: ".".into(),
            strict_directives: false,
            max_call_depth: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("directive_marker", &self.directive_marker),
            ("comment_marker", &self.comment_marker),
            ("inline_open", &self.inline_open),
            ("inline_close", &self.inline_close),
            ("front_matter_fence", &self.front_matter_fence),
            ("macro_start", &self.macro_start),
            ("macro_end", &self.macro_end),
            ("working_dir_var", &self.working_dir_var),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{name}` must not be empty")));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` must not contain whitespace"
                )));
            }
        }
        if self.inline_open == self.inline_close {
            return Err(ConfigError::Invalid(
                "inline delimiters must differ".into(),
            ));
        }
        if self.macro_start == self.macro_end {
            return Err(ConfigError::Invalid(
                "macro start and end keywords must differ".into(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid("`max_call_depth` must be at least 1".into()));
        }
        Ok(())
    }

    /// The prefix of a whole-line comment, e.g. `://`.
    pub(crate) fn comment_line_prefix(&self) -> String {
        format!("{}{}", self.directive_marker, self.comment_marker)
    }
}
