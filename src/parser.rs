//! Statement registry and the recursive container parser.
//!
//! Each directive keyword is registered with one of the statement shapes in
//! [`StatementSyntax`]. The parser reads logical lines, dispatches directives
//! by keyword, and recurses into the body of block-shaped statements until
//! the statement's end keyword (or, for multi-block statements, one of its
//! continuation keywords) is reached.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{Container, Statement, Unidentified};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{Location, ParseError};
use crate::lexer::{is_identifier, split_top_level, strip_trailing_comment};
use crate::macros::{Macro, MacroTable};
use crate::modifiers::ModifierRegistry;
use crate::reader::{Line, LineReader};
use crate::statements::{self, content};

/// A directive line split into keyword and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub keyword: String,
    /// Everything after the keyword, trailing comment removed, trimmed.
    pub args: String,
    pub line: Line,
    pub at: Location,
}

/// What statement builders get to see while parsing.
pub struct ParseEnv<'a> {
    pub config: &'a EngineConfig,
    pub modifiers: &'a ModifierRegistry,
    pub source: &'a str,
}

impl ParseEnv<'_> {
    pub fn at(&self, line: &Line) -> Location {
        Location::new(self.source, line.number)
    }

    pub fn malformed(&self, directive: &Directive, reason: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            at: directive.at.clone(),
            keyword: directive.keyword.clone(),
            text: directive.line.trimmed().to_string(),
            reason: reason.into(),
        }
    }
}

pub type BoxedStatement = Box<dyn Statement>;

/// Builds a statement from its single line. `Ok(None)` means the line does
/// not have the line form.
pub type LineBuilder = fn(&Directive, &ParseEnv<'_>) -> Result<Option<BoxedStatement>, ParseError>;
pub type BlockBuilder = fn(&Directive, Container, &ParseEnv<'_>) -> Result<BoxedStatement, ParseError>;
pub type MultiBlockBuilder =
    fn(&Directive, Container, Vec<Section>, &ParseEnv<'_>) -> Result<BoxedStatement, ParseError>;
pub type VerbatimBuilder = fn(&Directive, Vec<Line>, &ParseEnv<'_>) -> Result<BoxedStatement, ParseError>;

/// A keyword that continues a multi-block statement, like `elseif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub keyword: String,
    /// May appear more than once.
    pub repeatable: bool,
    /// Must be the last section before the end keyword.
    pub closes_chain: bool,
}

/// One alternate section of a multi-block statement, in source order.
#[derive(Debug)]
pub struct Section {
    pub keyword: String,
    pub header: Directive,
    pub body: Container,
}

/// The shape of a registered statement.
#[derive(Clone)]
pub enum StatementSyntax {
    /// Resolves completely from one line.
    Line { build: LineBuilder },
    /// Owns one body, closed by `end`.
    Block { end: String, build: BlockBuilder },
    /// Tries the line form first, otherwise owns a body closed by `end`.
    BlockOrLine {
        end: String,
        line: LineBuilder,
        block: BlockBuilder,
    },
    /// A primary body plus ordered continuation sections, closed by `end`.
    MultiBlock {
        end: String,
        continuations: Vec<Continuation>,
        build: MultiBlockBuilder,
    },
    /// Raw lines up to `end`, not parsed as statements.
    Verbatim { end: String, build: VerbatimBuilder },
}

impl StatementSyntax {
    pub fn end_keyword(&self) -> Option<&str> {
        match self {
            Self::Line { .. } => None,
            Self::Block { end, .. }
            | Self::BlockOrLine { end, .. }
            | Self::MultiBlock { end, .. }
            | Self::Verbatim { end, .. } => Some(end),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Block { .. } => "block",
            Self::BlockOrLine { .. } => "block-or-line",
            Self::MultiBlock { .. } => "multi-block",
            Self::Verbatim { .. } => "verbatim",
        }
    }
}

impl fmt::Debug for StatementSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StatementSyntax");
        s.field("shape", &self.shape());
        if let Some(end) = self.end_keyword() {
            s.field("end", &end);
        }
        if let Self::MultiBlock { continuations, .. } = self {
            s.field("continuations", continuations);
        }
        s.finish()
    }
}

/// Keyword to statement-shape map.
#[derive(Debug, Default)]
pub struct StatementRegistry {
    entries: HashMap<String, StatementSyntax>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        statements::register_defaults(&mut registry);
        registry
    }

    /// Registers `keyword`, replacing any statement already registered under it.
    pub fn register(&mut self, keyword: &str, syntax: StatementSyntax) {
        tracing::debug!(keyword, shape = syntax.shape(), "registering statement");
        self.entries.insert(keyword.to_string(), syntax);
    }

    pub fn lookup(&self, keyword: &str) -> Option<&StatementSyntax> {
        self.entries.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }
}

enum Classified {
    Text(Line),
    Directive(Directive),
}

pub struct Parser<'e> {
    env: ParseEnv<'e>,
    registry: &'e StatementRegistry,
    reader: LineReader,
    macros: MacroTable,
}

impl<'e> Parser<'e> {
    pub fn new(engine: &'e Engine, source: &'e str, text: &str) -> Self {
        Self {
            env: ParseEnv {
                config: engine.config(),
                modifiers: engine.modifiers(),
                source,
            },
            registry: engine.statements(),
            reader: LineReader::new(text, engine.config()),
            macros: MacroTable::new(),
        }
    }

    /// Parses a whole document: optional front matter, then statements up to
    /// end of input.
    pub fn parse_document(mut self) -> Result<(Container, MacroTable), ParseError> {
        let front_matter = self.parse_front_matter()?;
        let (mut body, _) = self.parse_container(&[])?;
        body.prepend(front_matter);
        Ok((body, self.macros))
    }

    fn parse_front_matter(&mut self) -> Result<Vec<BoxedStatement>, ParseError> {
        let config = self.env.config;
        let fence = config.front_matter_fence.as_str();
        let opening = match self.reader.current_line() {
            Some(line) if line.trimmed() == fence => line.clone(),
            _ => return Ok(Vec::new()),
        };
        self.reader.advance();

        let lines = self
            .reader
            .read_block(Some(fence))
            .ok_or_else(|| ParseError::Unterminated {
                at: self.env.at(&opening),
                keyword: fence.to_string(),
                expected: fence.to_string(),
            })?;
        self.reader.advance();

        lines
            .iter()
            .map(|line| statements::set::front_matter_entry(line, &self.env))
            .collect()
    }

    fn classify(&self, line: Line) -> Classified {
        let config = self.env.config;
        let marker = config.directive_marker.as_str();
        let trimmed = line.text.trim_start();
        let indent = &line.text[..line.text.len() - trimmed.len()];

        if let Some(escaped) = trimmed.strip_prefix('\\') {
            if escaped.starts_with(marker) {
                let text = format!("{indent}{escaped}");
                return Classified::Text(Line { text, ..line });
            }
        }

        let Some(rest) = trimmed.strip_prefix(marker) else {
            return Classified::Text(line);
        };
        let keyword_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if keyword_len == 0 {
            return Classified::Text(line);
        }
        let keyword = rest[..keyword_len].to_string();
        let args = strip_trailing_comment(&rest[keyword_len..], &config.comment_marker)
            .trim()
            .to_string();
        let at = self.env.at(&line);
        Classified::Directive(Directive {
            keyword,
            args,
            line,
            at,
        })
    }

    /// Parses statements until a directive whose keyword is in `until`, which
    /// is consumed and returned, or until end of input (`None`).
    pub fn parse_container(&mut self, until: &[&str]) -> Result<(Container, Option<Directive>), ParseError> {
        self.parse_items(until, false)
    }

    /// Shared by [`parse_container`](Self::parse_container) and the section
    /// scan of multi-block statements. Within a section scan an unregistered
    /// keyword is an invalid continuation rather than a placeholder.
    fn parse_items(
        &mut self,
        until: &[&str],
        sections: bool,
    ) -> Result<(Container, Option<Directive>), ParseError> {
        let registry = self.registry;
        let mut container = Container::new();

        while let Some(line) = self.reader.current_line().cloned() {
            let directive = match self.classify(line) {
                Classified::Text(line) => {
                    container.push(content::text_line(&line, &self.env)?);
                    self.reader.advance();
                    continue;
                }
                Classified::Directive(directive) => directive,
            };

            if until.contains(&directive.keyword.as_str()) {
                self.reader.advance();
                return Ok((container, Some(directive)));
            }

            if directive.keyword == self.env.config.macro_start {
                self.parse_macro(directive)?;
                continue;
            }

            match registry.lookup(&directive.keyword) {
                Some(syntax) => {
                    let statement = self.parse_statement(directive, syntax)?;
                    container.push(statement);
                }
                None if sections => {
                    return Err(ParseError::InvalidContinuation {
                        at: directive.at.clone(),
                        keyword: directive.keyword,
                        text: directive.line.trimmed().to_string(),
                    });
                }
                None if self.env.config.strict_directives => {
                    return Err(ParseError::UnknownDirective {
                        at: directive.at.clone(),
                        keyword: directive.keyword,
                        text: directive.line.trimmed().to_string(),
                    });
                }
                None => {
                    tracing::debug!(
                        at = %directive.at,
                        keyword = %directive.keyword,
                        "unidentified directive"
                    );
                    container.push(Box::new(Unidentified {
                        text: directive.line.trimmed().to_string(),
                        at: directive.at,
                        keyword: directive.keyword,
                    }));
                    self.reader.advance();
                }
            }
        }

        Ok((container, None))
    }

    fn parse_body(&mut self, header: &Directive, end: &str) -> Result<Container, ParseError> {
        match self.parse_container(&[end])? {
            (body, Some(_)) => Ok(body),
            (_, None) => Err(unterminated(header, end)),
        }
    }

    fn parse_statement(&mut self, directive: Directive, syntax: &StatementSyntax) -> Result<BoxedStatement, ParseError> {
        match syntax {
            StatementSyntax::Line { build } => {
                let statement = build(&directive, &self.env)?
                    .ok_or_else(|| self.env.malformed(&directive, "unrecognized arguments"))?;
                self.reader.advance();
                Ok(statement)
            }
            StatementSyntax::Block { end, build } => {
                self.reader.advance();
                let body = self.parse_body(&directive, end)?;
                build(&directive, body, &self.env)
            }
            StatementSyntax::BlockOrLine { end, line, block } => {
                if let Some(statement) = line(&directive, &self.env)? {
                    self.reader.advance();
                    return Ok(statement);
                }
                self.reader.advance();
                let body = self.parse_body(&directive, end)?;
                block(&directive, body, &self.env)
            }
            StatementSyntax::MultiBlock {
                end,
                continuations,
                build,
            } => {
                self.reader.advance();
                let (primary, sections) = self.parse_sections(&directive, end, continuations)?;
                build(&directive, primary, sections, &self.env)
            }
            StatementSyntax::Verbatim { end, build } => {
                self.reader.advance();
                let lines = self
                    .reader
                    .read_directive_block(end)
                    .ok_or_else(|| unterminated(&directive, end))?;
                self.reader.advance();
                build(&directive, lines, &self.env)
            }
        }
    }

    /// Parses the primary body and every continuation section of a
    /// multi-block statement. Each body ends at the end keyword or at any
    /// continuation keyword.
    fn parse_sections(
        &mut self,
        header: &Directive,
        end: &str,
        continuations: &[Continuation],
    ) -> Result<(Container, Vec<Section>), ParseError> {
        let mut boundary: Vec<&str> = continuations.iter().map(|c| c.keyword.as_str()).collect();
        boundary.push(end);

        let (primary, mut stop) = self.parse_items(&boundary, true)?;
        let mut sections: Vec<Section> = Vec::new();

        loop {
            let Some(next) = stop else {
                return Err(unterminated(header, end));
            };
            if next.keyword == end {
                break;
            }

            let chain_closed = sections.last().is_some_and(|last| {
                continuations
                    .iter()
                    .any(|c| c.keyword == last.keyword && c.closes_chain)
            });
            let continuation = continuations
                .iter()
                .find(|c| c.keyword == next.keyword)
                .filter(|c| c.repeatable || !sections.iter().any(|s| s.keyword == c.keyword));
            if chain_closed || continuation.is_none() {
                return Err(ParseError::InvalidContinuation {
                    at: next.at.clone(),
                    keyword: next.keyword.clone(),
                    text: next.line.trimmed().to_string(),
                });
            }

            let (body, following) = self.parse_items(&boundary, true)?;
            sections.push(Section {
                keyword: next.keyword.clone(),
                header: next,
                body,
            });
            stop = following;
        }

        Ok((primary, sections))
    }

    /// `:func name(a, b)` ... `:end-func`
    fn parse_macro(&mut self, header: Directive) -> Result<(), ParseError> {
        let (name, params) = macro_signature(&header.args)
            .ok_or_else(|| self.env.malformed(&header, "expected `name(param, ...)`"))?;
        self.reader.advance();

        let end = self.env.config.macro_end.clone();
        let body = self.parse_body(&header, &end)?;
        tracing::debug!(name = %name, at = %header.at, params = ?params, "declared macro");
        self.macros.insert(Macro {
            name,
            params,
            body,
            at: header.at,
        });
        Ok(())
    }
}

fn unterminated(header: &Directive, end: &str) -> ParseError {
    ParseError::Unterminated {
        at: header.at.clone(),
        keyword: header.keyword.clone(),
        expected: end.to_string(),
    }
}

/// Parses `name`, `name()` or `name(a, b)`.
pub(crate) fn macro_signature(args: &str) -> Option<(String, Vec<String>)> {
    let (name, params) = match args.find('(') {
        Some(open) => {
            let inner = args[open + 1..].strip_suffix(')')?;
            let params = if inner.trim().is_empty() {
                Vec::new()
            } else {
                split_top_level(inner, ',')
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .collect()
            };
            (args[..open].trim(), params)
        }
        None => (args.trim(), Vec::new()),
    };
    if !is_identifier(name) || !params.iter().all(|p| is_identifier(p)) {
        return None;
    }
    Some((name.to_string(), params))
}
