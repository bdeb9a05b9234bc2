//! Tokenizing helpers for expressions and directive arguments.
//!
//! Expressions are line-oriented: terms and operators are separated by
//! whitespace, parentheses are always tokens of their own, and quoted strings
//! and `[...]` sequence literals are single tokens.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word: number, keyword, operator or variable reference.
    Word(String),
    /// A quoted string, escapes already processed.
    Str(String),
    /// The raw contents of a `[...]` sequence literal.
    List(String),
    LParen,
    RParen,
}

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, String> {
        let rest = self.remaining();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());

        let rest = self.remaining();
        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };

        match first {
            '(' => {
                self.advance(1);
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.advance(1);
                Ok(Some(Token::RParen))
            }
            '\'' | '"' => {
                let mut s = String::new();
                let mut chars = rest.char_indices().skip(1);
                while let Some((idx, c)) = chars.next() {
                    if c == first {
                        self.advance(idx + 1);
                        return Ok(Some(Token::Str(s)));
                    }
                    if c == '\\' {
                        match chars.next() {
                            Some((_, 'n')) => s.push('\n'),
                            Some((_, 't')) => s.push('\t'),
                            Some((_, esc)) => s.push(esc),
                            None => break,
                        }
                    } else {
                        s.push(c);
                    }
                }
                Err(format!("unterminated string literal {rest}"))
            }
            '[' => match closing_bracket(rest) {
                Some(end) => {
                    self.advance(end + 1);
                    Ok(Some(Token::List(rest[1..end].to_string())))
                }
                None => Err(format!("unterminated sequence literal {rest}")),
            },
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                    .unwrap_or(rest.len());
                self.advance(len);
                Ok(Some(Token::Word(rest[..len].to_string())))
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Byte index of the `]` matching the `[` at the start of `s`.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `s` on `sep` where it appears outside quotes, brackets and
/// parentheses. A `|` separator never splits a `||` pair.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    let bytes = s.as_bytes();

    for (idx, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            _ if c == sep && depth == 0 => {
                if sep == '|' {
                    let doubled = (idx > 0 && bytes[idx - 1] == b'|')
                        || bytes.get(idx + 1) == Some(&b'|');
                    if doubled {
                        continue;
                    }
                }
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Cuts a trailing ` <marker>` comment that sits outside quotes.
pub fn strip_trailing_comment<'s>(s: &'s str, marker: &str) -> &'s str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
        } else if c.is_whitespace() && s[idx + c.len_utf8()..].starts_with(marker) {
            return &s[..idx];
        }
    }
    s
}

/// A piece of a text line containing inline expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'s> {
    Text(&'s str),
    Expr(&'s str),
}

/// Splits `line` into literal text and `open expr close` segments. An
/// unclosed `open` is kept as literal text.
pub fn split_inline<'s>(line: &'s str, open: &str, close: &str) -> Vec<Segment<'s>> {
    let mut segments = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find(open) {
        let (before, after_start) = rest.split_at(start);
        let inner = &after_start[open.len()..];
        match find_unquoted(inner, close) {
            Some(end) => {
                if !before.is_empty() {
                    segments.push(Segment::Text(before));
                }
                segments.push(Segment::Expr(inner[..end].trim()));
                rest = &inner[end + close.len()..];
            }
            None => break,
        }
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// Byte offset of the first `pat` in `s` that is not inside a quoted string.
fn find_unquoted(s: &str, pat: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
        } else if s[idx..].starts_with(pat) {
            return Some(idx);
        }
    }
    None
}

/// Letters, digits, `_` and `-`, not starting with a digit.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '@' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<Token> {
        tokenize(input).unwrap()
    }

    #[test]
    fn tokenizes_terms_operators_and_groups() {
        assert_eq!(
            words("not (a.b == 'x y') or count > 2"),
            vec![
                Token::Word("not".into()),
                Token::LParen,
                Token::Word("a.b".into()),
                Token::Word("==".into()),
                Token::Str("x y".into()),
                Token::RParen,
                Token::Word("or".into()),
                Token::Word("count".into()),
                Token::Word(">".into()),
                Token::Word("2".into()),
            ]
        );
    }

    #[test]
    fn strings_handle_escapes() {
        assert_eq!(words(r#""a\"b\n""#), vec![Token::Str("a\"b\n".into())]);
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn sequence_literals_are_single_tokens() {
        assert_eq!(
            words("[1, 'a]', [2]] + x"),
            vec![
                Token::List("1, 'a]', [2]".into()),
                Token::Word("+".into()),
                Token::Word("x".into()),
            ]
        );
        assert!(tokenize("[1, 2").is_err());
    }

    #[test]
    fn top_level_split_respects_nesting() {
        assert_eq!(
            split_top_level("name | default('a|b') | join(', ')", '|'),
            vec!["name ", " default('a|b') ", " join(', ')"]
        );
        assert_eq!(split_top_level("a || b", '|'), vec!["a || b"]);
        assert_eq!(split_top_level("x: [1, 2], y: f(a, b)", ','), vec!["x: [1, 2]", " y: f(a, b)"]);
    }

    #[test]
    fn trailing_comments_are_cut_outside_quotes() {
        assert_eq!(strip_trailing_comment("x = 1 // note", "//"), "x = 1");
        assert_eq!(strip_trailing_comment("x = 'http://a' // c", "//"), "x = 'http://a'");
        assert_eq!(strip_trailing_comment("x = 'a //b'", "//"), "x = 'a //b'");
    }

    #[test]
    fn inline_segments() {
        assert_eq!(
            split_inline("let {{ name }}: {{type|uppercase}};", "{{", "}}"),
            vec![
                Segment::Text("let "),
                Segment::Expr("name"),
                Segment::Text(": "),
                Segment::Expr("type|uppercase"),
                Segment::Text(";"),
            ]
        );
        assert_eq!(split_inline("a {{ open", "{{", "}}"), vec![Segment::Text("a {{ open")]);
        assert_eq!(
            split_inline("x{{ '}}' }}y{{ \"a}}\" | trim }}", "{{", "}}"),
            vec![
                Segment::Text("x"),
                Segment::Expr("'}}'"),
                Segment::Text("y"),
                Segment::Expr("\"a}}\" | trim"),
            ]
        );
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("entity_name"));
        assert!(is_identifier("api-path"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }
}
