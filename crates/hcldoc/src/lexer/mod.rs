//! character stream to tokens
//!
//! The [Lexer] hands out one [Token] per call to [Lexer::next_token]. Whitespace and comments
//! are skipped, newlines are kept since they separate attributes and map entries.
//!
//! String and heredoc literals are scanned in one go. Template sequences (`${ ... }` and
//! `%{ ... }`) inside of them are scanned by recursing into the default mode until the matching
//! `}` shows up, so braces and quotes inside the sequence never end the literal early. The text
//! of a template sequence is kept as written; evaluating it is left to a later phase.
mod token;

pub use token::{Token, TokenKind};

use crate::error::{Error, LexErrorKind, Result};
use crate::span::{Position, Span};
use std::fmt;

/// Template sequences that may be open inside of each other
pub const MAX_TEMPLATE_DEPTH: usize = 32;

/// Lexical modes, kept as a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default,
    String,
    Heredoc,
    LineComment,
    BlockComment,
    Interpolation,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Default => f.write_str("expression"),
            Mode::String => f.write_str("string literal"),
            Mode::Heredoc => f.write_str("heredoc"),
            Mode::LineComment => f.write_str("line comment"),
            Mode::BlockComment => f.write_str("block comment"),
            Mode::Interpolation => f.write_str("template interpolation"),
        }
    }
}

pub struct Lexer<'src> {
    source: &'src str,
    position: Position,
    modes: Vec<Mode>,
    /// kind of the most recent token, decides whether `-`/`+` is a sign
    last: Option<TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: Position::default(),
            modes: vec![Mode::Default],
            last: None,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Default)
    }

    /// Scans the next token
    ///
    /// Once the input is exhausted every call returns [TokenKind::Eof].
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;

        let start = self.position;
        let Some(c) = self.peek() else {
            return Ok(self.finish(TokenKind::Eof, String::new(), Span::new(start, 0)));
        };

        let kind = match c {
            '"' => return self.scan_string(),
            '<' if self.heredoc_ahead() => return self.scan_heredoc(),
            '0'..='9' => return Ok(self.scan_number()),
            '-' | '+' if self.sign_allowed() && matches!(self.peek_nth(1), Some('0'..='9')) => {
                return Ok(self.scan_number())
            }
            c if is_ident_start(c) => return Ok(self.scan_ident()),

            '\n' => self.punct(1, TokenKind::Newline),
            '{' => self.punct(1, TokenKind::LBrace),
            '}' => self.punct(1, TokenKind::RBrace),
            '[' => self.punct(1, TokenKind::LBracket),
            ']' => self.punct(1, TokenKind::RBracket),
            '(' => self.punct(1, TokenKind::LParen),
            ')' => self.punct(1, TokenKind::RParen),
            ',' => self.punct(1, TokenKind::Comma),
            ':' => self.punct(1, TokenKind::Colon),
            '?' => self.punct(1, TokenKind::Question),
            '.' if self.starts_with("...") => self.punct(3, TokenKind::Ellipsis),
            '.' => self.punct(1, TokenKind::Dot),
            '=' if self.starts_with("==") => self.punct(2, TokenKind::Operator),
            '=' if self.starts_with("=>") => self.punct(2, TokenKind::Arrow),
            '=' => self.punct(1, TokenKind::Equals),
            '!' | '<' | '>' if self.peek_nth(1) == Some('=') => self.punct(2, TokenKind::Operator),
            '&' if self.starts_with("&&") => self.punct(2, TokenKind::Operator),
            '|' if self.starts_with("||") => self.punct(2, TokenKind::Operator),
            '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%' => self.punct(1, TokenKind::Operator),
            other => {
                return Err(Error::lexical(LexErrorKind::UnexpectedChar(other), start));
            }
        };

        Ok(self.token(kind, start))
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.position.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining().starts_with(prefix)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, chars: usize) {
        for _ in 0..chars {
            self.advance();
        }
    }

    fn punct(&mut self, chars: usize, kind: TokenKind) -> TokenKind {
        self.advance_by(chars);
        kind
    }

    fn enter(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    fn leave(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.position.offset - start.offset)
    }

    fn token(&mut self, kind: TokenKind, start: Position) -> Token {
        let span = self.span_from(start);
        let text = span.slice(self.source).to_string();
        self.finish(kind, text, span)
    }

    fn finish(&mut self, kind: TokenKind, text: String, span: Span) -> Token {
        tracing::trace!(?kind, line = span.line(), column = span.column(), ?text, "token");
        self.last = Some(kind);
        Token::new(kind, text, span)
    }

    fn unterminated(&self, start: Position) -> Error {
        Error::lexical(LexErrorKind::Unterminated(self.mode()), start)
    }

    fn sign_allowed(&self) -> bool {
        !self.last.is_some_and(|kind| kind.ends_operand())
    }

    fn heredoc_ahead(&self) -> bool {
        if !self.starts_with("<<") {
            return false;
        }
        let marker_at = if self.peek_nth(2) == Some('-') { 3 } else { 2 };
        matches!(self.peek_nth(marker_at), Some(c) if is_ident_start(c))
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\u{feff}') => {
                    self.advance();
                }
                Some('#') => self.skip_line_comment(),
                Some('/') if self.starts_with("//") => self.skip_line_comment(),
                Some('/') if self.starts_with("/*") => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Skips up to, but not including, the end of the line
    fn skip_line_comment(&mut self) {
        self.enter(Mode::LineComment);
        while matches!(self.peek(), Some(c) if c != '\n') {
            self.advance();
        }
        self.leave();
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.position;
        self.enter(Mode::BlockComment);
        self.advance_by(2);
        while !self.starts_with("*/") {
            if self.advance().is_none() {
                return Err(self.unterminated(start));
            }
        }
        self.advance_by(2);
        self.leave();
        Ok(())
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.position;
        self.advance();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }

        let kind = match &self.source[start.offset..self.position.offset] {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };
        self.token(kind, start)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.position;
        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }
        self.skip_digits();

        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some('0'..='9')) {
            self.advance();
            self.skip_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek_nth(1), Some('+' | '-')) { 2 } else { 1 };
            if matches!(self.peek_nth(digit_at), Some('0'..='9')) {
                self.advance_by(digit_at);
                self.skip_digits();
            }
        }

        self.token(TokenKind::Number, start)
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
    }

    fn scan_string(&mut self) -> Result<Token> {
        let start = self.position;
        self.enter(Mode::String);
        self.advance();

        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.unterminated(start)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => self.scan_escape(&mut value)?,
                Some('$' | '%') => self.scan_template_marker(&mut value)?,
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        self.leave();

        let span = self.span_from(start);
        Ok(self.finish(TokenKind::String, value, span))
    }

    fn scan_escape(&mut self, out: &mut String) -> Result<()> {
        let start = self.position;
        self.advance();

        let decoded = match self.advance() {
            None => return Err(self.unterminated(start)),
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('"') => '"',
            Some('\\') => '\\',
            Some(marker @ 'u') => self.scan_unicode(marker, 4, start)?,
            Some(marker @ 'U') => self.scan_unicode(marker, 8, start)?,
            Some(other) => {
                let sequence = format!("\\{other}");
                return Err(Error::lexical(LexErrorKind::InvalidEscape(sequence), start));
            }
        };

        out.push(decoded);
        Ok(())
    }

    fn scan_unicode(&mut self, marker: char, digits: usize, start: Position) -> Result<char> {
        let hex: String = self.remaining().chars().take(digits).collect();
        let invalid = || {
            let sequence = format!("\\{marker}{hex}");
            Error::lexical(LexErrorKind::InvalidEscape(sequence), start)
        };

        if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(invalid)?;
        self.advance_by(digits);
        Ok(decoded)
    }

    /// Handles `$` or `%` inside of a literal
    ///
    /// `$${` and `%%{` are escapes for a literal `${`/`%{`, `${`/`%{` opens a template sequence,
    /// anything else is an ordinary character.
    fn scan_template_marker(&mut self, out: &mut String) -> Result<()> {
        let Some(marker) = self.peek() else {
            return Ok(());
        };

        if self.peek_nth(1) == Some(marker) && self.peek_nth(2) == Some('{') {
            out.push(marker);
            out.push('{');
            self.advance_by(3);
        } else if self.peek_nth(1) == Some('{') {
            self.scan_template_sequence(out)?;
        } else {
            out.push(marker);
            self.advance();
        }

        Ok(())
    }

    fn scan_template_sequence(&mut self, out: &mut String) -> Result<()> {
        let start = self.position;
        let open = self.modes.iter().filter(|mode| **mode == Mode::Interpolation).count();
        if open >= MAX_TEMPLATE_DEPTH {
            let kind = LexErrorKind::NestingTooDeep(MAX_TEMPLATE_DEPTH);
            return Err(Error::lexical(kind, start));
        }
        self.enter(Mode::Interpolation);
        self.advance_by(2);

        let mut depth = 0usize;
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                TokenKind::Eof => return Err(self.unterminated(start)),
                _ => {}
            }
        }
        self.leave();

        out.push_str(&self.source[start.offset..self.position.offset]);
        Ok(())
    }

    /// Scans `<<MARKER` or `<<-MARKER` up to and including the closing marker
    ///
    /// The line break after the closing marker is left for the next token.
    fn scan_heredoc(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance_by(2);
        let flush = self.peek() == Some('-');
        if flush {
            self.advance();
        }

        let marker_start = self.position.offset;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }
        let marker = &self.source[marker_start..self.position.offset];

        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
        if self.peek() != Some('\n') {
            return Err(Error::lexical(LexErrorKind::InvalidHeredocMarker, start));
        }
        self.advance();

        self.enter(Mode::Heredoc);
        let mut content = String::new();
        loop {
            let line = self.remaining().split('\n').next().unwrap_or_default();
            let line = line.strip_suffix('\r').unwrap_or(line);
            let candidate = if flush { line.trim_start() } else { line };
            if candidate == marker {
                self.advance_by(line.chars().count());
                break;
            }

            if self.remaining().is_empty() {
                return Err(self.unterminated(start));
            }
            self.scan_heredoc_line(&mut content, start)?;
        }
        self.leave();

        if flush {
            content = dedent(&content);
        }

        let span = self.span_from(start);
        Ok(self.finish(TokenKind::Heredoc, content, span))
    }

    fn scan_heredoc_line(&mut self, out: &mut String, start: Position) -> Result<()> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    out.push('\n');
                    self.advance();
                    return Ok(());
                }
                '\r' if self.peek_nth(1) == Some('\n') => {
                    self.advance();
                }
                '$' | '%' => self.scan_template_marker(out)?,
                c => {
                    out.push(c);
                    self.advance();
                }
            }
        }

        Err(self.unterminated(start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Removes the indentation shared by all non-blank lines
fn dedent(content: &str) -> String {
    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let indent = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(indent_of)
        .min()
        .unwrap_or(0);

    content
        .split_inclusive('\n')
        .map(|line| &line[indent_of(line).min(indent)..])
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use TokenKind::{
        Arrow, Bool, Colon, Comma, Dot, Ellipsis, Eof, Equals, Heredoc, Ident, LBrace, LBracket,
        LParen, Newline, Null, Number, Operator, Question, RBrace, RBracket, RParen,
    };

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token().expect("must tokenize");
            if token.kind == Eof {
                return tokens;
            }
            tokens.push((token.kind, token.text));
        }
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|(kind, _)| kind).collect()
    }

    fn lex_error(source: &str) -> (LexErrorKind, Position) {
        let mut lexer = Lexer::new(source);
        loop {
            match lexer.next_token() {
                Ok(token) if token.kind == Eof => panic!("expected an error for {source:?}"),
                Ok(_) => continue,
                Err(Error::Lexical { kind, position }) => return (kind, position),
                Err(other) => panic!("unexpected error {other}"),
            }
        }
    }

    #[test]
    fn punctuation_and_operators() {
        assert_eq!(
            kinds("a = b == c => d ... !x != y && z || w <= 1"),
            vec![
                Ident, Equals, Ident, Operator, Ident, Arrow, Ident, Ellipsis, Operator, Ident,
                Operator, Ident, Operator, Ident, Operator, Ident, Operator, Number
            ]
        );
        assert_eq!(
            kinds("{[(,:?.)]}"),
            vec![LBrace, LBracket, LParen, Comma, Colon, Question, Dot, RParen, RBracket, RBrace]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            tokenize("a_b-c true false null nullable"),
            vec![
                (Ident, "a_b-c".into()),
                (Bool, "true".into()),
                (Bool, "false".into()),
                (Null, "null".into()),
                (Ident, "nullable".into()),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokenize("x = -12.5e+3"),
            vec![
                (Ident, "x".into()),
                (Equals, "=".into()),
                (Number, "-12.5e+3".into())
            ]
        );
        assert_eq!(tokenize("3.14e2"), vec![(Number, "3.14e2".into())]);
        assert_eq!(
            tokenize("[1, -2]"),
            vec![
                (LBracket, "[".into()),
                (Number, "1".into()),
                (Comma, ",".into()),
                (Number, "-2".into()),
                (RBracket, "]".into()),
            ]
        );
    }

    #[test]
    fn minus_after_operand_is_an_operator() {
        assert_eq!(
            tokenize("a -1"),
            vec![
                (Ident, "a".into()),
                (Operator, "-".into()),
                (Number, "1".into())
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            tokenize(r#""a\"b\n\u00e9\\""#),
            vec![(TokenKind::String, "a\"b\né\\".into())]
        );
    }

    #[test]
    fn interpolation_keeps_nested_braces_and_quotes() {
        assert_eq!(
            tokenize(r#""${ { a = "}" }.a } tail" next"#),
            vec![
                (TokenKind::String, r#"${ { a = "}" }.a } tail"#.into()),
                (Ident, "next".into())
            ]
        );
    }

    #[test]
    fn template_escapes() {
        assert_eq!(
            tokenize(r#""$${x} %%{y} 100% $""#),
            vec![(TokenKind::String, "${x} %{y} 100% $".into())]
        );
        assert_eq!(
            tokenize(r#""%{ if a }yes%{ endif }""#),
            vec![(TokenKind::String, "%{ if a }yes%{ endif }".into())]
        );
    }

    #[test]
    fn heredoc() {
        assert_eq!(
            tokenize("<<EOT\nhello\n  world\nEOT\n"),
            vec![(Heredoc, "hello\n  world\n".into()), (Newline, "\n".into())]
        );
    }

    #[test]
    fn heredoc_marker_must_stand_alone() {
        assert_eq!(
            tokenize("<<EOT\n  EOT\nEOT"),
            vec![(Heredoc, "  EOT\n".into())]
        );
    }

    #[test]
    fn flush_heredoc() {
        assert_eq!(
            tokenize("<<-EOT\n    a\n      b\n\n    EOT"),
            vec![(Heredoc, "a\n  b\n\n".into())]
        );
    }

    #[test]
    fn heredoc_interpolation() {
        assert_eq!(
            tokenize("<<EOT\nx ${join(\"}\", [\n  a\n])}\nEOT"),
            vec![(Heredoc, "x ${join(\"}\", [\n  a\n])}\n".into())]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("# a\nfoo // b\n/* c \n d */ bar"),
            vec![Newline, Ident, Newline, Ident]
        );
    }

    #[test]
    fn positions() {
        let mut lexer = Lexer::new("a = 1\n  bb");
        let mut last = None;
        while let Ok(token) = lexer.next_token() {
            if token.kind == Eof {
                break;
            }
            last = Some(token);
        }

        let last = last.expect("at least one token");
        assert_eq!(last.text, "bb");
        assert_eq!(last.span.start, Position::new(2, 3, 8));
        assert_eq!(last.span.length, 2);
    }

    #[test]
    fn mode_returns_to_default() {
        let mut lexer = Lexer::new(r#""${ "a" }" x"#);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(lexer.mode(), Mode::Default);
    }

    #[test]
    fn template_nesting_is_limited() {
        let nested = |levels: usize| {
            (0..levels).fold("x".to_string(), |inner, _| format!("\"${{{inner}}}\""))
        };

        assert_eq!(kinds(&nested(MAX_TEMPLATE_DEPTH)), vec![TokenKind::String]);
        assert_eq!(
            lex_error(&nested(MAX_TEMPLATE_DEPTH + 1)),
            (
                LexErrorKind::NestingTooDeep(MAX_TEMPLATE_DEPTH),
                Position::new(1, 98, 97)
            )
        );
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(
            lex_error("a = \"abc"),
            (
                LexErrorKind::Unterminated(Mode::String),
                Position::new(1, 5, 4)
            )
        );
    }

    #[test]
    fn unterminated_modes() {
        assert_eq!(
            lex_error("/* open").0,
            LexErrorKind::Unterminated(Mode::BlockComment)
        );
        assert_eq!(
            lex_error("x = <<EOT\nbody\n").0,
            LexErrorKind::Unterminated(Mode::Heredoc)
        );
        assert_eq!(
            lex_error("x = \"${ a").0,
            LexErrorKind::Unterminated(Mode::Interpolation)
        );
    }

    #[test]
    fn invalid_input() {
        assert_eq!(
            lex_error(r#""\q""#).0,
            LexErrorKind::InvalidEscape("\\q".into())
        );
        assert_eq!(
            lex_error(r#""\u12""#).0,
            LexErrorKind::InvalidEscape("\\u12\"".into())
        );
        assert_eq!(
            lex_error("a = @"),
            (LexErrorKind::UnexpectedChar('@'), Position::new(1, 5, 4))
        );
        assert_eq!(
            lex_error("<<EOT trailing\n").0,
            LexErrorKind::InvalidHeredocMarker
        );
    }
}
