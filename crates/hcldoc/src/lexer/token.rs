use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// bare identifier, may contain `-`
    Ident,
    /// quoted string, `text` holds the unescaped content
    String,
    /// heredoc, `text` holds the content lines
    Heredoc,
    /// numeral including an optional leading sign
    Number,
    /// `true` or `false`
    Bool,
    /// `null`
    Null,

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    /// `=`
    Equals,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `?`
    Question,
    /// `=>`
    Arrow,
    /// arithmetic, comparison and logic operators
    Operator,

    Newline,
    Eof,
}

impl TokenKind {
    /// Whether a token of this kind can end an operand
    ///
    /// A `-` or `+` directly after such a token is an operator, not a sign.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::String
                | TokenKind::Heredoc
                | TokenKind::Number
                | TokenKind::Bool
                | TokenKind::Null
                | TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::RParen
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::String => write!(f, "string {:?}", self.text),
            TokenKind::Heredoc => f.write_str("heredoc"),
            _ => write!(f, "`{}`", self.text),
        }
    }
}
