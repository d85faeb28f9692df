//! errors raised while scanning, building or reducing a document
use crate::lexer::Mode;
use crate::span::Position;
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{kind} at {position}")]
    Lexical {
        kind: LexErrorKind,
        position: Position,
    },
    #[error("{kind} at {position}")]
    Syntax {
        kind: SyntaxErrorKind,
        position: Position,
    },
    #[error("HCL Block expression scope traverses an object {conflict} (`{label}` at {position})")]
    ScopeConflict {
        conflict: ScopeConflict,
        label: String,
        position: Position,
    },
    #[error("The root blocks must only consist of Blocks and Attributes (found {found} at {position})")]
    RootSymbol {
        found: &'static str,
        position: Position,
    },
    #[error("Error parsing numerical value `{raw}` in HCL attribute `{attribute}` at {position}")]
    Number {
        attribute: String,
        raw: String,
        position: Position,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn lexical(kind: LexErrorKind, position: Position) -> Self {
        Self::Lexical { kind, position }
    }

    pub(crate) fn syntax(kind: SyntaxErrorKind, position: Position) -> Self {
        Self::Syntax { kind, position }
    }

    /// Where in the source the error was detected, if known
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lexical { position, .. }
            | Error::Syntax { position, .. }
            | Error::ScopeConflict { position, .. }
            | Error::RootSymbol { position, .. }
            | Error::Number { position, .. } => Some(*position),
            Error::Io(_) => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unterminated {0}")]
    Unterminated(Mode),
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("heredoc marker must be an identifier followed by a newline")]
    InvalidHeredocMarker,
    #[error("template sequences nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("unmatched closing `{0}`")]
    UnmatchedClose(char),
    #[error("unclosed {0}")]
    Unclosed(&'static str),
    #[error("nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

/// The two ways a block can collide with an already reduced value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeConflict {
    /// a list sits where a nested object (non-terminal label) was expected
    ObjectArray,
    /// a scalar sits where a nested object was expected
    ObjectValue,
}

impl fmt::Display for ScopeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeConflict::ObjectArray => f.write_str("array"),
            ScopeConflict::ObjectValue => f.write_str("value"),
        }
    }
}
