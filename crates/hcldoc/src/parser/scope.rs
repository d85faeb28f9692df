use crate::error::{Error, Result, SyntaxErrorKind};
use crate::span::Position;
use crate::symbol::SymbolId;

/// Scopes open at once, the document body included
pub const MAX_DEPTH: usize = 128;

/// What the parser expects to read next inside of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    /// blocks and attributes, either at document level or inside `{ ... }` of a block
    Body,
    /// the value of an attribute or map entry
    Attribute,
    /// elements of `[ ... ]`
    Array,
    /// entries of `{ ... }` in expression position
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scope {
    pub kind: ScopeKind,
    /// symbol that receives the children read in this scope, `None` for the document itself
    pub symbol: Option<SymbolId>,
    /// set once a complete value has been read into this scope
    pub complete: bool,
}

/// Stack of open scopes, the innermost on top
///
/// The document body sits at the bottom. Parsing is done once the stack is empty.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Body,
                symbol: None,
                complete: false,
            }],
        }
    }

    pub fn top(&self) -> Option<Scope> {
        self.scopes.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Opens a scope for `symbol`, which starts at `position`
    pub fn open(&mut self, symbol: SymbolId, kind: ScopeKind, position: Position) -> Result<()> {
        if self.depth() >= MAX_DEPTH {
            return Err(Error::syntax(SyntaxErrorKind::NestingTooDeep(MAX_DEPTH), position));
        }

        tracing::trace!(?kind, symbol = symbol.index(), depth = self.depth(), "open scope");
        self.scopes.push(Scope {
            kind,
            symbol: Some(symbol),
            complete: false,
        });
        Ok(())
    }

    /// Pops the innermost scope; the enclosing scope now holds a complete value
    pub fn close(&mut self) -> Option<Scope> {
        let closed = self.scopes.pop()?;
        tracing::trace!(kind = ?closed.kind, depth = self.depth(), "close scope");
        if let Some(parent) = self.scopes.last_mut() {
            parent.complete = true;
        }
        Some(closed)
    }

    pub fn set_complete(&mut self, complete: bool) {
        if let Some(top) = self.scopes.last_mut() {
            top.complete = complete;
        }
    }
}
