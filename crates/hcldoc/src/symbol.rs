//! syntax symbols and the tree holding them
//!
//! All symbols of one parse live in a [SymbolTree] and refer to each other by [SymbolId].
//! Children are listed top-down; the `parent` id points back up and is only meant for
//! diagnostics.
use crate::span::{Position, Span};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What kind of node a [Symbol] is
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    /// `ident "label" label { ... }`
    ///
    /// `names` holds the identifier followed by all labels and is never empty.
    Block { names: Vec<String> },
    /// `name = expression`, the expression is the only child (none means `null`)
    Attribute,
    /// literal scalar, kept in its textual form until reduction
    Value { ty: ValueType, value: String },
    /// `[ ... ]`, children are the elements
    Array,
    /// `{ key = value, ... }`, children are attributes
    Map,
    /// expression left for a later evaluation phase
    Eval(EvalSymbol),
    /// bare type keyword such as `string`
    Primitive(PrimitiveType),
}

impl SymbolKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Block { .. } => "block",
            SymbolKind::Attribute => "attribute",
            SymbolKind::Value { .. } => "value",
            SymbolKind::Array => "array",
            SymbolKind::Map => "map",
            SymbolKind::Eval(_) => "expression",
            SymbolKind::Primitive(_) => "primitive type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Number => f.write_str("number"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Null => f.write_str("null"),
        }
    }
}

/// Unevaluated expression and its source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new)]
pub struct EvalSymbol {
    pub kind: EvalKind,
    pub expression: String,
}

impl fmt::Display for EvalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.expression)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalKind {
    /// `var.name`, `local.list[0]`, `aws_instance.web.*.id`
    Variable,
    /// `name(...)`
    Function,
    /// `[for ...]` or `{for ...}`
    For,
    /// operations, conditionals and parenthesised expressions
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Bool,
    Any,
}

impl PrimitiveType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(PrimitiveType::String),
            "number" => Some(PrimitiveType::Number),
            "bool" => Some(PrimitiveType::Bool),
            "any" => Some(PrimitiveType::Any),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: Option<String>,
    pub span: Span,
    children: Vec<SymbolId>,
    attributes: Vec<SymbolId>,
    parent: Option<SymbolId>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: Option<String>, span: Span) -> Self {
        tracing::debug!(kind = kind.describe(), ?name, line = span.line(), "create new symbol");
        Self {
            kind,
            name,
            span,
            children: vec![],
            attributes: vec![],
            parent: None,
        }
    }

    pub fn block(names: Vec<String>, span: Span) -> Self {
        let name = names.first().cloned();
        Self::new(SymbolKind::Block { names }, name, span)
    }

    pub fn attribute(name: impl Into<String>, span: Span) -> Self {
        Self::new(SymbolKind::Attribute, Some(name.into()), span)
    }

    pub fn value(ty: ValueType, value: impl Into<String>, span: Span) -> Self {
        Self::new(
            SymbolKind::Value {
                ty,
                value: value.into(),
            },
            None,
            span,
        )
    }

    pub fn children(&self) -> &[SymbolId] {
        &self.children
    }

    /// Attribute children of a block or map
    pub fn attributes(&self) -> &[SymbolId] {
        &self.attributes
    }

    pub fn parent(&self) -> Option<SymbolId> {
        self.parent
    }

    pub fn position(&self) -> Position {
        self.span.start
    }

    pub fn line(&self) -> usize {
        self.span.line()
    }

    pub fn column(&self) -> usize {
        self.span.column()
    }

    pub fn length(&self) -> usize {
        self.span.length
    }

    /// Identifier and labels if this is a block
    pub fn block_names(&self) -> Option<&[String]> {
        match &self.kind {
            SymbolKind::Block { names } => Some(names),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, SymbolKind::Block { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, SymbolKind::Attribute)
    }
}

/// Arena of all symbols produced by one parse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTree {
    symbols: Vec<Symbol>,
    roots: Vec<SymbolId>,
}

impl SymbolTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `symbol` as the last child of `parent`, or as a root symbol when there is none
    pub fn push(&mut self, parent: Option<SymbolId>, mut symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        let is_attribute = symbol.is_attribute();
        symbol.parent = parent;
        self.symbols.push(symbol);

        match parent {
            None => self.roots.push(id),
            Some(parent) => {
                let parent = &mut self.symbols[parent.0];
                parent.children.push(id);
                if is_attribute && matches!(parent.kind, SymbolKind::Block { .. } | SymbolKind::Map)
                {
                    parent.attributes.push(id);
                }
            }
        }

        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn roots(&self) -> &[SymbolId] {
        &self.roots
    }

    pub fn root_symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.roots.iter().map(|id| (*id, &self[*id]))
    }

    pub fn children(&self, id: SymbolId) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self[id].children.iter().map(|id| (*id, &self[*id]))
    }

    /// Walks from `id` up to its root symbol, excluding `id` itself
    pub fn ancestors(&self, id: SymbolId) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        std::iter::successors(self[id].parent, |id| self[*id].parent).map(|id| (id, &self[id]))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Extends the span of `id` up to the end of `end`
    pub(crate) fn close(&mut self, id: SymbolId, end: Span) {
        let symbol = &mut self.symbols[id.0];
        symbol.span = symbol.span.to(end);
    }

    /// Replaces `id`, the most recently opened symbol, and everything below it with `replacement`
    ///
    /// Used when a value turns out to be the first operand of a larger expression.
    pub(crate) fn collapse(&mut self, id: SymbolId, replacement: Symbol) {
        self.symbols.truncate(id.0 + 1);
        let parent = self.symbols[id.0].parent;
        self.symbols[id.0] = Symbol {
            parent,
            ..replacement
        };
    }
}

impl std::ops::Index<SymbolId> for SymbolTree {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Self::Output {
        &self.symbols[id.0]
    }
}
