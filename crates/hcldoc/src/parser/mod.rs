//! tokens to a [SymbolTree]
//!
//! The parser is driven by an explicit [ScopeStack] instead of recursion: every step looks at
//! the innermost open scope, reads what that scope allows and opens or closes scopes as it goes.
//! Nesting depth is capped at [MAX_DEPTH] open scopes.
//!
//! Expressions are not evaluated. Literals become value symbols, arrays and maps become
//! container symbols, and everything else (traversals, function calls, `for` expressions,
//! operations and conditionals) becomes an [EvalSymbol] holding its source text.
mod scope;

use crate::error::{Error, Result, SyntaxErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::span::{Position, Span};
use crate::symbol::{
    EvalKind, EvalSymbol, PrimitiveType, Symbol, SymbolId, SymbolKind, SymbolTree, ValueType,
};
pub use scope::MAX_DEPTH;
use scope::{ScopeKind, ScopeStack};
use std::collections::VecDeque;

/// What to do with a lexical or structural error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recovery {
    /// fail the parse
    #[default]
    Strict,
    /// keep what was read up to the error and drop the error
    BestEffort,
}

impl From<bool> for Recovery {
    fn from(ignore_errors: bool) -> Self {
        if ignore_errors {
            Recovery::BestEffort
        } else {
            Recovery::Strict
        }
    }
}

/// Result of building a tree: the symbols read so far and the error that stopped the parser
#[derive(Debug)]
pub struct ParseOutcome {
    pub tree: SymbolTree,
    pub error: Option<Error>,
}

impl ParseOutcome {
    pub fn into_result(self) -> Result<SymbolTree> {
        self.recover(Recovery::Strict)
    }

    pub fn recover(self, recovery: Recovery) -> Result<SymbolTree> {
        match (self.error, recovery) {
            (None, _) => Ok(self.tree),
            (Some(error), Recovery::BestEffort) => {
                tracing::warn!(%error, symbols = self.tree.len(), "ignoring error, keeping partial tree");
                Ok(self.tree)
            }
            (Some(error), Recovery::Strict) => Err(error),
        }
    }
}

/// Builds the symbol tree of `source`
pub fn parse_tree(source: &str) -> ParseOutcome {
    Parser::new(source).parse()
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: VecDeque<Token>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        let mut tree = SymbolTree::new();
        let error = self.build(&mut tree).err();
        if let Some(error) = &error {
            tracing::debug!(%error, "parser stopped");
        }
        ParseOutcome { tree, error }
    }

    fn build(&mut self, tree: &mut SymbolTree) -> Result<()> {
        let mut scopes = ScopeStack::new();

        while let Some(scope) = scopes.top() {
            match (scope.kind, scope.symbol) {
                (ScopeKind::Body, parent) => self.body(tree, &mut scopes, parent)?,
                (ScopeKind::Attribute, Some(id)) => {
                    self.attribute(tree, &mut scopes, id, scope.complete)?
                }
                (ScopeKind::Array, Some(id)) => self.array(tree, &mut scopes, id, scope.complete)?,
                (ScopeKind::Map, Some(id)) => self.map(tree, &mut scopes, id, scope.complete)?,
                (_, None) => unreachable!("only the document body has no symbol"),
            }
        }

        Ok(())
    }

    fn body(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        parent: Option<SymbolId>,
    ) -> Result<()> {
        self.skip_newlines()?;
        let token = self.next()?;

        match token.kind {
            TokenKind::Eof => match parent {
                None => {
                    scopes.close();
                    Ok(())
                }
                Some(block) => Err(unclosed("block", tree[block].position())),
            },
            TokenKind::RBrace => match parent {
                Some(block) => {
                    tree.close(block, token.span);
                    scopes.close();
                    Ok(())
                }
                None => Err(unmatched(&token)),
            },
            TokenKind::RBracket | TokenKind::RParen => Err(unmatched(&token)),
            TokenKind::Ident | TokenKind::String => self.structure(tree, scopes, parent, token),
            TokenKind::LBracket => {
                let array = tree.push(parent, Symbol::new(SymbolKind::Array, None, token.span));
                scopes.open(array, ScopeKind::Array, token.span.start)
            }
            _ => Err(unexpected("block or attribute", &token)),
        }
    }

    /// Reads what follows the identifier `first`: either `= value` or labels and `{`
    fn structure(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        parent: Option<SymbolId>,
        first: Token,
    ) -> Result<()> {
        if first.is(TokenKind::Ident) && self.peek()?.is(TokenKind::Equals) {
            self.next()?;
            let attribute = tree.push(parent, Symbol::attribute(first.text, first.span));
            return scopes.open(attribute, ScopeKind::Attribute, first.span.start);
        }

        let span = first.span;
        let mut names = vec![first.text];
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Ident | TokenKind::String => names.push(token.text),
                TokenKind::LBrace => {
                    let block = tree.push(parent, Symbol::block(names, span));
                    return scopes.open(block, ScopeKind::Body, span.start);
                }
                _ => return Err(unexpected("block label, `{` or `=`", &token)),
            }
        }
    }

    fn attribute(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        attribute: SymbolId,
        complete: bool,
    ) -> Result<()> {
        if !complete {
            return self.expression(tree, scopes, attribute);
        }

        if let Some(&value) = tree[attribute].children().last() {
            self.continuation(tree, value)?;
            let end = tree[value].span;
            tree.close(attribute, end);
        }
        scopes.close();
        self.end_of_attribute(scopes)
    }

    /// Consumes what separates an attribute from the next one
    fn end_of_attribute(&mut self, scopes: &ScopeStack) -> Result<()> {
        let in_map = scopes
            .top()
            .is_some_and(|scope| scope.kind == ScopeKind::Map);

        let kind = self.peek()?.kind;
        match kind {
            TokenKind::Newline => {
                self.next()?;
                Ok(())
            }
            TokenKind::Comma if in_map => {
                self.next()?;
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => {
                let token = self.next()?;
                Err(unexpected("newline after attribute", &token))
            }
        }
    }

    fn array(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        array: SymbolId,
        complete: bool,
    ) -> Result<()> {
        if complete {
            scopes.set_complete(false);
            if let Some(&last) = tree[array].children().last() {
                self.continuation(tree, last)?;
            }
            return self.element_separator();
        }

        self.skip_newlines()?;
        let kind = self.peek()?.kind;
        match kind {
            TokenKind::RBracket => {
                let token = self.next()?;
                tree.close(array, token.span);
                scopes.close();
                Ok(())
            }
            TokenKind::Eof => Err(unclosed("array", tree[array].position())),
            _ => self.expression(tree, scopes, array),
        }
    }

    /// Elements are separated by a comma, a newline or both
    fn element_separator(&mut self) -> Result<()> {
        let mut separated = false;
        while self.peek()?.is(TokenKind::Newline) {
            self.next()?;
            separated = true;
        }

        let kind = self.peek()?.kind;
        match kind {
            TokenKind::Comma => {
                self.next()?;
                Ok(())
            }
            TokenKind::RBracket => Ok(()),
            _ if separated => Ok(()),
            _ => {
                let token = self.next()?;
                Err(unexpected("`,` or `]`", &token))
            }
        }
    }

    fn map(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        map: SymbolId,
        complete: bool,
    ) -> Result<()> {
        if complete {
            // the entry already consumed its separator
            scopes.set_complete(false);
        }

        self.skip_newlines()?;
        let token = self.next()?;
        match token.kind {
            TokenKind::RBrace => {
                tree.close(map, token.span);
                scopes.close();
                Ok(())
            }
            TokenKind::Eof => Err(unclosed("map", tree[map].position())),
            TokenKind::Ident
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Bool
            | TokenKind::Null => self.map_entry(tree, scopes, map, token.text, token.span),
            TokenKind::LParen => {
                let end = self.skip_group(token.span)?;
                let span = token.span.to(end);
                let key = span.slice(self.lexer.source()).to_string();
                self.map_entry(tree, scopes, map, key, span)
            }
            _ => Err(unexpected("map key", &token)),
        }
    }

    fn map_entry(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        map: SymbolId,
        key: String,
        span: Span,
    ) -> Result<()> {
        let separator = self.next()?;
        if !matches!(separator.kind, TokenKind::Equals | TokenKind::Colon) {
            return Err(unexpected("`=` or `:`", &separator));
        }

        let entry = tree.push(Some(map), Symbol::attribute(key, span));
        scopes.open(entry, ScopeKind::Attribute, span.start)
    }

    /// Reads one value into `container`
    ///
    /// Arrays and maps only get opened here; their content is read by the following steps.
    fn expression(
        &mut self,
        tree: &mut SymbolTree,
        scopes: &mut ScopeStack,
        container: SymbolId,
    ) -> Result<()> {
        let token = self.next()?;
        let (kind, span) = (token.kind, token.span);

        let symbol = match kind {
            TokenKind::String | TokenKind::Heredoc => {
                Symbol::value(ValueType::String, token.text, span)
            }
            TokenKind::Number => Symbol::value(ValueType::Number, token.text, span),
            TokenKind::Bool => Symbol::value(ValueType::Boolean, token.text, span),
            TokenKind::Null => Symbol::value(ValueType::Null, token.text, span),
            TokenKind::LBracket | TokenKind::LBrace if self.for_ahead()? => {
                let end = self.skip_group(span)?;
                self.eval(EvalKind::For, None, span, end)
            }
            TokenKind::LBracket => {
                let array = tree.push(Some(container), Symbol::new(SymbolKind::Array, None, span));
                return scopes.open(array, ScopeKind::Array, span.start);
            }
            TokenKind::LBrace => {
                let map = tree.push(Some(container), Symbol::new(SymbolKind::Map, None, span));
                return scopes.open(map, ScopeKind::Map, span.start);
            }
            TokenKind::Ident => self.traversal(token)?,
            TokenKind::LParen => {
                let end = self.skip_group(span)?;
                self.eval(EvalKind::Expression, None, span, end)
            }
            TokenKind::Operator if token.text == "-" || token.text == "!" => {
                let end = self.expression_end(span)?;
                self.eval(EvalKind::Expression, None, span, end)
            }
            _ => return Err(unexpected("expression", &token)),
        };

        tree.push(Some(container), symbol);
        scopes.set_complete(true);
        Ok(())
    }

    /// `name`, `name.attr[index].*`, `name(args)` or a type keyword
    fn traversal(&mut self, root: Token) -> Result<Symbol> {
        let mut kind = EvalKind::Variable;
        let mut end = root.span;

        loop {
            let next = self.peek()?.kind;
            match next {
                TokenKind::Dot => {
                    self.next()?;
                    let step = self.next()?;
                    if !(step.is(TokenKind::Ident) || step.is(TokenKind::Number) || step.is_operator("*")) {
                        return Err(unexpected("attribute name", &step));
                    }
                    end = step.span;
                }
                TokenKind::LBracket => {
                    let open = self.next()?;
                    end = self.skip_group(open.span)?;
                }
                TokenKind::LParen if end == root.span => {
                    let open = self.next()?;
                    kind = EvalKind::Function;
                    end = self.skip_group(open.span)?;
                }
                _ => break,
            }
        }

        if end == root.span {
            if let Some(primitive) = PrimitiveType::from_keyword(&root.text) {
                return Ok(Symbol::new(
                    SymbolKind::Primitive(primitive),
                    Some(root.text),
                    root.span,
                ));
            }
        }

        Ok(self.eval(kind, Some(root.text), root.span, end))
    }

    /// Folds `value` into a larger expression when an operator or `?` follows it
    fn continuation(&mut self, tree: &mut SymbolTree, value: SymbolId) -> Result<()> {
        if !matches!(self.peek()?.kind, TokenKind::Operator | TokenKind::Question) {
            return Ok(());
        }

        let start = tree[value].span;
        let end = self.expression_end(start)?;
        let symbol = self.eval(EvalKind::Expression, None, start, end);
        tree.collapse(value, symbol);
        Ok(())
    }

    /// Consumes the rest of an expression and returns the span of its last token
    ///
    /// The expression ends at a newline, `,` or closing bracket outside of any brackets it
    /// opened itself. A newline right after an operator does not end it.
    fn expression_end(&mut self, start: Span) -> Result<Span> {
        let mut end = start;
        let mut depth = 0usize;
        let mut dangling = false;

        loop {
            let kind = self.peek()?.kind;
            match kind {
                TokenKind::Eof if depth > 0 => return Err(unclosed("expression", start.start)),
                TokenKind::Eof => return Ok(end),
                TokenKind::Comma | TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen
                    if depth == 0 =>
                {
                    return Ok(end)
                }
                TokenKind::Newline if depth == 0 && !dangling => return Ok(end),
                _ => {}
            }

            let token = self.next()?;
            match token.kind {
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => depth -= 1,
                TokenKind::Newline => continue,
                _ => {}
            }
            dangling = matches!(
                token.kind,
                TokenKind::Operator | TokenKind::Question | TokenKind::Colon
            );
            end = token.span;
        }
    }

    /// Skips to the bracket closing the one at `open`, returns the span of the closing bracket
    fn skip_group(&mut self, open: Span) -> Result<Span> {
        let mut depth = 1usize;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(token.span);
                    }
                }
                TokenKind::Eof => return Err(unclosed("expression", open.start)),
                _ => {}
            }
        }
    }

    /// Whether the bracket just read opens a `for` expression
    fn for_ahead(&mut self) -> Result<bool> {
        let mut index = 0;
        while self.peek_nth(index)?.is(TokenKind::Newline) {
            index += 1;
        }

        let keyword = self.peek_nth(index)?;
        if !(keyword.is(TokenKind::Ident) && keyword.text == "for") {
            return Ok(false);
        }
        Ok(self.peek_nth(index + 1)?.is(TokenKind::Ident))
    }

    fn eval(&self, kind: EvalKind, name: Option<String>, start: Span, end: Span) -> Symbol {
        let span = start.to(end);
        let expression = span.slice(self.lexer.source()).to_string();
        Symbol::new(
            SymbolKind::Eval(EvalSymbol::new(kind, expression)),
            name,
            span,
        )
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.peek()?.is(TokenKind::Newline) {
            self.next()?;
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&mut self, n: usize) -> Result<&Token> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token()?;
            self.lookahead.push_back(token);
        }
        Ok(&self.lookahead[n])
    }

    fn next(&mut self) -> Result<Token> {
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }
}

fn unexpected(expected: &'static str, found: &Token) -> Error {
    Error::syntax(
        SyntaxErrorKind::UnexpectedToken {
            expected,
            found: found.to_string(),
        },
        found.span.start,
    )
}

fn unmatched(token: &Token) -> Error {
    let bracket = token.text.chars().next().unwrap_or('}');
    Error::syntax(SyntaxErrorKind::UnmatchedClose(bracket), token.span.start)
}

fn unclosed(what: &'static str, position: Position) -> Error {
    Error::syntax(SyntaxErrorKind::Unclosed(what), position)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::LexErrorKind;
    use crate::lexer::Mode;
    use pretty_assertions::assert_eq;

    fn tree(source: &str) -> SymbolTree {
        parse_tree(source).into_result().expect("source must parse")
    }

    fn syntax_error(source: &str) -> (SyntaxErrorKind, Position) {
        match parse_tree(source).error {
            Some(Error::Syntax { kind, position }) => (kind, position),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    /// The only child of the attribute `name` among the root symbols
    fn root_value<'a>(tree: &'a SymbolTree, name: &str) -> &'a Symbol {
        let (attribute, _) = tree
            .root_symbols()
            .find(|(_, symbol)| symbol.is_attribute() && symbol.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("no attribute `{name}`"));
        let children = tree[attribute].children();
        assert_eq!(children.len(), 1, "`{name}` must have exactly one value");
        &tree[children[0]]
    }

    fn eval(tree: &SymbolTree, name: &str) -> (EvalKind, String) {
        match &root_value(tree, name).kind {
            SymbolKind::Eval(eval) => (eval.kind, eval.expression.clone()),
            other => panic!("`{name}` is not an expression: {other:?}"),
        }
    }

    fn value(tree: &SymbolTree, name: &str) -> (ValueType, String) {
        match &root_value(tree, name).kind {
            SymbolKind::Value { ty, value } => (*ty, value.clone()),
            other => panic!("`{name}` is not a value: {other:?}"),
        }
    }

    #[test]
    fn block_with_labels() {
        let tree = tree("resource \"aws_instance\" web {\n  ami = \"ami-123\"\n}\n");

        assert_eq!(tree.roots().len(), 1);
        let block = &tree[tree.roots()[0]];
        assert_eq!(
            block.block_names(),
            Some(&["resource".to_string(), "aws_instance".to_string(), "web".to_string()][..])
        );
        assert_eq!(block.name.as_deref(), Some("resource"));
        assert_eq!((block.line(), block.column()), (1, 1));

        let attribute = block.children()[0];
        assert_eq!(block.attributes(), &[attribute]);
        assert_eq!(tree[attribute].name.as_deref(), Some("ami"));
        assert_eq!((tree[attribute].line(), tree[attribute].column()), (2, 3));
    }

    #[test]
    fn nested_blocks_and_one_line_blocks() {
        let tree = tree("a {\n  b \"x\" { c = 1 }\n  d {}\n}\ne {}");

        let names = |id: SymbolId| tree[id].name.clone().unwrap_or_default();
        assert_eq!(tree.roots().iter().map(|id| names(*id)).collect::<Vec<_>>(), ["a", "e"]);

        let a = tree.roots()[0];
        let children = tree[a].children();
        assert_eq!(children.iter().map(|id| names(*id)).collect::<Vec<_>>(), ["b", "d"]);
        assert!(tree[a].attributes().is_empty());
        assert_eq!(tree[children[0]].children().len(), 1);
        assert!(tree[children[1]].children().is_empty());
    }

    #[test]
    fn literal_values() {
        let tree = tree(
            "s = \"text\"\nn = -1.5\nb = true\nf = false\nz = null\nh = <<EOT\nline\nEOT\n",
        );

        assert_eq!(value(&tree, "s"), (ValueType::String, "text".into()));
        assert_eq!(value(&tree, "n"), (ValueType::Number, "-1.5".into()));
        assert_eq!(value(&tree, "b"), (ValueType::Boolean, "true".into()));
        assert_eq!(value(&tree, "f"), (ValueType::Boolean, "false".into()));
        assert_eq!(value(&tree, "z"), (ValueType::Null, "null".into()));
        assert_eq!(value(&tree, "h"), (ValueType::String, "line\n".into()));
    }

    #[test]
    fn attribute_span_covers_the_value() {
        let tree = tree("abc = \"x\"\n");
        let attribute = &tree[tree.roots()[0]];
        assert_eq!(attribute.length(), 9);
    }

    #[test]
    fn arrays() {
        let tree = tree("a = [1, \"two\",\n  [3],\n]\nb = [\n  1\n  2\n]\nc = []\n");

        let a = root_value(&tree, "a");
        assert_eq!(a.kind, SymbolKind::Array);
        let elements = a.children();
        assert_eq!(elements.len(), 3);
        assert_eq!(tree[elements[2]].kind, SymbolKind::Array);
        assert_eq!(tree[elements[2]].children().len(), 1);

        assert_eq!(root_value(&tree, "b").children().len(), 2);
        assert!(root_value(&tree, "c").children().is_empty());
    }

    #[test]
    fn maps() {
        let tree = tree("m = {\n  a = 1, \"b\" = 2\n  c: 3\n  (var.k) = 4\n}\n");

        let map = root_value(&tree, "m");
        assert_eq!(map.kind, SymbolKind::Map);
        let keys: Vec<_> = map
            .attributes()
            .iter()
            .map(|id| tree[*id].name.clone().unwrap_or_default())
            .collect();
        assert_eq!(keys, ["a", "b", "c", "(var.k)"]);
        assert_eq!(map.children(), map.attributes());
    }

    #[test]
    fn traversals_and_calls() {
        let tree = tree(
            "v = var.list[0].name\ns = aws_instance.web.*.id\nf = merge(local.a, { b = 1 })\nt = list(string)\n",
        );

        assert_eq!(eval(&tree, "v"), (EvalKind::Variable, "var.list[0].name".into()));
        assert_eq!(root_value(&tree, "v").name.as_deref(), Some("var"));
        assert_eq!(eval(&tree, "s"), (EvalKind::Variable, "aws_instance.web.*.id".into()));
        assert_eq!(
            eval(&tree, "f"),
            (EvalKind::Function, "merge(local.a, { b = 1 })".into())
        );
        assert_eq!(eval(&tree, "t"), (EvalKind::Function, "list(string)".into()));
    }

    #[test]
    fn type_keywords() {
        let tree = tree("a = string\nb = number\nc = bool\nd = any\n");

        assert_eq!(root_value(&tree, "a").kind, SymbolKind::Primitive(PrimitiveType::String));
        assert_eq!(root_value(&tree, "b").kind, SymbolKind::Primitive(PrimitiveType::Number));
        assert_eq!(root_value(&tree, "c").kind, SymbolKind::Primitive(PrimitiveType::Bool));
        assert_eq!(root_value(&tree, "d").kind, SymbolKind::Primitive(PrimitiveType::Any));
    }

    #[test]
    fn for_expressions() {
        let tree = tree(
            "a = [for s in var.list : upper(s)]\nb = {\n  for k, v in var.m : k => v\n}\n",
        );

        assert_eq!(
            eval(&tree, "a"),
            (EvalKind::For, "[for s in var.list : upper(s)]".into())
        );
        assert_eq!(
            eval(&tree, "b"),
            (EvalKind::For, "{\n  for k, v in var.m : k => v\n}".into())
        );
    }

    #[test]
    fn operations_collapse_into_one_expression() {
        let tree = tree(
            "c = var.enabled ? 1 : 0\ne = 1 + 2\nu = !var.x\nl = [1, 2] + x\no = (\n  a +\n  b\n)\nw = a &&\n  b\n",
        );

        assert_eq!(eval(&tree, "c"), (EvalKind::Expression, "var.enabled ? 1 : 0".into()));
        assert_eq!(eval(&tree, "e"), (EvalKind::Expression, "1 + 2".into()));
        assert_eq!(eval(&tree, "u"), (EvalKind::Expression, "!var.x".into()));
        assert_eq!(eval(&tree, "l"), (EvalKind::Expression, "[1, 2] + x".into()));
        assert!(root_value(&tree, "l").children().is_empty());
        assert_eq!(eval(&tree, "o"), (EvalKind::Expression, "(\n  a +\n  b\n)".into()));
        assert_eq!(eval(&tree, "w"), (EvalKind::Expression, "a &&\n  b".into()));
    }

    #[test]
    fn operation_inside_array() {
        let tree = tree("a = [x + 1, 2]\n");
        let array = root_value(&tree, "a");
        let first = &tree[array.children()[0]];
        assert_eq!(
            first.kind,
            SymbolKind::Eval(EvalSymbol::new(EvalKind::Expression, "x + 1".into()))
        );
        assert_eq!(array.children().len(), 2);
    }

    #[test]
    fn root_array() {
        let tree = tree("[1, 2]\n");
        assert_eq!(tree[tree.roots()[0]].kind, SymbolKind::Array);
        assert_eq!(tree[tree.roots()[0]].children().len(), 2);
    }

    #[test]
    fn parents_point_up() {
        let tree = tree("a {\n  b {\n    c = [1]\n  }\n}\n");

        let a = tree.roots()[0];
        let b = tree[a].children()[0];
        let c = tree[b].children()[0];
        let array = tree[c].children()[0];
        let element = tree[array].children()[0];

        let names: Vec<_> = tree
            .ancestors(element)
            .map(|(_, symbol)| symbol.name.clone().unwrap_or_else(|| "[]".into()))
            .collect();
        assert_eq!(names, ["[]", "c", "b", "a"]);
    }

    #[test]
    fn structural_errors() {
        assert_eq!(
            syntax_error("a {\n  b = 1\n"),
            (SyntaxErrorKind::Unclosed("block"), Position::new(1, 1, 0))
        );
        assert_eq!(
            syntax_error("a = 1\n}\n"),
            (SyntaxErrorKind::UnmatchedClose('}'), Position::new(2, 1, 6))
        );
        assert_eq!(
            syntax_error("x = [1, 2\n").0,
            SyntaxErrorKind::Unclosed("array")
        );
        assert_eq!(
            syntax_error("x = { a = 1\n").0,
            SyntaxErrorKind::Unclosed("map")
        );
        assert_eq!(
            syntax_error("x = [1 2]").0,
            SyntaxErrorKind::UnexpectedToken {
                expected: "`,` or `]`",
                found: "`2`".into()
            }
        );
        assert_eq!(
            syntax_error("a b = 1").0,
            SyntaxErrorKind::UnexpectedToken {
                expected: "block label, `{` or `=`",
                found: "`=`".into()
            }
        );
        assert_eq!(
            syntax_error("a = ").0,
            SyntaxErrorKind::UnexpectedToken {
                expected: "expression",
                found: "end of input".into()
            }
        );
        assert_eq!(
            syntax_error("a = 1 b = 2").0,
            SyntaxErrorKind::UnexpectedToken {
                expected: "newline after attribute",
                found: "`b`".into()
            }
        );
        assert_eq!(
            syntax_error("f = foo(1, 2\n").0,
            SyntaxErrorKind::Unclosed("expression")
        );
    }

    #[test]
    fn nesting_is_limited() {
        let deep = format!("a = {}{}\n", "[".repeat(20_000), "]".repeat(20_000));
        // body and attribute take two scopes, the 127th bracket would be one too many
        assert_eq!(
            syntax_error(&deep),
            (SyntaxErrorKind::NestingTooDeep(MAX_DEPTH), Position::new(1, 131, 130))
        );

        let deep_maps = format!("a = {}{}\n", "{ b = ".repeat(1_000), "}".repeat(1_000));
        assert_eq!(
            syntax_error(&deep_maps).0,
            SyntaxErrorKind::NestingTooDeep(MAX_DEPTH)
        );

        let shallow = format!("a = {}{}\n", "[".repeat(100), "]".repeat(100));
        let tree = tree(&shallow);
        let mut innermost = tree.roots()[0];
        while let Some(&child) = tree[innermost].children().first() {
            innermost = child;
        }
        assert_eq!(tree.ancestors(innermost).count(), 100);
    }

    #[test]
    fn best_effort_keeps_the_partial_tree() {
        let source = "a = 1\nb {\n  c = 2\n  d = \"open\n";

        let outcome = parse_tree(source);
        assert!(matches!(
            outcome.error,
            Some(Error::Lexical {
                kind: LexErrorKind::Unterminated(Mode::String),
                ..
            })
        ));

        let tree = outcome.recover(Recovery::BestEffort).expect("errors are ignored");
        let names: Vec<_> = tree
            .root_symbols()
            .map(|(_, symbol)| symbol.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, ["a", "b"]);

        let block = &tree[tree.roots()[1]];
        assert_eq!(block.children().len(), 2);
        assert!(tree[block.children()[1]].children().is_empty());

        assert!(parse_tree(source).recover(Recovery::Strict).is_err());
        assert_eq!(Recovery::from(true), Recovery::BestEffort);
        assert_eq!(Recovery::from(false), Recovery::Strict);
    }
}
