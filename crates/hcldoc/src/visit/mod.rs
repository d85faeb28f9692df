//! visitor pattern helpers
mod visit_evals;
pub use visit_evals::VisitEvals;

use crate::symbol::{Symbol, SymbolId, SymbolTree};

/// Visitor that visits its subjects
pub trait Visit<T: ?Sized> {
    fn visit(&mut self, value: &T);
}

// blanket impl for FnMut
impl<T: ?Sized, F> Visit<T> for F
where
    F: FnMut(&T),
{
    fn visit(&mut self, value: &T) {
        self(value)
    }
}

/// Visits every symbol of `tree` depth first, parents before children and in source order
pub fn walk(tree: &SymbolTree, visitor: &mut dyn Visit<Symbol>) {
    let mut pending: Vec<SymbolId> = tree.roots().iter().rev().copied().collect();
    while let Some(id) = pending.pop() {
        let symbol = &tree[id];
        visitor.visit(symbol);
        pending.extend(symbol.children().iter().rev().copied());
    }
}
