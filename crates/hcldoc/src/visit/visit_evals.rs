use super::{walk, Visit};
use crate::symbol::{EvalSymbol, Symbol, SymbolKind, SymbolTree};
use crate::value::Value;

/// Recursively visit all unevaluated expressions
pub trait VisitEvals {
    fn visit_evals(&self, visitor: &mut dyn Visit<EvalSymbol>);
}

impl VisitEvals for SymbolTree {
    fn visit_evals(&self, visitor: &mut dyn Visit<EvalSymbol>) {
        walk(self, &mut |symbol: &Symbol| {
            if let SymbolKind::Eval(eval) = &symbol.kind {
                visitor.visit(eval);
            }
        });
    }
}

impl VisitEvals for Value {
    fn visit_evals(&self, visitor: &mut dyn Visit<EvalSymbol>) {
        match self {
            Value::Eval(eval) => visitor.visit(eval),
            Value::Array(values) => {
                for value in values {
                    value.visit_evals(visitor);
                }
            }
            Value::Object(map) => {
                for value in map.values() {
                    value.visit_evals(visitor);
                }
            }
            Value::Null
            | Value::Boolean(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Primitive(_) => {}
        }
    }
}

impl SymbolTree {
    /// Every expression left for a later evaluation phase, in source order
    pub fn eval_symbols(&self) -> Vec<EvalSymbol> {
        let mut evals = vec![];
        self.visit_evals(&mut |eval: &EvalSymbol| evals.push(eval.clone()));
        evals
    }
}
