//! symbol tree to an ordered map
//!
//! Blocks are folded into nested objects, one level per identifier and label:
//!
//! ```hcl
//! service "web" { port = 80 }
//! service "db" { port = 5432 }
//! ```
//!
//! becomes `{"service": {"web": {"port": 80}, "db": {"port": 5432}}}`.
//!
//! A block that repeats the full label path of an earlier one turns the entry for its last
//! label into an array, one object per declaration:
//!
//! ```hcl
//! service "web" { port = 80 }
//! service "web" { port = 81 }
//! ```
//!
//! becomes `{"service": {"web": [{"port": 80}, {"port": 81}]}}`.
//!
//! Passing through an array or a plain value on the way to the last label is a
//! [ScopeConflict]. Expressions stay unevaluated and end up as [Value::Eval].
use crate::error::{Error, Result, ScopeConflict};
use crate::span::Position;
use crate::symbol::{SymbolId, SymbolKind, SymbolTree, ValueType};
use crate::value::{Map, Value};

/// Reduces all root symbols of `tree` into one map
///
/// Root symbols that are neither blocks nor attributes produce no key and are dropped.
pub fn reduce(tree: &SymbolTree) -> Result<Map> {
    let mut document = Map::new();
    for &root in tree.roots() {
        reduce_symbol(tree, root, &mut document)?;
    }
    Ok(document)
}

/// Reduces the symbol `id`
///
/// Blocks and attributes write into `scope` and return `None`. All other symbols return their
/// value and leave `scope` alone.
pub fn reduce_symbol(tree: &SymbolTree, id: SymbolId, scope: &mut Map) -> Result<Option<Value>> {
    let symbol = &tree[id];
    tracing::trace!(kind = symbol.kind.describe(), name = ?symbol.name, line = symbol.line(), "reduce");

    match &symbol.kind {
        SymbolKind::Block { names } => {
            let target = block_scope(scope, names, symbol.position())?;
            for &child in symbol.children() {
                reduce_symbol(tree, child, target)?;
            }
            Ok(None)
        }
        SymbolKind::Attribute => {
            let value = match symbol.children().first() {
                Some(&child) => expression(tree, child)?,
                None => Value::Null,
            };
            scope.insert(symbol.name.clone().unwrap_or_default(), value);
            Ok(None)
        }
        SymbolKind::Map => {
            let mut map = Map::new();
            for &child in symbol.children() {
                reduce_symbol(tree, child, &mut map)?;
            }
            Ok(Some(Value::Object(map)))
        }
        SymbolKind::Array => {
            let elements = symbol
                .children()
                .iter()
                .map(|&child| expression(tree, child))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Value::Array(elements)))
        }
        SymbolKind::Value { ty, value } => coerce(tree, id, *ty, value).map(Some),
        SymbolKind::Eval(eval) => Ok(Some(Value::Eval(eval.clone()))),
        SymbolKind::Primitive(primitive) => Ok(Some(Value::Primitive(*primitive))),
    }
}

/// Reduces `id` against a scratch map that is thrown away afterwards
fn expression(tree: &SymbolTree, id: SymbolId) -> Result<Value> {
    let mut scratch = Map::new();
    Ok(reduce_symbol(tree, id, &mut scratch)?.unwrap_or_default())
}

/// Walks `names` down from `scope` and returns the object the block body is written into
fn block_scope<'m>(
    mut scope: &'m mut Map,
    names: &[String],
    position: Position,
) -> Result<&'m mut Map> {
    let last = names.len().saturating_sub(1);
    for (index, name) in names.iter().enumerate() {
        scope = descend(scope, name, index == last, position)?;
    }
    Ok(scope)
}

fn descend<'m>(
    scope: &'m mut Map,
    name: &str,
    is_last: bool,
    position: Position,
) -> Result<&'m mut Map> {
    let repeated = scope.contains_key(name);
    let slot = scope
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    if is_last && repeated && matches!(*slot, Value::Object(_)) {
        tracing::trace!(name, "repeated block, converting to a list");
        let previous = std::mem::take(slot);
        *slot = Value::Array(vec![previous]);
    }

    let conflict = match slot {
        Value::Object(map) => return Ok(map),
        Value::Array(list) if is_last => return Ok(push_object(list)),
        Value::Array(_) => ScopeConflict::ObjectArray,
        _ => ScopeConflict::ObjectValue,
    };

    Err(Error::ScopeConflict {
        conflict,
        label: name.to_string(),
        position,
    })
}

fn push_object(list: &mut Vec<Value>) -> &mut Map {
    list.push(Value::Object(Map::new()));
    match list.last_mut() {
        Some(Value::Object(map)) => map,
        _ => unreachable!("an object was pushed right before"),
    }
}

/// Turns the raw text of a literal into its value
///
/// Booleans are `true` only for the exact text `true`, any other text is `false`.
fn coerce(tree: &SymbolTree, id: SymbolId, ty: ValueType, raw: &str) -> Result<Value> {
    match ty {
        ValueType::String => Ok(Value::String(raw.to_string())),
        ValueType::Boolean => Ok(Value::Boolean(raw == "true")),
        ValueType::Null => Ok(Value::Null),
        ValueType::Number => raw
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|source| Error::Number {
                attribute: attribute_context(tree, id),
                raw: raw.to_string(),
                position: tree[id].position(),
                source,
            }),
    }
}

/// Name of the closest attribute above `id`
fn attribute_context(tree: &SymbolTree, id: SymbolId) -> String {
    tree.ancestors(id)
        .find(|(_, symbol)| symbol.is_attribute())
        .and_then(|(_, symbol)| symbol.name.clone())
        .unwrap_or_default()
}
