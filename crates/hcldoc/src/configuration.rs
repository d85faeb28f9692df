//! typed view of a document: root blocks and root attributes
//!
//! [Configuration] keeps the parsed [SymbolTree] and lists its root symbols by kind, in source
//! order. Unlike [reduce](crate::reduce::reduce) nothing is merged, repeated blocks stay separate
//! and every symbol keeps its position.
use crate::error::{Error, Result};
use crate::reduce::reduce_symbol;
use crate::symbol::{Symbol, SymbolId, SymbolKind, SymbolTree};
use crate::value::{Map, Value};

#[derive(Debug, Clone)]
pub struct Configuration {
    tree: SymbolTree,
    blocks: Vec<SymbolId>,
    attributes: Vec<SymbolId>,
}

impl Configuration {
    pub fn get_block(&self, index: usize) -> Option<&Symbol> {
        self.blocks.get(index).map(|id| &self.tree[*id])
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Symbol> {
        self.blocks.iter().map(|id| &self.tree[*id])
    }

    /// Root blocks with the identifier `identifier`
    pub fn blocks_named<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a Symbol> {
        self.blocks()
            .filter(move |block| block.name.as_deref() == Some(identifier))
    }

    pub fn get_attribute(&self, index: usize) -> Option<&Symbol> {
        self.attributes.get(index).map(|id| &self.tree[*id])
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Symbol> {
        self.attributes.iter().map(|id| &self.tree[*id])
    }

    /// Reduced value of the last root attribute called `name`
    pub fn attribute_value(&self, name: &str) -> Result<Option<Value>> {
        let Some(&id) = self
            .attributes
            .iter()
            .rev()
            .find(|id| self.tree[**id].name.as_deref() == Some(name))
        else {
            return Ok(None);
        };

        let mut scope = Map::new();
        reduce_symbol(&self.tree, id, &mut scope)?;
        Ok(scope.swap_remove(name))
    }

    pub fn tree(&self) -> &SymbolTree {
        &self.tree
    }
}

impl TryFrom<SymbolTree> for Configuration {
    type Error = Error;

    /// Fails if a root symbol is neither a block nor an attribute
    fn try_from(tree: SymbolTree) -> Result<Self> {
        let mut blocks = vec![];
        let mut attributes = vec![];

        for (id, symbol) in tree.root_symbols() {
            match symbol.kind {
                SymbolKind::Block { .. } => blocks.push(id),
                SymbolKind::Attribute => attributes.push(id),
                _ => {
                    return Err(Error::RootSymbol {
                        found: symbol.kind.describe(),
                        position: symbol.position(),
                    })
                }
            }
        }

        tracing::debug!(blocks = blocks.len(), attributes = attributes.len(), "configuration");
        Ok(Self {
            tree,
            blocks,
            attributes,
        })
    }
}
