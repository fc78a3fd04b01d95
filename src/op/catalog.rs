//! The registry itself: a name-keyed table of [`Operation`](super::Operation)
//! records, plus the process-wide default instance every compile uses unless
//! a caller supplies its own (dependency injection over a bare global, per
//! the teacher crate's preference for passing context explicitly).

use super::Operation;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct OpCatalog {
    operations: HashMap<&'static str, Operation>,
}

impl OpCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-populated with every builtin operation.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        super::builtin::register_all(&mut catalog);
        catalog
    }

    pub fn register(&mut self, op: Operation) {
        self.operations.insert(op.name, op);
    }

    pub fn get(&self, name: &str) -> Result<Operation> {
        self.operations
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

lazy_static! {
    static ref DEFAULT_CATALOG: OpCatalog = OpCatalog::with_builtins();
}

/// The catalog used by [`crate::ir::Ir::new`] when no explicit catalog is
/// supplied.
pub fn default_catalog() -> &'static OpCatalog {
    &DEFAULT_CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_knows_add() {
        assert!(default_catalog().contains("add"));
    }

    #[test]
    fn unknown_operation_is_an_error() {
        assert!(default_catalog().get("frobnicate").is_err());
    }
}
