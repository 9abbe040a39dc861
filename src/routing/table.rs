//! Ordered binding storage.
//!
//! # Responsibilities
//! - Keep bindings in precedence order (front = most recently bound)
//! - Enforce one binding per alias template
//!
//! # Design Decisions
//! - A plain `Vec`, scanned front to back; iteration order is precedence
//! - Bindings are `Arc`ed so copy-on-write snapshots stay cheap

use std::sync::Arc;

use crate::routing::compiler::Binding;

/// Outcome of inserting into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableChange {
    /// The alias was already bound to the same route.
    Unchanged,
    /// A new alias was added.
    Added,
    /// An existing alias was rebound to a different route.
    Replaced,
}

impl TableChange {
    pub fn is_changed(self) -> bool {
        !matches!(self, TableChange::Unchanged)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: Vec<Arc<Binding>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from bindings already in precedence order.
    pub fn from_ordered(bindings: Vec<Binding>) -> Self {
        Self {
            bindings: bindings.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&Arc<Binding>> {
        self.bindings.iter().find(|b| b.alias() == alias)
    }

    /// Bind `alias` to `route`, compiling only when something changes.
    ///
    /// The new binding goes to the front of the table.
    pub fn bind(&mut self, alias: &str, route: &str) -> Result<TableChange, regex::Error> {
        let change = match self.get(alias) {
            Some(existing) if existing.route() == route => return Ok(TableChange::Unchanged),
            Some(_) => TableChange::Replaced,
            None => TableChange::Added,
        };

        let binding = Binding::compile(alias, route)?;
        self.remove(alias);
        self.bindings.insert(0, Arc::new(binding));
        Ok(change)
    }

    /// Remove the binding for `alias`. Returns whether one was present.
    pub fn remove(&mut self, alias: &str) -> bool {
        match self.bindings.iter().position(|b| b.alias() == alias) {
            Some(index) => {
                self.bindings.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Binding>> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
