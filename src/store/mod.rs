//! Persistent backing for the alias router.
//!
//! # Data Flow
//! ```text
//! attach_store()
//!     → RouteStore::load (once)
//!     → RouterSnapshot → binding table + memo caches
//!
//! bind / unbind / flush (when dirty)
//!     → AliasRouter snapshot
//!     → RouteStore::save (whole snapshot, overwrite)
//! ```
//!
//! # Design Decisions
//! - Stores are collaborators behind a trait; the router runs fine without one
//! - The format is a single opaque blob, never appended to
//! - Only setup problems (location unusable, contents unreadable) are errors

pub mod file;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A binding as persisted: templates, matchers and replacement templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBinding {
    pub alias: String,
    pub route: String,
    pub alias_matcher: String,
    pub route_matcher: String,
    pub alias_replacement: String,
    pub route_replacement: String,
}

/// Everything a store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSnapshot {
    /// Bindings in precedence order.
    pub bindings: Vec<StoredBinding>,
    /// Memoized alias -> route answers.
    pub routes: BTreeMap<String, String>,
    /// Memoized route -> alias answers.
    pub aliases: BTreeMap<String, String>,
    /// Aliases that came from configuration rather than runtime binds.
    pub managed: BTreeSet<String>,
}

/// Errors raised while attaching, loading or writing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache file {} could not be created: {source}", path.display())]
    NotCreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {} is not readable: {source}", path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {} is not writable: {source}", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache contents are corrupt: {0}")]
    Corrupt(String),
}

/// A key-value collaborator holding the router's state between runs.
pub trait RouteStore: Send + std::fmt::Debug {
    /// Read the stored snapshot. `None` means the store is empty.
    fn load(&mut self) -> Result<Option<RouterSnapshot>, StoreError>;

    /// Overwrite the stored snapshot.
    fn save(&mut self, snapshot: &RouterSnapshot) -> Result<(), StoreError>;
}
