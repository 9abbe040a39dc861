//! Alias routing subsystem.
//!
//! # Data Flow
//! ```text
//! Binding (at startup, reload or via admin API):
//!     alias template + route template
//!     → compiler.rs (tokenize, pair wildcards with references)
//!     → table.rs (insert at front, one binding per alias)
//!     → resolver.rs (publish new snapshot, fresh memo)
//!
//! Resolution (per request):
//!     normalized path
//!     → memo.rs (hit? done)
//!     → resolver.rs (first matching binding, recurse with it excluded)
//!     → route string "controller/action/args..."
//!
//! Canonical alias:
//!     route → same algorithm through the route matchers → alias
//! ```
//!
//! # Design Decisions
//! - First match wins, scanning most recently bound first
//! - An unmatched input resolves to itself; resolution never fails
//! - Matchers are anchored at the start only, so a binding rewrites the
//!   matched prefix and keeps the rest of the path

pub mod compiler;
pub mod memo;
pub mod resolver;
pub mod table;
pub mod wildcard;

pub use compiler::Binding;
pub use resolver::{AliasRouter, BindingView};
pub use table::{BindingTable, TableChange};
pub use wildcard::Wildcard;

/// Which way a resolution goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// alias → route
    ToRoute,
    /// route → alias
    ToAlias,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ToRoute => "route",
            Direction::ToAlias => "alias",
        }
    }
}

/// Strip leading and trailing path separators.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}
