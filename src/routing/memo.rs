//! Memoized resolution results.
//!
//! Two maps, one per direction, filled on first resolution of an input.
//! A memo belongs to exactly one table snapshot: publishing a new table
//! starts a fresh, empty memo, which is how wholesale invalidation happens.

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::routing::Direction;

#[derive(Debug, Default)]
pub struct MemoCache {
    /// alias -> route
    routes: DashMap<String, String>,
    /// route -> alias
    aliases: DashMap<String, String>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted maps.
    pub fn from_maps(routes: BTreeMap<String, String>, aliases: BTreeMap<String, String>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            aliases: aliases.into_iter().collect(),
        }
    }

    fn map(&self, direction: Direction) -> &DashMap<String, String> {
        match direction {
            Direction::ToRoute => &self.routes,
            Direction::ToAlias => &self.aliases,
        }
    }

    pub fn get(&self, direction: Direction, input: &str) -> Option<String> {
        self.map(direction).get(input).map(|r| r.value().clone())
    }

    pub fn insert(&self, direction: Direction, input: String, output: String) {
        self.map(direction).insert(input, output);
    }

    pub fn len(&self, direction: Direction) -> usize {
        self.map(direction).len()
    }

    /// Sorted copy of one direction, for persistence.
    pub fn to_map(&self, direction: Direction) -> BTreeMap<String, String> {
        self.map(direction)
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}
