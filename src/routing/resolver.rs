//! Bidirectional alias/route resolution.
//!
//! # Responsibilities
//! - Resolve an alias to its route and a route to its canonical alias
//! - Apply bindings transitively until nothing changes
//! - Memoize answers per table snapshot
//! - Own the optional persistent store and its write-back points
//!
//! # Design Decisions
//! - Readers load an immutable snapshot (table + memo) through `ArcSwap`
//!   and never take a lock
//! - Writers serialize on one mutex, build a new table and publish it with a
//!   fresh memo; old snapshots simply stop being visible
//! - Recursion state (excluded bindings, previous candidate) lives on the
//!   stack of the call that started the resolution
//! - Store I/O happens only in `attach_store`, `bind`, `unbind`, `apply` and
//!   `flush`, never while resolving

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::routing::compiler::Binding;
use crate::routing::memo::MemoCache;
use crate::routing::table::BindingTable;
use crate::routing::{normalize, Direction};
use crate::store::{RouteStore, RouterSnapshot, StoreError};

/// A table and the answers memoized against it.
#[derive(Debug, Default)]
struct RouterState {
    table: BindingTable,
    memo: MemoCache,
}

impl RouterState {
    fn new(table: BindingTable) -> Self {
        Self {
            table,
            memo: MemoCache::new(),
        }
    }

    fn restore(snapshot: RouterSnapshot) -> Result<Self, StoreError> {
        let bindings = snapshot
            .bindings
            .iter()
            .map(Binding::from_stored)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Self {
            table: BindingTable::from_ordered(bindings),
            memo: MemoCache::from_maps(snapshot.routes, snapshot.aliases),
        })
    }

    fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot {
            bindings: self.table.iter().map(|b| b.to_stored()).collect(),
            routes: self.memo.to_map(Direction::ToRoute),
            aliases: self.memo.to_map(Direction::ToAlias),
            managed: BTreeSet::new(),
        }
    }
}

/// Writer-side state, guarded by the write lock.
#[derive(Debug)]
struct Writer {
    store: Option<Box<dyn RouteStore>>,
    autosave: bool,
    /// Aliases bound by the last `apply`; only these are ever unbound by it.
    managed: BTreeSet<String>,
}

/// Alias/route pair as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingView {
    pub alias: String,
    pub route: String,
}

/// The route/alias resolver.
#[derive(Debug)]
pub struct AliasRouter {
    state: ArcSwap<RouterState>,
    writer: Mutex<Writer>,
    dirty: AtomicBool,
}

impl Default for AliasRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasRouter {
    /// Create an empty router with write-back at every mutation.
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(RouterState::default()),
            writer: Mutex::new(Writer {
                store: None,
                autosave: true,
                managed: BTreeSet::new(),
            }),
            dirty: AtomicBool::new(false),
        }
    }

    /// Whether `bind`/`unbind` write the store back immediately.
    /// When off, only `flush` writes.
    pub fn set_autosave(&self, autosave: bool) {
        self.lock_writer().autosave = autosave;
    }

    /// Resolve a public alias to its internal route.
    ///
    /// Unbound paths come back unchanged (normalized).
    pub fn route_for(&self, alias: &str) -> String {
        self.resolve(Direction::ToRoute, alias)
    }

    /// Compute the canonical alias of an internal route.
    pub fn alias_for(&self, route: &str) -> String {
        self.resolve(Direction::ToAlias, route)
    }

    /// Bind `alias` to `route` at the highest precedence.
    ///
    /// Returns `false` if the alias was already bound to this route.
    pub fn bind(&self, alias: &str, route: &str) -> bool {
        let alias = normalize(alias);
        let route = normalize(route);

        let mut writer = self.lock_writer();
        let mut table = self.state.load().table.clone();
        let changed = bind_into(&mut table, alias, route);
        if changed {
            tracing::info!(alias = %alias, route = %route, "Binding added");
            self.publish(&mut writer, table);
        }
        changed
    }

    /// Remove the binding for `alias`. Unknown aliases are a no-op.
    pub fn unbind(&self, alias: &str) -> bool {
        let alias = normalize(alias);

        let mut writer = self.lock_writer();
        let mut table = self.state.load().table.clone();
        let removed = table.remove(alias);
        if removed {
            writer.managed.remove(alias);
            tracing::info!(alias = %alias, "Binding removed");
            self.publish(&mut writer, table);
        }
        removed
    }

    /// Bring the configured part of the table in line with `bindings` in one
    /// publication.
    ///
    /// Aliases that an earlier `apply` bound and that are missing from the
    /// list are unbound, then each pair is bound in order, exactly as a
    /// sequence of `unbind`/`bind` calls would. Bindings made through `bind`
    /// alone are left in place. Pairs that are already bound keep their
    /// position and the memo survives if nothing changed at all.
    pub fn apply<'a, I>(&self, bindings: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: Vec<(&str, &str)> = bindings
            .into_iter()
            .map(|(alias, route)| (normalize(alias), normalize(route)))
            .collect();

        let mut writer = self.lock_writer();
        let mut table = self.state.load().table.clone();
        let mut changed = false;

        let stale: Vec<String> = writer
            .managed
            .iter()
            .filter(|managed| !pairs.iter().any(|(alias, _)| *alias == managed.as_str()))
            .cloned()
            .collect();
        for alias in &stale {
            changed |= table.remove(alias);
        }
        for (alias, route) in &pairs {
            changed |= bind_into(&mut table, alias, route);
        }

        let managed: BTreeSet<String> = pairs.iter().map(|(alias, _)| alias.to_string()).collect();
        let ownership_changed = managed != writer.managed;
        writer.managed = managed;

        if changed {
            tracing::info!(
                bindings = table.len(),
                removed = stale.len(),
                "Configured bindings applied"
            );
            self.publish(&mut writer, table);
        } else if ownership_changed {
            self.mark_dirty(&mut writer);
        }
        changed
    }

    /// Attach a persistent store, seeding table and memo from it.
    ///
    /// An empty store receives the current state at the next write-back.
    pub fn attach_store<S>(&self, store: S) -> Result<(), StoreError>
    where
        S: RouteStore + 'static,
    {
        let mut store: Box<dyn RouteStore> = Box::new(store);
        let mut writer = self.lock_writer();

        match store.load()? {
            Some(mut snapshot) => {
                let managed = std::mem::take(&mut snapshot.managed);
                let state = RouterState::restore(snapshot)?;
                writer.managed = managed;
                metrics::record_bindings(state.table.len());
                self.state.store(Arc::new(state));
                self.dirty.store(false, Ordering::Release);
            }
            None => self.dirty.store(true, Ordering::Release),
        }

        writer.store = Some(store);
        Ok(())
    }

    /// Write the current state to the store if it changed since the last
    /// write. Returns whether anything was written.
    pub fn flush(&self) -> Result<bool, StoreError> {
        let mut writer = self.lock_writer();
        self.write_back(&mut writer)
    }

    /// Whether state changed since the last write-back.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Bindings in precedence order.
    pub fn bindings(&self) -> Vec<BindingView> {
        self.state
            .load()
            .table
            .iter()
            .map(|b| BindingView {
                alias: b.alias().to_string(),
                route: b.route().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.load().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of memoized answers in one direction.
    pub fn memoized(&self, direction: Direction) -> usize {
        self.state.load().memo.len(direction)
    }

    fn resolve(&self, direction: Direction, input: &str) -> String {
        let state = self.state.load();
        let input = normalize(input);

        if let Some(hit) = state.memo.get(direction, input) {
            metrics::record_resolution(direction, true);
            return hit;
        }

        let mut excluded = vec![false; state.table.len()];
        let resolved = rewrite(&state.table, direction, input.to_string(), &mut excluded, None);
        metrics::record_resolution(direction, false);

        // Only resolutions where a binding fired are memoized.
        if !excluded.contains(&true) {
            return resolved;
        }

        tracing::trace!(
            direction = direction.as_str(),
            input = %input,
            output = %resolved,
            "Resolved"
        );
        state.memo.insert(direction, input.to_string(), resolved.clone());
        self.dirty.store(true, Ordering::Release);
        resolved
    }

    fn publish(&self, writer: &mut Writer, table: BindingTable) {
        metrics::record_bindings(table.len());
        self.state.store(Arc::new(RouterState::new(table)));
        self.mark_dirty(writer);
    }

    fn mark_dirty(&self, writer: &mut Writer) {
        self.dirty.store(true, Ordering::Release);

        if writer.autosave {
            if let Err(e) = self.write_back(writer) {
                tracing::error!(error = %e, "Failed to write router cache, will retry on next flush");
            }
        }
    }

    fn write_back(&self, writer: &mut Writer) -> Result<bool, StoreError> {
        let Some(store) = writer.store.as_mut() else {
            return Ok(false);
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }

        let mut snapshot = self.state.load().snapshot();
        snapshot.managed = writer.managed.clone();
        match store.save(&snapshot) {
            Ok(()) => {
                metrics::record_store_flush(true);
                Ok(true)
            }
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                metrics::record_store_flush(false);
                Err(e)
            }
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Writer> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bind_into(table: &mut BindingTable, alias: &str, route: &str) -> bool {
    match table.bind(alias, route) {
        Ok(change) => change.is_changed(),
        Err(e) => {
            tracing::error!(alias = %alias, route = %route, error = %e, "Binding rejected");
            false
        }
    }
}

/// Apply the first binding that changes `current`, then continue on its
/// output with that binding excluded.
///
/// Stops when no remaining binding changes the string, or when a binding
/// produces the same candidate as the previous step.
fn rewrite(
    table: &BindingTable,
    direction: Direction,
    current: String,
    excluded: &mut [bool],
    previous: Option<&str>,
) -> String {
    for (index, binding) in table.iter().enumerate() {
        if excluded[index] {
            continue;
        }
        let Some(candidate) = binding.rewrite(direction, &current) else {
            continue;
        };
        if candidate == current {
            continue;
        }

        excluded[index] = true;
        if previous == Some(candidate.as_str()) {
            return normalize(&candidate).to_string();
        }
        let next = normalize(&candidate).to_string();
        return rewrite(table, direction, next, excluded, Some(candidate.as_str()));
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_passthrough() {
        let router = AliasRouter::new();
        assert_eq!(router.route_for("unbound/path"), "unbound/path");
        assert_eq!(router.alias_for("/Some/route/"), "Some/route");
    }

    #[test]
    fn test_trivial_round_trip() {
        let router = AliasRouter::new();
        router.bind("/about/", "Page/show/about");
        assert_eq!(router.route_for("about"), "Page/show/about");
        assert_eq!(router.alias_for("Page/show/about"), "about");
    }

    #[test]
    fn test_wildcard_round_trip() {
        let router = AliasRouter::new();
        router.bind("Article/<:num>", "Article/read/$1");
        assert_eq!(router.route_for("Article/42"), "Article/read/42");
        assert_eq!(router.alias_for("Article/read/42"), "Article/42");
        assert_eq!(router.route_for("Article/latest"), "Article/latest");
    }

    #[test]
    fn test_idempotent_bind() {
        let router = AliasRouter::new();
        assert!(router.bind("a", "A/index"));
        assert!(!router.bind("a", "A/index"));
        assert_eq!(router.len(), 1);
        assert_eq!(router.route_for("a"), "A/index");
    }

    #[test]
    fn test_rebind_replaces() {
        let router = AliasRouter::new();
        router.bind("x", "r1");
        router.bind("x", "r2");
        assert_eq!(router.len(), 1);
        assert_eq!(router.route_for("x"), "r2");
        assert_eq!(router.alias_for("r1"), "r1");
    }

    #[test]
    fn test_unbind_reverts_to_identity() {
        let router = AliasRouter::new();
        router.bind("a", "A/index");
        assert_eq!(router.route_for("a"), "A/index");
        assert!(router.unbind("a"));
        assert!(!router.unbind("a"));
        assert_eq!(router.route_for("a"), "a");
    }

    #[test]
    fn test_chaining() {
        let router = AliasRouter::new();
        router.bind("a", "b");
        router.bind("b", "c");
        assert_eq!(router.route_for("a"), "c");
    }

    #[test]
    fn test_cycle_terminates() {
        let router = AliasRouter::new();
        router.bind("x", "y");
        router.bind("y", "x");
        let route = router.route_for("x");
        assert!(route == "x" || route == "y");
        let alias = router.alias_for("y");
        assert!(alias == "x" || alias == "y");
    }

    #[test]
    fn test_self_referencing_rule_terminates() {
        let router = AliasRouter::new();
        router.bind("a", "a/a");
        assert_eq!(router.route_for("a"), "a/a");
    }

    #[test]
    fn test_first_match_wins() {
        let router = AliasRouter::new();
        router.bind("shop/<:rest>", "Shop/browse/$1");
        router.bind("shop/<:num>", "Shop/item/$1");
        assert_eq!(router.route_for("shop/12"), "Shop/item/12");
        assert_eq!(router.route_for("shop/shoes"), "Shop/browse/shoes");
    }

    #[test]
    fn test_memo_invalidated_on_mutation() {
        let router = AliasRouter::new();
        router.bind("a", "A/one");
        assert_eq!(router.route_for("a"), "A/one");
        assert_eq!(router.memoized(Direction::ToRoute), 1);

        router.bind("a", "A/two");
        assert_eq!(router.memoized(Direction::ToRoute), 0);
        assert_eq!(router.route_for("a"), "A/two");

        router.unbind("a");
        assert_eq!(router.route_for("a"), "a");
    }

    #[test]
    fn test_homepage_binding() {
        let router = AliasRouter::new();
        router.bind("<:end>", "Document");
        router.bind("Document/<:rest>", "Document/read/$1");

        assert_eq!(router.route_for("/"), "Document");
        assert_eq!(router.alias_for("Document"), "");
        assert_eq!(router.route_for("Document/guide/intro"), "Document/read/guide/intro");
    }

    #[test]
    fn test_store_seeded_and_written() {
        let store = MemoryStore::new();
        let router = AliasRouter::new();
        router.attach_store(store.clone()).unwrap();
        assert!(router.is_dirty());

        router.bind("a", "A/index");
        assert_eq!(store.save_count(), 1);
        assert!(!router.is_dirty());

        // Resolution marks dirty but never writes.
        router.route_for("a");
        assert!(router.is_dirty());
        assert_eq!(store.save_count(), 1);

        assert!(router.flush().unwrap());
        assert!(!router.flush().unwrap());
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.bindings.len(), 1);
        assert_eq!(snapshot.routes.get("a").map(String::as_str), Some("A/index"));
    }

    #[test]
    fn test_store_restores_state() {
        let store = MemoryStore::new();
        {
            let router = AliasRouter::new();
            router.attach_store(store.clone()).unwrap();
            router.bind("Article/<:num>", "Article/read/$1");
            router.route_for("Article/7");
            router.flush().unwrap();
        }

        let router = AliasRouter::new();
        router.attach_store(store.clone()).unwrap();
        assert_eq!(router.len(), 1);
        assert_eq!(router.memoized(Direction::ToRoute), 1);
        assert!(!router.is_dirty());

        // Same binding again does not invalidate the restored memo.
        assert!(!router.bind("Article/<:num>", "Article/read/$1"));
        assert_eq!(router.memoized(Direction::ToRoute), 1);
        assert_eq!(router.alias_for("Article/read/7"), "Article/7");
    }

    #[test]
    fn test_autosave_off_defers_to_flush() {
        let store = MemoryStore::new();
        let router = AliasRouter::new();
        router.set_autosave(false);
        router.attach_store(store.clone()).unwrap();

        router.bind("a", "A/index");
        router.unbind("a");
        assert_eq!(store.save_count(), 0);
        assert!(router.flush().unwrap());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_apply_diffs_table() {
        let router = AliasRouter::new();
        router.apply([("old", "Old/index"), ("keep", "Keep/index")]);

        assert!(router.apply([("keep", "Keep/index"), ("new", "New/index")]));
        let aliases: Vec<String> = router.bindings().into_iter().map(|b| b.alias).collect();
        assert_eq!(aliases, vec!["new", "keep"]);

        router.route_for("keep");
        assert!(!router.apply([("keep", "Keep/index"), ("new", "New/index")]));
        assert_eq!(router.memoized(Direction::ToRoute), 1);
    }

    #[test]
    fn test_passthrough_is_not_memoized() {
        let store = MemoryStore::new();
        let router = AliasRouter::new();
        router.attach_store(store.clone()).unwrap();
        router.bind("Article/<:num>", "Article/read/$1");
        assert!(!router.is_dirty());

        for i in 0..100 {
            let path = format!("random/path/{i}");
            assert_eq!(router.route_for(&path), path);
            assert_eq!(router.alias_for(&path), path);
        }
        assert_eq!(router.memoized(Direction::ToRoute), 0);
        assert_eq!(router.memoized(Direction::ToAlias), 0);
        assert!(!router.is_dirty());
        assert!(!router.flush().unwrap());

        router.route_for("Article/1");
        assert_eq!(router.memoized(Direction::ToRoute), 1);
        assert!(router.is_dirty());
    }

    #[test]
    fn test_apply_keeps_runtime_bindings() {
        let router = AliasRouter::new();
        router.apply([("Article/<:num>", "Article/read/$1")]);
        router.bind("promo", "Shop/promo");

        assert!(!router.apply([("Article/<:num>", "Article/read/$1")]));
        assert_eq!(router.route_for("promo"), "Shop/promo");

        assert!(router.apply(std::iter::empty()));
        assert_eq!(router.route_for("Article/3"), "Article/3");
        assert_eq!(router.route_for("promo"), "Shop/promo");
    }

    #[test]
    fn test_configured_aliases_survive_restore() {
        let store = MemoryStore::new();
        {
            let router = AliasRouter::new();
            router.attach_store(store.clone()).unwrap();
            router.apply([("Article/<:num>", "Article/read/$1")]);
            router.bind("promo", "Shop/promo");
            router.flush().unwrap();
        }

        let router = AliasRouter::new();
        router.attach_store(store.clone()).unwrap();
        assert!(!router.apply([("Article/<:num>", "Article/read/$1")]));
        assert_eq!(router.route_for("promo"), "Shop/promo");

        assert!(router.apply([("News/<:seo>", "News/read/$1")]));
        assert_eq!(router.route_for("Article/3"), "Article/3");
        assert_eq!(router.route_for("promo"), "Shop/promo");
        let managed = store.snapshot().unwrap().managed;
        assert_eq!(managed.into_iter().collect::<Vec<_>>(), vec!["News/<:seo>"]);
    }
}
