//! Config file watcher for hot reload of router settings.
//!
//! # Design Decisions
//! - Editors emit several events per save, so a reload is forwarded only when
//!   the parsed `[router]` section differs from the last one seen
//! - Listener, timeout, observability and admin changes are reported and wait
//!   for a restart
//! - A file that fails to load or validate keeps the running bindings

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// What a newly loaded config changes relative to the running one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiff {
    /// The `[router]` section changed and must be applied.
    pub router: bool,
    /// Changed sections that only take effect on restart.
    pub restart_only: Vec<&'static str>,
}

impl ConfigDiff {
    pub fn between(current: &AppConfig, next: &AppConfig) -> Self {
        let mut restart_only = Vec::new();
        if current.listener != next.listener {
            restart_only.push("listener");
        }
        if current.timeouts != next.timeouts {
            restart_only.push("timeouts");
        }
        if current.observability != next.observability {
            restart_only.push("observability");
        }
        if current.admin != next.admin {
            restart_only.push("admin");
        }

        Self {
            router: current.router != next.router,
            restart_only,
        }
    }
}

/// Watches the config file and forwards router changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: AppConfig,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, which was loaded as `current`.
    ///
    /// Returns the watcher and a receiver for configurations whose router
    /// section changed.
    pub fn new(path: &Path, current: AppConfig) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let next = match load_config(&path) {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::error!(error = %e, "Config reload rejected, keeping current bindings");
                            return;
                        }
                    };

                    let diff = ConfigDiff::between(&current, &next);
                    if !diff.restart_only.is_empty() {
                        tracing::warn!(
                            sections = ?diff.restart_only,
                            "Config changes take effect on restart"
                        );
                    }
                    if diff.router {
                        tracing::info!(
                            path = ?path,
                            bindings = next.router.bindings.len(),
                            "Router configuration changed"
                        );
                        if update_tx.send(next.clone()).is_err() {
                            tracing::debug!("Config reload receiver closed");
                        }
                    }
                    current = next;
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}
