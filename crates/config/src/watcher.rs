//! Hot-reload configuration watcher

use crate::{validate_config, AppConfig, ConfigError, ConfigLoader, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Watches a config file and keeps the latest valid configuration
///
/// A run already in progress keeps the policy it was started with; reloads
/// only affect what later reads of [`ConfigWatcher::get_config`] return.
/// Pass each fresh read to `order_batch::start_configured_run` to apply the
/// validation limits and policy defaults to the next run.
pub struct ConfigWatcher {
    config: Arc<RwLock<AppConfig>>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new config watcher
    ///
    /// Loads and validates the initial configuration from the specified path
    pub fn new(path: PathBuf) -> Result<Self> {
        let config = ConfigLoader::from_file(&path)?;
        validate_config(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// Get a clone of the current configuration
    pub fn get_config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Start watching the config file for changes
    ///
    /// Returns a join handle for the watcher task.
    pub fn start_watching(&self) -> Result<JoinHandle<()>> {
        let config = Arc::clone(&self.config);
        let path = self.path.clone();

        let (tx, mut rx) = mpsc::channel(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(e) = tx.blocking_send(event) {
                        error!("Failed to send file event: {}", e);
                    }
                }
                Err(e) => error!("File watch error: {}", e),
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| ConfigError::WatchError(e.to_string()))?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::WatchError(e.to_string()))?;

        info!(path = ?path, "Started watching config file");

        let handle = tokio::spawn(async move {
            // Watcher must outlive the task
            let _watcher = watcher;

            while let Some(event) = rx.recv().await {
                if !matches!(event.kind, EventKind::Modify(_)) {
                    continue;
                }
                debug!("Config file modified, reloading");

                let reloaded =
                    ConfigLoader::from_file(&path).and_then(|c| validate_config(&c).map(|_| c));
                match reloaded {
                    Ok(new_config) => {
                        *config.write() = new_config;
                        info!("Config reloaded");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to reload config, keeping previous");
                    }
                }
            }

            debug!("Config watcher task stopped");
        });

        Ok(handle)
    }

    /// Create a watcher and start watching immediately
    pub fn watch(path: PathBuf) -> Result<(Self, JoinHandle<()>)> {
        let watcher = Self::new(path)?;
        let handle = watcher.start_watching()?;
        Ok((watcher, handle))
    }
}
