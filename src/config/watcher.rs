//! Settings file watcher for hot reload.
//!
//! Watches the directory holding the settings file (saves replace the file by
//! rename, which a watch on the file itself would not survive) and reloads the
//! store when the file changes. Our own saves reload to an identical record and
//! are not reported.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::settings::SettingsStore;

/// A watcher that reloads the settings store on external edits.
pub struct SettingsWatcher {
    dir: PathBuf,
    file_name: OsString,
    store: Arc<SettingsStore>,
    update_tx: mpsc::UnboundedSender<()>,
}

impl SettingsWatcher {
    /// Create a new SettingsWatcher.
    ///
    /// Returns the watcher and a receiver notified after every reload that
    /// changed the record.
    pub fn new(store: Arc<SettingsStore>) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let path = store.path();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();

        (
            Self {
                dir,
                file_name,
                store,
                update_tx,
            },
            update_rx,
        )
    }

    fn concerns_settings(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    /// Start watching in a background thread. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        fs::create_dir_all(&self.dir).map_err(notify::Error::io)?;
        let dir = self.dir().to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) || !self.concerns_settings(&event) {
                        return;
                    }
                    match self.store.reload() {
                        Ok(true) => {
                            tracing::info!("Settings file changed on disk, reloaded");
                            let _ = self.update_tx.send(());
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload settings. Keeping current settings.");
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?dir, "Settings watcher started");
        Ok(watcher)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
