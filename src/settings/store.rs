//! The settings store: single owner of the global settings record.
//!
//! # Data Flow
//! ```text
//! startup:  settings file → decrypt secrets → GlobalSettings → ArcSwap
//! update:   writer lock → draft = current.clone() → mutate draft
//!           → encrypt + write temp file → rename over target
//!           → publish draft → release lock
//! read:     ArcSwap::load_full (lock-free, may be one update behind)
//! ```
//!
//! # Design Decisions
//! - One writer at a time; readers never block
//! - The in-memory record only changes after the file was written, so a
//!   failed save leaves both unchanged
//! - Loading never fails: a missing file is a first run, an unreadable one is
//!   logged and replaced by defaults on the next save

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::settings::error::SettingsResult;
use crate::settings::secret::{Secret, SecretCipher};
use crate::settings::types::{
    ConnectionFactory, EventFilterSettings, GlobalSettings, IncludeMode, RelayMessagingSettings,
};

/// On-disk layout. Secrets hold ciphertext.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersistedSettings {
    collab_net_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    use_global: bool,
    broker: PersistedBroker,
    filters: EventFilterSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersistedBroker {
    host: String,
    port: i32,
    username: String,
    password: Option<String>,
    exchange: String,
    workflow_queue: String,
    actions_queue: String,
}

impl PersistedSettings {
    fn seal(settings: &GlobalSettings, cipher: &SecretCipher) -> SettingsResult<Self> {
        let relay = &settings.relay;
        let broker_password = if relay.password.is_empty() {
            None
        } else {
            Some(cipher.encrypt(&relay.password)?)
        };

        Ok(Self {
            collab_net_url: settings.url().map(str::to_string),
            username: settings.username().map(str::to_string),
            password: settings.password().map(|p| cipher.encrypt(p)).transpose()?,
            use_global: settings.use_global(),
            broker: PersistedBroker {
                host: relay.host.clone(),
                port: relay.port,
                username: relay.username.clone(),
                password: broker_password,
                exchange: relay.exchange.clone(),
                workflow_queue: relay.workflow_queue.clone(),
                actions_queue: relay.actions_queue.clone(),
            },
            filters: settings.filters.clone(),
        })
    }

    fn open(self, cipher: &SecretCipher) -> SettingsResult<GlobalSettings> {
        let password = self.password.as_deref().map(|c| cipher.decrypt(c)).transpose()?;
        let broker_password = match self.broker.password.as_deref() {
            Some(c) => cipher.decrypt(c)?,
            None => Secret::default(),
        };

        let mut settings = GlobalSettings::default();
        if self.use_global {
            if let (Some(url), Some(username), Some(password)) = (self.collab_net_url, self.username, password) {
                settings.set_connection_factory(Some(ConnectionFactory::new(url, username, password)));
            } else {
                tracing::warn!("Persisted connection factory is incomplete; treating it as unset");
            }
        }
        settings.relay = RelayMessagingSettings {
            host: self.broker.host,
            port: self.broker.port,
            username: self.broker.username,
            password: broker_password,
            exchange: self.broker.exchange,
            workflow_queue: self.broker.workflow_queue,
            actions_queue: self.broker.actions_queue,
        };
        settings.filters = self.filters;
        Ok(settings)
    }
}

/// Owner of the global settings record and its persisted form.
pub struct SettingsStore {
    path: PathBuf,
    cipher: SecretCipher,
    current: ArcSwap<GlobalSettings>,
    writer: Mutex<()>,
}

impl SettingsStore {
    /// Load the persisted record, falling back to defaults.
    pub fn load(path: impl Into<PathBuf>, cipher: SecretCipher) -> Self {
        let path = path.into();
        let settings = match read_persisted(&path, &cipher) {
            Ok(Some(settings)) => {
                tracing::info!(
                    path = %path.display(),
                    use_global = settings.use_global(),
                    relay_valid = settings.are_settings_valid(),
                    "Loaded global settings"
                );
                settings
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No persisted settings, starting with defaults");
                GlobalSettings::default()
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read persisted settings, starting with defaults"
                );
                GlobalSettings::default()
            }
        };

        Self {
            path,
            cipher,
            current: ArcSwap::from_pointee(settings),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consistent view of every field at one point in time.
    pub fn snapshot(&self) -> Arc<GlobalSettings> {
        self.current.load_full()
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `update` to a copy of the record, persist it, then publish it.
    ///
    /// Holds the writer lock for the whole sequence. On error nothing changes.
    /// Blocks on file I/O; async callers run it on the blocking pool.
    pub fn transaction<F>(&self, update: F) -> SettingsResult<Arc<GlobalSettings>>
    where
        F: FnOnce(&mut GlobalSettings),
    {
        let _guard = self.lock_writer();

        let mut draft = GlobalSettings::clone(&self.current.load());
        update(&mut draft);

        self.write(&draft)?;
        let published = Arc::new(draft);
        self.current.store(published.clone());
        Ok(published)
    }

    /// Persist the current record as-is.
    pub fn save(&self) -> SettingsResult<()> {
        let _guard = self.lock_writer();
        let current = self.current.load_full();
        self.write(&current)
    }

    fn write(&self, settings: &GlobalSettings) -> SettingsResult<()> {
        let result = write_persisted(&self.path, &self.cipher, settings);
        metrics::record_save(result.is_ok());
        match &result {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Global settings saved"),
            Err(e) => tracing::error!(path = %self.path.display(), error = %e, "Failed to save global settings"),
        }
        result
    }

    /// Re-read the persisted file. Returns true if the record changed.
    pub fn reload(&self) -> SettingsResult<bool> {
        let _guard = self.lock_writer();
        let loaded = read_persisted(&self.path, &self.cipher)?.unwrap_or_default();
        if *self.current.load_full() == loaded {
            return Ok(false);
        }
        self.current.store(Arc::new(loaded));
        tracing::info!(path = %self.path.display(), "Global settings reloaded from disk");
        Ok(true)
    }

    /// Set or clear the connection factory and save.
    pub fn set_connection_factory(&self, factory: Option<ConnectionFactory>) -> SettingsResult<()> {
        self.transaction(|settings| settings.set_connection_factory(factory))?;
        Ok(())
    }

    pub fn connection_factory(&self) -> Option<ConnectionFactory> {
        self.current.load().connection_factory()
    }

    pub fn use_global(&self) -> bool {
        self.current.load().use_global()
    }

    pub fn are_settings_valid(&self) -> bool {
        self.current.load().are_settings_valid()
    }

    pub fn collab_net_url(&self) -> Option<String> {
        self.current.load().url().map(str::to_string)
    }

    pub fn username(&self) -> Option<String> {
        self.current.load().username().map(str::to_string)
    }

    /// Revealed connection-factory password.
    pub fn password(&self) -> Option<String> {
        self.current.load().password().map(|p| p.reveal().to_string())
    }

    pub fn mq_host(&self) -> String {
        self.current.load().relay.host.clone()
    }

    pub fn mq_port(&self) -> i32 {
        self.current.load().relay.port
    }

    pub fn mq_username(&self) -> String {
        self.current.load().relay.username.clone()
    }

    /// Revealed broker password.
    pub fn mq_password(&self) -> String {
        self.current.load().relay.password.reveal().to_string()
    }

    pub fn mq_exchange(&self) -> String {
        self.current.load().relay.exchange.clone()
    }

    pub fn mq_workflow_queue(&self) -> String {
        self.current.load().relay.workflow_queue.clone()
    }

    pub fn mq_actions_queue(&self) -> String {
        self.current.load().relay.actions_queue.clone()
    }

    pub fn include_mode(&self) -> Option<IncludeMode> {
        self.current.load().filters.include_mode.clone()
    }

    pub fn filters(&self) -> EventFilterSettings {
        self.current.load().filters.clone()
    }

    pub fn msg_manual(&self) -> bool {
        self.current.load().filters.manual
    }

    pub fn msg_workitem(&self) -> bool {
        self.current.load().filters.workitem
    }

    pub fn msg_commit(&self) -> bool {
        self.current.load().filters.commit
    }

    pub fn msg_build(&self) -> bool {
        self.current.load().filters.build
    }

    pub fn msg_review(&self) -> bool {
        self.current.load().filters.review
    }

    pub fn msg_custom(&self) -> bool {
        self.current.load().filters.custom
    }

    pub fn msg_custom_text(&self) -> String {
        self.current.load().filters.custom_text.clone()
    }
}

fn read_persisted(path: &Path, cipher: &SecretCipher) -> SettingsResult<Option<GlobalSettings>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let persisted: PersistedSettings = serde_json::from_slice(&content)?;
    persisted.open(cipher).map(Some)
}

fn write_persisted(path: &Path, cipher: &SecretCipher, settings: &GlobalSettings) -> SettingsResult<()> {
    let bytes = serde_json::to_vec_pretty(&PersistedSettings::seal(settings, cipher)?)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}
