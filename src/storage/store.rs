//! Debounced, quota-aware settings persistence
//!
//! Preferences change in bursts (a slider emits a save per tick), so writes
//! are coalesced: a save schedules the blob and replaces any still-pending
//! one instead of queueing behind it. The quota check runs before scheduling
//! and is the only part of a save the caller can observe failing; the write
//! itself is fire-and-forget. There is no in-memory cache over the timer, so
//! a load right after a save may or may not observe it.

use super::settings::UserSettings;
use crate::config::StorageSettings;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Fixed key the settings blob is persisted under
pub const STORAGE_KEY: &str = "aerostart_settings";

/// Default ceiling for total occupied storage, in bytes
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Default write-coalescing window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Why a save was rejected
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The write would push total occupied storage past the quota ceiling,
    /// or the platform itself reported storage full
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The blob could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Any other persistence failure, propagated unchanged
    #[error("failed to persist settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Debounced, quota-aware store for the settings blob
pub struct SettingsStore {
    /// Storage directory; everything in it counts against the quota
    dir: PathBuf,
    /// Path of the persisted blob
    file: PathBuf,
    quota_bytes: u64,
    debounce: Duration,
    /// Single pending-write slot; scheduling replaces an unfired task
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Completed blob writes, for diagnostics and coalescing checks
    writes: Arc<AtomicU64>,
}

impl SettingsStore {
    /// Store rooted at `dir` with the default quota and debounce window
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_limits(dir, DEFAULT_QUOTA_BYTES, DEFAULT_DEBOUNCE)
    }

    /// Store with an explicit quota ceiling and debounce window
    pub fn with_limits(dir: impl Into<PathBuf>, quota_bytes: u64, debounce: Duration) -> Self {
        let dir = dir.into();
        let file = dir.join(format!("{}.json", STORAGE_KEY));
        Self {
            dir,
            file,
            quota_bytes,
            debounce,
            pending: Mutex::new(None),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Store configured from the storage section of the settings file
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let dir = settings.dir.clone().unwrap_or_else(default_storage_dir);
        Self::with_limits(
            dir,
            settings.quota_bytes,
            Duration::from_millis(settings.debounce_ms),
        )
    }

    /// Load persisted settings merged over `defaults`
    ///
    /// Stored top-level keys win; keys absent from the blob keep their
    /// default. Absent, unreadable, or unparsable data yields `defaults`
    /// unchanged, never an error.
    pub async fn load(&self, defaults: &UserSettings) -> UserSettings {
        let raw = match tokio::fs::read(&self.file).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.file.display(), error = %e, "failed to read settings");
                }
                return defaults.clone();
            }
        };

        let stored = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.file.display(), "stored settings are not a JSON object");
                return defaults.clone();
            }
        };

        // Shallow merge at the top level: a stored nested section replaces
        // the default section wholesale.
        let mut merged = match serde_json::to_value(defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults.clone(),
        };
        for (key, value) in stored {
            merged.insert(key, value);
        }

        match serde_json::from_value(Value::Object(merged)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.file.display(), error = %e, "stored settings have incompatible fields");
                defaults.clone()
            }
        }
    }

    /// Persist `settings`, coalescing rapid calls into one write
    ///
    /// Serialization and the quota check happen now; a violation is returned
    /// with nothing scheduled and nothing written. Past that point the write
    /// fires after the debounce window, replacing any write still pending.
    pub fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        let blob = serde_json::to_vec(settings)?;
        self.check_quota(blob.len() as u64)?;

        let dir = self.dir.clone();
        let file = self.file.clone();
        let delay = self.debounce;
        let writes = Arc::clone(&self.writes);

        let mut pending = self.pending.lock().unwrap();
        if let Some(prev) = pending.take() {
            prev.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match write_blob(&dir, &file, &blob).await {
                Ok(()) => {
                    writes.fetch_add(1, Ordering::Relaxed);
                    debug!(path = %file.display(), bytes = blob.len(), "settings persisted");
                }
                Err(e) => {
                    error!(path = %file.display(), error = %e, "failed to persist settings");
                }
            }
        }));
        Ok(())
    }

    /// Persist immediately, bypassing the debounce window
    ///
    /// Cancels any pending debounced write first; meant for shutdown paths.
    pub async fn save_now(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        let blob = serde_json::to_vec(settings)?;
        self.check_quota(blob.len() as u64)?;
        self.cancel_pending();
        write_blob(&self.dir, &self.file, &blob).await?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Best-effort removal of the persisted blob
    ///
    /// Cancels any pending debounced write. Failures are logged, never
    /// returned.
    pub async fn clear(&self) {
        self.cancel_pending();
        match tokio::fs::remove_file(&self.file).await {
            Ok(()) => debug!(path = %self.file.display(), "settings cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(path = %self.file.display(), error = %e, "failed to clear settings"),
        }
    }

    /// Completed blob writes since creation
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Path of the persisted blob
    pub fn blob_path(&self) -> &Path {
        &self.file
    }

    /// Serialized size plus current occupied storage must stay at or under
    /// the ceiling. The blob being replaced stays in the tally; the check is
    /// deliberately conservative.
    fn check_quota(&self, blob_len: u64) -> Result<(), SettingsError> {
        let needed = dir_size(&self.dir) + blob_len;
        if needed > self.quota_bytes {
            warn!(
                needed,
                quota = self.quota_bytes,
                "settings blob would exceed storage quota"
            );
            return Err(SettingsError::QuotaExceeded);
        }
        Ok(())
    }

    fn cancel_pending(&self) {
        if let Some(prev) = self.pending.lock().unwrap().take() {
            prev.abort();
        }
    }
}

/// Write the blob, mapping a full filesystem to the quota condition
async fn write_blob(dir: &Path, file: &Path, blob: &[u8]) -> Result<(), SettingsError> {
    tokio::fs::create_dir_all(dir).await.map_err(map_io)?;
    tokio::fs::write(file, blob).await.map_err(map_io)?;
    Ok(())
}

fn map_io(e: std::io::Error) -> SettingsError {
    if e.kind() == std::io::ErrorKind::StorageFull {
        SettingsError::QuotaExceeded
    } else {
        SettingsError::Io(e)
    }
}

/// Total bytes of the files directly under `dir`
fn dir_size(dir: &Path) -> u64 {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        // A directory that does not exist yet occupies nothing.
        Err(_) => return 0,
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

/// Platform default storage directory
fn default_storage_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("aerostart"))
        .unwrap_or_else(|| PathBuf::from(".aerostart"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quick_store(dir: &TempDir) -> SettingsStore {
        SettingsStore::with_limits(dir.path(), DEFAULT_QUOTA_BYTES, Duration::from_millis(25))
    }

    fn settings_with_theme(theme: &str) -> UserSettings {
        UserSettings {
            theme: theme.to_string(),
            ..UserSettings::default()
        }
    }

    #[tokio::test]
    async fn test_load_without_stored_data_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);
        let defaults = settings_with_theme("midnight");
        let loaded = store.load(&defaults).await;
        assert_eq!(loaded, defaults);
    }

    #[tokio::test]
    async fn test_load_merges_stored_keys_over_defaults() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.blob_path(), r#"{"theme": "light"}"#).unwrap();

        let mut defaults = UserSettings::default();
        defaults.wallpaper = "mountains".to_string();

        let loaded = store.load(&defaults).await;
        assert_eq!(loaded.theme, "light");
        assert_eq!(loaded.wallpaper, "mountains");
        assert_eq!(loaded.language, "en");
    }

    #[tokio::test]
    async fn test_load_ignores_corrupt_data() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);
        std::fs::write(store.blob_path(), "not json {{{").unwrap();

        let defaults = settings_with_theme("midnight");
        let loaded = store.load(&defaults).await;
        assert_eq!(loaded, defaults);
    }

    #[tokio::test]
    async fn test_rapid_saves_coalesce_into_one_write() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);

        for theme in ["a", "b", "c"] {
            store.save(&settings_with_theme(theme)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.write_count(), 1);
        let loaded = store.load(&UserSettings::default()).await;
        assert_eq!(loaded.theme, "c");
    }

    #[tokio::test]
    async fn test_spaced_saves_each_write() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);

        store.save(&settings_with_theme("a")).unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        store.save(&settings_with_theme("b")).unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(store.write_count(), 2);
        let loaded = store.load(&UserSettings::default()).await;
        assert_eq!(loaded.theme, "b");
    }

    #[tokio::test]
    async fn test_quota_violation_rejects_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::with_limits(dir.path(), 10, Duration::from_millis(10));

        let err = store.save(&UserSettings::default()).unwrap_err();
        assert!(matches!(err, SettingsError::QuotaExceeded));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.write_count(), 0);
        assert!(!store.blob_path().exists());
    }

    #[tokio::test]
    async fn test_quota_counts_existing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("wallpaper.bin"), vec![0u8; 900]).unwrap();
        let store = SettingsStore::with_limits(dir.path(), 1000, Duration::from_millis(10));

        let err = store.save(&UserSettings::default()).unwrap_err();
        assert!(matches!(err, SettingsError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_save_now_writes_immediately() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);

        store.save_now(&settings_with_theme("x")).await.unwrap();
        assert_eq!(store.write_count(), 1);
        assert!(store.blob_path().exists());
        let loaded = store.load(&UserSettings::default()).await;
        assert_eq!(loaded.theme, "x");
    }

    #[tokio::test]
    async fn test_clear_removes_blob_and_cancels_pending() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);

        store.save_now(&settings_with_theme("x")).await.unwrap();
        store.save(&settings_with_theme("y")).unwrap();
        store.clear().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!store.blob_path().exists());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_is_quiet_when_nothing_stored() {
        let dir = TempDir::new().unwrap();
        let store = quick_store(&dir);
        store.clear().await;
        assert!(!store.blob_path().exists());
    }
}
