use crate::ports::{BoxFuture, DeviceRegistry, RecipeCatalog, SettingsStore};
use crate::types::catalog::{DeviceEntry, NotificationSettings, RecipeRecord, RegisteredDevice};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

const SETTINGS_DOC: &str = "settings/notifications.json";
const DEVICES_DIR: &str = "devices";
const RECIPES_DIR: &str = "recipes";
const DOC_EXTENSION: &str = "json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid document id '{0}'")]
    InvalidId(String),
    #[error("notification settings do not exist")]
    MissingSettings,
}

/// Document store backed by a directory of JSON files, one per document.
///
/// ```text
/// <root>/settings/notifications.json
/// <root>/devices/<id>.json
/// <root>/recipes/<id>.json
/// ```
///
/// Every write to the settings document goes through one lock shared by all
/// clones, so the job's `lastSent` update and a user's schedule change never
/// overwrite each other.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
    settings_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            settings_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Sets `enabled` and `hour`, creating the document if needed and keeping
    /// any stored `lastSent`.
    pub async fn save_schedule(&self, enabled: bool, hour: u8) -> Result<(), StoreError> {
        let _guard = self.settings_lock.lock().await;
        let path = self.settings_path();
        let last_sent = read_doc::<NotificationSettings>(&path)
            .await?
            .and_then(|settings| settings.last_sent);
        let settings = NotificationSettings {
            enabled,
            hour,
            last_sent,
        };
        write_doc(&path, &settings).await
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_DOC)
    }

    fn device_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_doc_id(id)?;
        Ok(self
            .root
            .join(DEVICES_DIR)
            .join(format!("{id}.{DOC_EXTENSION}")))
    }

    async fn update_settings<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut NotificationSettings),
    {
        let _guard = self.settings_lock.lock().await;
        let path = self.settings_path();
        let mut settings: NotificationSettings = read_doc(&path)
            .await?
            .ok_or(StoreError::MissingSettings)?;
        apply(&mut settings);
        write_doc(&path, &settings).await
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), StoreError> {
        for id in ids {
            let path = match self.device_path(id) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping device delete");
                    continue;
                }
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
        Ok(())
    }
}

/// Ids become file names, so they must stay a single plain path component.
pub(crate) fn validate_doc_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '@' | '+'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

async fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

/// Every document in a collection, sorted by id.
///
/// Malformed documents are skipped with a warning so one bad file does not
/// hide the rest of the collection.
async fn list_docs<T: DeserializeOwned>(dir: &Path) -> Result<Vec<(String, T)>, StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(io_err(source)),
    };

    let mut docs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(DOC_EXTENSION) {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if let Err(err) = validate_doc_id(id) {
            tracing::warn!(error = %err, path = %path.display(), "skipping document");
            continue;
        }
        let id = id.to_string();
        match read_doc::<T>(&path).await {
            Ok(Some(doc)) => docs.push((id, doc)),
            Ok(None) => {}
            Err(err @ StoreError::Malformed { .. }) => {
                tracing::warn!(error = %err, "skipping document");
            }
            Err(err) => return Err(err),
        }
    }
    docs.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(docs)
}

async fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut bytes = serde_json::to_vec_pretty(doc)?;
    bytes.push(b'\n');
    let tmp = path.with_extension(format!(
        "{DOC_EXTENSION}.{}-{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

impl SettingsStore for FileStore {
    type Error = StoreError;
    type Load<'a>
        = BoxFuture<'a, Result<Option<NotificationSettings>, StoreError>>
    where
        Self: 'a;
    type Write<'a>
        = BoxFuture<'a, Result<(), StoreError>>
    where
        Self: 'a;

    fn load_settings(&self) -> Self::Load<'_> {
        Box::pin(async move { read_doc(&self.settings_path()).await })
    }

    fn save_settings<'a>(&'a self, settings: &'a NotificationSettings) -> Self::Write<'a> {
        Box::pin(async move {
            let _guard = self.settings_lock.lock().await;
            write_doc(&self.settings_path(), settings).await
        })
    }

    fn record_sent<'a>(&'a self, date: &'a str) -> Self::Write<'a> {
        Box::pin(async move {
            self.update_settings(|settings| settings.last_sent = Some(date.to_string()))
                .await
        })
    }
}

impl DeviceRegistry for FileStore {
    type Error = StoreError;
    type List<'a>
        = BoxFuture<'a, Result<Vec<DeviceEntry>, StoreError>>
    where
        Self: 'a;
    type Write<'a>
        = BoxFuture<'a, Result<(), StoreError>>
    where
        Self: 'a;

    fn list_devices(&self) -> Self::List<'_> {
        Box::pin(async move {
            let docs = list_docs::<RegisteredDevice>(&self.root.join(DEVICES_DIR)).await?;
            Ok(docs
                .into_iter()
                .map(|(id, device)| DeviceEntry { id, device })
                .collect())
        })
    }

    fn upsert_device<'a>(&'a self, id: &'a str, device: &'a RegisteredDevice) -> Self::Write<'a> {
        Box::pin(async move { write_doc(&self.device_path(id)?, device).await })
    }

    fn delete_devices<'a>(&'a self, ids: &'a [String]) -> Self::Write<'a> {
        Box::pin(async move { self.delete_many(ids).await })
    }
}

impl RecipeCatalog for FileStore {
    type Error = StoreError;
    type List<'a>
        = BoxFuture<'a, Result<Vec<RecipeRecord>, StoreError>>
    where
        Self: 'a;

    fn list_recipes(&self) -> Self::List<'_> {
        Box::pin(async move {
            let docs = list_docs::<RecipeRecord>(&self.root.join(RECIPES_DIR)).await?;
            Ok(docs
                .into_iter()
                .map(|(id, mut recipe)| {
                    recipe.id = id;
                    recipe
                })
                .collect())
        })
    }
}
