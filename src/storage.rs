use crate::config::atomic_rename;
use crate::model::Pet;
use crate::snapshot::{decode, encode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Raw saved data plus when it was written, if the backend knows.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedBlob {
    pub data: String,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Key-value persistence for the single pet snapshot. Writes always replace
/// the whole snapshot.
pub trait SnapshotStore: Send {
    fn read(&self) -> Result<Option<SavedBlob>>;
    fn write(&mut self, data: &str) -> Result<()>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self) -> Result<Option<SavedBlob>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let saved_at = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(Some(SavedBlob { data, saved_at }))
    }

    fn write(&mut self, data: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).ok();
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    blob: Option<SavedBlob>,
    writes: usize,
}

/// In-process store. Clones share the same slot, so a caller can keep a
/// handle while the game owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: &str, saved_at: Option<DateTime<Utc>>) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.blob = Some(SavedBlob {
                data: data.to_string(),
                saved_at,
            });
        }
        store
    }

    pub fn data(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.blob.as_ref().map(|b| b.data.clone()))
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().map(|i| i.writes).unwrap_or(0)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<SavedBlob>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(inner.blob.clone())
    }

    fn write(&mut self, data: &str) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        inner.blob = Some(SavedBlob {
            data: data.to_string(),
            saved_at: Some(Utc::now()),
        });
        inner.writes += 1;
        Ok(())
    }
}

/// Loads the pet, or a default one when nothing (or nothing readable) is
/// stored. Also returns when the save was last written.
pub fn load_pet(store: &dyn SnapshotStore) -> (Pet, Option<DateTime<Utc>>) {
    match store.read() {
        Ok(Some(blob)) => (decode(&blob.data), blob.saved_at),
        Ok(None) => (Pet::default(), None),
        Err(e) => {
            log::warn!("could not read save: {:#}", e);
            (Pet::default(), None)
        }
    }
}

pub fn save_pet(store: &mut dyn SnapshotStore, pet: &Pet) -> Result<()> {
    let data = encode(pet).context("serializing pet")?;
    store.write(&data)
}
