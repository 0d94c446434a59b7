use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

pub const TASKS_KEY: &str = "mafia-operations";
pub const NOTES_KEY: &str = "mafia-notes";
pub const BOOKS_KEY: &str = "mafia-books-ledger";

const VALUE_EXTENSION: &str = "data";

/// Session-scoped string storage keyed by widget.
///
/// Every widget owns its own key and writes the whole value on each change,
/// so implementations only need last-write-wins semantics per key.
pub trait KeyValueStore {
    fn load_raw(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn save_raw(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn load_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load_raw(key)
    }

    fn save_raw(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).save_raw(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn load_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load_raw(key)
    }

    fn save_raw(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).save_raw(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// JSON-typed access on top of any [`KeyValueStore`].
pub trait TypedStore: KeyValueStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let Some(raw) = self.load_raw(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing stored value for {key}"))?;
        Ok(Some(value))
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("failed serializing value for {key}"))?;
        self.save_raw(key, &json)
    }

    /// Mount-time load: unreadable or malformed data is logged and replaced
    /// by the default value.
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load::<T>(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(err) => {
                error!(key, error = %format!("{err:#}"), "failed loading stored value; starting empty");
                T::default()
            }
        }
    }
}

impl<S: KeyValueStore + ?Sized> TypedStore for S {}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn load_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn save_raw(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.data` file per key inside a session
/// directory. Clearing the directory ends the session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pub session_dir: PathBuf,
}

impl SessionStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let session_dir = data_dir.join("session");
        fs::create_dir_all(&session_dir)
            .with_context(|| format!("failed to create {}", session_dir.display()))?;

        info!(session_dir = %session_dir.display(), "opened session store");
        Ok(Self { session_dir })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.session_dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Drops every stored key for this session.
    #[tracing::instrument(skip(self))]
    pub fn clear(&self) -> anyhow::Result<()> {
        let mut removed = 0_usize;
        for entry in fs::read_dir(&self.session_dir)
            .with_context(|| format!("failed reading {}", self.session_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(VALUE_EXTENSION) {
                fs::remove_file(&path)
                    .with_context(|| format!("failed removing {}", path.display()))?;
                removed += 1;
            }
        }
        info!(removed, "cleared session store");
        Ok(())
    }
}

impl KeyValueStore for SessionStore {
    #[tracing::instrument(skip(self))]
    fn load_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(file = %path.display(), "no stored value");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value), fields(bytes = value.len()))]
    fn save_raw(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        debug!(file = %path.display(), "saving value atomically");

        let mut temp = NamedTempFile::new_in(&self.session_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed removing {}", path.display()))?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> anyhow::Result<()> {
    if key.is_empty() {
        return Err(anyhow!("storage key cannot be empty"));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        || key.starts_with('.')
    {
        return Err(anyhow!("invalid storage key: {key}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn session_store_persists_and_clears() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open store");

        store.save_raw(NOTES_KEY, "meet at dawn").expect("save");
        let reopened = SessionStore::open(temp.path()).expect("reopen store");
        assert_eq!(
            reopened.load_raw(NOTES_KEY).expect("load").as_deref(),
            Some("meet at dawn")
        );

        reopened.clear().expect("clear");
        assert_eq!(reopened.load_raw(NOTES_KEY).expect("load"), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open store");
        assert!(store.save_raw("../escape", "x").is_err());
        assert!(store.load_raw("").is_err());
    }

    #[test]
    fn load_or_default_swallows_malformed_json() {
        let store = MemoryStore::new();
        store.save_raw(BOOKS_KEY, "{not json").expect("save");
        let values: Vec<u32> = store.load_or_default(BOOKS_KEY);
        assert!(values.is_empty());
    }

    #[test]
    fn typed_round_trip() {
        let store = MemoryStore::new();
        store.save("numbers", &vec![3_u32, 1, 2]).expect("save");
        let loaded: Option<Vec<u32>> = store.load("numbers").expect("load");
        assert_eq!(loaded, Some(vec![3, 1, 2]));
        store.remove("numbers").expect("remove");
        assert!(store.keys().is_empty());
    }
}
