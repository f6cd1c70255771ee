use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::progress::UserStats;
use crate::state::AppState;
use crate::todo::TodoList;

pub const TODOS_KEY: &str = "fitTodos";
pub const STATS_KEY: &str = "fitStats";

/// String-keyed value store. Values are opaque strings; the datastore
/// layers JSON on top.
pub trait Storage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            debug!(file = %path.display(), "no stored value");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value))]
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        debug!(file = %path.display(), bytes = value.len(), "writing value atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves [`AppState`] over a [`Storage`] backend.
#[derive(Debug)]
pub struct DataStore<S = FileStorage> {
    storage: S,
}

impl DataStore<FileStorage> {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(FileStorage::open(data_dir)?))
    }
}

impl<S: Storage> DataStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[tracing::instrument(skip(self))]
    pub fn load_todos(&self) -> anyhow::Result<TodoList> {
        let todos: TodoList = load_json(&self.storage, TODOS_KEY)?;
        debug!(count = todos.len(), "loaded todos");
        Ok(todos)
    }

    #[tracing::instrument(skip(self))]
    pub fn load_stats(&self) -> anyhow::Result<UserStats> {
        load_json(&self.storage, STATS_KEY)
    }

    #[tracing::instrument(skip(self))]
    pub fn load_state(&self) -> anyhow::Result<AppState> {
        Ok(AppState::new(self.load_todos()?, self.load_stats()?))
    }

    #[tracing::instrument(skip(self, todos), fields(count = todos.len()))]
    pub fn save_todos(&mut self, todos: &TodoList) -> anyhow::Result<()> {
        save_json(&mut self.storage, TODOS_KEY, todos)
    }

    #[tracing::instrument(skip(self, stats), fields(streak = stats.streak))]
    pub fn save_stats(&mut self, stats: &UserStats) -> anyhow::Result<()> {
        save_json(&mut self.storage, STATS_KEY, stats)
    }
}

/// Missing keys and a literal JSON `null` both fall back to the default.
/// Anything else that fails to parse, an empty value included, is an error.
fn load_json<S, T>(storage: &S, key: &str) -> anyhow::Result<T>
where
    S: Storage,
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get_item(key)? else {
        return Ok(T::default());
    };
    if raw.trim() == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(&raw).with_context(|| format!("failed parsing stored {key}"))
}

fn save_json<S, T>(storage: &mut S, key: &str, value: &T) -> anyhow::Result<()>
where
    S: Storage,
    T: Serialize,
{
    let serialized = serde_json::to_string(value)?;
    storage
        .set_item(key, &serialized)
        .with_context(|| format!("failed to save {key}"))
}
