use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::model::config::Config;
use crate::model::task::{Task, TaskId};

/// Error type for store writes. Reads never fail; see [`load`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not create {path}: {source}")]
    CreateDirError { path: PathBuf, source: io::Error },
    #[error("could not serialize tasks: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("no task ids left")]
    IdsExhausted,
}

/// Ids at or above this are reassigned on load.
const ID_LIMIT: u64 = u64::MAX;

/// Ordered task list mirrored to a single JSON file.
///
/// Every mutation writes the whole list back before returning. The next
/// free id lives in a `<name>.seq` file beside it so ids stay unique across
/// processes even after the highest one is deleted.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tasks = load(&path);
        let mut store = TaskStore {
            path,
            tasks,
            next_id: 1,
        };
        store.assign_ids();
        store
    }

    /// Open the store named by `config` inside `data_dir`.
    pub fn in_data_dir(data_dir: &Path, config: &Config) -> Self {
        Self::open(data_dir.join(&config.storage.file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Current display position of a task
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn id_at(&self, index: usize) -> Option<TaskId> {
        self.tasks.get(index).map(|t| t.id)
    }

    /// Append a new, not-completed task and persist.
    pub fn add(
        &mut self,
        text: String,
        start: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Result<TaskId, StoreError> {
        if self.next_id >= ID_LIMIT {
            return Err(StoreError::IdsExhausted);
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task::new(id, text, start, deadline));
        self.save()?;
        Ok(id)
    }

    /// Remove a task by id and persist. `Ok(None)` if no such task.
    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        match self.position(id) {
            Some(index) => self.remove_at(index),
            None => Ok(None),
        }
    }

    /// Remove the task at `index`; later tasks shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<Option<Task>, StoreError> {
        if index >= self.tasks.len() {
            return Ok(None);
        }
        let removed = self.tasks.remove(index);
        self.save()?;
        Ok(Some(removed))
    }

    /// Set the completed flag and persist. Returns false if no such task.
    pub fn set_completed(&mut self, id: TaskId, completed: bool) -> Result<bool, StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.completed = completed;
        self.save()?;
        Ok(true)
    }

    /// Write the id counter, then the full list.
    pub fn save(&self) -> Result<(), StoreError> {
        atomic_write(&seq_path(&self.path), self.next_id.to_string().as_bytes())?;
        save(&self.path, &self.tasks)
    }

    /// Re-read the file, e.g. after another process wrote it.
    pub fn reload(&mut self) {
        self.tasks = load(&self.path);
        self.assign_ids();
    }

    /// Give every task a unique id in `1..ID_LIMIT`, keeping the valid ones.
    /// The counter never moves backwards.
    fn assign_ids(&mut self) {
        let max = self
            .tasks
            .iter()
            .map(|t| t.id.0)
            .filter(|&id| id < ID_LIMIT)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(load_seq(&self.path)).max(max + 1);
        let mut seen = HashSet::new();
        let next_id = &mut self.next_id;
        self.tasks.retain_mut(|task| {
            let valid = task.id.0 != 0 && task.id.0 < ID_LIMIT;
            if valid && seen.insert(task.id) {
                return true;
            }
            if *next_id >= ID_LIMIT {
                tracing::warn!(text = %task.text, "no task ids left, dropping record");
                return false;
            }
            task.id = TaskId(*next_id);
            *next_id += 1;
            seen.insert(task.id);
            true
        });
    }
}

/// Where the id counter for the store at `path` is kept.
pub fn seq_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".seq");
    path.with_file_name(name)
}

/// Persisted next id, or 0 when missing or unreadable.
fn load_seq(path: &Path) -> u64 {
    let seq = seq_path(path);
    let content = match fs::read_to_string(&seq) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
        Err(e) => {
            tracing::warn!(path = %seq.display(), error = %e, "could not read id counter");
            return 0;
        }
    };
    match content.trim().parse::<u64>() {
        Ok(n) if n < ID_LIMIT => n,
        _ => {
            tracing::warn!(path = %seq.display(), "ignoring invalid id counter");
            0
        }
    }
}

/// Read the task list from `path`.
///
/// A missing, empty or `null` record is an empty list. Unparseable content
/// is copied aside to `<name>.bak` and also treated as empty.
pub fn load(path: &Path) -> Vec<Task> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read task store");
            return Vec::new();
        }
    };
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Option<Vec<Task>>>(&content) {
        Ok(tasks) => tasks.unwrap_or_default(),
        Err(e) => {
            let bak = backup_path(path);
            match fs::copy(path, &bak) {
                Ok(_) => tracing::warn!(
                    path = %path.display(),
                    backup = %bak.display(),
                    error = %e,
                    "task store is corrupt, starting empty"
                ),
                Err(copy_err) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    backup_error = %copy_err,
                    "task store is corrupt and could not be backed up, starting empty"
                ),
            }
            Vec::new()
        }
    }
}

/// Atomically replace `path` with the serialized list.
pub fn save(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(tasks)?;
    atomic_write(path, content.as_bytes())?;
    tracing::debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Temp file + rename in the destination directory.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::CreateDirError {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let write_err = |source| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
