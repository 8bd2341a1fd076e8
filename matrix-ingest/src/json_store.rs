//! File-backed task store holding a backend-style `{"tasks": [...]}` document.
//!
//! Codes are written into the in-memory document; nothing touches disk until
//! `flush`.

use anyhow::{Context, Result};
use matrix_core::{PriorityCode, Scope, StoreError, Task, TaskStore};
use std::fs;
use std::path::{Path, PathBuf};

use crate::normalize::{normalize_all, normalize_task};
use crate::types::{RawTask, TaskEnvelope};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    timezone: String,
    doc: TaskEnvelope,
    dirty: bool,
}

impl JsonFileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: impl AsRef<Path>, timezone: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            TaskEnvelope::default()
        };
        Ok(Self {
            path,
            timezone: timezone.into(),
            doc,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.doc.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.tasks.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn raw_tasks(&self) -> &[RawTask] {
        &self.doc.tasks
    }

    /// Every task in the document, normalized.
    pub fn all_tasks(&self) -> Vec<Task> {
        normalize_all(&self.doc.tasks, &self.timezone)
    }

    /// Merge `incoming` into the record with the same id, or append it.
    /// Returns `true` when an existing record was updated.
    pub fn upsert_raw(&mut self, incoming: RawTask) -> bool {
        let id = incoming.id();
        self.dirty = true;
        if let Some(existing) = self.doc.tasks.iter_mut().find(|r| id.is_some() && r.id() == id) {
            for (k, v) in incoming.0 {
                existing.0.insert(k, v);
            }
            return true;
        }
        self.doc.tasks.push(incoming);
        false
    }

    /// Write the document back if anything changed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.doc).context("serialize task document")?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), tasks = self.doc.tasks.len(), "task document flushed");
        Ok(())
    }
}

impl TaskStore for JsonFileStore {
    fn list_tasks_in_scope(&self, scope: Scope) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .doc
            .tasks
            .iter()
            .filter_map(|r| normalize_task(r, &self.timezone))
            .filter(|t| t.scope == scope)
            .collect())
    }

    fn persist_priority_code(&mut self, task_id: &str, code: PriorityCode) -> Result<(), StoreError> {
        let raw = self
            .doc
            .tasks
            .iter_mut()
            .find(|r| r.id().as_deref() == Some(task_id))
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        raw.set_priority(code);
        self.dirty = true;
        Ok(())
    }
}
