//! Task-store port.
//!
//! The store owns task records and their persisted codes. The engine only
//! lists one scope and writes one code per task; retries are the store's
//! business.

use std::collections::HashSet;
use thiserror::Error;

use crate::code::PriorityCode;
use crate::task::{Scope, Task};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("write rejected for task {task_id}: {reason}")]
    Rejected { task_id: String, reason: String },

    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

pub trait TaskStore {
    /// All tasks currently in `scope`, in the store's listing order.
    fn list_tasks_in_scope(&self, scope: Scope) -> Result<Vec<Task>, StoreError>;

    fn persist_priority_code(&mut self, task_id: &str, code: PriorityCode) -> Result<(), StoreError>;
}

impl<S: TaskStore + ?Sized> TaskStore for &mut S {
    fn list_tasks_in_scope(&self, scope: Scope) -> Result<Vec<Task>, StoreError> {
        (**self).list_tasks_in_scope(scope)
    }

    fn persist_priority_code(&mut self, task_id: &str, code: PriorityCode) -> Result<(), StoreError> {
        (**self).persist_priority_code(task_id, code)
    }
}

/// Vec-backed store. Listing order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTaskStore {
    tasks: Vec<Task>,
    rejected_writes: HashSet<String>,
}

impl InMemoryTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            rejected_writes: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Make every future write for `task_id` fail.
    pub fn reject_writes_for(&mut self, task_id: impl Into<String>) {
        self.rejected_writes.insert(task_id.into());
    }
}

impl TaskStore for InMemoryTaskStore {
    fn list_tasks_in_scope(&self, scope: Scope) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.iter().filter(|t| t.scope == scope).cloned().collect())
    }

    fn persist_priority_code(&mut self, task_id: &str, code: PriorityCode) -> Result<(), StoreError> {
        if self.rejected_writes.contains(task_id) {
            return Err(StoreError::Rejected {
                task_id: task_id.to_string(),
                reason: "write disabled".to_string(),
            });
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        task.priority_code = Some(code);
        Ok(())
    }
}
