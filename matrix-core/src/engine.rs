//! Priority engine: list a scope, rank it, persist one code per task.
//!
//! The engine is synchronous and does no locking. Callers keep at most one
//! recompute in flight per scope, or accept last-write-wins on stored codes.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::code::{compose_scope, PriorityCode};
use crate::store::{StoreError, TaskStore};
use crate::task::{Scope, Task};

/// A code that was computed but could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    pub task_id: String,
    pub reason: String,
}

/// Outcome of one recompute pass.
///
/// `codes` holds every computed code, including ones whose write failed;
/// codes written before a failure are never rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    pub scope: Scope,
    pub codes: BTreeMap<String, PriorityCode>,
    pub failures: Vec<PersistFailure>,
}

impl RecomputeReport {
    pub fn new(scope: Scope, codes: BTreeMap<String, PriorityCode>) -> Self {
        Self {
            scope,
            codes,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, task_id: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(PersistFailure {
            task_id: task_id.into(),
            reason: reason.into(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn persisted_count(&self) -> usize {
        self.codes.len().saturating_sub(self.failures.len())
    }

    /// Codes whose write succeeded.
    pub fn persisted(&self) -> impl Iterator<Item = (&str, PriorityCode)> {
        self.codes
            .iter()
            .filter(|(id, _)| !self.failures.iter().any(|f| &f.task_id == *id))
            .map(|(id, code)| (id.as_str(), *code))
    }

    /// Highest code first; equal codes by id.
    pub fn ordered(&self) -> Vec<(&str, PriorityCode)> {
        let mut out: Vec<(&str, PriorityCode)> = self.codes.iter().map(|(id, c)| (id.as_str(), *c)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }
}

/// Tasks of one scope with freshly computed codes, not yet persisted.
pub fn rank_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    let codes = compose_scope(&tasks);
    for (task, code) in tasks.iter_mut().zip(codes) {
        task.priority_code = Some(code);
    }
    tasks
}

#[derive(Debug, Clone)]
pub struct PriorityEngine<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> PriorityEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Compute codes for `scope` without writing them.
    pub fn preview_scope(&self, scope: Scope) -> Result<Vec<Task>, StoreError> {
        let tasks = self.store.list_tasks_in_scope(scope)?;
        Ok(rank_tasks(tasks))
    }

    /// Rank `scope` and persist every task's code.
    ///
    /// Only a failed listing is an error. A failed write is recorded in the
    /// report and the pass moves on to the next task.
    pub fn recompute_scope(&mut self, scope: Scope) -> Result<RecomputeReport, StoreError> {
        let tasks = self.store.list_tasks_in_scope(scope)?;
        let codes = compose_scope(&tasks);
        tracing::debug!(%scope, tasks = tasks.len(), "ranked scope");

        let mut report = RecomputeReport::new(
            scope,
            tasks.iter().map(|t| t.id.clone()).zip(codes.iter().copied()).collect(),
        );

        for (task, code) in tasks.iter().zip(codes) {
            if let Err(e) = self.store.persist_priority_code(&task.id, code) {
                tracing::warn!(task_id = %task.id, %code, error = %e, "failed to persist priority code");
                report.record_failure(&task.id, e.to_string());
            }
        }

        tracing::info!(
            %scope,
            persisted = report.persisted_count(),
            failed = report.failures.len(),
            "recompute complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::decode_bucket;
    use crate::store::InMemoryTaskStore;
    use crate::task::Bucket;
    use chrono::{Duration, TimeZone, Utc};

    fn scenario_store() -> InMemoryTaskStore {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        InMemoryTaskStore::new(vec![
            Task::new("A", "ship")
                .with_bucket(Bucket::Urgent)
                .with_deadline(now + Duration::hours(1))
                .with_units(8, 0),
            Task::new("B", "review")
                .with_bucket(Bucket::Medium)
                .with_deadline(now + Duration::days(2))
                .with_units(3, 1),
            Task::new("C", "someday"),
            Task::new("W", "weekly").with_scope(Scope::Week).with_bucket(Bucket::High),
        ])
    }

    #[test]
    fn recompute_persists_codes_for_scope_only() {
        let mut engine = PriorityEngine::new(scenario_store());
        let report = engine.recompute_scope(Scope::Day).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.codes.len(), 3);
        let ordered: Vec<&str> = report.ordered().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ordered, vec!["A", "B", "C"]);

        let store = engine.store();
        assert_eq!(store.get("A").unwrap().priority_code.map(|c| c.get()), Some(433));
        assert_eq!(store.get("B").unwrap().priority_code.map(|c| c.get()), Some(222));
        assert_eq!(store.get("C").unwrap().priority_code.map(|c| c.get()), Some(11));
        assert!(store.get("W").unwrap().priority_code.is_none());
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut engine = PriorityEngine::new(scenario_store());
        let first = engine.recompute_scope(Scope::Day).unwrap();
        let second = engine.recompute_scope(Scope::Day).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_scope_is_not_an_error() {
        let mut engine = PriorityEngine::new(scenario_store());
        let report = engine.recompute_scope(Scope::Month).unwrap();
        assert!(report.codes.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn failed_write_is_reported_and_others_still_persist() {
        let mut store = scenario_store();
        store.reject_writes_for("B");
        let mut engine = PriorityEngine::new(store);

        let report = engine.recompute_scope(Scope::Day).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task_id, "B");
        assert_eq!(report.persisted_count(), 2);
        assert!(report.codes.contains_key("B"));
        let persisted: Vec<&str> = report.persisted().map(|(id, _)| id).collect();
        assert_eq!(persisted, vec!["A", "C"]);

        let store = engine.store();
        assert!(store.get("A").unwrap().priority_code.is_some());
        assert!(store.get("B").unwrap().priority_code.is_none());
        assert!(store.get("C").unwrap().priority_code.is_some());
    }

    #[test]
    fn preview_does_not_write() {
        let engine = PriorityEngine::new(scenario_store());
        let ranked = engine.preview_scope(Scope::Day).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(decode_bucket(ranked[0].priority_code.unwrap().get()), Bucket::Urgent);
        assert!(engine.store().get("A").unwrap().priority_code.is_none());
    }

    #[test]
    fn engine_works_over_borrowed_store() {
        let mut store = scenario_store();
        {
            let mut engine = PriorityEngine::new(&mut store);
            engine.recompute_scope(Scope::Week).unwrap();
        }
        assert_eq!(store.get("W").unwrap().priority_code.map(|c| c.get()), Some(311));
    }
}
