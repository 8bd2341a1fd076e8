//! Raw backend records -> normalized engine tasks.

use matrix_core::time::parse_deadline;
use matrix_core::{decode_bucket, decode_quadrant, Bucket, PriorityCode, QuadrantValue, Scope, Task};
use std::collections::BTreeMap;

use crate::types::RawTask;

/// Unknown or missing timeframes land in `day`, like the dashboard's grouping.
pub fn scope_lenient(timeframe: Option<&str>) -> Scope {
    timeframe.and_then(|s| s.parse().ok()).unwrap_or(Scope::Day)
}

/// Normalize one record. Returns `None` for records without an id.
///
/// The bucket comes from an explicit `quadrant` label when present; otherwise
/// it is decoded from the stored priority code.
pub fn normalize_task(raw: &RawTask, timezone: &str) -> Option<Task> {
    let Some(id) = raw.id() else {
        tracing::warn!("skipping task record without an id");
        return None;
    };

    let stored = raw.stored_code();
    let bucket = match raw.quadrant_label() {
        Some(label) => Bucket::parse_lenient(label),
        None => stored.map(|c| stored_bucket(&id, c)).unwrap_or_default(),
    };

    let deadline = raw.end_date().and_then(|s| match parse_deadline(s, timezone) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::warn!(task_id = %id, error = %e, "ignoring unparseable endDate");
            None
        }
    });

    Some(Task {
        title: raw.name().unwrap_or("(untitled)").to_string(),
        scope: scope_lenient(raw.timeframe()),
        bucket,
        deadline,
        total_units: raw.total_units(),
        completed_units: raw.completed_units(),
        priority_code: stored,
        id,
    })
}

/// Bucket recovered from a stored code. A hundreds digit outside `0..=4`
/// came from another digit convention and reads as `unassigned`.
fn stored_bucket(id: &str, code: PriorityCode) -> Bucket {
    let digit = decode_quadrant(code.get());
    if QuadrantValue::from_digit(digit).is_none() {
        tracing::warn!(
            task_id = %id,
            %code,
            digit,
            "stored priority code has a quadrant digit outside 0..=4; treating task as unassigned"
        );
    }
    decode_bucket(code.get())
}

pub fn normalize_all(raws: &[RawTask], timezone: &str) -> Vec<Task> {
    raws.iter().filter_map(|r| normalize_task(r, timezone)).collect()
}

/// Split tasks into their scopes, keeping input order inside each scope.
pub fn group_by_scope(tasks: Vec<Task>) -> BTreeMap<Scope, Vec<Task>> {
    let mut groups: BTreeMap<Scope, Vec<Task>> = Scope::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for t in tasks {
        groups.entry(t.scope).or_default().push(t);
    }
    groups
}
