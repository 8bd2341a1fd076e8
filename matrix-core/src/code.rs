//! Composite priority code: `quadrant * 100 + time_rank * 10 + unit_rank`.
//!
//! The hundreds digit is the manual quadrant, so it dominates any difference
//! in the lower digits. Ranks are single digits (`1..=9`); nothing may carry
//! across a digit boundary. Widening ranks past 9 would break decoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::classifier::{classify, QuadrantValue};
use crate::rank::{deadline_ranks, workload_ranks, Rank};
use crate::task::{Bucket, Task};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("quadrant digit {0} out of range 0..=4")]
    QuadrantOutOfRange(u32),

    #[error("{digit} rank {value} out of range 1..=9")]
    RankOutOfRange { digit: &'static str, value: u32 },
}

/// Persisted priority code. Higher sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityCode(u32);

impl PriorityCode {
    pub fn compose(quadrant: QuadrantValue, time_rank: Rank, unit_rank: Rank) -> Self {
        PriorityCode(
            quadrant.get() as u32 * 100 + time_rank.get() as u32 * 10 + unit_rank.get() as u32,
        )
    }

    /// Compose from raw digits, rejecting anything that would carry.
    pub fn try_compose(quadrant: u32, time_rank: u32, unit_rank: u32) -> Result<Self, CodeError> {
        let q = QuadrantValue::from_digit(quadrant).ok_or(CodeError::QuadrantOutOfRange(quadrant))?;
        let t = rank_digit("time", time_rank)?;
        let u = rank_digit("unit", unit_rank)?;
        Ok(Self::compose(q, t, u))
    }

    /// Wrap a value read back from storage. No range check: stored codes may
    /// predate the current digit convention.
    pub fn from_raw(value: u32) -> Self {
        PriorityCode(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn quadrant(self) -> u32 {
        decode_quadrant(self.0)
    }

    pub fn time_rank(self) -> u32 {
        (self.0 / 10) % 10
    }

    pub fn unit_rank(self) -> u32 {
        self.0 % 10
    }

    pub fn bucket(self) -> Bucket {
        decode_bucket(self.0)
    }
}

impl fmt::Display for PriorityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

fn rank_digit(digit: &'static str, value: u32) -> Result<Rank, CodeError> {
    u8::try_from(value)
        .ok()
        .and_then(Rank::new)
        .ok_or(CodeError::RankOutOfRange { digit, value })
}

/// Recover the quadrant digit of a stored code. Ranks are not recoverable
/// in general once compression has collapsed them.
pub fn decode_quadrant(code: u32) -> u32 {
    code / 100
}

/// Display bucket for a stored code; digits outside `0..=4` are `unassigned`.
pub fn decode_bucket(code: u32) -> Bucket {
    QuadrantValue::from_digit(decode_quadrant(code))
        .map(QuadrantValue::bucket)
        .unwrap_or_default()
}

/// Codes for a whole scope, aligned with `tasks` by index.
///
/// Each ranker runs exactly once over the scope.
pub(crate) fn compose_scope(tasks: &[Task]) -> Vec<PriorityCode> {
    let time = deadline_ranks(tasks);
    let units = workload_ranks(tasks);

    tasks
        .iter()
        .zip(time.iter().zip(units.iter()))
        .map(|(task, (t, u))| PriorityCode::compose(classify(task.bucket), *t, *u))
        .collect()
}

/// Compose every task's code in one pass over the scope.
pub fn compose_all(tasks: &[Task]) -> BTreeMap<String, PriorityCode> {
    tasks
        .iter()
        .zip(compose_scope(tasks))
        .map(|(task, code)| (task.id.clone(), code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn compose_places_digits() {
        let code = PriorityCode::try_compose(4, 3, 3).unwrap();
        assert_eq!(code.get(), 433);
        assert_eq!(code.quadrant(), 4);
        assert_eq!(code.time_rank(), 3);
        assert_eq!(code.unit_rank(), 3);
        assert_eq!(code.bucket(), Bucket::Urgent);
    }

    #[test]
    fn try_compose_rejects_carry() {
        assert_eq!(
            PriorityCode::try_compose(1, 10, 1),
            Err(CodeError::RankOutOfRange { digit: "time", value: 10 })
        );
        assert_eq!(
            PriorityCode::try_compose(1, 1, 0),
            Err(CodeError::RankOutOfRange { digit: "unit", value: 0 })
        );
        assert_eq!(PriorityCode::try_compose(5, 1, 1), Err(CodeError::QuadrantOutOfRange(5)));
    }

    #[test]
    fn decode_round_trips_every_valid_digit_triple() {
        for q in 0..=4u32 {
            for t in 1..=9u32 {
                for u in 1..=9u32 {
                    let code = PriorityCode::try_compose(q, t, u).unwrap();
                    assert_eq!(decode_quadrant(code.get()), q);
                    assert_eq!((code.time_rank(), code.unit_rank()), (t, u));
                }
            }
        }
    }

    #[test]
    fn quadrant_dominates_lower_digits() {
        let low_best = PriorityCode::try_compose(1, 9, 9).unwrap();
        let high_worst = PriorityCode::try_compose(2, 1, 1).unwrap();
        assert!(high_worst > low_best);
    }

    #[test]
    fn decode_bucket_fails_soft_on_foreign_digits() {
        assert_eq!(decode_bucket(0), Bucket::Unassigned);
        assert_eq!(decode_bucket(211), Bucket::Medium);
        assert_eq!(decode_bucket(599), Bucket::Unassigned);
    }

    #[test]
    fn display_pads_to_three_digits() {
        assert_eq!(PriorityCode::try_compose(0, 1, 1).unwrap().to_string(), "011");
    }

    #[test]
    fn three_task_scope_composes_expected_codes() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let tasks = vec![
            Task::new("A", "ship release")
                .with_bucket(Bucket::Urgent)
                .with_deadline(now + Duration::hours(1))
                .with_units(8, 0),
            Task::new("B", "review notes")
                .with_bucket(Bucket::Medium)
                .with_deadline(now + Duration::days(2))
                .with_units(2, 0),
            Task::new("C", "someday"),
        ];

        let codes = compose_all(&tasks);
        assert_eq!(codes["A"].get(), 433);
        assert_eq!(codes["B"].get(), 222);
        assert_eq!(codes["C"].get(), 11);
        assert!(codes["A"] > codes["B"] && codes["B"] > codes["C"]);
    }

    #[test]
    fn code_serializes_as_plain_integer() {
        let code = PriorityCode::try_compose(3, 2, 1).unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "321");
        let back: PriorityCode = serde_json::from_str("321").unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn compose_all_empty_scope() {
        assert!(compose_all(&[]).is_empty());
    }
}
