//! Temporal and workload rankers.
//!
//! Both rankers order one scope and compress list positions onto `1..=9`:
//! with `cap = min(9, N)`, position `i < cap` gets `cap - i`, everything past
//! the ninth position gets 1.
//!
//! Ordering is a stable sort (`slice::sort_by`): tasks with equal keys keep
//! their input order, so recomputing an unchanged scope gives the same ranks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::code::CodeError;
use crate::task::Task;

/// Compressed rank, always in `Rank::MIN..=Rank::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

impl Rank {
    pub const MIN: Rank = Rank(1);
    pub const MAX: Rank = Rank(9);

    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Some(Rank(value))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rank {
    type Error = CodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Rank::new(v).ok_or(CodeError::RankOutOfRange {
            digit: "stored",
            value: v as u32,
        })
    }
}

impl From<Rank> for u8 {
    fn from(r: Rank) -> u8 {
        r.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rank a scope by deadline proximity (earliest deadline ranks highest).
pub fn rank_by_deadline(tasks: &[Task]) -> HashMap<String, Rank> {
    by_id(tasks, &deadline_ranks(tasks))
}

/// Rank a scope by remaining units (most remaining work ranks highest).
pub fn rank_by_remaining_units(tasks: &[Task]) -> HashMap<String, Rank> {
    by_id(tasks, &workload_ranks(tasks))
}

/// Deadline ranks aligned with `tasks` by index.
pub(crate) fn deadline_ranks(tasks: &[Task]) -> Vec<Rank> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| cmp_deadline(tasks[a].deadline, tasks[b].deadline));
    compress(&order)
}

/// Workload ranks aligned with `tasks` by index.
pub(crate) fn workload_ranks(tasks: &[Task]) -> Vec<Rank> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| tasks[b].remaining_units().cmp(&tasks[a].remaining_units()));
    compress(&order)
}

// Dated tasks first, earliest first; undated tasks after all of them.
fn cmp_deadline(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `order[p]` is the input index of the task at sorted position `p`.
fn compress(order: &[usize]) -> Vec<Rank> {
    let cap = order.len().min(Rank::MAX.0 as usize);
    let mut ranks = vec![Rank::MIN; order.len()];
    for (position, &idx) in order.iter().enumerate().take(cap) {
        ranks[idx] = Rank((cap - position) as u8);
    }
    ranks
}

// Ids are unique within a scope; a duplicate id keeps its last rank.
fn by_id(tasks: &[Task], ranks: &[Rank]) -> HashMap<String, Rank> {
    tasks
        .iter()
        .zip(ranks)
        .map(|(t, r)| (t.id.clone(), *r))
        .collect()
}
