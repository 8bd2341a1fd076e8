//! Task model at the ranking-engine boundary.
//!
//! The task store owns these records; the engine reads `bucket`, `deadline`
//! and the unit counters, and writes nothing but `priority_code`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::code::PriorityCode;

/// Timeframe bucket a task is ranked in. Codes are only comparable within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Day,
    Week,
    Month,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Day, Scope::Week, Scope::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Day => "day",
            Scope::Week => "week",
            Scope::Month => "month",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Scope::Day),
            "week" => Ok(Scope::Week),
            "month" => Ok(Scope::Month),
            other => anyhow::bail!("unknown scope '{other}' (expected day|week|month)"),
        }
    }
}

/// Manually assigned quadrant, set by the user (drag-and-drop in the dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    #[default]
    Unassigned,
    Low,
    Medium,
    High,
    Urgent,
}

impl Bucket {
    /// Parse a bucket label. Empty or unknown labels become `Unassigned` so a
    /// malformed record never blocks ranking of the rest of its scope.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "urgent" => Bucket::Urgent,
            "high" => Bucket::High,
            "medium" => Bucket::Medium,
            "low" => Bucket::Low,
            _ => Bucket::Unassigned,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Unassigned => "unassigned",
            Bucket::Low => "low",
            Bucket::Medium => "medium",
            Bucket::High => "high",
            Bucket::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Normalized task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,

    pub scope: Scope,
    pub bucket: Bucket,

    /// Optional hard deadline (UTC). Tasks without one rank least urgent in time.
    pub deadline: Option<DateTime<Utc>>,

    /// Raw counters as the store reports them; may be malformed.
    pub total_units: i64,
    pub completed_units: i64,

    /// Written only by a recompute pass.
    pub priority_code: Option<PriorityCode>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            scope: Scope::Day,
            bucket: Bucket::Unassigned,
            deadline: None,
            total_units: 0,
            completed_units: 0,
            priority_code: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_bucket(mut self, bucket: Bucket) -> Self {
        self.bucket = bucket;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_units(mut self, total: i64, completed: i64) -> Self {
        self.total_units = total;
        self.completed_units = completed;
        self
    }

    /// `total - completed`. Negative counters read as zero and the result
    /// never goes below zero.
    pub fn remaining_units(&self) -> i64 {
        (self.total_units.max(0) - self.completed_units.max(0)).max(0)
    }

    /// Completion percentage in `0..=100`; zero when there is no workload.
    pub fn progress_percent(&self) -> u8 {
        if self.total_units <= 0 {
            return 0;
        }
        let pct = (self.completed_units as f64 / self.total_units as f64) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }

    /// Reassign the timeframe. The old code is meaningless in the new scope.
    pub fn move_to_scope(&mut self, scope: Scope) {
        if self.scope != scope {
            self.scope = scope;
            self.priority_code = None;
        }
    }
}
