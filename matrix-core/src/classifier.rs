//! Quadrant classifier: manual bucket -> hundreds digit of the priority code.
//!
//! Digit convention is 0..=4 (`unassigned` = 0, `urgent` = 4). Codes written
//! under any other convention decode to whatever digit they carry; nothing
//! here tries to guess which convention produced them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::code::CodeError;
use crate::task::Bucket;

/// Ordinal quadrant value, always in `0..=QuadrantValue::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QuadrantValue(u8);

impl QuadrantValue {
    pub const MIN: QuadrantValue = QuadrantValue(0);
    pub const MAX: QuadrantValue = QuadrantValue(4);

    /// Accepts a decoded digit; `None` outside `0..=4`.
    pub fn from_digit(digit: u32) -> Option<Self> {
        if digit <= Self::MAX.0 as u32 {
            Some(QuadrantValue(digit as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Display bucket for this value.
    pub fn bucket(self) -> Bucket {
        match self.0 {
            4 => Bucket::Urgent,
            3 => Bucket::High,
            2 => Bucket::Medium,
            1 => Bucket::Low,
            _ => Bucket::Unassigned,
        }
    }
}

impl TryFrom<u8> for QuadrantValue {
    type Error = CodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        QuadrantValue::from_digit(v as u32).ok_or(CodeError::QuadrantOutOfRange(v as u32))
    }
}

impl From<QuadrantValue> for u8 {
    fn from(q: QuadrantValue) -> u8 {
        q.0
    }
}

impl fmt::Display for QuadrantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Total, infallible: `urgent > high > medium > low > unassigned`.
pub fn classify(bucket: Bucket) -> QuadrantValue {
    match bucket {
        Bucket::Unassigned => QuadrantValue(0),
        Bucket::Low => QuadrantValue(1),
        Bucket::Medium => QuadrantValue(2),
        Bucket::High => QuadrantValue(3),
        Bucket::Urgent => QuadrantValue(4),
    }
}

/// Classify a raw label. Missing, empty and unknown labels are `unassigned`.
pub fn classify_label(label: Option<&str>) -> QuadrantValue {
    classify(label.map(Bucket::parse_lenient).unwrap_or_default())
}
