//! matrix-core: priority ranking engine for the task matrix.
//!
//! A task's manual quadrant, its deadline and its remaining workload are
//! folded into one integer code per scope (`day`, `week`, `month`). Higher
//! codes sort first, and the quadrant can be read back from any stored code.

pub mod classifier;
pub mod code;
pub mod engine;
pub mod rank;
pub mod store;
pub mod task;
pub mod time;

pub use classifier::{classify, classify_label, QuadrantValue};
pub use code::{compose_all, decode_bucket, decode_quadrant, CodeError, PriorityCode};
pub use engine::{rank_tasks, PersistFailure, PriorityEngine, RecomputeReport};
pub use rank::{rank_by_deadline, rank_by_remaining_units, Rank};
pub use store::{InMemoryTaskStore, StoreError, TaskStore};
pub use task::{Bucket, Scope, Task};
