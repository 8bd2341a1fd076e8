//! matrix-ingest: task-store adapters for the ranking engine.
//!
//! Normalizes the backend's loosely-shaped task records, keeps them in a
//! JSON document on disk, and imports CSV exports.

pub mod csv_import;
pub mod json_store;
pub mod normalize;
pub mod types;

pub use csv_import::{import_csv, parse_task_csv, ImportSummary, TaskRow};
pub use json_store::JsonFileStore;
pub use normalize::{group_by_scope, normalize_all, normalize_task, scope_lenient};
pub use types::{RawTask, StatusEnvelope, TaskEnvelope};
