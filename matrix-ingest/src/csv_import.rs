//! CSV task import.
//!
//! Expected header (column order is free, extra columns are ignored):
//! id,name,timeframe,quadrant,end_date,units,completed

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::json_store::JsonFileStore;
use crate::types::RawTask;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub quadrant: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub completed: Option<i64>,
}

impl TaskRow {
    /// Backend-shaped record, so imported rows go through the same
    /// normalization as everything else in the store.
    pub fn into_raw(self) -> RawTask {
        let mut raw = RawTask::new().with("id", self.id.trim()).with("taskName", self.name.trim());
        let optional = [
            ("timeframe", self.timeframe),
            ("quadrant", self.quadrant),
            ("endDate", self.end_date),
        ];
        for (key, value) in optional {
            if let Some(v) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                raw = raw.with(key, v);
            }
        }
        if let Some(units) = self.units {
            raw = raw.with("numberOfUnits", units);
        }
        if let Some(completed) = self.completed {
            raw = raw.with("completedUnits", completed);
        }
        raw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Parse rows from any reader. Rows that fail to deserialize or have an
/// empty id are skipped and counted.
pub fn read_task_rows<R: Read>(reader: R) -> Result<(Vec<TaskRow>, usize)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (line, result) in rdr.deserialize::<TaskRow>().enumerate() {
        match result {
            Ok(row) if !row.id.trim().is_empty() => rows.push(row),
            Ok(_) => {
                tracing::warn!(row = line + 1, "skipping CSV row without id");
                skipped += 1;
            }
            Err(e) => {
                tracing::warn!(row = line + 1, error = %e, "skipping malformed CSV row");
                skipped += 1;
            }
        }
    }

    Ok((rows, skipped))
}

pub fn parse_task_csv(path: impl AsRef<Path>) -> Result<(Vec<TaskRow>, usize)> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    read_task_rows(file).with_context(|| format!("parsing {}", path.as_ref().display()))
}

/// Import a CSV file into `store` (not flushed).
pub fn import_csv(path: impl AsRef<Path>, store: &mut JsonFileStore) -> Result<ImportSummary> {
    let (rows, skipped) = parse_task_csv(path)?;
    let mut summary = ImportSummary {
        skipped,
        ..Default::default()
    };
    for row in rows {
        if store.upsert_raw(row.into_raw()) {
            summary.updated += 1;
        } else {
            summary.added += 1;
        }
    }
    Ok(summary)
}
