use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$MATRIX_HOME`, or `~/.matrix`.
pub fn matrix_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MATRIX_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".matrix"))
}

pub fn ensure_matrix_home() -> Result<PathBuf> {
    let dir = matrix_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_store_path() -> Result<PathBuf> {
    Ok(ensure_matrix_home()?.join("tasks.json"))
}
