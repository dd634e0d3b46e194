//! Audit Writer (spec §4.9): structured JSON documents under
//! `audit/change_requests/<cr_id>/` and `audit/validation_runs/<run_id>/`,
//! written once, never overwritten, with temp-file-then-rename atomicity
//! — the same primitive `table::log` uses for commits.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreResult;

#[derive(Debug, Default, Clone, Copy)]
pub struct AuditWriter;

impl AuditWriter {
    pub fn new() -> Self {
        Self
    }

    /// Writes `document` as pretty JSON to `dir/<name>.json`, atomically.
    /// Does not overwrite an existing file — each audit artifact is written
    /// exactly once per its natural key.
    pub async fn write_once<T: Serialize>(&self, dir: &Path, name: &str, document: &T) -> CoreResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let final_path = dir.join(format!("{name}.json"));
        if tokio::fs::try_exists(&final_path).await.unwrap_or(false) {
            return Ok(final_path);
        }
        let tmp_path = dir.join(format!("{name}.json.tmp-{}", uuid::Uuid::now_v7()));
        let payload = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&tmp_path, &payload).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(final_path)
    }

    pub async fn read<T: serde::de::DeserializeOwned>(&self, dir: &Path, name: &str) -> CoreResult<Option<T>> {
        let path = dir.join(format!("{name}.json"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
