//! The versioned columnar log itself: commit-per-write, strictly increasing
//! version numbers, write-then-rename atomicity, time-travel reads.
//!
//! No external engine in this exercise's corpus wraps a Delta-Lake-like
//! table format from Rust, so this module is the crate's own log, built the
//! way the original Python service's `_delta_log` is described in spec §6:
//! one JSON document per committed version, read back by loading the
//! highest version number present.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{CoreError, CoreResult};
use crate::table::schema::ColumnDef;
use crate::value::Row;

const LOG_DIR: &str = "_log";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operation {
    Create,
    Append,
    Overwrite,
    Merge,
    Restore,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Append => "WRITE",
            Operation::Overwrite => "WRITE",
            Operation::Merge => "MERGE",
            Operation::Restore => "RESTORE",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitMetrics {
    pub rows_added: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub total_rows: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub version: u64,
    pub operation: Operation,
    pub metrics: CommitMetrics,
    pub timestamp: DateTime<Utc>,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
}

/// Per-table-path write lock registry. One `tokio::sync::Mutex` per
/// canonical path, created lazily, so concurrent writers to different
/// tables never contend and a single table's writers serialise without a
/// central lock manager (spec §5: "write connections are short-lived, not
/// shared across requests").
fn lock_registry() -> &'static Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock_for(path: &Path) -> Arc<AsyncMutex<()>> {
    let mut registry = lock_registry().lock().unwrap_or_else(|p| p.into_inner());
    registry
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
}

fn log_dir(table_path: &Path) -> PathBuf {
    table_path.join(LOG_DIR)
}

pub fn table_exists(table_path: &Path) -> bool {
    log_dir(table_path).is_dir()
}

/// Lists committed version numbers in ascending order by scanning
/// `<table>/_log/*.json`.
async fn list_versions(table_path: &Path) -> CoreResult<Vec<u64>> {
    let dir = log_dir(table_path);
    let mut versions = Vec::new();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if let Some(stem) = name.strip_suffix(".json") {
            if let Ok(version) = stem.parse::<u64>() {
                versions.push(version);
            }
        }
    }
    versions.sort_unstable();
    Ok(versions)
}

pub async fn head_version(table_path: &Path) -> CoreResult<Option<u64>> {
    Ok(list_versions(table_path).await?.into_iter().max())
}

pub async fn read_commit(table_path: &Path, version: u64) -> CoreResult<Commit> {
    let file = log_dir(table_path).join(format!("{version}.json"));
    let bytes = tokio::fs::read(&file).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            CoreError::version_not_found(format!(
                "version {version} not found for {}",
                table_path.display()
            ))
        } else {
            CoreError::from(err)
        }
    })?;
    let commit: Commit = serde_json::from_slice(&bytes)?;
    Ok(commit)
}

pub async fn read_head(table_path: &Path) -> CoreResult<Option<Commit>> {
    match head_version(table_path).await? {
        Some(version) => Ok(Some(read_commit(table_path, version).await?)),
        None => Ok(None),
    }
}

pub async fn history(table_path: &Path) -> CoreResult<Vec<Commit>> {
    let versions = list_versions(table_path).await?;
    let mut commits = Vec::with_capacity(versions.len());
    for version in versions {
        commits.push(read_commit(table_path, version).await?);
    }
    Ok(commits)
}

/// Writes a new commit with write-then-rename atomicity: either the rename
/// succeeds and the version is visible in full, or it does not and the
/// previous head remains the latest (spec §4.2 failure semantics, §7
/// "they never leave a half-applied state").
async fn write_commit(table_path: &Path, commit: &Commit) -> CoreResult<()> {
    let dir = log_dir(table_path);
    tokio::fs::create_dir_all(&dir).await?;
    let final_path = dir.join(format!("{}.json", commit.version));
    let tmp_path = dir.join(format!("{}.json.tmp-{}", commit.version, uuid::Uuid::now_v7()));
    let payload = serde_json::to_vec_pretty(commit)?;
    tokio::fs::write(&tmp_path, &payload).await?;
    tokio::fs::rename(&tmp_path, &final_path).await?;
    Ok(())
}

/// Commits `rows` under `columns` as the next version, serialised per table
/// path via the lock registry above.
pub async fn commit(
    table_path: &Path,
    operation: Operation,
    columns: Vec<ColumnDef>,
    rows: Vec<Row>,
    metrics: CommitMetrics,
) -> CoreResult<Commit> {
    let lock = lock_for(table_path);
    let _guard = lock.lock().await;
    let next_version = head_version(table_path).await?.map(|v| v + 1).unwrap_or(0);
    let commit = Commit {
        version: next_version,
        operation,
        metrics,
        timestamp: Utc::now(),
        columns,
        rows,
    };
    write_commit(table_path, &commit).await?;
    Ok(commit)
}

pub async fn delete_table(table_path: &Path) -> CoreResult<()> {
    match tokio::fs::remove_dir_all(table_path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ColumnType, Value};

    fn col(name: &str, ty: ColumnType) -> ColumnDef {
        ColumnDef { name: name.to_string(), col_type: ty }
    }

    #[tokio::test]
    async fn versions_are_strictly_increasing_p4() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let columns = vec![col("id", ColumnType::Integer)];

        let mut row = Row::new();
        row.insert("id".into(), Value::Integer(1));
        commit(&path, Operation::Append, columns.clone(), vec![row.clone()], CommitMetrics::default())
            .await
            .unwrap();
        commit(&path, Operation::Append, columns, vec![row], CommitMetrics::default())
            .await
            .unwrap();

        let hist = history(&path).await.unwrap();
        let versions: Vec<u64> = hist.iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![0, 1]);
    }

    #[tokio::test]
    async fn read_at_missing_version_is_version_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        commit(&path, Operation::Create, vec![], vec![], CommitMetrics::default())
            .await
            .unwrap();
        let err = read_commit(&path, 5).await.unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::VersionNotFound));
    }
}
