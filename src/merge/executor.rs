//! `MergeExecutor`: wires the Table Adapter, the CR service, and the Audit
//! Writer into the eight-step pipeline described in spec §4.7, grounded on
//! `merge_executor.py`'s `MergeExecutor.full_merge`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::AuditWriter;
use crate::change_request::{ChangeRequest, ChangeRequestService, CrStatus};
use crate::error::{CoreError, CoreResult};
use crate::path::DatasetLayout;
use crate::table::adapter::{keys_match, QueryOptions, TableAdapter};
use crate::table::log;
use crate::value::Row;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub cr_id: String,
    pub version_before: u64,
    pub version_after: u64,
    pub rows_added: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub forced: bool,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeDiff {
    pub version_before: u64,
    pub version_after: u64,
    pub rows_added: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConflictReport {
    pub primary_keys: Vec<String>,
    pub conflicting_rows: Vec<Row>,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub cr: ChangeRequest,
    pub merge_result: MergeResult,
    pub diff: MergeDiff,
}

pub struct MergeExecutor {
    table_adapter: Arc<TableAdapter>,
    cr_service: Arc<ChangeRequestService>,
    audit: AuditWriter,
    archive_staging: bool,
}

impl MergeExecutor {
    pub fn new(table_adapter: Arc<TableAdapter>, cr_service: Arc<ChangeRequestService>, archive_staging: bool) -> Self {
        Self { table_adapter, cr_service, audit: AuditWriter::new(), archive_staging }
    }

    /// Runs the full approval-to-commit pipeline for `cr`. `delta_version_before`
    /// is the `main` version the staging table was branched from; it is the
    /// caller's job to have captured it at CR-creation time (Open Question #2:
    /// always a real log version, never a placeholder).
    pub async fn full_merge(
        &self,
        layout: &DatasetLayout,
        cr: &ChangeRequest,
        primary_keys: &[String],
        delta_version_before: u64,
        executor_id: &str,
        force: bool,
    ) -> CoreResult<MergeOutcome> {
        // Step 1: lock CR — only an APPROVED CR may be merged, unless forced.
        if !force && cr.status != CrStatus::Approved {
            return Err(CoreError::illegal_transition(format!(
                "CR must be APPROVED to merge, currently {:?}",
                cr.status
            )));
        }

        let main_path = layout.main();
        let staging_path = layout.staging(&cr.id)?;

        let staging_rows = self
            .table_adapter
            .query(&staging_path, QueryOptions::default())
            .await?
            .rows;

        // Step 2: conflict detection.
        let current_version = log::head_version(&main_path).await?.unwrap_or(0);
        if delta_version_before != current_version {
            let conflicts = self.detect_conflicts(&main_path, &staging_rows, primary_keys).await?;
            if !conflicts.is_empty() {
                let report = MergeConflictReport { primary_keys: primary_keys.to_vec(), conflicting_rows: conflicts };
                let audit_dir = layout.audit_change_requests(&cr.id)?;
                self.audit.write_once(&audit_dir, "conflicts", &report).await?;
                if !force {
                    warn!(cr_id = %cr.id, conflicts = report.conflicting_rows.len(), "merge_conflict_detected");
                    return Err(CoreError::merge_conflict(format!(
                        "{} conflicting row(s) on {:?}",
                        report.conflicting_rows.len(),
                        primary_keys
                    )));
                }
            }
        }

        // Steps 3-7: execute, record, diff, persist, cleanup. Any failure here
        // reverts the CR to PENDING_REVIEW with the staging table preserved.
        match self
            .execute_and_finalize(layout, &main_path, &staging_path, cr, primary_keys, delta_version_before, executor_id, force)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.cr_service.fail_merge(&cr.id, executor_id, format!("merge failed: {err}")).await?;
                Err(err)
            }
        }
    }

    async fn execute_and_finalize(
        &self,
        layout: &DatasetLayout,
        main_path: &std::path::Path,
        staging_path: &std::path::Path,
        cr: &ChangeRequest,
        primary_keys: &[String],
        delta_version_before: u64,
        executor_id: &str,
        force: bool,
    ) -> CoreResult<MergeOutcome> {
        // Step 3: execute merge.
        let staging_rows = self.table_adapter.query(staging_path, QueryOptions::default()).await?.rows;
        self.table_adapter.merge(main_path, staging_rows, primary_keys).await?;

        // Step 4: record new version.
        let metrics = self.table_adapter.latest_operation_metrics(main_path).await?;
        let version_after = metrics.version;

        // Step 5: diff. Row-level diff is left to a future audit extractor;
        // counts come straight from the commit metrics.
        let diff = MergeDiff {
            version_before: delta_version_before,
            version_after,
            rows_added: metrics.rows_added,
            rows_updated: metrics.rows_updated,
            rows_deleted: metrics.rows_deleted,
        };

        let merge_result = MergeResult {
            cr_id: cr.id.clone(),
            version_before: delta_version_before,
            version_after,
            rows_added: diff.rows_added,
            rows_updated: diff.rows_updated,
            rows_deleted: diff.rows_deleted,
            forced: force,
            executed_at: Utc::now(),
        };

        // Step 6: persist audit artifacts.
        let audit_dir = layout.audit_change_requests(&cr.id)?;
        self.audit.write_once(&audit_dir, "merge_result", &merge_result).await?;
        self.audit.write_once(&audit_dir, "diff", &diff).await?;

        // Step 7: cleanup staging.
        self.cleanup_staging(layout, &cr.id).await?;

        // Step 8: finalize CR.
        let updated_cr = self
            .cr_service
            .record_merge(&cr.id, executor_id, delta_version_before, version_after, force)
            .await?;

        info!(cr_id = %cr.id, version_before = delta_version_before, version_after, forced = force, "merge_completed");
        Ok(MergeOutcome { cr: updated_cr, merge_result, diff })
    }

    /// `conflicts = staging ∩ main_current` on `primary_keys` (spec §4.7
    /// step 2). Returns the conflicting rows as they currently stand in
    /// `main`, for the audit report.
    async fn detect_conflicts(&self, main_path: &std::path::Path, staging_rows: &[Row], primary_keys: &[String]) -> CoreResult<Vec<Row>> {
        let main_rows = self.table_adapter.query(main_path, QueryOptions::default()).await?.rows;
        let conflicts = main_rows
            .into_iter()
            .filter(|main_row| staging_rows.iter().any(|staged| keys_match(main_row, staged, primary_keys)))
            .collect();
        Ok(conflicts)
    }

    /// Deletes `staging/<cr_id>`, or moves it under `archive/<cr_id>` when
    /// `archive_staging_on_cleanup` is set (spec §4.7 step 7).
    async fn cleanup_staging(&self, layout: &DatasetLayout, cr_id: &str) -> CoreResult<()> {
        let staging = layout.staging(cr_id)?;
        if !tokio::fs::try_exists(&staging).await.unwrap_or(false) {
            return Ok(());
        }

        if !self.archive_staging {
            return match tokio::fs::remove_dir_all(&staging).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            };
        }

        let archive = layout.audit_history().join(cr_id);
        tokio::fs::create_dir_all(layout.audit_history()).await?;
        tokio::fs::rename(&staging, &archive).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::value::Value;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    async fn setup() -> (tempfile::TempDir, DatasetLayout, Arc<TableAdapter>, Arc<ChangeRequestService>, MergeExecutor) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_root: dir.path().to_path_buf(), ..Config::default() };
        let layout = DatasetLayout::new(&config, "p", "d").unwrap();
        layout.ensure_skeleton().await.unwrap();
        let table_adapter = Arc::new(TableAdapter::new());
        let cr_service = Arc::new(ChangeRequestService::new());
        let executor = MergeExecutor::new(table_adapter.clone(), cr_service.clone(), false);
        (dir, layout, table_adapter, cr_service, executor)
    }

    #[tokio::test]
    async fn clean_merge_advances_version_and_finalizes_cr() {
        let (_dir, layout, table_adapter, cr_service, executor) = setup().await;
        table_adapter
            .overwrite(&layout.main(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))])])
            .await
            .unwrap();
        let version_before = log::head_version(&layout.main()).await.unwrap().unwrap();

        let cr = cr_service.create("p", "d", None, "t", None, vec![], "alice", "staging/cr".to_string()).await;
        cr_service.submit_for_review(&cr.id, "alice", None).await.unwrap();
        let cr = cr_service.approve(&cr.id, "bob", None).await.unwrap();

        table_adapter
            .overwrite(&layout.staging(&cr.id).unwrap(), vec![row(&[("id", Value::Integer(2)), ("v", Value::Text("b".into()))])])
            .await
            .unwrap();

        let outcome = executor
            .full_merge(&layout, &cr, &["id".to_string()], version_before, "executor", false)
            .await
            .unwrap();

        assert_eq!(outcome.cr.status, CrStatus::Merged);
        assert_eq!(outcome.merge_result.version_after, version_before + 1);

        let result = table_adapter.query(&layout.main(), QueryOptions::default()).await.unwrap();
        assert_eq!(result.count, 2);
        assert!(!tokio::fs::try_exists(layout.staging(&cr.id).unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn diverged_main_with_colliding_key_fails_with_merge_conflict() {
        let (_dir, layout, table_adapter, cr_service, executor) = setup().await;
        table_adapter
            .overwrite(&layout.main(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))])])
            .await
            .unwrap();
        let stale_version = log::head_version(&layout.main()).await.unwrap().unwrap();

        let cr = cr_service.create("p", "d", None, "t", None, vec![], "alice", "staging/cr".to_string()).await;
        cr_service.submit_for_review(&cr.id, "alice", None).await.unwrap();
        let cr = cr_service.approve(&cr.id, "bob", None).await.unwrap();

        table_adapter
            .overwrite(&layout.staging(&cr.id).unwrap(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("staged".into()))])])
            .await
            .unwrap();

        // Main diverges after staging branched: someone else edits id=1.
        table_adapter
            .overwrite(&layout.main(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("concurrent".into()))])])
            .await
            .unwrap();

        let err = executor
            .full_merge(&layout, &cr, &["id".to_string()], stale_version, "executor", false)
            .await
            .unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::MergeConflict));

        let refreshed = cr_service.get(&cr.id).await.unwrap();
        assert_eq!(refreshed.status, CrStatus::Approved);

        let conflicts_path = layout.audit_change_requests(&cr.id).unwrap().join("conflicts.json");
        assert!(conflicts_path.exists());
    }

    #[tokio::test]
    async fn force_merge_bypasses_conflicts_and_approved_gate() {
        let (_dir, layout, table_adapter, cr_service, executor) = setup().await;
        table_adapter
            .overwrite(&layout.main(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))])])
            .await
            .unwrap();
        let stale_version = log::head_version(&layout.main()).await.unwrap().unwrap();

        let cr = cr_service.create("p", "d", None, "t", None, vec![], "alice", "staging/cr".to_string()).await;

        table_adapter
            .overwrite(&layout.staging(&cr.id).unwrap(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("staged".into()))])])
            .await
            .unwrap();
        table_adapter
            .overwrite(&layout.main(), vec![row(&[("id", Value::Integer(1)), ("v", Value::Text("concurrent".into()))])])
            .await
            .unwrap();

        let outcome = executor
            .full_merge(&layout, &cr, &["id".to_string()], stale_version, "executor", true)
            .await
            .unwrap();
        assert_eq!(outcome.cr.status, CrStatus::Merged);

        let events = cr_service.list_events(&cr.id).await;
        assert!(events.iter().any(|e| e.event_type == crate::change_request::CrEventType::ForceMerge));
    }
}
