//! `LiveEditSessionManager`: session lifecycle, cell editing with
//! validation, overlay reads, and preview generation (spec §4.5),
//! grounded on `live_edit_service.py`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::audit::AuditWriter;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::live_edit::session::{CellEdit, LiveEditSession, SessionMode, SessionStatistics, SessionStatus};
use crate::live_edit::RowIdStrategy;
use crate::table::TableAdapter;
use crate::validator::{BatchValidationResult, Rule, Validator};
use crate::value::{Row, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResult {
    pub session: LiveEditSession,
    pub sample_rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOutcome {
    pub edit_id: Option<String>,
    pub valid: bool,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellDiff {
    pub row_id: String,
    pub column: String,
    pub old: Value,
    pub new: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub valid: usize,
    pub warnings: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub session_id: String,
    pub rows_changed: usize,
    pub cells_changed: usize,
    pub diffs: Vec<CellDiff>,
    pub validation_summary: ValidationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyChangesResult {
    pub rows_updated: usize,
    pub rows_deleted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRow {
    pub row: Row,
    pub edited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridPage {
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

pub struct LiveEditSessionManager {
    config: Config,
    validator: Arc<dyn Validator>,
    table_adapter: Arc<TableAdapter>,
    row_id_strategy: RowIdStrategy,
    sessions: Mutex<BTreeMap<String, LiveEditSession>>,
    edits: Mutex<BTreeMap<String, Vec<CellEdit>>>,
}

impl LiveEditSessionManager {
    pub fn new(
        config: Config,
        validator: Arc<dyn Validator>,
        table_adapter: Arc<TableAdapter>,
        row_id_strategy: RowIdStrategy,
    ) -> Self {
        Self {
            config,
            validator,
            table_adapter,
            row_id_strategy,
            sessions: Mutex::new(BTreeMap::new()),
            edits: Mutex::new(BTreeMap::new()),
        }
    }

    /// Starts a session over `base_path`, sampling up to `sample_limit` rows
    /// for the caller's initial grid paint (spec §4.5 `start_session`).
    pub async fn start_session(
        &self,
        base_path: &std::path::Path,
        project_id: &str,
        dataset_id: &str,
        user_id: &str,
        mode: SessionMode,
        selected_rows: Vec<String>,
        editable_columns: Vec<String>,
        rules_map: BTreeMap<String, Vec<Rule>>,
        sample_limit: usize,
    ) -> CoreResult<StartSessionResult> {
        if mode == SessionMode::RowSelection && selected_rows.is_empty() {
            return Err(CoreError::precondition_failed(
                "row_selection mode requires at least one selected row",
            ));
        }

        let session_id = format!("sess_{}", uuid::Uuid::now_v7().simple());
        let now = Utc::now();
        let session = LiveEditSession {
            session_id: session_id.clone(),
            dataset_id: dataset_id.to_string(),
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
            mode,
            selected_rows: if mode == SessionMode::RowSelection { selected_rows } else { Vec::new() },
            staging_path: format!("{}/live_edit/{session_id}", base_path.display()),
            editable_columns,
            rules_map,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            expires_at: Some(now + chrono_duration(self.config.session_ttl)),
            edit_count: 0,
            cells_changed: 0,
            rows_affected: 0,
            change_request_id: None,
            metadata: JsonMap::new(),
        };

        let sample = self
            .table_adapter
            .query(base_path, crate::table::QueryOptions { limit: sample_limit, ..Default::default() })
            .await?;

        self.sessions.lock().await.insert(session_id.clone(), session.clone());
        self.edits.lock().await.insert(session_id.clone(), Vec::new());

        info!(session_id = %session_id, %user_id, %dataset_id, mode = ?mode, "live_session_created");

        Ok(StartSessionResult { session, sample_rows: sample.rows })
    }

    pub async fn get_session(&self, session_id: &str) -> Option<LiveEditSession> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    /// Validates and records a single cell edit (spec §4.5
    /// `save_cell_edit`). Rejects edits outside `can_edit()`, outside the
    /// editable-column list, or — in `ROW_SELECTION` mode — outside the
    /// session's selected rows (grounded on
    /// `live_edit_service.py`'s row-selection guard, supplemented into
    /// the distilled spec per SPEC_FULL §4.5).
    pub async fn save_cell_edit(
        &self,
        session_id: &str,
        row_id: &str,
        column: &str,
        old_value: Value,
        new_value: Value,
        client_ts: Option<DateTime<Utc>>,
        user_id: &str,
    ) -> CoreResult<EditOutcome> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoreError::not_found(format!("session not found: {session_id}")))?;

        if !session.can_edit(now) {
            return Err(CoreError::precondition_failed("session is not editable"));
        }
        if !session.editable_columns.iter().any(|c| c == column) {
            return Err(CoreError::precondition_failed(format!("column '{column}' is not editable")));
        }
        if session.mode == SessionMode::RowSelection && !session.selected_rows.iter().any(|r| r == row_id) {
            return Err(CoreError::precondition_failed(format!(
                "row '{row_id}' is outside this session's selected rows"
            )));
        }

        let column_rules: Vec<Rule> = session.rules_map.get(column).cloned().unwrap_or_default();
        let validation = self.validator.validate_cell(column, &new_value, &column_rules, Some(row_id));
        let messages: Vec<String> = validation.errors.iter().map(|e| e.message.clone()).collect();
        let is_valid = validation.valid;

        let edit = CellEdit {
            edit_id: format!("edit_{}", uuid::Uuid::now_v7().simple()),
            session_id: session_id.to_string(),
            row_id: row_id.to_string(),
            column: column.to_string(),
            old_value,
            new_value,
            user_id: user_id.to_string(),
            client_ts,
            server_ts: now,
            validation: Some(validation),
            is_valid,
            metadata: JsonMap::new(),
        };

        let mut edits = self.edits.lock().await;
        let session_edits = edits.entry(session_id.to_string()).or_default();
        session_edits.push(edit.clone());
        let stats = SessionStatistics::calculate(session_edits);

        session.edit_count = stats.total_edits;
        session.cells_changed = stats.cells_changed;
        session.rows_affected = stats.rows_affected;
        session.updated_at = now;

        info!(session_id, edit_id = %edit.edit_id, row_id, column, is_valid, "edit_saved");

        Ok(EditOutcome { edit_id: Some(edit.edit_id), valid: is_valid, messages })
    }

    pub async fn save_bulk_edits(
        &self,
        session_id: &str,
        edits: Vec<(String, String, Value, Value, Option<DateTime<Utc>>)>,
        user_id: &str,
    ) -> CoreResult<Vec<EditOutcome>> {
        let mut results = Vec::with_capacity(edits.len());
        for (row_id, column, old_value, new_value, client_ts) in edits {
            results.push(
                self.save_cell_edit(session_id, &row_id, &column, old_value, new_value, client_ts, user_id)
                    .await?,
            );
        }
        Ok(results)
    }

    /// Overlays the session's latest-edit-per-cell on top of `base_rows`
    /// (spec §4.5: "overlay-read semantics"). Rows are identified via the
    /// configured `RowIdStrategy`.
    pub async fn overlay_read(&self, session_id: &str, base_rows: Vec<Row>) -> Vec<Row> {
        let edits = self.edits.lock().await;
        let Some(session_edits) = edits.get(session_id) else {
            return base_rows;
        };

        let mut latest: BTreeMap<(String, String), &Value> = BTreeMap::new();
        for edit in session_edits {
            latest.insert((edit.row_id.clone(), edit.column.clone()), &edit.new_value);
        }

        base_rows
            .into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                let row_id = self.row_id_strategy.row_id(&row, idx);
                for ((candidate_row, column), value) in &latest {
                    if candidate_row == &row_id {
                        row.insert(column.clone(), (*value).clone());
                    }
                }
                row
            })
            .collect()
    }

    pub async fn get_rows_by_ids(&self, base_path: &std::path::Path, row_ids: &[String]) -> CoreResult<Vec<Row>> {
        let all = self.table_adapter.query(base_path, crate::table::QueryOptions::default()).await?;
        Ok(all
            .rows
            .into_iter()
            .enumerate()
            .filter(|(idx, row)| row_ids.iter().any(|id| id == &self.row_id_strategy.row_id(row, *idx)))
            .map(|(_, row)| row)
            .collect())
    }

    /// Paginated, overlay-aware grid read (spec §4.5 `get_grid_data`): reads
    /// a page of `base_path`, applies `session_id`'s overlay if given, and
    /// marks each row `edited` when the session touched it.
    pub async fn get_grid_data(
        &self,
        base_path: &std::path::Path,
        page: usize,
        limit: usize,
        session_id: Option<&str>,
        order_by: Option<&str>,
    ) -> CoreResult<GridPage> {
        let page = page.max(1);
        let offset = (page - 1) * limit;
        let all = self
            .table_adapter
            .query(base_path, crate::table::QueryOptions { order_by: order_by.map(str::to_string), ..Default::default() })
            .await?;
        let total = all.rows.len();
        let columns = all.columns;
        let base_page = crate::table::query::paginate(all.rows, limit, offset);

        let edited_ids: BTreeSet<String> = match session_id {
            Some(id) => self
                .edits
                .lock()
                .await
                .get(id)
                .map(|edits| edits.iter().map(|e| e.row_id.clone()).collect())
                .unwrap_or_default(),
            None => BTreeSet::new(),
        };

        let overlaid = match session_id {
            Some(id) => self.overlay_read(id, base_page).await,
            None => base_page,
        };

        let rows = overlaid
            .into_iter()
            .enumerate()
            .map(|(idx, row)| {
                let row_id = self.row_id_strategy.row_id(&row, offset + idx);
                let edited = edited_ids.contains(&row_id);
                GridRow { row, edited }
            })
            .collect();

        Ok(GridPage { columns, rows, total, page, limit })
    }

    /// Applies a session's pending edits and row deletions to `base_path` as
    /// a single overwrite commit (spec §4.5 `apply_changes`), invoked by the
    /// Merge Executor once a CR carrying this session is approved.
    pub async fn apply_changes(
        &self,
        session_id: &str,
        base_path: &std::path::Path,
        deleted_rows: &[String],
    ) -> CoreResult<ApplyChangesResult> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .ok_or_else(|| CoreError::not_found(format!("session not found: {session_id}")))?;
        drop(sessions);

        let session_edits = self.edits.lock().await.get(session_id).cloned().unwrap_or_default();
        let deleted: BTreeSet<&String> = deleted_rows.iter().collect();

        let base = self.table_adapter.query(base_path, crate::table::QueryOptions::default()).await?;
        let mut rows_updated: BTreeSet<String> = BTreeSet::new();
        let mut rows_deleted = 0usize;

        let mut kept = Vec::with_capacity(base.rows.len());
        for (idx, row) in base.rows.into_iter().enumerate() {
            let row_id = self.row_id_strategy.row_id(&row, idx);
            if deleted.contains(&row_id) {
                rows_deleted += 1;
                continue;
            }
            kept.push((row_id, row));
        }

        let mut latest: BTreeMap<(String, String), &Value> = BTreeMap::new();
        for edit in &session_edits {
            latest.insert((edit.row_id.clone(), edit.column.clone()), &edit.new_value);
        }

        let result_rows: Vec<Row> = kept
            .into_iter()
            .map(|(row_id, mut row)| {
                let mut touched = false;
                for ((candidate_row, column), value) in &latest {
                    if candidate_row == &row_id {
                        row.insert(column.clone(), (*value).clone());
                        touched = true;
                    }
                }
                if touched {
                    rows_updated.insert(row_id);
                }
                row
            })
            .collect();

        self.table_adapter.overwrite(base_path, result_rows).await?;

        info!(session_id, rows_updated = rows_updated.len(), rows_deleted, "changes_applied");
        Ok(ApplyChangesResult { rows_updated: rows_updated.len(), rows_deleted })
    }

    /// Revalidates a session's overlaid rows against `rules` and records the
    /// validation-run audit artifacts (spec §4.9; canonical flow step
    /// "Validator (revalidate staging)").
    pub async fn revalidate_staging(
        &self,
        session_id: &str,
        base_path: &std::path::Path,
        audit: &AuditWriter,
        validation_runs_dir: &std::path::Path,
        run_id: &str,
        rules: &[Rule],
    ) -> CoreResult<BatchValidationResult> {
        let base = self.table_adapter.query(base_path, crate::table::QueryOptions::default()).await?;
        let overlaid = self.overlay_read(session_id, base.rows).await;
        crate::validator::run_and_record(self.validator.as_ref(), audit, validation_runs_dir, run_id, &overlaid, rules).await
    }

    pub async fn generate_preview(&self, session_id: &str) -> CoreResult<PreviewSummary> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .ok_or_else(|| CoreError::not_found(format!("session not found: {session_id}")))?;
        drop(sessions);

        let edits = self.edits.lock().await;
        let session_edits = edits.get(session_id).cloned().unwrap_or_default();
        drop(edits);

        let diffs: Vec<CellDiff> = session_edits
            .iter()
            .map(|e| CellDiff {
                row_id: e.row_id.clone(),
                column: e.column.clone(),
                old: e.old_value.clone(),
                new: e.new_value.clone(),
            })
            .collect();

        let mut summary = ValidationSummary::default();
        for edit in &session_edits {
            if let Some(validation) = &edit.validation {
                for error in &validation.errors {
                    match error.severity {
                        crate::validator::ValidationSeverity::Warning => summary.warnings += 1,
                        crate::validator::ValidationSeverity::Error | crate::validator::ValidationSeverity::Fatal => {
                            summary.errors += 1
                        }
                        crate::validator::ValidationSeverity::Info => {}
                    }
                }
            }
        }
        summary.valid = session_edits.iter().filter(|e| e.is_valid).count();

        let stats = SessionStatistics::calculate(&session_edits);

        Ok(PreviewSummary {
            session_id: session_id.to_string(),
            rows_changed: stats.rows_affected,
            cells_changed: stats.cells_changed,
            diffs,
            validation_summary: summary,
        })
    }

    /// Aborts a session. Cannot abort once a change request has claimed it
    /// (spec §4.5 `delete_session`).
    pub async fn delete_session(&self, session_id: &str) -> CoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoreError::not_found(format!("session not found: {session_id}")))?;
        if session.change_request_id.is_some() {
            return Err(CoreError::precondition_failed(
                "cannot delete a session with an associated change request",
            ));
        }
        session.status = SessionStatus::Aborted;
        session.updated_at = Utc::now();
        drop(sessions);

        self.edits.lock().await.remove(session_id);
        info!(session_id, "session_aborted");
        Ok(())
    }

    pub async fn attach_change_request(&self, session_id: &str, cr_id: &str) -> CoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoreError::not_found(format!("session not found: {session_id}")))?;
        session.change_request_id = Some(cr_id.to_string());
        session.updated_at = Utc::now();
        Ok(())
    }

    pub async fn get_session_edits(&self, session_id: &str) -> Vec<CellEdit> {
        self.edits.lock().await.get(session_id).cloned().unwrap_or_default()
    }

    /// Marks active-but-expired sessions as expired and drops their edits,
    /// returning the count cleaned (spec §4.5 `cleanup_expired_sessions`).
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let mut cleaned = 0;
        let expired_ids: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.status == SessionStatus::Active && s.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired_ids {
            if let Some(session) = sessions.get_mut(id) {
                session.status = SessionStatus::Expired;
                cleaned += 1;
                info!(session_id = %id, "session_expired");
            }
        }
        drop(sessions);
        let mut edits = self.edits.lock().await;
        for id in &expired_ids {
            edits.remove(id);
        }
        cleaned
    }
}

fn chrono_duration(std_duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(std_duration).unwrap_or(chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::RuleEngineValidator;

    fn manager() -> LiveEditSessionManager {
        LiveEditSessionManager::new(
            Config::default(),
            Arc::new(RuleEngineValidator::new()),
            Arc::new(TableAdapter::new()),
            RowIdStrategy::Column("id".to_string()),
        )
    }

    async fn seed_table(path: &std::path::Path) {
        let adapter = TableAdapter::new();
        let mut row1 = Row::new();
        row1.insert("id".into(), Value::Integer(1));
        row1.insert("amount".into(), Value::Integer(10));
        let mut row2 = Row::new();
        row2.insert("id".into(), Value::Integer(2));
        row2.insert("amount".into(), Value::Integer(20));
        adapter.overwrite(path, vec![row1, row2]).await.unwrap();
    }

    #[tokio::test]
    async fn row_selection_mode_rejects_edits_outside_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();

        let started = manager
            .start_session(
                &path,
                "p",
                "d",
                "u1",
                SessionMode::RowSelection,
                vec!["1".to_string()],
                vec!["amount".to_string()],
                BTreeMap::new(),
                10,
            )
            .await
            .unwrap();

        let err = manager
            .save_cell_edit(
                &started.session.session_id,
                "2",
                "amount",
                Value::Integer(20),
                Value::Integer(99),
                None,
                "u1",
            )
            .await
            .unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::PreconditionFailed));

        let ok = manager
            .save_cell_edit(
                &started.session.session_id,
                "1",
                "amount",
                Value::Integer(10),
                Value::Integer(99),
                None,
                "u1",
            )
            .await
            .unwrap();
        assert!(ok.valid);
    }

    #[tokio::test]
    async fn overlay_read_applies_latest_edit_per_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();

        let started = manager
            .start_session(
                &path,
                "p",
                "d",
                "u1",
                SessionMode::FullTable,
                Vec::new(),
                vec!["amount".to_string()],
                BTreeMap::new(),
                10,
            )
            .await
            .unwrap();

        manager
            .save_cell_edit(&started.session.session_id, "1", "amount", Value::Integer(10), Value::Integer(50), None, "u1")
            .await
            .unwrap();
        manager
            .save_cell_edit(&started.session.session_id, "1", "amount", Value::Integer(50), Value::Integer(75), None, "u1")
            .await
            .unwrap();

        let base = manager.table_adapter.query(&path, Default::default()).await.unwrap();
        let overlaid = manager.overlay_read(&started.session.session_id, base.rows).await;
        let edited_row = overlaid.iter().find(|r| r.get("id") == Some(&Value::Integer(1))).unwrap();
        assert_eq!(edited_row.get("amount"), Some(&Value::Integer(75)));
    }

    #[tokio::test]
    async fn cannot_delete_session_with_attached_change_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();
        let started = manager
            .start_session(&path, "p", "d", "u1", SessionMode::FullTable, Vec::new(), vec![], BTreeMap::new(), 10)
            .await
            .unwrap();
        manager.attach_change_request(&started.session.session_id, "cr_1").await.unwrap();
        let err = manager.delete_session(&started.session.session_id).await.unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::PreconditionFailed));
    }

    #[tokio::test]
    async fn apply_changes_updates_and_deletes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();

        let started = manager
            .start_session(&path, "p", "d", "u1", SessionMode::FullTable, Vec::new(), vec!["amount".to_string()], BTreeMap::new(), 10)
            .await
            .unwrap();
        manager
            .save_cell_edit(&started.session.session_id, "1", "amount", Value::Integer(10), Value::Integer(99), None, "u1")
            .await
            .unwrap();

        let result = manager
            .apply_changes(&started.session.session_id, &path, &["2".to_string()])
            .await
            .unwrap();
        assert_eq!(result.rows_updated, 1);
        assert_eq!(result.rows_deleted, 1);

        let final_rows = manager.table_adapter.query(&path, Default::default()).await.unwrap();
        assert_eq!(final_rows.count, 1);
        assert_eq!(final_rows.rows[0].get("amount"), Some(&Value::Integer(99)));
    }

    #[tokio::test]
    async fn get_grid_data_marks_edited_rows_and_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();

        let started = manager
            .start_session(&path, "p", "d", "u1", SessionMode::FullTable, Vec::new(), vec!["amount".to_string()], BTreeMap::new(), 10)
            .await
            .unwrap();
        manager
            .save_cell_edit(&started.session.session_id, "1", "amount", Value::Integer(10), Value::Integer(42), None, "u1")
            .await
            .unwrap();

        let page = manager
            .get_grid_data(&path, 1, 1, Some(&started.session.session_id), Some("id ASC"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert!(page.rows[0].edited);
        assert_eq!(page.rows[0].row.get("amount"), Some(&Value::Integer(42)));

        let page2 = manager
            .get_grid_data(&path, 2, 1, Some(&started.session.session_id), Some("id ASC"))
            .await
            .unwrap();
        assert_eq!(page2.rows.len(), 1);
        assert!(!page2.rows[0].edited);
    }

    #[tokio::test]
    async fn revalidate_staging_writes_audit_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        seed_table(&path).await;
        let manager = manager();

        let started = manager
            .start_session(&path, "p", "d", "u1", SessionMode::FullTable, Vec::new(), vec!["amount".to_string()], BTreeMap::new(), 10)
            .await
            .unwrap();

        let audit = crate::audit::AuditWriter::new();
        let runs_dir = dir.path().join("audit/validation_runs");
        let result = manager
            .revalidate_staging(&started.session.session_id, &path, &audit, &runs_dir, "run_1", &[])
            .await
            .unwrap();
        assert!(result.valid);
        assert!(runs_dir.join("run_1").join("summary.json").exists());
        assert!(runs_dir.join("run_1").join("full.json").exists());
    }
}
