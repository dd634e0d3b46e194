//! Session and cell-edit entities, grounded on `live_edit_models.py`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

use crate::validator::{CellValidationResult, Rule};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    RowSelection,
    FullTable,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::FullTable
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Preview,
    Submitted,
    Aborted,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEditSession {
    pub session_id: String,
    pub dataset_id: String,
    pub project_id: String,
    pub user_id: String,

    pub mode: SessionMode,
    pub selected_rows: Vec<String>,

    pub staging_path: String,
    pub editable_columns: Vec<String>,
    pub rules_map: std::collections::BTreeMap<String, Vec<Rule>>,

    pub status: SessionStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    pub edit_count: usize,
    pub cells_changed: usize,
    pub rows_affected: usize,

    pub change_request_id: Option<String>,

    #[serde(default)]
    pub metadata: JsonMap<String, JsonValue>,
}

impl LiveEditSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expiry| now > expiry).unwrap_or(false)
    }

    /// A session accepts edits only while active, unexpired, and not yet
    /// handed off to a change request (spec §4.5 `can_edit`).
    pub fn can_edit(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active && !self.is_expired(now) && self.change_request_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellEdit {
    pub edit_id: String,
    pub session_id: String,
    pub row_id: String,
    pub column: String,
    pub old_value: Value,
    pub new_value: Value,
    pub user_id: String,

    pub client_ts: Option<DateTime<Utc>>,
    pub server_ts: DateTime<Utc>,

    pub validation: Option<CellValidationResult>,
    pub is_valid: bool,

    #[serde(default)]
    pub metadata: JsonMap<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatistics {
    pub total_edits: usize,
    pub rows_affected: usize,
    pub cells_changed: usize,
    pub valid_edits: usize,
    pub invalid_edits: usize,
}

impl SessionStatistics {
    /// Counts distinct rows and distinct (row, column) pairs touched, so a
    /// cell edited twice contributes one to `cells_changed`, not two (spec
    /// §4.5).
    pub fn calculate(edits: &[CellEdit]) -> Self {
        let mut rows = std::collections::BTreeSet::new();
        let mut cells = std::collections::BTreeSet::new();
        let mut valid_edits = 0;
        let mut invalid_edits = 0;
        for edit in edits {
            rows.insert(edit.row_id.clone());
            cells.insert((edit.row_id.clone(), edit.column.clone()));
            if edit.is_valid {
                valid_edits += 1;
            } else {
                invalid_edits += 1;
            }
        }
        Self {
            total_edits: edits.len(),
            rows_affected: rows.len(),
            cells_changed: cells.len(),
            valid_edits,
            invalid_edits,
        }
    }
}
