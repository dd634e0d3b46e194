//! Change Request Service (spec §4.6): the six-state CR lifecycle and its
//! append-only event log, grounded on `change_request_models.py` /
//! `change_request_service.py`.

pub mod service;

pub use service::ChangeRequestService;

use serde::{Deserialize, Serialize};

use crate::validation_state::{ValidationCounts, ValidationState};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CrStatus {
    Draft,
    PendingReview,
    Rejected,
    Approved,
    Merged,
    Closed,
}

/// Event types on a CR's audit trail. `ForceMerge` and `ValidationOverride`
/// are additions beyond the original's event enum (spec §9's "force
/// merge" flag and Open Question #3's override both need a distinguishable
/// audit entry; SPEC_FULL §4.6/§4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CrEventType {
    Created,
    Edited,
    Submitted,
    Approved,
    Rejected,
    ValidationOverride,
    Merged,
    ForceMerge,
    MergeFailed,
    Restored,
    Cleanup,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub state: ValidationState,
    pub counts: ValidationCounts,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellChange {
    pub column: String,
    pub old_value: Value,
    pub new_value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDiff {
    pub row_id: String,
    pub changes: Vec<CellChange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeRequestEdits {
    pub cr_id: String,
    pub diffs: Vec<RowDiff>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    pub project_id: String,
    pub dataset_id: String,
    pub session_id: Option<String>,

    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub approvers: Vec<String>,

    pub status: CrStatus,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub approved_at: Option<chrono::DateTime<chrono::Utc>>,
    pub rejected_at: Option<chrono::DateTime<chrono::Utc>>,
    pub merged_at: Option<chrono::DateTime<chrono::Utc>>,

    pub staging_path: String,
    pub delta_version_before: Option<u64>,
    pub delta_version_after: Option<u64>,

    pub row_count_added: u64,
    pub row_count_updated: u64,
    pub row_count_deleted: u64,
    pub cell_count_changed: u64,

    pub validation_summary: Option<ValidationSummary>,
    pub warnings_count: u32,
    pub errors_count: u32,
    pub fatal_errors: u32,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestEvent {
    pub id: String,
    pub cr_id: String,
    pub event_type: CrEventType,
    pub actor_id: String,
    pub message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Pure transition table mirroring `ChangeRequestStateMachine` (spec §4.6).
pub fn can_transition(from: CrStatus, to: CrStatus) -> bool {
    use CrStatus::*;
    matches!(
        (from, to),
        (Draft, PendingReview)
            | (PendingReview, Approved)
            | (PendingReview, Rejected)
            | (Rejected, PendingReview)
            | (Approved, Merged)
            | (Approved, PendingReview)
            | (Merged, Closed)
    )
}
