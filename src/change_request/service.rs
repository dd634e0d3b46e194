//! `ChangeRequestService`: CR creation, lifecycle transitions, and the
//! append-only event log (spec §4.6), grounded on
//! `change_request_service.py`.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::change_request::{
    can_transition, ChangeRequest, ChangeRequestEdits, ChangeRequestEvent, CrEventType, CrStatus,
    ValidationSummary,
};
use crate::error::{CoreError, CoreResult};

pub struct ChangeRequestService {
    crs: Mutex<BTreeMap<String, ChangeRequest>>,
    events: Mutex<Vec<ChangeRequestEvent>>,
    edits: Mutex<BTreeMap<String, ChangeRequestEdits>>,
}

impl Default for ChangeRequestService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeRequestService {
    pub fn new() -> Self {
        Self {
            crs: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
            edits: Mutex::new(BTreeMap::new()),
        }
    }

    async fn record_event(&self, cr_id: &str, event_type: CrEventType, actor_id: &str, message: Option<String>) {
        let event = ChangeRequestEvent {
            id: format!("evt_{}", uuid::Uuid::now_v7().simple()),
            cr_id: cr_id.to_string(),
            event_type,
            actor_id: actor_id.to_string(),
            message,
            created_at: Utc::now(),
            metadata: serde_json::Map::new(),
        };
        self.events.lock().await.push(event);
    }

    /// Creates a CR in `DRAFT`, staging at `<dataset>/staging/<cr_id>`
    /// (spec §4.6 `create_change_request`).
    pub async fn create(
        &self,
        project_id: &str,
        dataset_id: &str,
        session_id: Option<String>,
        title: &str,
        description: Option<String>,
        approvers: Vec<String>,
        created_by: &str,
        staging_path: String,
    ) -> ChangeRequest {
        let cr_id = format!("cr_{}", uuid::Uuid::now_v7().simple());
        let now = Utc::now();
        let cr = ChangeRequest {
            id: cr_id.clone(),
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            session_id,
            title: title.to_string(),
            description,
            created_by: created_by.to_string(),
            approvers,
            status: CrStatus::Draft,
            created_at: now,
            updated_at: now,
            approved_at: None,
            rejected_at: None,
            merged_at: None,
            staging_path,
            delta_version_before: None,
            delta_version_after: None,
            row_count_added: 0,
            row_count_updated: 0,
            row_count_deleted: 0,
            cell_count_changed: 0,
            validation_summary: None,
            warnings_count: 0,
            errors_count: 0,
            fatal_errors: 0,
            metadata: serde_json::Map::new(),
        };

        self.crs.lock().await.insert(cr_id.clone(), cr.clone());
        self.record_event(&cr_id, CrEventType::Created, created_by, Some(format!("Created CR: {title}"))).await;
        info!(cr_id = %cr_id, project_id, dataset_id, created_by, "cr_created");
        cr
    }

    pub async fn get(&self, cr_id: &str) -> Option<ChangeRequest> {
        self.crs.lock().await.get(cr_id).cloned()
    }

    pub async fn list(
        &self,
        project_id: Option<&str>,
        dataset_id: Option<&str>,
        status: Option<CrStatus>,
    ) -> Vec<ChangeRequest> {
        let crs = self.crs.lock().await;
        let mut results: Vec<ChangeRequest> = crs
            .values()
            .filter(|cr| project_id.map(|p| cr.project_id == p).unwrap_or(true))
            .filter(|cr| dataset_id.map(|d| cr.dataset_id == d).unwrap_or(true))
            .filter(|cr| status.map(|s| cr.status == s).unwrap_or(true))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    /// Validates and records the `DRAFT -> PENDING_REVIEW` transition
    /// (spec §4.6 `submit_for_review`); blocks on blocking/fatal errors.
    pub async fn submit_for_review(
        &self,
        cr_id: &str,
        submitter_id: &str,
        validation_summary: Option<ValidationSummary>,
    ) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        if let Some(summary) = validation_summary {
            cr.warnings_count = summary.counts.warning;
            cr.errors_count = summary.counts.error;
            cr.fatal_errors = summary.counts.fatal;
            cr.validation_summary = Some(summary);
        }

        if cr.status != CrStatus::Draft {
            return Err(CoreError::illegal_transition(format!(
                "CR must be in DRAFT status, currently {:?}",
                cr.status
            )));
        }
        if cr.fatal_errors > 0 || cr.errors_count > 0 {
            return Err(CoreError::validation_blocked("CR has blocking validation errors"));
        }
        if !can_transition(cr.status, CrStatus::PendingReview) {
            return Err(CoreError::illegal_transition("cannot transition to PENDING_REVIEW"));
        }

        cr.status = CrStatus::PendingReview;
        cr.updated_at = Utc::now();
        let result = cr.clone();
        drop(crs);

        self.record_event(cr_id, CrEventType::Submitted, submitter_id, Some("Submitted for review".to_string())).await;
        info!(cr_id, submitter_id, warnings = result.warnings_count, errors = result.errors_count, "cr_submitted");
        Ok(result)
    }

    /// `PENDING_REVIEW -> APPROVED` (spec §4.6 `approve_change_request`).
    pub async fn approve(&self, cr_id: &str, approver_id: &str, message: Option<String>) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        if cr.status != CrStatus::PendingReview {
            return Err(CoreError::illegal_transition(format!(
                "CR must be in PENDING_REVIEW status, currently {:?}",
                cr.status
            )));
        }
        if cr.fatal_errors > 0 || cr.errors_count > 0 {
            return Err(CoreError::validation_blocked("CR has blocking validation errors"));
        }
        if !can_transition(cr.status, CrStatus::Approved) {
            return Err(CoreError::illegal_transition("cannot transition to APPROVED"));
        }

        let now = Utc::now();
        cr.status = CrStatus::Approved;
        cr.approved_at = Some(now);
        cr.updated_at = now;
        let result = cr.clone();
        drop(crs);

        self.record_event(cr_id, CrEventType::Approved, approver_id, message.or_else(|| Some("Approved".to_string()))).await;
        info!(cr_id, approver_id, "cr_approved");
        Ok(result)
    }

    /// `PENDING_REVIEW -> REJECTED` (spec §4.6 `reject_change_request`); a
    /// rejection message is mandatory, as in the original service.
    pub async fn reject(&self, cr_id: &str, reviewer_id: &str, message: String) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        if !can_transition(cr.status, CrStatus::Rejected) {
            return Err(CoreError::illegal_transition(format!(
                "cannot transition from {:?} to REJECTED",
                cr.status
            )));
        }

        let now = Utc::now();
        cr.status = CrStatus::Rejected;
        cr.rejected_at = Some(now);
        cr.updated_at = now;
        let result = cr.clone();
        drop(crs);

        self.record_event(cr_id, CrEventType::Rejected, reviewer_id, Some(message)).await;
        info!(cr_id, reviewer_id, "cr_rejected");
        Ok(result)
    }

    /// Records the validation-state override used to unblock a
    /// `PARTIAL_PASS` CR without re-running validation (resolves Open
    /// Question #3, SPEC_FULL §4.7).
    pub async fn record_validation_override(&self, cr_id: &str, actor_id: &str, message: Option<String>) -> CoreResult<()> {
        let crs = self.crs.lock().await;
        if !crs.contains_key(cr_id) {
            return Err(CoreError::not_found(format!("CR not found: {cr_id}")));
        }
        drop(crs);
        self.record_event(cr_id, CrEventType::ValidationOverride, actor_id, message).await;
        Ok(())
    }

    /// Records a completed merge: `APPROVED -> MERGED`, stamping the
    /// before/after versions the Merge Executor observed (spec §4.6/§4.7,
    /// Open Question #2: these are always the Table Adapter's real log
    /// versions, never placeholders).
    pub async fn record_merge(
        &self,
        cr_id: &str,
        executor_id: &str,
        delta_version_before: u64,
        delta_version_after: u64,
        forced: bool,
    ) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        if !forced && !can_transition(cr.status, CrStatus::Merged) {
            return Err(CoreError::illegal_transition(format!(
                "CR must be APPROVED before merge, currently {:?}",
                cr.status
            )));
        }

        let now = Utc::now();
        cr.status = CrStatus::Merged;
        cr.delta_version_before = Some(delta_version_before);
        cr.delta_version_after = Some(delta_version_after);
        cr.merged_at = Some(now);
        cr.updated_at = now;
        let result = cr.clone();
        drop(crs);

        let event_type = if forced { CrEventType::ForceMerge } else { CrEventType::Merged };
        self.record_event(cr_id, event_type, executor_id, Some(format!("Merged to version {delta_version_after}"))).await;
        info!(cr_id, executor_id, delta_version_before, delta_version_after, forced, "cr_merged");
        Ok(result)
    }

    /// Reverts `APPROVED -> PENDING_REVIEW` after a merge failure at step 3
    /// or later (spec §4.7: "the CR is moved APPROVED -> PENDING_REVIEW;
    /// the staging table is preserved; an error event is emitted").
    pub async fn fail_merge(&self, cr_id: &str, actor_id: &str, message: String) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        cr.status = CrStatus::PendingReview;
        cr.updated_at = Utc::now();
        let result = cr.clone();
        drop(crs);

        self.record_event(cr_id, CrEventType::MergeFailed, actor_id, Some(message)).await;
        info!(cr_id, actor_id, "cr_merge_failed");
        Ok(result)
    }

    /// Finalizes a merged CR: `MERGED -> CLOSED` (spec §4.6's post-merge
    /// finalize step).
    pub async fn close(&self, cr_id: &str, actor_id: &str, message: Option<String>) -> CoreResult<ChangeRequest> {
        let mut crs = self.crs.lock().await;
        let cr = crs.get_mut(cr_id).ok_or_else(|| CoreError::not_found(format!("CR not found: {cr_id}")))?;

        if !can_transition(cr.status, CrStatus::Closed) {
            return Err(CoreError::illegal_transition(format!(
                "cannot transition from {:?} to CLOSED",
                cr.status
            )));
        }

        cr.status = CrStatus::Closed;
        cr.updated_at = Utc::now();
        let result = cr.clone();
        drop(crs);

        self.record_event(cr_id, CrEventType::Closed, actor_id, message).await;
        info!(cr_id, actor_id, "cr_closed");
        Ok(result)
    }

    pub async fn list_events(&self, cr_id: &str) -> Vec<ChangeRequestEvent> {
        self.events.lock().await.iter().filter(|e| e.cr_id == cr_id).cloned().collect()
    }

    pub async fn save_edits(&self, cr_id: &str, edits: ChangeRequestEdits) {
        let diff_count = edits.diffs.len();
        self.edits.lock().await.insert(cr_id.to_string(), edits);
        info!(cr_id, diff_count, "cr_edits_saved");
    }

    pub async fn get_edits(&self, cr_id: &str) -> Option<ChangeRequestEdits> {
        self.edits.lock().await.get(cr_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_state::ValidationCounts;

    #[tokio::test]
    async fn six_state_lifecycle_happy_path() {
        let service = ChangeRequestService::new();
        let cr = service
            .create("p", "d", None, "title", None, vec![], "alice", "staging/cr_1".to_string())
            .await;
        assert_eq!(cr.status, CrStatus::Draft);

        let submitted = service.submit_for_review(&cr.id, "alice", None).await.unwrap();
        assert_eq!(submitted.status, CrStatus::PendingReview);

        let approved = service.approve(&cr.id, "bob", None).await.unwrap();
        assert_eq!(approved.status, CrStatus::Approved);

        let merged = service.record_merge(&cr.id, "executor", 3, 4, false).await.unwrap();
        assert_eq!(merged.status, CrStatus::Merged);
        assert_eq!(merged.delta_version_before, Some(3));
        assert_eq!(merged.delta_version_after, Some(4));

        let events = service.list_events(&cr.id).await;
        let types: Vec<CrEventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![CrEventType::Created, CrEventType::Submitted, CrEventType::Approved, CrEventType::Merged]
        );
    }

    #[tokio::test]
    async fn submission_blocked_by_errors() {
        let service = ChangeRequestService::new();
        let cr = service.create("p", "d", None, "t", None, vec![], "alice", "s".to_string()).await;
        let summary = ValidationSummary {
            state: crate::validation_state::ValidationState::Failed,
            counts: ValidationCounts { error: 1, ..Default::default() },
            messages: vec![],
        };
        let err = service.submit_for_review(&cr.id, "alice", Some(summary)).await.unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::ValidationBlocked));
    }

    #[tokio::test]
    async fn rejected_cr_can_be_resubmitted() {
        let service = ChangeRequestService::new();
        let cr = service.create("p", "d", None, "t", None, vec![], "alice", "s".to_string()).await;
        service.submit_for_review(&cr.id, "alice", None).await.unwrap();
        service.reject(&cr.id, "bob", "needs work".to_string()).await.unwrap();
        let resubmitted = service.submit_for_review(&cr.id, "alice", None).await.unwrap();
        assert_eq!(resubmitted.status, CrStatus::PendingReview);
    }

    #[tokio::test]
    async fn force_merge_bypasses_approved_gate_and_is_distinguishable() {
        let service = ChangeRequestService::new();
        let cr = service.create("p", "d", None, "t", None, vec![], "alice", "s".to_string()).await;
        let merged = service.record_merge(&cr.id, "executor", 0, 1, true).await.unwrap();
        assert_eq!(merged.status, CrStatus::Merged);
        let events = service.list_events(&cr.id).await;
        assert!(events.iter().any(|e| e.event_type == CrEventType::ForceMerge));
    }

    #[tokio::test]
    async fn merged_cr_can_be_closed() {
        let service = ChangeRequestService::new();
        let cr = service.create("p", "d", None, "t", None, vec![], "alice", "s".to_string()).await;
        service.record_merge(&cr.id, "executor", 0, 1, true).await.unwrap();
        let closed = service.close(&cr.id, "bob", Some("done".to_string())).await.unwrap();
        assert_eq!(closed.status, CrStatus::Closed);
        let events = service.list_events(&cr.id).await;
        assert!(events.iter().any(|e| e.event_type == CrEventType::Closed));
    }

    #[tokio::test]
    async fn closing_non_merged_cr_fails() {
        let service = ChangeRequestService::new();
        let cr = service.create("p", "d", None, "t", None, vec![], "alice", "s".to_string()).await;
        let err = service.close(&cr.id, "bob", None).await.unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::IllegalTransition));
    }
}
