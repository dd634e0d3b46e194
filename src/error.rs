//! Error taxonomy for the collaborative table-change core.
//!
//! Mirrors the catalogue-of-constructors style used elsewhere in this crate
//! (see `table::log` and `change_request::service`): a closed `CoreErrorKind`
//! enum maps 1:1 onto the error taxonomy of the design, and small builder
//! functions live beside the code that raises them rather than inline
//! `CoreError { .. }` literals scattered through the tree.

use std::fmt;

/// Abstract error kind. Each variant maps to an HTTP status at whatever
/// boundary embeds this crate; the core itself never assigns a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CoreErrorKind {
    #[error("not found")]
    NotFound,
    #[error("illegal transition")]
    IllegalTransition,
    #[error("validation blocked")]
    ValidationBlocked,
    #[error("schema mismatch")]
    SchemaMismatch,
    #[error("merge conflict")]
    MergeConflict,
    #[error("version not found")]
    VersionNotFound,
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("internal error")]
    Internal,
}

impl CoreErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::IllegalTransition => "ILLEGAL_TRANSITION",
            Self::ValidationBlocked => "VALIDATION_BLOCKED",
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
            Self::MergeConflict => "MERGE_CONFLICT",
            Self::VersionNotFound => "VERSION_NOT_FOUND",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::Internal => "INTERNAL",
        }
    }
}

/// A correlation id attached to `Internal` errors so a caller can tie a log
/// line back to a user-visible failure without leaking internals.
pub fn new_correlation_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[derive(Debug, Clone)]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub correlation_id: Option<String>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            correlation_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::NotFound, message)
    }

    pub fn illegal_transition(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::IllegalTransition, message)
    }

    pub fn validation_blocked(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::ValidationBlocked, message)
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::SchemaMismatch, message)
    }

    pub fn merge_conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::MergeConflict, message)
    }

    pub fn version_not_found(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::VersionNotFound, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::PreconditionFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message).with_correlation_id()
    }

    fn with_correlation_id(mut self) -> Self {
        self.correlation_id = Some(new_correlation_id());
        self
    }

    pub fn is_kind(&self, kind: CoreErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.message, self.kind.as_str(), self.kind)?;
        if let Some(detail) = &self.detail {
            write!(f, " — {detail}")?;
        }
        if let Some(correlation_id) = &self.correlation_id {
            write!(f, " [correlation_id={correlation_id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::internal(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::internal(format!("json error: {err}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_have_unique_wire_strings() {
        use std::collections::HashSet;
        let kinds = [
            CoreErrorKind::NotFound,
            CoreErrorKind::IllegalTransition,
            CoreErrorKind::ValidationBlocked,
            CoreErrorKind::SchemaMismatch,
            CoreErrorKind::MergeConflict,
            CoreErrorKind::VersionNotFound,
            CoreErrorKind::PreconditionFailed,
            CoreErrorKind::Internal,
        ];
        let mut seen = HashSet::new();
        for kind in kinds {
            assert!(seen.insert(kind.as_str()), "duplicate wire string for {kind:?}");
        }
    }

    #[test]
    fn internal_errors_carry_a_correlation_id() {
        let err = CoreError::internal("boom");
        assert!(err.correlation_id.is_some());
        assert!(err.is_kind(CoreErrorKind::Internal));
    }

    #[test]
    fn non_internal_errors_do_not_carry_a_correlation_id() {
        let err = CoreError::not_found("dataset missing");
        assert!(err.correlation_id.is_none());
    }
}
