//! Live Edit Session Manager (spec §4.5): short-lived, cell-level staged
//! edits over a base table, read back through an overlay (base ∪
//! latest-edit-per-cell) rather than written through immediately.

pub mod manager;
pub mod session;

pub use manager::{ApplyChangesResult, EditOutcome, GridPage, GridRow, LiveEditSessionManager, PreviewSummary, StartSessionResult};
pub use session::{CellEdit, LiveEditSession, SessionMode, SessionStatistics, SessionStatus};

use serde::{Deserialize, Serialize};

/// Resolves Open Question #1 (spec §9): how a row is identified for
/// editing and lookup is an explicit, required choice made once per
/// dataset, not inferred per call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RowIdStrategy {
    Column(String),
    Positional,
}

impl RowIdStrategy {
    pub fn row_id(&self, row: &crate::value::Row, position: usize) -> String {
        match self {
            RowIdStrategy::Column(name) => row
                .get(name)
                .map(|v| v.to_canonical_string())
                .unwrap_or_else(|| position.to_string()),
            RowIdStrategy::Positional => position.to_string(),
        }
    }
}
