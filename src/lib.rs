//! Collaborative change-control core over a versioned columnar table log.
//!
//! A dataset lives under `projects/<project_id>/datasets/<dataset_id>/` as a
//! `main` table plus per-change-request `staging` tables, all built on the
//! same append-only commit log (`table::log`). Edits flow through a live
//! edit session, get staged into a change request, pass validation, and are
//! merged back into `main` by the merge executor.

pub mod audit;
pub mod change_request;
pub mod config;
pub mod error;
pub mod live_edit;
pub mod merge;
pub mod path;
pub mod query_surface;
pub mod staging_upload;
pub mod table;
pub mod validation_state;
pub mod validator;
pub mod value;

pub use audit::AuditWriter;
pub use change_request::{ChangeRequest, ChangeRequestEvent, ChangeRequestService, CrEventType, CrStatus};
pub use config::Config;
pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use live_edit::{LiveEditSession, LiveEditSessionManager, RowIdStrategy};
pub use merge::MergeExecutor;
pub use path::DatasetLayout;
pub use query_surface::QuerySurface;
pub use staging_upload::StagingUploadStore;
pub use table::TableAdapter;
pub use validation_state::{ValidationCounts, ValidationState};
pub use validator::{RuleEngineValidator, Validator};
pub use value::{ColumnType, Row, Value};

/// Installs a `tracing` subscriber reading `RUST_LOG` (default `info`),
/// mirroring how the teacher's binaries wire up logging at startup.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
