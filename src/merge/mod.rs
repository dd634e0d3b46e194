//! Merge Executor (spec §4.7): the eight-step approval-to-commit pipeline,
//! grounded on `merge_executor.py`.

pub mod executor;

pub use executor::{MergeConflictReport, MergeDiff, MergeExecutor, MergeOutcome, MergeResult};
