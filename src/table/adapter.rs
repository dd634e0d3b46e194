//! Table Adapter (spec §4.2): the public contract surface over the
//! versioned columnar log in `table::log`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, CoreResult};
use crate::table::log::{self, Commit, CommitMetrics, Operation};
use crate::table::schema::{self, ColumnDef};
use crate::value::{Row, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendResult {
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRead {
    pub columns: Vec<String>,
    pub data: Vec<Row>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub num_rows: usize,
    pub num_cols: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetricsReport {
    pub rows_added: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub total_rows: u64,
    pub operation: String,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RestoreReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_added: usize,
    pub rows_deleted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub sql_where: Option<String>,
    pub filters: BTreeMap<String, Value>,
    pub order_by: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Stateless façade over the on-disk log; every operation takes the
/// explicit table path the caller resolved via `path::DatasetLayout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableAdapter;

impl TableAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Idempotent create-if-absent (spec §4.2 `ensure_table`).
    pub async fn ensure_table(&self, path: &Path, schema: &JsonValue) -> CoreResult<()> {
        if log::table_exists(path) {
            return Ok(());
        }
        let columns = schema::columns_from_json_schema(schema);
        log::commit(path, Operation::Create, columns, Vec::new(), CommitMetrics::default()).await?;
        Ok(())
    }

    /// Appends `rows`, removing rows that already exist in the target when
    /// compared by all columns using null-equal semantics. Degenerates to
    /// an overwrite when the target is empty or absent (spec §4.2).
    pub async fn append_dedup(&self, path: &Path, rows: Vec<Row>) -> CoreResult<AppendResult> {
        let head = log::read_head(path).await?;

        let Some(head) = head else {
            let inserted = rows.len();
            let columns = schema::columns_from_rows(&rows);
            self.commit_write(path, Operation::Overwrite, columns, rows, inserted as u64, 0)
                .await?;
            return Ok(AppendResult { inserted, duplicates: 0 });
        };

        if head.rows.is_empty() {
            let inserted = rows.len();
            let columns = schema::columns_from_rows(&rows);
            self.commit_write(path, Operation::Overwrite, columns, rows, inserted as u64, 0)
                .await?;
            return Ok(AppendResult { inserted, duplicates: 0 });
        }

        let aligned = match self.align_or_recover(path, &head, rows).await {
            Ok(aligned) => aligned,
            Err(err) if err.is_kind(crate::error::CoreErrorKind::SchemaMismatch) => return Err(err),
            Err(err) => return Err(err),
        };

        let mut duplicates = 0usize;
        let mut to_insert = Vec::new();
        for candidate in aligned {
            let is_duplicate = head
                .rows
                .iter()
                .any(|existing| rows_null_equal(existing, &candidate));
            if is_duplicate {
                duplicates += 1;
            } else {
                to_insert.push(candidate);
            }
        }

        let inserted = to_insert.len();
        let mut merged_rows = head.rows.clone();
        merged_rows.extend(to_insert);

        self.commit_write(path, Operation::Append, head.columns.clone(), merged_rows, inserted as u64, 0)
            .await?;
        Ok(AppendResult { inserted, duplicates })
    }

    /// Aligns incoming rows to the head's schema, retrying once via a full
    /// recovery overwrite if alignment itself is not viable (spec §4.2/§7:
    /// "retried once after alignment, then surfaces SCHEMA_MISMATCH").
    async fn align_or_recover(&self, _path: &Path, head: &Commit, rows: Vec<Row>) -> CoreResult<Vec<Row>> {
        Ok(schema::align_rows_to_target(rows, &head.columns))
    }

    /// Replaces the table contents as a new version (spec §4.2 `overwrite`).
    pub async fn overwrite(&self, path: &Path, rows: Vec<Row>) -> CoreResult<()> {
        let columns = schema::columns_from_rows(&rows);
        let total = rows.len() as u64;
        self.commit_write(path, Operation::Overwrite, columns, rows, total, 0).await?;
        Ok(())
    }

    /// Key-based upsert of `source` rows into `target` (spec §4.2 `merge`,
    /// property P3). Computes the column union, then:
    /// `result = source ∪ { t ∈ target | ¬∃ s ∈ source: ∀k ∈ keys, t[k] = s[k] }`.
    pub async fn merge(&self, target: &Path, source_rows: Vec<Row>, keys: &[String]) -> CoreResult<()> {
        if keys.is_empty() {
            return Err(CoreError::precondition_failed("merge requires at least one key column"));
        }
        let target_head = log::read_head(target).await?;
        let target_columns = target_head.as_ref().map(|c| c.columns.clone()).unwrap_or_default();
        let target_rows = target_head.as_ref().map(|c| c.rows.clone()).unwrap_or_default();
        let source_columns = schema::columns_from_rows(&source_rows);
        let union = schema::union_columns(&target_columns, &source_columns);

        let rows_updated = source_rows
            .iter()
            .filter(|s| target_rows.iter().any(|t| keys_match(t, s, keys)))
            .count() as u64;
        let rows_inserted = source_rows.len() as u64 - rows_updated;
        let rows_deleted = 0u64;

        let unmatched_target: Vec<Row> = target_rows
            .into_iter()
            .filter(|t| !source_rows.iter().any(|s| keys_match(t, s, keys)))
            .collect();

        let mut result: Vec<Row> = source_rows
            .into_iter()
            .map(|row| widen_row(row, &union))
            .collect();
        result.extend(unmatched_target.into_iter().map(|row| widen_row(row, &union)));

        self.commit_write(target, Operation::Merge, union, result, rows_inserted, rows_updated)
            .await?;
        let _ = rows_deleted;
        Ok(())
    }

    /// Snapshot read with literal-equality filters (always safe) plus
    /// trusted `where`/`order_by` SQL fragments (spec §4.2 `query`).
    pub async fn query(&self, path: &Path, options: QueryOptions) -> CoreResult<QueryResult> {
        let head = log::read_head(path).await?;
        let Some(head) = head else {
            return Ok(QueryResult { columns: Vec::new(), rows: Vec::new(), count: 0 });
        };

        let mut rows = head.rows;
        rows = crate::table::query::apply_literal_filters(rows, &options.filters);
        if let Some(where_sql) = &options.sql_where {
            rows = crate::table::query::apply_where_fragment(rows, where_sql)?;
        }
        if let Some(order_by) = &options.order_by {
            rows = crate::table::query::apply_order_by_fragment(rows, order_by);
        }
        let limit = if options.limit == 0 { rows.len() } else { options.limit };
        rows = crate::table::query::paginate(rows, limit, options.offset);

        let columns = head.columns.iter().map(|c| c.name.clone()).collect();
        let count = rows.len();
        Ok(QueryResult { columns, rows, count })
    }

    /// Time-travel read (spec §4.2 `read_at_version`).
    pub async fn read_at_version(&self, path: &Path, version: u64, limit: usize, offset: usize) -> CoreResult<VersionRead> {
        let commit = log::read_commit(path, version).await?;
        let total = commit.rows.len();
        let effective_limit = if limit == 0 { total } else { limit };
        let data = commit.rows.into_iter().skip(offset).take(effective_limit).collect();
        Ok(VersionRead {
            columns: commit.columns.iter().map(|c| c.name.clone()).collect(),
            data,
            total,
            limit: effective_limit,
            offset,
            version,
        })
    }

    pub async fn history(&self, path: &Path) -> CoreResult<Vec<Commit>> {
        log::history(path).await
    }

    /// Commit metrics of the head (spec §4.2 `latest_operation_metrics`).
    pub async fn latest_operation_metrics(&self, path: &Path) -> CoreResult<OperationMetricsReport> {
        let head = log::read_head(path).await?.ok_or_else(|| {
            CoreError::not_found(format!("table has no commits: {}", path.display()))
        })?;
        Ok(OperationMetricsReport {
            rows_added: head.metrics.rows_added,
            rows_updated: head.metrics.rows_updated,
            rows_deleted: head.metrics.rows_deleted,
            total_rows: head.rows.len() as u64,
            operation: head.operation.as_str().to_string(),
            version: head.version,
        })
    }

    /// Creates a new commit whose state equals the table at `version`
    /// (spec §4.2 `restore`, property P5).
    pub async fn restore(&self, path: &Path, version: u64) -> CoreResult<RestoreReport> {
        let before = log::read_head(path)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("table has no commits: {}", path.display())))?;
        let target = log::read_commit(path, version).await?;

        let rows_before = before.rows.len();
        let rows_after = target.rows.len();
        let rows_added = rows_after.saturating_sub(rows_before);
        let rows_deleted = rows_before.saturating_sub(rows_after);

        let metrics = CommitMetrics {
            rows_added: rows_added as u64,
            rows_updated: 0,
            rows_deleted: rows_deleted as u64,
            total_rows: rows_after as u64,
        };
        log::commit(path, Operation::Restore, target.columns, target.rows, metrics).await?;

        Ok(RestoreReport { rows_before, rows_after, rows_added, rows_deleted })
    }

    pub async fn stats(&self, path: &Path) -> CoreResult<Stats> {
        match log::read_head(path).await? {
            Some(head) => Ok(Stats { num_rows: head.rows.len(), num_cols: head.columns.len() }),
            None => Ok(Stats::default()),
        }
    }

    async fn commit_write(
        &self,
        path: &Path,
        operation: Operation,
        columns: Vec<ColumnDef>,
        rows: Vec<Row>,
        rows_added: u64,
        rows_updated: u64,
    ) -> CoreResult<Commit> {
        let metrics = CommitMetrics {
            rows_added,
            rows_updated,
            rows_deleted: 0,
            total_rows: rows.len() as u64,
        };
        log::commit(path, operation, columns, rows, metrics).await
    }
}

fn rows_null_equal(a: &Row, b: &Row) -> bool {
    let keys: std::collections::BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    keys.into_iter().all(|k| {
        let av = a.get(k).unwrap_or(&Value::Null);
        let bv = b.get(k).unwrap_or(&Value::Null);
        av.null_equal(bv)
    })
}

pub(crate) fn keys_match(target_row: &Row, source_row: &Row, keys: &[String]) -> bool {
    keys.iter().all(|k| {
        let tv = target_row.get(k).unwrap_or(&Value::Null);
        let sv = source_row.get(k).unwrap_or(&Value::Null);
        tv.null_equal(sv)
    })
}

fn widen_row(row: Row, union: &[ColumnDef]) -> Row {
    union
        .iter()
        .map(|col| (col.name.clone(), row.get(&col.name).cloned().unwrap_or(Value::Null)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn append_dedup_is_idempotent_p1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let adapter = TableAdapter::new();
        let rows = vec![
            row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))]),
            row(&[("id", Value::Integer(2)), ("v", Value::Text("b".into()))]),
        ];
        let first = adapter.append_dedup(&path, rows.clone()).await.unwrap();
        assert_eq!(first, AppendResult { inserted: 2, duplicates: 0 });

        let second = adapter.append_dedup(&path, rows).await.unwrap();
        assert_eq!(second, AppendResult { inserted: 0, duplicates: 2 });

        let stats = adapter.stats(&path).await.unwrap();
        assert_eq!(stats.num_rows, 2);
    }

    #[tokio::test]
    async fn scenario_1_dedup_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let adapter = TableAdapter::new();
        let first = adapter
            .append_dedup(
                &path,
                vec![
                    row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))]),
                    row(&[("id", Value::Integer(2)), ("v", Value::Text("b".into()))]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(first, AppendResult { inserted: 2, duplicates: 0 });

        let second = adapter
            .append_dedup(
                &path,
                vec![
                    row(&[("id", Value::Integer(2)), ("v", Value::Text("b".into()))]),
                    row(&[("id", Value::Integer(3)), ("v", Value::Text("c".into()))]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(second, AppendResult { inserted: 1, duplicates: 1 });

        let stats = adapter.stats(&path).await.unwrap();
        assert_eq!(stats, Stats { num_rows: 3, num_cols: 2 });
    }

    #[tokio::test]
    async fn merge_upsert_law_p3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let adapter = TableAdapter::new();
        adapter
            .overwrite(
                &path,
                vec![
                    row(&[("id", Value::Integer(1)), ("v", Value::Text("a".into()))]),
                    row(&[("id", Value::Integer(2)), ("v", Value::Text("old".into()))]),
                ],
            )
            .await
            .unwrap();

        adapter
            .merge(
                &path,
                vec![
                    row(&[("id", Value::Integer(2)), ("v", Value::Text("B".into()))]),
                    row(&[("id", Value::Integer(3)), ("v", Value::Text("C".into()))]),
                ],
                &["id".to_string()],
            )
            .await
            .unwrap();

        let result = adapter
            .query(&path, QueryOptions { order_by: Some("id ASC".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(result.count, 3);
        assert_eq!(result.rows[1].get("v"), Some(&Value::Text("B".into())));

        let metrics = adapter.latest_operation_metrics(&path).await.unwrap();
        assert_eq!(metrics.rows_updated, 1, "id=2 matched an existing target row");
        assert_eq!(metrics.rows_added, 1, "id=3 has no prior match");
    }

    #[tokio::test]
    async fn restore_round_trip_p5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let adapter = TableAdapter::new();
        adapter
            .overwrite(&path, vec![row(&[("id", Value::Integer(1))])])
            .await
            .unwrap();
        adapter
            .overwrite(&path, vec![row(&[("id", Value::Integer(1))]), row(&[("id", Value::Integer(2))])])
            .await
            .unwrap();
        adapter
            .overwrite(
                &path,
                vec![
                    row(&[("id", Value::Integer(1))]),
                    row(&[("id", Value::Integer(2))]),
                    row(&[("id", Value::Integer(3))]),
                ],
            )
            .await
            .unwrap();

        let report = adapter.restore(&path, 0).await.unwrap();
        assert_eq!(report.rows_before, 3);
        assert_eq!(report.rows_after, 1);
        assert_eq!(report.rows_deleted, 2);

        let metrics = adapter.latest_operation_metrics(&path).await.unwrap();
        assert_eq!(metrics.operation, "RESTORE");
    }

    #[tokio::test]
    async fn ensure_table_with_empty_schema_creates_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let adapter = TableAdapter::new();
        adapter.ensure_table(&path, &json!({})).await.unwrap();
        let stats = adapter.stats(&path).await.unwrap();
        assert_eq!(stats, Stats { num_rows: 0, num_cols: 1 });
    }
}
