//! Staging Upload Store (spec §4.8): raw file uploads held under
//! `pending_uploads/<upload_id>/` until finalized into a dataset's `main`
//! table or swept away after `pending_upload_ttl`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::path::{pending_upload_dir, pending_uploads_root};
use crate::table::adapter::{AppendResult, TableAdapter};
use crate::value::{row_from_json_object, Row, Value};

const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub upload_id: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub file_path: String,
}

pub struct StagingUploadStore {
    config: Config,
}

impl StagingUploadStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Accepts raw upload bytes, writes them under a fresh `upload_id`
    /// directory alongside a metadata sidecar.
    pub async fn put(&self, filename: &str, bytes: &[u8]) -> CoreResult<UploadMetadata> {
        let upload_id = format!("upl_{}", uuid::Uuid::now_v7().simple());
        let dir = pending_upload_dir(&self.config, &upload_id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let file_path = dir.join(filename);
        tokio::fs::write(&file_path, bytes).await?;

        let metadata = UploadMetadata {
            upload_id: upload_id.clone(),
            filename: filename.to_string(),
            created_at: Utc::now(),
            file_path: filename.to_string(),
        };
        let payload = serde_json::to_vec_pretty(&metadata)?;
        tokio::fs::write(dir.join(METADATA_FILE), &payload).await?;

        info!(upload_id, filename, "upload_staged");
        Ok(metadata)
    }

    pub async fn get(&self, upload_id: &str) -> CoreResult<Option<UploadMetadata>> {
        let dir = pending_upload_dir(&self.config, upload_id)?;
        match tokio::fs::read(dir.join(METADATA_FILE)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, upload_id: &str) -> CoreResult<()> {
        let dir = pending_upload_dir(&self.config, upload_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Parses the staged file (CSV or JSON; spec §4.8) and appends it into
    /// `target` through the Table Adapter's dedup path, then deletes the
    /// staging directory. Excel support has no grounded crate in this
    /// corpus and is left for a later addition (see design notes).
    pub async fn finalize(&self, upload_id: &str, table_adapter: &TableAdapter, target: &std::path::Path) -> CoreResult<AppendResult> {
        let metadata = self
            .get(upload_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("upload not found: {upload_id}")))?;
        let dir = pending_upload_dir(&self.config, upload_id)?;
        let file_path = dir.join(&metadata.file_path);
        let bytes = tokio::fs::read(&file_path).await?;

        let rows = parse_upload(&metadata.filename, &bytes)?;
        let result = table_adapter.append_dedup(target, rows).await?;

        self.delete(upload_id).await?;
        info!(upload_id, inserted = result.inserted, duplicates = result.duplicates, "upload_finalized");
        Ok(result)
    }

    /// Deletes every pending upload whose metadata is older than
    /// `pending_upload_ttl` (spec §4.8 "a background sweeper").
    pub async fn sweep_expired(&self) -> CoreResult<usize> {
        let root = pending_uploads_root(&self.config);
        let mut removed = 0usize;
        let mut entries = match tokio::fs::read_dir(&root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let now = Utc::now();
        while let Some(entry) = entries.next_entry().await? {
            let Some(upload_id) = entry.file_name().to_str().map(str::to_string) else { continue };
            let Some(metadata) = self.get(&upload_id).await? else { continue };
            let age = now.signed_duration_since(metadata.created_at);
            if age.to_std().map(|d| d > self.config.pending_upload_ttl).unwrap_or(false) {
                self.delete(&upload_id).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "pending_uploads_swept");
        }
        Ok(removed)
    }
}

fn parse_upload(filename: &str, bytes: &[u8]) -> CoreResult<Vec<Row>> {
    let extension = PathBuf::from(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => parse_csv(bytes),
        "json" => parse_json(bytes),
        other => Err(CoreError::precondition_failed(format!("unsupported upload format: .{other}"))),
    }
}

fn parse_csv(bytes: &[u8]) -> CoreResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers: Vec<String> = reader.headers().map_err(csv_error)?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let mut row = Row::new();
        for (column, field) in headers.iter().zip(record.iter()) {
            row.insert(column.clone(), infer_csv_value(field));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn infer_csv_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::Number(f);
    }
    if field.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(field.to_string())
}

fn csv_error(err: csv::Error) -> CoreError {
    CoreError::precondition_failed(format!("invalid CSV upload: {err}"))
}

/// Accepts either a bare JSON array of objects or `{"rows": [...]}`.
fn parse_json(bytes: &[u8]) -> CoreResult<Vec<Row>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("rows") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(CoreError::precondition_failed("JSON upload must be an array or {\"rows\": [...]}")),
        },
        _ => return Err(CoreError::precondition_failed("JSON upload must be an array or {\"rows\": [...]}")),
    };
    array
        .into_iter()
        .map(|item| match item {
            serde_json::Value::Object(object) => Ok(row_from_json_object(&object)),
            _ => Err(CoreError::precondition_failed("JSON upload rows must be objects")),
        })
        .collect()
}
