//! Column schema helpers: JSON-Schema-style column specs in, `ColumnDef`s
//! out, plus the append-time alignment rule from spec §4.2.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::value::{ColumnType, Row, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub col_type: ColumnType,
}

/// Converts a JSON-Schema-style column specification (either `{properties:
/// {...}}` or a bare `{col: {type: ...}}` map) into `ColumnDef`s. An empty
/// or absent spec yields a single placeholder string column, per spec §4.2.
pub fn columns_from_json_schema(schema: &JsonValue) -> Vec<ColumnDef> {
    let properties = match schema {
        JsonValue::Object(map) => match map.get("properties") {
            Some(JsonValue::Object(props)) => props,
            _ => map,
        },
        _ => return vec![placeholder_column()],
    };

    let mut columns: Vec<ColumnDef> = properties
        .iter()
        .map(|(name, meta)| {
            let declared_type = meta.get("type");
            ColumnDef {
                name: name.clone(),
                col_type: ColumnType::from_json_schema_type(declared_type),
            }
        })
        .collect();

    if columns.is_empty() {
        columns.push(placeholder_column());
    }
    columns
}

fn placeholder_column() -> ColumnDef {
    ColumnDef {
        name: "_auto".to_string(),
        col_type: ColumnType::String,
    }
}

pub fn columns_from_rows(rows: &[Row]) -> Vec<ColumnDef> {
    let mut seen = Vec::new();
    for row in rows {
        for (name, value) in row {
            if !seen.iter().any(|c: &ColumnDef| &c.name == name) {
                seen.push(ColumnDef {
                    name: name.clone(),
                    col_type: value.type_name(),
                });
            }
        }
    }
    if seen.is_empty() {
        seen.push(placeholder_column());
    }
    seen
}

/// Schema alignment on write (spec §4.2, the central invariant). For each
/// target column: cast the incoming value if present, or materialise nulls
/// if absent. Columns present in the incoming rows but absent from the
/// target are dropped — they can only enter via `overwrite` or a
/// merge-driven column union on an empty target.
pub fn align_rows_to_target(rows: Vec<Row>, target: &[ColumnDef]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            target
                .iter()
                .map(|col| {
                    let value = row
                        .get(&col.name)
                        .cloned()
                        .unwrap_or(Value::Null)
                        .cast_to(col.col_type);
                    (col.name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Union of two column lists by name, target columns first in their
/// existing order, then any source-only columns appended — used by `merge`
/// (spec §4.2: "source-only columns become new columns in the merged
/// output").
pub fn union_columns(target: &[ColumnDef], source: &[ColumnDef]) -> Vec<ColumnDef> {
    let mut union = target.to_vec();
    for col in source {
        if !union.iter().any(|c| c.name == col.name) {
            union.push(col.clone());
        }
    }
    union
}
