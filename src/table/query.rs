//! Snapshot reads: literal-equality filters (always safe) plus trusted SQL
//! `where`/`order_by` fragments for server-internal callers (spec §4.2).
//!
//! `sqlparser` — already part of this crate's ambient stack — parses the
//! fragments; a small tree-walking evaluator applies them to in-memory
//! rows. This is the idiomatic-Rust stand-in for the original's embedded
//! DuckDB pass-through (spec §4.10 and §9): one process-wide parser, no
//! external SQL engine.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sqlparser::ast::{BinaryOperator, Expr, UnaryOperator, Value as SqlValue};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::{CoreError, CoreResult};
use crate::value::{Row, Value};

pub fn apply_literal_filters(rows: Vec<Row>, filters: &BTreeMap<String, Value>) -> Vec<Row> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            filters.iter().all(|(column, expected)| {
                row.get(column).unwrap_or(&Value::Null).null_equal(expected)
            })
        })
        .collect()
}

pub fn parse_where_expr(sql: &str) -> CoreResult<Expr> {
    let dialect = GenericDialect {};
    Parser::new(&dialect)
        .try_with_sql(sql)
        .map_err(|err| CoreError::internal(format!("invalid where fragment: {err}")))?
        .parse_expr()
        .map_err(|err| CoreError::internal(format!("invalid where fragment: {err}")))
}

pub fn apply_where_fragment(rows: Vec<Row>, where_sql: &str) -> CoreResult<Vec<Row>> {
    let trimmed = where_sql.trim();
    if trimmed.is_empty() {
        return Ok(rows);
    }
    let expr = parse_where_expr(trimmed)?;
    let mut kept = Vec::new();
    for row in rows {
        if eval_predicate(&expr, &row)? {
            kept.push(row);
        }
    }
    Ok(kept)
}

#[derive(Debug, Clone)]
struct OrderKey {
    column: String,
    descending: bool,
}

/// Hand-parses `col [ASC|DESC], col2 [ASC|DESC], ...`. `order_by` fragments
/// are trusted, single-table column lists (spec §4.2); a full expression
/// parser is unnecessary for this shape.
fn parse_order_by(order_by_sql: &str) -> Vec<OrderKey> {
    order_by_sql
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let mut words = part.split_whitespace();
            let column = words.next()?.trim_matches('"').to_string();
            let descending = words
                .next()
                .map(|dir| dir.eq_ignore_ascii_case("desc"))
                .unwrap_or(false);
            Some(OrderKey { column, descending })
        })
        .collect()
}

pub fn apply_order_by_fragment(mut rows: Vec<Row>, order_by_sql: &str) -> Vec<Row> {
    let trimmed = order_by_sql.trim();
    if trimmed.is_empty() {
        return rows;
    }
    let keys = parse_order_by(trimmed);
    rows.sort_by(|a, b| {
        for key in &keys {
            let av = a.get(&key.column).cloned().unwrap_or(Value::Null);
            let bv = b.get(&key.column).cloned().unwrap_or(Value::Null);
            let ordering = av.partial_cmp_for_order(&bv).unwrap_or(Ordering::Equal);
            let ordering = if key.descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    rows
}

pub fn paginate(rows: Vec<Row>, limit: usize, offset: usize) -> Vec<Row> {
    rows.into_iter().skip(offset).take(limit).collect()
}

fn eval_value(expr: &Expr, row: &Row) -> CoreResult<Value> {
    match expr {
        Expr::Identifier(ident) => Ok(row.get(&ident.value).cloned().unwrap_or(Value::Null)),
        Expr::CompoundIdentifier(parts) => {
            let name = parts.last().map(|ident| ident.value.clone()).unwrap_or_default();
            Ok(row.get(&name).cloned().unwrap_or(Value::Null))
        }
        Expr::Value(value) => Ok(sql_value_to_value(value)),
        Expr::Nested(inner) => eval_value(inner, row),
        other => Err(CoreError::internal(format!("unsupported expression in fragment: {other}"))),
    }
}

fn sql_value_to_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Number(n, _) => n
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Number(n.parse().unwrap_or(f64::NAN))),
        SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => Value::Text(s.clone()),
        SqlValue::Boolean(b) => Value::Bool(*b),
        SqlValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

pub fn eval_predicate(expr: &Expr, row: &Row) -> CoreResult<bool> {
    match expr {
        Expr::BinaryOp { left, op, right } => match op {
            BinaryOperator::And => Ok(eval_predicate(left, row)? && eval_predicate(right, row)?),
            BinaryOperator::Or => Ok(eval_predicate(left, row)? || eval_predicate(right, row)?),
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Gt
            | BinaryOperator::Lt
            | BinaryOperator::GtEq
            | BinaryOperator::LtEq => {
                let left_value = eval_value(left, row)?;
                let right_value = eval_value(right, row)?;
                let ordering = left_value.partial_cmp_for_order(&right_value);
                Ok(match op {
                    BinaryOperator::Eq => left_value.null_equal(&right_value),
                    BinaryOperator::NotEq => !left_value.null_equal(&right_value),
                    BinaryOperator::Gt => ordering == Some(Ordering::Greater),
                    BinaryOperator::Lt => ordering == Some(Ordering::Less),
                    BinaryOperator::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                    BinaryOperator::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    _ => unreachable!(),
                })
            }
            other => Err(CoreError::internal(format!("unsupported operator in fragment: {other}"))),
        },
        Expr::UnaryOp { op: UnaryOperator::Not, expr } => Ok(!eval_predicate(expr, row)?),
        Expr::IsNull(inner) => Ok(eval_value(inner, row)?.is_null()),
        Expr::IsNotNull(inner) => Ok(!eval_value(inner, row)?.is_null()),
        Expr::Nested(inner) => eval_predicate(inner, row),
        Expr::Value(SqlValue::Boolean(b)) => Ok(*b),
        other => Err(CoreError::internal(format!("unsupported predicate in fragment: {other}"))),
    }
}
