// ==========================================
// 炼钢产量预测系统 - SQLite 表存储实现
// ==========================================
// 职责: 用 rusqlite 实现 TableStore
// 约束: 值一律参数化；表名/列名只能来自校验过的标识符
// 依赖: SQLite >= 3.35（RETURNING 子句，bundled 版本满足）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::table_store::{
    validate_identifier, Filter, Query, Row, SortOrder, TableStore,
};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::{Number, Value};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteTableStore
// ==========================================
pub struct SqliteTableStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTableStore {
    /// 打开数据库文件并创建存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建存储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 执行返回单行的语句（INSERT ... RETURNING *）
    fn query_returning(
        &self,
        table: &str,
        sql: &str,
        values: Vec<SqlValue>,
    ) -> RepositoryResult<Row> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let row = stmt
            .query_row(params_from_iter(values), |row| read_row(row, &columns))
            .optional()?;
        row.ok_or_else(|| RepositoryError::EmptyReturn {
            table: table.to_string(),
        })
    }
}

impl TableStore for SqliteTableStore {
    fn find_one(&self, table: &str, filter: &Filter) -> RepositoryResult<Option<Row>> {
        let query = Query::new().filter(filter.clone()).limit(1);
        Ok(self.select(table, &query)?.into_iter().next())
    }

    fn insert(&self, table: &str, row: Row) -> RepositoryResult<Row> {
        let table_ident = validate_identifier(table)?;
        if row.is_empty() {
            let sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table_ident);
            return self.query_returning(table, &sql, Vec::new());
        }

        let (columns, values) = split_row(&row)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table_ident,
            columns.join(", "),
            placeholders(1, columns.len())
        );
        self.query_returning(table, &sql, values)
    }

    fn update(&self, table: &str, filter: &Filter, changes: Row) -> RepositoryResult<usize> {
        let table_ident = validate_identifier(table)?;
        if changes.is_empty() {
            return Ok(0);
        }

        let (columns, mut values) = split_row(&changes)?;
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| format!("{} = ?{}", col, idx + 1))
            .collect();
        let (where_clause, filter_values) = build_where(filter, values.len() + 1)?;
        values.extend(filter_values);

        let sql = format!(
            "UPDATE {} SET {}{}",
            table_ident,
            assignments.join(", "),
            where_clause
        );
        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        Ok(affected)
    }

    fn upsert(&self, table: &str, row: Row, conflict_keys: &[&str]) -> RepositoryResult<Row> {
        let table_ident = validate_identifier(table)?;
        if conflict_keys.is_empty() {
            return self.insert(table, row);
        }
        for key in conflict_keys {
            validate_identifier(key)?;
            if !row.contains_key(*key) {
                return Err(RepositoryError::InvalidRow {
                    table: table.to_string(),
                    message: format!("upsert 缺少冲突键列: {}", key),
                });
            }
        }

        let (columns, values) = split_row(&row)?;
        let mut updates: Vec<String> = columns
            .iter()
            .filter(|c| !conflict_keys.contains(&c.as_str()))
            .map(|c| format!("{0} = excluded.{0}", c))
            .collect();
        if updates.is_empty() {
            // 全部列都是冲突键：仍需 DO UPDATE 才能拿到 RETURNING 行
            updates.push(format!("{0} = excluded.{0}", conflict_keys[0]));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {} RETURNING *",
            table_ident,
            columns.join(", "),
            placeholders(1, columns.len()),
            conflict_keys.join(", "),
            updates.join(", ")
        );
        self.query_returning(table, &sql, values)
    }

    fn select(&self, table: &str, query: &Query) -> RepositoryResult<Vec<Row>> {
        let table_ident = validate_identifier(table)?;
        let (where_clause, values) = build_where(&query.filter, 1)?;

        let mut sql = format!("SELECT * FROM {}{}", table_ident, where_clause);
        if let Some((column, order)) = &query.order_by {
            let direction = match order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", validate_identifier(column)?, direction));
        }
        if let Some(limit) = query.limit {
            // SQLite 的 LIMIT 为 64 位有符号整数
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let columns = column_names(&stmt);
        let rows = stmt
            .query_map(params_from_iter(values), |row| read_row(row, &columns))?
            .collect::<rusqlite::Result<Vec<Row>>>()?;
        Ok(rows)
    }
}

// ==========================================
// SQL 构造与值转换
// ==========================================

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn split_row(row: &Row) -> RepositoryResult<(Vec<String>, Vec<SqlValue>)> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (column, value) in row {
        columns.push(validate_identifier(column)?.to_string());
        values.push(to_sql_value(value));
    }
    Ok((columns, values))
}

fn build_where(filter: &Filter, start: usize) -> RepositoryResult<(String, Vec<SqlValue>)> {
    if filter.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    for (column, value) in filter.conditions() {
        let column = validate_identifier(column)?;
        if value.is_null() {
            clauses.push(format!("{} IS NULL", column));
        } else {
            values.push(to_sql_value(value));
            clauses.push(format!("{} = ?{}", column, start + values.len() - 1));
        }
    }
    Ok((format!(" WHERE {}", clauses.join(" AND ")), values))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut map = Row::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        };
        map.insert(name.clone(), value);
    }
    Ok(map)
}
