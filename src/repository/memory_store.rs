// ==========================================
// 炼钢产量预测系统 - 进程内表存储
// ==========================================
// 职责: TableStore 的内存实现，用作测试替身与无库运行
// 说明:
// - 不强制 name 唯一，读后写之间的并发竞争会产生重名行（与外部存储一致的已知风险）
// - 支持注入“第 N 次写入后失败”，用于验证部分成功语义
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::table_store::{
    compare_values, values_equal, Filter, Query, Row, SortOrder, TableStore,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryTable {
    fn push(&mut self, mut row: Row) -> Row {
        let id = match row.get("id").and_then(Value::as_i64) {
            Some(id) => {
                self.next_id = self.next_id.max(id);
                id
            }
            None => {
                self.next_id += 1;
                self.next_id
            }
        };
        row.insert("id".to_string(), Value::from(id));
        self.rows.push(row.clone());
        row
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    writes: usize,
    fail_after: Option<usize>,
}

impl MemoryState {
    /// 写入计数；超过注入阈值时返回连接错误
    fn begin_write(&mut self) -> RepositoryResult<()> {
        if let Some(limit) = self.fail_after {
            if self.writes >= limit {
                return Err(RepositoryError::DatabaseConnectionError(format!(
                    "存储不可达（已写入 {} 次）",
                    self.writes
                )));
            }
        }
        self.writes += 1;
        Ok(())
    }
}

// ==========================================
// MemoryTableStore
// ==========================================
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<MemoryState>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功写入 `writes` 次之后，所有写操作返回 DatabaseConnectionError
    pub fn fail_writes_after(&self, writes: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_after = Some(writes);
        }
    }

    /// 解除写入故障注入
    pub fn clear_failure(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_after = None;
        }
    }

    /// 表内全部行的快照（按插入顺序）
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .map(|state| {
                state
                    .tables
                    .get(table)
                    .map(|t| t.rows.clone())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn get_state(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl TableStore for MemoryTableStore {
    fn find_one(&self, table: &str, filter: &Filter) -> RepositoryResult<Option<Row>> {
        let state = self.get_state()?;
        Ok(state
            .tables
            .get(table)
            .and_then(|t| t.rows.iter().find(|r| filter.matches(r)).cloned()))
    }

    fn insert(&self, table: &str, row: Row) -> RepositoryResult<Row> {
        let mut state = self.get_state()?;
        state.begin_write()?;
        Ok(state.tables.entry(table.to_string()).or_default().push(row))
    }

    fn update(&self, table: &str, filter: &Filter, changes: Row) -> RepositoryResult<usize> {
        let mut state = self.get_state()?;
        state.begin_write()?;
        let Some(t) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let mut affected = 0;
        for row in t.rows.iter_mut().filter(|r| filter.matches(r)) {
            for (column, value) in &changes {
                row.insert(column.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn upsert(&self, table: &str, row: Row, conflict_keys: &[&str]) -> RepositoryResult<Row> {
        let mut state = self.get_state()?;
        state.begin_write()?;
        let t = state.tables.entry(table.to_string()).or_default();

        if !conflict_keys.is_empty() {
            let existing = t.rows.iter_mut().find(|existing| {
                conflict_keys.iter().all(|key| {
                    match (existing.get(*key), row.get(*key)) {
                        (Some(a), Some(b)) => values_equal(a, b),
                        _ => false,
                    }
                })
            });
            if let Some(existing) = existing {
                for (column, value) in row {
                    if column != "id" {
                        existing.insert(column, value);
                    }
                }
                return Ok(existing.clone());
            }
        }

        Ok(t.push(row))
    }

    fn select(&self, table: &str, query: &Query) -> RepositoryResult<Vec<Row>> {
        let state = self.get_state()?;
        let mut rows: Vec<Row> = state
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| query.filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((column, order)) = &query.order_by {
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = MemoryTableStore::new();
        let a = store.insert("t", row(json!({"name": "a"}))).unwrap();
        let b = store.insert("t", row(json!({"name": "b"}))).unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
    }

    #[test]
    fn test_upsert_overwrites_matching_key() {
        let store = MemoryTableStore::new();
        let keys = ["year_month", "steel_grade_id"];
        store
            .upsert("f", row(json!({"year_month": "2024-06", "steel_grade_id": 1, "tons": 5.0})), &keys)
            .unwrap();
        store
            .upsert("f", row(json!({"year_month": "2024-06", "steel_grade_id": 1, "tons": 9.0})), &keys)
            .unwrap();
        store
            .upsert("f", row(json!({"year_month": "2024-07", "steel_grade_id": 1, "tons": 1.0})), &keys)
            .unwrap();

        let rows = store.rows("f");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["tons"], json!(9.0));
    }

    #[test]
    fn test_select_desc_with_limit() {
        let store = MemoryTableStore::new();
        for ym in ["2024-04", "2024-06", "2024-05", "2024-07"] {
            store.insert("f", row(json!({"year_month": ym}))).unwrap();
        }
        let rows = store
            .select(
                "f",
                &Query::new().order_by("year_month", SortOrder::Desc).limit(3),
            )
            .unwrap();
        let months: Vec<&str> = rows.iter().map(|r| r["year_month"].as_str().unwrap()).collect();
        assert_eq!(months, vec!["2024-07", "2024-06", "2024-05"]);
    }

    #[test]
    fn test_fail_writes_after_limit() {
        let store = MemoryTableStore::new();
        store.fail_writes_after(1);
        assert!(store.insert("t", row(json!({"name": "a"}))).is_ok());
        let err = store.insert("t", row(json!({"name": "b"}))).unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseConnectionError(_)));
        // 读操作不受影响
        assert!(store.find_one("t", &Filter::new().eq("name", "a")).unwrap().is_some());

        store.clear_failure();
        assert!(store.insert("t", row(json!({"name": "b"}))).is_ok());
    }
}
