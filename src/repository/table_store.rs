// ==========================================
// 炼钢产量预测系统 - 通用表存储接口
// ==========================================
// 职责: 以 表名 + 行(JSON 对象) 的形式暴露 find/insert/update/upsert/select
// 红线: Repository 不含业务逻辑
// 实现者: SqliteTableStore（rusqlite）、MemoryTableStore（进程内替身）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// 一行数据：列名 → 值
pub type Row = Map<String, Value>;

/// 表名常量
pub mod tables {
    pub const PRODUCT_GROUPS: &str = "product_groups";
    pub const STEEL_GRADES: &str = "steel_grades";
    pub const STEEL_GRADE_PRODUCTION: &str = "steel_grade_production";
    pub const PRODUCT_GROUP_MONTHLY: &str = "product_group_monthly";
    pub const PRODUCT_GROUP_GRADE_MONTHLY: &str = "product_group_grade_monthly";
    pub const DAILY_CHARGE_SCHEDULE: &str = "daily_charge_schedule";
}

// ==========================================
// Filter - 精确匹配过滤条件（AND 连接）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个 column = value 条件
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 判断行是否满足全部条件
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            row.get(column)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(expected.is_null())
        })
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

// ==========================================
// Query - 过滤 + 排序 + 限制
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, column: &str, order: SortOrder) -> Self {
        self.order_by = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ==========================================
// TableStore Trait
// ==========================================
// 约束:
// - 全部为同步调用，可能阻塞在 I/O 上
// - insert / upsert 必须返回落库后的整行（含代理键 id），
//   无返回行时报 EmptyReturn，禁止返回占位 id
pub trait TableStore: Send + Sync {
    /// 按精确匹配取第一行
    fn find_one(&self, table: &str, filter: &Filter) -> RepositoryResult<Option<Row>>;

    /// 插入一行并返回落库后的行
    fn insert(&self, table: &str, row: Row) -> RepositoryResult<Row>;

    /// 按过滤条件更新，返回受影响行数
    fn update(&self, table: &str, filter: &Filter, changes: Row) -> RepositoryResult<usize>;

    /// 按冲突键插入或覆盖，返回落库后的行
    fn upsert(&self, table: &str, row: Row, conflict_keys: &[&str]) -> RepositoryResult<Row>;

    /// 条件查询（可排序、限制行数）
    fn select(&self, table: &str, query: &Query) -> RepositoryResult<Vec<Row>>;
}

impl<T: TableStore + ?Sized> TableStore for Arc<T> {
    fn find_one(&self, table: &str, filter: &Filter) -> RepositoryResult<Option<Row>> {
        (**self).find_one(table, filter)
    }

    fn insert(&self, table: &str, row: Row) -> RepositoryResult<Row> {
        (**self).insert(table, row)
    }

    fn update(&self, table: &str, filter: &Filter, changes: Row) -> RepositoryResult<usize> {
        (**self).update(table, filter, changes)
    }

    fn upsert(&self, table: &str, row: Row, conflict_keys: &[&str]) -> RepositoryResult<Row> {
        (**self).upsert(table, row, conflict_keys)
    }

    fn select(&self, table: &str, query: &Query) -> RepositoryResult<Vec<Row>> {
        (**self).select(table, query)
    }
}

// ==========================================
// 行编解码辅助
// ==========================================

/// 结构体 → 行
pub fn encode_row<T: Serialize>(table: &str, value: &T) -> RepositoryResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RepositoryError::InvalidRow {
            table: table.to_string(),
            message: format!("期望对象, 实际 {}", other),
        }),
        Err(e) => Err(RepositoryError::InvalidRow {
            table: table.to_string(),
            message: e.to_string(),
        }),
    }
}

/// 行 → 结构体
pub fn decode_row<T: DeserializeOwned>(table: &str, row: Row) -> RepositoryResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| RepositoryError::InvalidRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}

/// 取行中的代理键 id
pub fn row_id(table: &str, row: &Row) -> RepositoryResult<i64> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| RepositoryError::InvalidRow {
            table: table.to_string(),
            message: "缺少整数 id 列".to_string(),
        })
}

/// 值相等判断（数值按 f64 比较，避免 1 与 1.0 不等）
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// 值排序（NULL 最小；数值按大小；字符串按字典序）
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// 校验表名/列名（只允许字母数字下划线，且不以数字开头）
pub fn validate_identifier(name: &str) -> RepositoryResult<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(RepositoryError::InvalidIdentifier(name.to_string()))
    }
}
