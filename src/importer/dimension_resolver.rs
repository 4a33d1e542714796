// ==========================================
// 炼钢产量预测系统 - 维度归并
// ==========================================
// 职责: 按名称查找或创建 产品组 / 钢种，返回代理键
// 规则:
// - 查找按名称精确匹配，找不到则插入
// - 钢种已存在且传入非空产品组 → 无条件覆盖产品组（后写覆盖）
// - 传入空产品组 → 不修改已有关联
// 并发: 读后写非原子；存储有唯一约束时，插入撞上唯一约束即改为重新按名称查找
//       （同批次并发导入同名新维度不报错）；存储无唯一约束时仍可能产生重复行
// ==========================================

use crate::repository::table_store::{row_id, tables, Filter, Row, TableStore};
use crate::repository::{RepositoryError, RepositoryResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DimensionResolver<S: TableStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TableStore + ?Sized> Clone for DimensionResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TableStore + ?Sized> DimensionResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 产品组名称 → id（不存在则创建）
    pub fn resolve_product_group(&self, name: &str) -> RepositoryResult<i64> {
        let filter = Filter::new().eq("name", name);
        if let Some(existing) = self.store.find_one(tables::PRODUCT_GROUPS, &filter)? {
            return row_id(tables::PRODUCT_GROUPS, &existing);
        }

        let mut row = Row::new();
        row.insert("name".to_string(), Value::from(name));
        match self.store.insert(tables::PRODUCT_GROUPS, row) {
            Ok(inserted) => {
                let id = row_id(tables::PRODUCT_GROUPS, &inserted)?;
                debug!(product_group = name, id, "新建产品组");
                Ok(id)
            }
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                self.find_after_conflict(tables::PRODUCT_GROUPS, name, msg)
            }
            Err(e) => Err(e),
        }
    }

    /// 钢种名称 → id（不存在则创建）
    ///
    /// # 参数
    /// - product_group_id: Some 时回填/覆盖产品组关联；None 时不修改
    pub fn resolve_steel_grade(
        &self,
        name: &str,
        product_group_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let filter = Filter::new().eq("name", name);
        if let Some(existing) = self.store.find_one(tables::STEEL_GRADES, &filter)? {
            let id = row_id(tables::STEEL_GRADES, &existing)?;
            if let Some(group_id) = product_group_id {
                let mut changes = Row::new();
                changes.insert("product_group_id".to_string(), Value::from(group_id));
                self.store
                    .update(tables::STEEL_GRADES, &Filter::new().eq("id", id), changes)?;
            }
            return Ok(id);
        }

        let mut row = Row::new();
        row.insert("name".to_string(), Value::from(name));
        row.insert(
            "product_group_id".to_string(),
            product_group_id.map(Value::from).unwrap_or(Value::Null),
        );
        match self.store.insert(tables::STEEL_GRADES, row) {
            Ok(inserted) => {
                let id = row_id(tables::STEEL_GRADES, &inserted)?;
                debug!(steel_grade = name, id, ?product_group_id, "新建钢种");
                Ok(id)
            }
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                let id = self.find_after_conflict(tables::STEEL_GRADES, name, msg)?;
                if let Some(group_id) = product_group_id {
                    let mut changes = Row::new();
                    changes.insert("product_group_id".to_string(), Value::from(group_id));
                    self.store
                        .update(tables::STEEL_GRADES, &Filter::new().eq("id", id), changes)?;
                }
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    /// 插入撞上唯一约束（并发写入方已建同名行）后按名称重新查找
    fn find_after_conflict(&self, table: &str, name: &str, msg: String) -> RepositoryResult<i64> {
        warn!(table, name, "维度并发创建冲突，改用已存在的行");
        match self.store.find_one(table, &Filter::new().eq("name", name))? {
            Some(existing) => row_id(table, &existing),
            None => Err(RepositoryError::UniqueConstraintViolation(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SteelGrade;
    use crate::repository::table_store::decode_row;
    use crate::repository::{MemoryTableStore, RepositoryError};

    fn steel_grade(store: &MemoryTableStore, name: &str) -> SteelGrade {
        let row = store
            .find_one(tables::STEEL_GRADES, &Filter::new().eq("name", name))
            .unwrap()
            .unwrap();
        decode_row(tables::STEEL_GRADES, row).unwrap()
    }

    #[test]
    fn test_resolve_product_group_reuses_existing() {
        let store = Arc::new(MemoryTableStore::new());
        let resolver = DimensionResolver::new(store.clone());

        let a = resolver.resolve_product_group("Structural").unwrap();
        let b = resolver.resolve_product_group("Structural").unwrap();
        let c = resolver.resolve_product_group("Boron").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.rows(tables::PRODUCT_GROUPS).len(), 2);
    }

    #[test]
    fn test_steel_grade_group_backfill_and_null_is_noop() {
        let store = Arc::new(MemoryTableStore::new());
        let resolver = DimensionResolver::new(store.clone());

        let grade_id = resolver.resolve_steel_grade("X", None).unwrap();
        assert_eq!(steel_grade(&store, "X").product_group_id, None);

        let group_id = resolver.resolve_product_group("G").unwrap();
        assert_eq!(resolver.resolve_steel_grade("X", Some(group_id)).unwrap(), grade_id);
        assert_eq!(steel_grade(&store, "X").product_group_id, Some(group_id));

        // 传入空产品组不清除已有关联
        assert_eq!(resolver.resolve_steel_grade("X", None).unwrap(), grade_id);
        assert_eq!(steel_grade(&store, "X").product_group_id, Some(group_id));
    }

    #[test]
    fn test_steel_grade_group_last_write_wins() {
        let store = Arc::new(MemoryTableStore::new());
        let resolver = DimensionResolver::new(store.clone());

        let g1 = resolver.resolve_product_group("G1").unwrap();
        let g2 = resolver.resolve_product_group("G2").unwrap();
        resolver.resolve_steel_grade("X", Some(g1)).unwrap();
        resolver.resolve_steel_grade("X", Some(g2)).unwrap();

        assert_eq!(steel_grade(&store, "X").product_group_id, Some(g2));
        assert_eq!(store.rows(tables::STEEL_GRADES).len(), 1);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let store = Arc::new(MemoryTableStore::new());
        store.fail_writes_after(0);
        let resolver = DimensionResolver::new(store);

        let err = resolver.resolve_product_group("G").unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseConnectionError(_)));
    }

    /// 模拟并发写入方：首次插入前由“另一方”抢先写入同名行，并报唯一约束冲突
    struct ConflictingStore {
        inner: MemoryTableStore,
        raced: std::sync::atomic::AtomicBool,
    }

    impl ConflictingStore {
        fn new() -> Self {
            Self {
                inner: MemoryTableStore::new(),
                raced: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    impl TableStore for ConflictingStore {
        fn find_one(&self, table: &str, filter: &Filter) -> RepositoryResult<Option<Row>> {
            self.inner.find_one(table, filter)
        }

        fn insert(&self, table: &str, row: Row) -> RepositoryResult<Row> {
            if !self.raced.swap(true, std::sync::atomic::Ordering::SeqCst) {
                let mut winner = row.clone();
                if table == tables::STEEL_GRADES {
                    winner.insert("product_group_id".to_string(), Value::Null);
                }
                self.inner.insert(table, winner)?;
                return Err(RepositoryError::UniqueConstraintViolation(format!(
                    "UNIQUE constraint failed: {}.name",
                    table
                )));
            }
            self.inner.insert(table, row)
        }

        fn update(&self, table: &str, filter: &Filter, changes: Row) -> RepositoryResult<usize> {
            self.inner.update(table, filter, changes)
        }

        fn upsert(&self, table: &str, row: Row, conflict_keys: &[&str]) -> RepositoryResult<Row> {
            self.inner.upsert(table, row, conflict_keys)
        }

        fn select(
            &self,
            table: &str,
            query: &crate::repository::Query,
        ) -> RepositoryResult<Vec<Row>> {
            self.inner.select(table, query)
        }
    }

    #[test]
    fn test_product_group_conflict_reuses_winner_row() {
        let store = Arc::new(ConflictingStore::new());
        let resolver = DimensionResolver::new(store.clone());

        let id = resolver.resolve_product_group("Alloy").unwrap();

        let rows = store.inner.rows(tables::PRODUCT_GROUPS);
        assert_eq!(rows.len(), 1);
        assert_eq!(row_id(tables::PRODUCT_GROUPS, &rows[0]).unwrap(), id);
    }

    #[test]
    fn test_steel_grade_conflict_keeps_supplied_group() {
        let store = Arc::new(ConflictingStore::new());
        store.raced.store(true, std::sync::atomic::Ordering::SeqCst);
        let resolver = DimensionResolver::new(store.clone());
        let group_id = resolver.resolve_product_group("Alloy").unwrap();

        store.raced.store(false, std::sync::atomic::Ordering::SeqCst);
        let grade_id = resolver.resolve_steel_grade("A1", Some(group_id)).unwrap();

        assert_eq!(store.inner.rows(tables::STEEL_GRADES).len(), 1);
        let grade: SteelGrade = decode_row(
            tables::STEEL_GRADES,
            store
                .inner
                .find_one(tables::STEEL_GRADES, &Filter::new().eq("name", "A1"))
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(grade.id, grade_id);
        assert_eq!(grade.product_group_id, Some(group_id));
    }

    #[test]
    fn test_concurrent_creation_may_duplicate_names() {
        // 读后写非原子：两个调用方都在插入前完成查找时会各自建行
        let store = Arc::new(MemoryTableStore::new());
        let first = DimensionResolver::new(store.clone());
        let second = first.clone();

        let mut row = Row::new();
        row.insert("name".to_string(), Value::from("Race"));
        assert!(store
            .find_one(tables::PRODUCT_GROUPS, &Filter::new().eq("name", "Race"))
            .unwrap()
            .is_none());
        store.insert(tables::PRODUCT_GROUPS, row.clone()).unwrap();
        store.insert(tables::PRODUCT_GROUPS, row).unwrap();

        let a = first.resolve_product_group("Race").unwrap();
        let b = second.resolve_product_group("Race").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.rows(tables::PRODUCT_GROUPS).len(), 2);
    }
}
