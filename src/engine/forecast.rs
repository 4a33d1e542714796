// ==========================================
// 炼钢产量预测系统 - 下期炉次预测引擎
// ==========================================
// 职责: 每个钢种取最近 N 个月产量 → 平推吨位 → 向上取整炉次
// 输入: steel_grades + product_groups + steel_grade_production
// 输出: ForecastEntry 列表（按钢种 id 顺序；无产量的钢种不出现）
// 规则:
// - 只做滑动平均平推，不做趋势/季节
// - 炉次只向上取整，宁多勿少
// - 结果快照写入审计（失败不影响返回）
// ==========================================

use crate::audit::AuditSink;
use crate::domain::dimension::{ProductGroup, SteelGrade};
use crate::domain::fact::ProductionFact;
use crate::domain::forecast::ForecastEntry;
use crate::repository::table_store::{decode_row, tables, Filter, Query, SortOrder, TableStore};
use crate::repository::{RepositoryError, RepositoryResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// 取整前的相对容限（几个 ulp）
///
/// 只吸收求和/相除带来的舍入误差：(0.1 + 0.2) * 1000 / 300 仍为 1 炉，
/// 而 100.00000001 吨 / 100 吨已是真实超出，取 2 炉。
const CEILING_ULPS: f64 = 4.0;

/// 预测错误
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("预测参数非法: {0}")]
    InvalidParameter(String),

    #[error("存储读取失败: {0}")]
    Storage(#[from] RepositoryError),
}

/// 吨位 → 炉次（向上取整）
pub fn project_heats(tons: f64, heat_tonnage: f64) -> i64 {
    let ratio = tons / heat_tonnage;
    let tolerance = ratio.abs() * CEILING_ULPS * f64::EPSILON;
    (ratio - tolerance).ceil().max(0.0) as i64
}

/// 算术平均（空切片返回 None）
pub fn trailing_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// ==========================================
// ForecastEngine
// ==========================================
pub struct ForecastEngine<S: TableStore + ?Sized> {
    store: Arc<S>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<S: TableStore + ?Sized> ForecastEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, audit: None }
    }

    /// 附加结果快照落盘
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// 预测下一期
    ///
    /// # 参数
    /// - trailing_months: 参与平均的最近月数（>= 1）
    /// - heat_tonnage: 每炉吨位（> 0）
    #[instrument(skip(self))]
    pub fn forecast_next_period(
        &self,
        trailing_months: usize,
        heat_tonnage: f64,
    ) -> Result<Vec<ForecastEntry>, ForecastError> {
        if trailing_months == 0 {
            return Err(ForecastError::InvalidParameter(
                "trailing_months 必须 >= 1".to_string(),
            ));
        }
        if !(heat_tonnage.is_finite() && heat_tonnage > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "heat_tonnage 必须 > 0, 实际 {}",
                heat_tonnage
            )));
        }

        let group_names = self.load_group_names()?;
        let grades = self.load_steel_grades()?;

        let mut entries = Vec::new();
        for grade in &grades {
            let tons = self.trailing_tons(grade.id, trailing_months)?;
            let Some(forecast_tons) = trailing_mean(&tons) else {
                continue;
            };

            entries.push(ForecastEntry {
                steel_grade: grade.name.clone(),
                product_group: grade
                    .product_group_id
                    .and_then(|id| group_names.get(&id).cloned()),
                tons: forecast_tons,
                heats: project_heats(forecast_tons, heat_tonnage),
            });
        }

        info!(
            grades = grades.len(),
            forecasts = entries.len(),
            "下期炉次预测完成"
        );
        self.snapshot(&entries);
        Ok(entries)
    }

    fn load_group_names(&self) -> RepositoryResult<HashMap<i64, String>> {
        self.store
            .select(tables::PRODUCT_GROUPS, &Query::new())?
            .into_iter()
            .map(|row| {
                decode_row::<ProductGroup>(tables::PRODUCT_GROUPS, row).map(|g| (g.id, g.name))
            })
            .collect()
    }

    fn load_steel_grades(&self) -> RepositoryResult<Vec<SteelGrade>> {
        self.store
            .select(
                tables::STEEL_GRADES,
                &Query::new().order_by("id", SortOrder::Asc),
            )?
            .into_iter()
            .map(|row| decode_row(tables::STEEL_GRADES, row))
            .collect()
    }

    /// 最近 N 个月吨位（year_month 字典序倒序）
    fn trailing_tons(&self, steel_grade_id: i64, months: usize) -> RepositoryResult<Vec<f64>> {
        let query = Query::new()
            .filter(Filter::new().eq("steel_grade_id", steel_grade_id))
            .order_by("year_month", SortOrder::Desc)
            .limit(months);

        self.store
            .select(tables::STEEL_GRADE_PRODUCTION, &query)?
            .into_iter()
            .map(|row| {
                decode_row::<ProductionFact>(tables::STEEL_GRADE_PRODUCTION, row).map(|f| f.tons)
            })
            .collect()
    }

    fn snapshot(&self, entries: &[ForecastEntry]) {
        let Some(audit) = &self.audit else {
            return;
        };
        let name = format!("forecast_{}", Utc::now().format("%Y%m%dT%H%M%S%.3f"));
        let document = match serde_json::to_value(entries) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "预测快照序列化失败");
                return;
            }
        };
        if let Err(e) = audit.write_document(&name, &document) {
            warn!(error = %e, "预测快照写入失败");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::domain::YearMonth;
    use crate::importer::DimensionResolver;
    use crate::repository::table_store::encode_row;
    use crate::repository::MemoryTableStore;

    fn seed_production(store: &Arc<MemoryTableStore>, grade_id: i64, facts: &[(&str, f64)]) {
        for (ym, tons) in facts {
            let fact = ProductionFact {
                year_month: ym.parse::<YearMonth>().unwrap(),
                steel_grade_id: grade_id,
                tons: *tons,
            };
            store
                .insert(
                    tables::STEEL_GRADE_PRODUCTION,
                    encode_row(tables::STEEL_GRADE_PRODUCTION, &fact).unwrap(),
                )
                .unwrap();
        }
    }

    #[test]
    fn test_project_heats_ceiling() {
        assert_eq!(project_heats(100.0, 100.0), 1);
        assert_eq!(project_heats(100.0 + 1.0 / 3.0, 100.0), 2);
        assert_eq!(project_heats(0.5, 100.0), 1);
        assert_eq!(project_heats(0.0, 100.0), 0);
    }

    #[test]
    fn test_project_heats_tolerance_is_relative() {
        // 舍入误差不进位
        assert_eq!(project_heats((0.1 + 0.2) * 1000.0, 300.0), 1);
        assert_eq!(project_heats(300.0 / 3.0 * 3.0, 300.0), 1);
        // 微小但真实的超出要进位
        assert_eq!(project_heats(100.00000001, 100.0), 2);
        assert_eq!(project_heats(1.0000000001, 1.0), 2);
    }

    #[test]
    fn test_forecast_math_flat_average() {
        let store = Arc::new(MemoryTableStore::new());
        let grade = DimensionResolver::new(store.clone())
            .resolve_steel_grade("S355", None)
            .unwrap();
        seed_production(&store, grade, &[("2024-04", 90.0), ("2024-05", 100.0), ("2024-06", 110.0)]);

        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tons, 100.0);
        assert_eq!(entries[0].heats, 1);
    }

    #[test]
    fn test_forecast_ceiling_never_rounds_down() {
        let store = Arc::new(MemoryTableStore::new());
        let grade = DimensionResolver::new(store.clone())
            .resolve_steel_grade("S355", None)
            .unwrap();
        seed_production(&store, grade, &[("2024-04", 100.0), ("2024-05", 100.0), ("2024-06", 101.0)]);

        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        assert!((entries[0].tons - 100.333).abs() < 0.001);
        assert_eq!(entries[0].heats, 2);
    }

    #[test]
    fn test_forecast_uses_most_recent_months_only() {
        let store = Arc::new(MemoryTableStore::new());
        let grade = DimensionResolver::new(store.clone())
            .resolve_steel_grade("S355", None)
            .unwrap();
        // 插入顺序打乱；2023-12 在窗口外
        seed_production(
            &store,
            grade,
            &[("2024-02", 300.0), ("2023-12", 9000.0), ("2024-03", 300.0), ("2024-01", 300.0)],
        );

        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        assert_eq!(entries[0].tons, 300.0);
        assert_eq!(entries[0].heats, 3);
    }

    #[test]
    fn test_grade_without_facts_is_omitted() {
        let store = Arc::new(MemoryTableStore::new());
        let resolver = DimensionResolver::new(store.clone());
        let with_data = resolver.resolve_steel_grade("S355", None).unwrap();
        resolver.resolve_steel_grade("S235", None).unwrap();
        seed_production(&store, with_data, &[("2024-06", 50.0)]);

        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.steel_grade.as_str()).collect();
        assert_eq!(names, vec!["S355"]);
    }

    #[test]
    fn test_product_group_name_attached() {
        let store = Arc::new(MemoryTableStore::new());
        let resolver = DimensionResolver::new(store.clone());
        let group = resolver.resolve_product_group("Structural").unwrap();
        let linked = resolver.resolve_steel_grade("S355", Some(group)).unwrap();
        let unlinked = resolver.resolve_steel_grade("S235", None).unwrap();
        seed_production(&store, linked, &[("2024-06", 50.0)]);
        seed_production(&store, unlinked, &[("2024-06", 50.0)]);

        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        assert_eq!(entries[0].product_group.as_deref(), Some("Structural"));
        assert_eq!(entries[1].product_group, None);
    }

    #[test]
    fn test_empty_store_returns_empty_list() {
        let store = Arc::new(MemoryTableStore::new());
        let entries = ForecastEngine::new(store).forecast_next_period(3, 100.0).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let engine = ForecastEngine::new(Arc::new(MemoryTableStore::new()));
        assert!(matches!(
            engine.forecast_next_period(0, 100.0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.forecast_next_period(3, 0.0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_forecast_snapshot_written() {
        let store = Arc::new(MemoryTableStore::new());
        let grade = DimensionResolver::new(store.clone())
            .resolve_steel_grade("S355", None)
            .unwrap();
        seed_production(&store, grade, &[("2024-06", 250.0)]);
        let audit = Arc::new(MemoryAuditSink::new());

        let engine = ForecastEngine::new(store).with_audit(audit.clone());
        let entries = engine.forecast_next_period(3, 100.0).unwrap();

        let documents = audit.documents();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].0.starts_with("forecast_"));
        assert_eq!(documents[0].1, serde_json::to_value(&entries).unwrap());
    }

    #[test]
    fn test_snapshot_failure_does_not_fail_forecast() {
        let store = Arc::new(MemoryTableStore::new());
        let engine = ForecastEngine::new(store).with_audit(Arc::new(MemoryAuditSink::failing()));
        assert!(engine.forecast_next_period(3, 100.0).is_ok());
    }
}
