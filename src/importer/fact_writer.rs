// ==========================================
// 炼钢产量预测系统 - 事实写入
// ==========================================
// 职责: 窄记录 → 维度归并 → 按自然复合键幂等 upsert
// 约束:
// - 逐条顺序写入，不批量，不跨记录事务
// - 单条失败立即中止，之前已写入的行保留（重跑即恢复）
// ==========================================

use crate::domain::fact::{
    DailyChargeRecord, ProductGroupGradeMonthlyFact, ProductGroupMonthlyFact, ProductionFact,
};
use crate::domain::record::{DailyChargeRow, ProductGroupRecord, ProductionRecord};
use crate::importer::dimension_resolver::DimensionResolver;
use crate::repository::table_store::{encode_row, tables, TableStore};
use crate::repository::RepositoryResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// 写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// 成功 upsert 的事实行数
    pub written: usize,
    /// 因缺少必要维度而跳过的记录数
    pub skipped: usize,
}

pub struct FactWriter<S: TableStore + ?Sized> {
    store: Arc<S>,
    resolver: DimensionResolver<S>,
}

impl<S: TableStore + ?Sized> FactWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        let resolver = DimensionResolver::new(Arc::clone(&store));
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &DimensionResolver<S> {
        &self.resolver
    }

    fn upsert_fact<T: Serialize>(
        &self,
        table: &str,
        fact: &T,
        conflict_keys: &[&str],
    ) -> RepositoryResult<()> {
        let row = encode_row(table, fact)?;
        self.store.upsert(table, row, conflict_keys)?;
        Ok(())
    }

    /// 钢种级产量 → steel_grade_production
    ///
    /// 产品组为空的记录仍写入，钢种不关联产品组
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn write_production_records(
        &self,
        records: &[ProductionRecord],
    ) -> RepositoryResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for record in records {
            let group_id = record
                .product_group
                .as_deref()
                .map(|name| self.resolver.resolve_product_group(name))
                .transpose()?;
            let steel_grade_id = self.resolver.resolve_steel_grade(&record.steel_grade, group_id)?;

            let fact = ProductionFact {
                year_month: record.year_month,
                steel_grade_id,
                tons: record.tons,
            };
            self.upsert_fact(
                tables::STEEL_GRADE_PRODUCTION,
                &fact,
                ProductionFact::CONFLICT_KEYS,
            )?;
            summary.written += 1;
        }

        info!(written = summary.written, "钢种月产量写入完成");
        Ok(summary)
    }

    /// 产品组级炉次 → product_group_monthly
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn write_group_monthly_records(
        &self,
        records: &[ProductGroupRecord],
    ) -> RepositoryResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for record in records {
            let product_group_id = self.resolver.resolve_product_group(&record.product_group)?;

            let fact = ProductGroupMonthlyFact {
                year_month: record.year_month,
                product_group_id,
                tons: record.tons,
                heats: record.heats,
            };
            self.upsert_fact(
                tables::PRODUCT_GROUP_MONTHLY,
                &fact,
                ProductGroupMonthlyFact::CONFLICT_KEYS,
            )?;
            summary.written += 1;
        }

        info!(written = summary.written, "产品组月度炉次写入完成");
        Ok(summary)
    }

    /// 产品组×钢种产量 → product_group_grade_monthly
    ///
    /// 该粒度必须有产品组，填充后仍无产品组的记录跳过
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn write_group_grade_records(
        &self,
        records: &[ProductionRecord],
    ) -> RepositoryResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for record in records {
            let Some(group_name) = record.product_group.as_deref() else {
                summary.skipped += 1;
                continue;
            };
            let product_group_id = self.resolver.resolve_product_group(group_name)?;
            let steel_grade_id = self
                .resolver
                .resolve_steel_grade(&record.steel_grade, Some(product_group_id))?;

            let fact = ProductGroupGradeMonthlyFact {
                year_month: record.year_month,
                product_group_id,
                steel_grade_id,
                tons: record.tons,
            };
            self.upsert_fact(
                tables::PRODUCT_GROUP_GRADE_MONTHLY,
                &fact,
                ProductGroupGradeMonthlyFact::CONFLICT_KEYS,
            )?;
            summary.written += 1;
        }

        info!(
            written = summary.written,
            skipped = summary.skipped,
            "产品组×钢种产量写入完成"
        );
        Ok(summary)
    }

    /// 日装炉顺序 → daily_charge_schedule（钢种不关联产品组）
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn write_daily_charges(&self, rows: &[DailyChargeRow]) -> RepositoryResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for row in rows {
            let steel_grade_id = self.resolver.resolve_steel_grade(&row.steel_grade, None)?;

            let record = DailyChargeRecord {
                run_date: row.run_date,
                sequence_order: row.sequence_order,
                steel_grade_id,
            };
            self.upsert_fact(
                tables::DAILY_CHARGE_SCHEDULE,
                &record,
                DailyChargeRecord::CONFLICT_KEYS,
            )?;
            summary.written += 1;
        }

        info!(written = summary.written, "日装炉顺序写入完成");
        Ok(summary)
    }
}
