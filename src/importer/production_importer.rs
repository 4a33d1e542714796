// ==========================================
// 炼钢产量预测系统 - 产量表导入器
// ==========================================
// 职责: 整合导入流程，从上传内容到数据库
// 流程: 解析 → 校验标签列 → 识别月份列 → 抽取 → 写入 → 审计
// 约束: 单次导入内全部顺序执行；客户端错误在写入前返回
// ==========================================

use crate::audit::{AuditRecord, AuditSink, AuditTable};
use crate::config::PipelineConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::fact_writer::{FactWriter, WriteSummary};
use crate::importer::file_parser::UniversalTableReader;
use crate::importer::month_columns::{ColumnClassifier, MonthColumn};
use crate::importer::record_extractor::{
    extract_daily_charges, extract_grade_records, extract_group_records, ExtractionStats,
};
use crate::importer::table::RawTable;
use crate::repository::TableStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 表头标签
pub mod labels {
    pub const QUALITY_GROUP: &str = "Quality group";
    pub const GRADE: &str = "Grade";
    pub const QUALITY: &str = "Quality";
    pub const DATE: &str = "Date";
    pub const SEQUENCE_ORDER: &str = "SequenceOrder";
    pub const STEEL_GRADE: &str = "SteelGrade";
}

/// 审计文件名前缀
mod audit_names {
    pub const GRADE_PRODUCTION: &str = "steel_grade_production";
    pub const GROUP_MONTHLY: &str = "product_groups_monthly";
    pub const GROUP_GRADE_MONTHLY: &str = "product_group_grade_monthly";
}

/// 单次导入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub batch_id: String,
    /// 抽取出的有效记录数
    pub records_processed: usize,
    /// 成功写入的事实行数
    pub records_written: usize,
    /// 审计文件位置（审计失败或无审计时为空）
    pub audit_location: Option<String>,
    #[serde(skip)]
    pub stats: ExtractionStats,
}

// ==========================================
// ProductionImporter
// ==========================================
pub struct ProductionImporter<S: TableStore + ?Sized> {
    reader: UniversalTableReader,
    writer: FactWriter<S>,
    audit: Arc<dyn AuditSink>,
    config: Arc<dyn PipelineConfigReader>,
}

impl<S: TableStore + ?Sized> ProductionImporter<S> {
    /// 创建导入器
    ///
    /// # 参数
    /// - store: 表存储
    /// - audit: 审计落盘
    /// - config: 配置读取器
    pub fn new(
        store: Arc<S>,
        audit: Arc<dyn AuditSink>,
        config: Arc<dyn PipelineConfigReader>,
    ) -> Self {
        Self {
            reader: UniversalTableReader,
            writer: FactWriter::new(store),
            audit,
            config,
        }
    }

    /// 钢种级产量表（Quality group / Grade / 月份列，单位吨）
    #[instrument(skip(self, bytes), fields(batch_id))]
    pub fn import_grade_table(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportOutcome> {
        let batch_id = new_batch_id();
        info!(batch_id = %batch_id, file_name, "开始导入钢种月产量");

        let table = self
            .reader
            .read_bytes(file_name, bytes, self.config.grade_header_row())?;
        let (group_col, grade_col) = (
            require_column(&table, labels::QUALITY_GROUP, &[labels::QUALITY_GROUP, labels::GRADE])?,
            require_column(&table, labels::GRADE, &[labels::QUALITY_GROUP, labels::GRADE])?,
        );
        let months = classify_months(&table, &[labels::QUALITY_GROUP, labels::GRADE])?;

        let extraction = extract_grade_records(&table, group_col, grade_col, &months);
        log_extraction(extraction.records.len(), &extraction.stats);

        let summary = self.writer.write_production_records(&extraction.records)?;
        let audit_location = self.write_audit(
            &format!("{}_{}", audit_names::GRADE_PRODUCTION, batch_id),
            &extraction.records,
        );

        Ok(outcome(batch_id, extraction.records.len(), summary, audit_location, extraction.stats))
    }

    /// 产品组级月度表（Quality / 月份列，单位炉次）
    ///
    /// 无有效记录时返回客户端错误
    #[instrument(skip(self, bytes), fields(batch_id))]
    pub fn import_group_table(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportOutcome> {
        let batch_id = new_batch_id();
        info!(batch_id = %batch_id, file_name, "开始导入产品组月度炉次");

        let table = self
            .reader
            .read_bytes(file_name, bytes, self.config.group_header_row())?;
        let group_col = require_column(&table, labels::QUALITY, &[labels::QUALITY])?;
        let months = classify_months(&table, &[labels::QUALITY])?;

        let extraction =
            extract_group_records(&table, group_col, &months, self.config.heat_tonnage());
        log_extraction(extraction.records.len(), &extraction.stats);
        if extraction.records.is_empty() {
            return Err(ImportError::NoRecords {
                columns_found: table.columns_found(),
            });
        }

        let summary = self.writer.write_group_monthly_records(&extraction.records)?;
        let audit_location = self.write_audit(
            &format!("{}_{}", audit_names::GROUP_MONTHLY, batch_id),
            &extraction.records,
        );

        Ok(outcome(batch_id, extraction.records.len(), summary, audit_location, extraction.stats))
    }

    /// 产品组×钢种月度表（Quality group / Grade / 月份列，单位吨）
    #[instrument(skip(self, bytes), fields(batch_id))]
    pub fn import_group_grade_table(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome> {
        let batch_id = new_batch_id();
        info!(batch_id = %batch_id, file_name, "开始导入产品组×钢种月产量");

        let table = self
            .reader
            .read_bytes(file_name, bytes, self.config.group_header_row())?;
        let (group_col, grade_col) = (
            require_column(&table, labels::QUALITY_GROUP, &[labels::QUALITY_GROUP, labels::GRADE])?,
            require_column(&table, labels::GRADE, &[labels::QUALITY_GROUP, labels::GRADE])?,
        );
        let months = classify_months(&table, &[labels::QUALITY_GROUP, labels::GRADE])?;

        let extraction = extract_grade_records(&table, group_col, grade_col, &months);
        log_extraction(extraction.records.len(), &extraction.stats);

        let summary = self.writer.write_group_grade_records(&extraction.records)?;
        let audit_location = self.write_audit(
            &format!("{}_{}", audit_names::GROUP_GRADE_MONTHLY, batch_id),
            &extraction.records,
        );

        Ok(outcome(batch_id, extraction.records.len(), summary, audit_location, extraction.stats))
    }

    /// 日装炉顺序表（Date / SequenceOrder / SteelGrade）
    #[instrument(skip(self, bytes), fields(batch_id))]
    pub fn import_daily_schedule(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome> {
        let batch_id = new_batch_id();
        info!(batch_id = %batch_id, file_name, "开始导入日装炉顺序");

        let required = [labels::DATE, labels::SEQUENCE_ORDER, labels::STEEL_GRADE];
        let table = self.reader.read_bytes(file_name, bytes, 0)?;
        let date_col = require_column(&table, labels::DATE, &required)?;
        let seq_col = require_column(&table, labels::SEQUENCE_ORDER, &required)?;
        let grade_col = require_column(&table, labels::STEEL_GRADE, &required)?;

        let extraction = extract_daily_charges(&table, date_col, seq_col, grade_col);
        log_extraction(extraction.records.len(), &extraction.stats);

        let summary = self.writer.write_daily_charges(&extraction.records)?;

        Ok(outcome(batch_id, extraction.records.len(), summary, None, extraction.stats))
    }

    /// 审计落盘；失败只记录告警
    fn write_audit<T: AuditRecord>(&self, name: &str, records: &[T]) -> Option<String> {
        match self.audit.write_table(name, &AuditTable::from_records(records)) {
            Ok(location) => {
                info!(location = %location, "审计文件已写入");
                Some(location)
            }
            Err(e) => {
                warn!(error = %e, name, "审计文件写入失败");
                None
            }
        }
    }
}

fn new_batch_id() -> String {
    let batch_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("batch_id", batch_id.as_str());
    batch_id
}

/// 查找必需列，缺失时列出全部必需列与实际列
fn require_column(table: &RawTable, name: &str, required: &[&str]) -> ImportResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| ImportError::MissingColumns {
            required: required.iter().map(|s| s.to_string()).collect(),
            columns_found: table.columns_found(),
        })
}

fn classify_months(table: &RawTable, label_columns: &[&str]) -> ImportResult<Vec<MonthColumn>> {
    let months = ColumnClassifier::new(label_columns).classify(&table.headers);
    let keys: Vec<String> = months.iter().map(|m| m.year_month().key()).collect();
    info!(month_columns = months.len(), keys = ?keys, "月份列识别完成");

    if months.is_empty() {
        return Err(ImportError::NoMonthColumns {
            columns_found: table.columns_found(),
        });
    }
    Ok(months)
}

fn log_extraction(records: usize, stats: &ExtractionStats) {
    info!(
        records,
        rows_seen = stats.rows_seen,
        rows_dropped = stats.rows_dropped,
        empty_cells = stats.empty_cells,
        skipped_cells = stats.skipped_cells,
        "记录抽取完成"
    );
}

fn outcome(
    batch_id: String,
    records_processed: usize,
    summary: WriteSummary,
    audit_location: Option<String>,
    stats: ExtractionStats,
) -> ImportOutcome {
    ImportOutcome {
        batch_id,
        records_processed,
        records_written: summary.written,
        audit_location,
        stats,
    }
}
