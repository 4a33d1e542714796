// ==========================================
// 炼钢产量预测系统 - API 请求/响应结构
// ==========================================

use crate::importer::ImportOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 上传文件
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// 导入种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestKind {
    /// 钢种级月产量（吨）
    GradeProduction,
    /// 产品组级月度炉次
    GroupMonthly,
    /// 产品组×钢种月产量（吨）
    GroupGradeMonthly,
    /// 日装炉顺序
    DailySchedule,
}

impl IngestKind {
    /// 成功响应的 status 文本
    pub fn status_message(&self) -> &'static str {
        match self {
            IngestKind::GradeProduction => "steel_grade_production data processed and saved",
            IngestKind::GroupMonthly => "product_group_monthly data processed and saved",
            IngestKind::GroupGradeMonthly => "product_group_grade_monthly data processed and saved",
            IngestKind::DailySchedule => "daily_charge_schedule ingested",
        }
    }
}

/// 导入成功响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub status: String,
    pub batch_id: String,
    pub records_processed: usize,
    pub records_written: usize,
    pub audit_location: Option<String>,
}

impl IngestResponse {
    pub fn from_outcome(kind: IngestKind, outcome: ImportOutcome) -> Self {
        Self {
            status: kind.status_message().to_string(),
            batch_id: outcome.batch_id,
            records_processed: outcome.records_processed,
            records_written: outcome.records_written,
            audit_location: outcome.audit_location,
        }
    }
}

/// 批量导入中单个文件的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIngestItem {
    pub file_name: String,
    pub status_code: u16,
    /// 成功时为 IngestResponse，失败时为错误响应体
    pub body: Value,
}

/// 预测查询参数（缺省取配置值）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    pub trailing_months: Option<usize>,
    pub heat_tonnage: Option<f64>,
}
