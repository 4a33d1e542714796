// ==========================================
// 炼钢产量预测系统 - 抽取记录
// ==========================================
// 职责: 宽表抽取阶段 → 写入阶段之间传递的不可变值对象
// 约束: 只含名称（维度尚未解析为 id）
// ==========================================

use crate::domain::types::YearMonth;
use chrono::NaiveDate;

/// 钢种级产量记录（一行一钢种 × 一月）
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub year_month: YearMonth,
    pub product_group: Option<String>,
    pub steel_grade: String,
    pub tons: f64,
}

/// 产品组级炉次记录（一行一产品组 × 一月）
#[derive(Debug, Clone, PartialEq)]
pub struct ProductGroupRecord {
    pub year_month: YearMonth,
    pub product_group: String,
    pub tons: f64,
    pub heats: f64,
}

/// 日装炉顺序行
#[derive(Debug, Clone, PartialEq)]
pub struct DailyChargeRow {
    pub run_date: NaiveDate,
    pub sequence_order: i64,
    pub steel_grade: String,
}
