// ==========================================
// 炼钢产量预测系统 - 月度/日度事实行
// ==========================================
// 职责: 事实表行结构（字段名与列名一致）
// 约束: 全部按自然复合键幂等 upsert
// ==========================================

use crate::domain::types::YearMonth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionFact - 钢种月产量
// ==========================================
// 对齐: steel_grade_production 表
// 冲突键: (year_month, steel_grade_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionFact {
    pub year_month: YearMonth,
    pub steel_grade_id: i64,
    pub tons: f64,
}

impl ProductionFact {
    pub const CONFLICT_KEYS: &'static [&'static str] = &["year_month", "steel_grade_id"];
}

// ==========================================
// ProductGroupMonthlyFact - 产品组月度炉次
// ==========================================
// 对齐: product_group_monthly 表
// 冲突键: (year_month, product_group_id)
// tons = heats * heat_tonnage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroupMonthlyFact {
    pub year_month: YearMonth,
    pub product_group_id: i64,
    pub tons: f64,
    pub heats: f64,
}

impl ProductGroupMonthlyFact {
    pub const CONFLICT_KEYS: &'static [&'static str] = &["year_month", "product_group_id"];
}

// ==========================================
// ProductGroupGradeMonthlyFact - 产品组×钢种月产量
// ==========================================
// 对齐: product_group_grade_monthly 表（独立粒度，不与上表合并）
// 冲突键: (year_month, product_group_id, steel_grade_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroupGradeMonthlyFact {
    pub year_month: YearMonth,
    pub product_group_id: i64,
    pub steel_grade_id: i64,
    pub tons: f64,
}

impl ProductGroupGradeMonthlyFact {
    pub const CONFLICT_KEYS: &'static [&'static str] =
        &["year_month", "product_group_id", "steel_grade_id"];
}

// ==========================================
// DailyChargeRecord - 日装炉顺序
// ==========================================
// 对齐: daily_charge_schedule 表
// 冲突键: (run_date, sequence_order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChargeRecord {
    pub run_date: NaiveDate,
    pub sequence_order: i64,
    pub steel_grade_id: i64,
}

impl DailyChargeRecord {
    pub const CONFLICT_KEYS: &'static [&'static str] = &["run_date", "sequence_order"];
}
