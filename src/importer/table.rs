// ==========================================
// 炼钢产量预测系统 - 原始表格模型
// ==========================================
// 职责: 文件解析阶段的输出（有序列名 + 有类型的单元格）
// 说明: 空表头按 "Unnamed: {列号}" 命名，与常见表格工具导出一致
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// 空表头的占位前缀
pub const UNNAMED_PREFIX: &str = "Unnamed:";

/// 单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl CellValue {
    /// 从文本推断类型（CSV 等无类型来源）
    ///
    /// 顺序: 空白 → 数值 → 日期/日期时间 → 文本
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            if v.is_finite() {
                return CellValue::Number(v);
            }
        }
        if let Some(dt) = parse_datetime_text(trimmed) {
            return CellValue::Date(dt);
        }
        CellValue::Text(trimmed.to_string())
    }

    /// 保留原文（去两端空白），不做类型推断
    ///
    /// 用于 CSV 数据行：标签列（如 "0045"）原样保留，数值由抽取阶段按需解析
    pub fn raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 作为标签读取（去空白；空白返回 None）
    ///
    /// 整数值数字去掉小数部分（钢种号常被表格存成数字）
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(v) => Some(format_number(*v)),
            CellValue::Date(dt) => Some(dt.date().format("%Y-%m-%d").to_string()),
        }
    }

    /// 作为日期读取（原生日期，或 YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD 文本）
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(dt) => Some(dt.date()),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                parse_datetime_text(trimmed)
                    .map(|dt| dt.date())
                    .or_else(|| NaiveDate::parse_from_str(trimmed, "%Y%m%d").ok())
            }
            CellValue::Number(v) if v.fract() == 0.0 => {
                NaiveDate::parse_from_str(&format_number(*v), "%Y%m%d").ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) => write!(f, "{}", format_number(*v)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==========================================
// RawTable - 原始表格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<CellValue>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// 创建表格（空表头补占位名，数据行按表头宽度补齐）
    pub fn new(headers: Vec<CellValue>, rows: Vec<Vec<CellValue>>) -> Self {
        let headers: Vec<CellValue> = headers
            .into_iter()
            .enumerate()
            .map(|(idx, h)| {
                if h.is_blank() {
                    CellValue::Text(format!("{} {}", UNNAMED_PREFIX, idx))
                } else {
                    h
                }
            })
            .collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, CellValue::Empty);
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// 按列名查找列号（两端空白忽略）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| matches!(h, CellValue::Text(s) if s.trim() == name))
    }

    /// 诊断用列名列表
    pub fn columns_found(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_string()).collect()
    }

    /// 取单元格（越界视为空）
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
