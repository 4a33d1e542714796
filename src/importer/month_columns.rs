// ==========================================
// 炼钢产量预测系统 - 月份列识别
// ==========================================
// 职责: 表头 → 月份列列表（原列号 + 原表头文本 + 规范年月）
// 规则:
// 1. 跳过标签列（精确匹配）与 "Unnamed: N" 占位列
// 2. 日期值表头 → Dated
// 3. "Mon YY" 文本表头（字母大小写不敏感）→ Labeled
// 空结果由调用方上报为客户端错误
// ==========================================

use crate::domain::types::{month_from_abbreviation, MonthHeader, YearMonth};
use crate::importer::table::{CellValue, UNNAMED_PREFIX};

/// 已识别的月份列
#[derive(Debug, Clone, PartialEq)]
pub struct MonthColumn {
    /// 原表中的列号
    pub index: usize,
    /// 原表头（用于日志与诊断）
    pub label: String,
    pub header: MonthHeader,
}

impl MonthColumn {
    pub fn year_month(&self) -> YearMonth {
        self.header.year_month()
    }
}

/// 解析 "Mon YY" 文本
///
/// 要求恰好两段：3 个 ASCII 字母 + 2 位数字；缩写不在 12 月表内返回 None
pub fn parse_month_label(raw: &str) -> Option<MonthHeader> {
    let mut parts = raw.split_whitespace();
    let (abbrev, year) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    if abbrev.len() != 3 || !abbrev.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let month = month_from_abbreviation(abbrev)?;
    let year: u8 = year.parse().ok()?;
    Some(MonthHeader::Labeled { month, year })
}

// ==========================================
// ColumnClassifier - 月份列分类器
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnClassifier {
    label_columns: Vec<String>,
}

impl ColumnClassifier {
    /// 创建分类器
    ///
    /// # 参数
    /// - label_columns: 实体标签列名（如 "Quality group", "Grade"），不参与识别
    pub fn new(label_columns: &[&str]) -> Self {
        Self {
            label_columns: label_columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 识别月份列（保持原列顺序）
    pub fn classify(&self, headers: &[CellValue]) -> Vec<MonthColumn> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                let header = self.classify_header(header)?;
                Some((index, header))
            })
            .map(|(index, header)| MonthColumn {
                index,
                label: headers[index].to_string(),
                header,
            })
            .collect()
    }

    fn classify_header(&self, header: &CellValue) -> Option<MonthHeader> {
        match header {
            CellValue::Date(dt) => Some(MonthHeader::Dated(dt.date())),
            CellValue::Text(text) => {
                let trimmed = text.trim();
                if self.is_label_column(trimmed) || trimmed.starts_with(UNNAMED_PREFIX) {
                    return None;
                }
                parse_month_label(trimmed)
            }
            CellValue::Empty | CellValue::Number(_) => None,
        }
    }

    fn is_label_column(&self, name: &str) -> bool {
        self.label_columns.iter().any(|label| label == name)
    }
}
