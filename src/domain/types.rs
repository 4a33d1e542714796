// ==========================================
// 炼钢产量预测系统 - 基础类型定义
// ==========================================
// 职责: 年月键 (YYYY-MM) 与月份表头变体
// 约束: 年月键按字典序即按时间序
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 月份缩写表（固定 12 项，下标 + 1 即月份）
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// 月份缩写 → 月份数字（大小写不敏感）
pub fn month_from_abbreviation(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbrev))
        .map(|idx| idx as u32 + 1)
}

// ==========================================
// YearMonth - 年月键
// ==========================================
// 用途: 月度事实表的分区键
// 序列化: 统一为 "YYYY-MM" 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 创建年月键（月份越界或年份超出 4 位返回 None）
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return None;
        }
        Some(Self { year, month })
    }

    /// 从日期取年月（日部分丢弃）
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 规范键 "YYYY-MM"
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("年月格式错误: {}", s))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(format!("年月格式错误: {}", s));
        }
        let year: i32 = year.parse().map_err(|_| format!("年份非法: {}", s))?;
        let month: u32 = month.parse().map_err(|_| format!("月份非法: {}", s))?;
        YearMonth::new(year, month).ok_or_else(|| format!("年月越界: {}", s))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.key()
    }
}

// ==========================================
// MonthHeader - 月份表头变体
// ==========================================
// Dated:   表头本身是日期值（Excel 日期单元格）
// Labeled: 表头是 "Mon YY" 文本（如 "Jun 24"）
// 两种变体在分类阶段一次性确定，统一由 year_month() 规范化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthHeader {
    Dated(NaiveDate),
    Labeled { month: u32, year: u8 },
}

impl MonthHeader {
    /// 规范化为年月键（两位年份补全为 20YY）
    pub fn year_month(&self) -> YearMonth {
        match *self {
            MonthHeader::Dated(date) => YearMonth::from_date(date),
            MonthHeader::Labeled { month, year } => YearMonth {
                year: 2000 + i32::from(year),
                month,
            },
        }
    }
}
