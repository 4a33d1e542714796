// ==========================================
// 炼钢产量预测系统 - 宽表记录抽取
// ==========================================
// 职责: 宽表（行=实体，列=月份）→ 窄记录
// 规则:
// - 钢种级: 产品组列向下填充；吨位 <= 0 / 空白 / 非数值 跳过
// - 产品组级: 标签空白的行整行丢弃（不填充）；炉次 <= 0 跳过
// - 日装炉: 日期缺失 / 序号非整数 / 钢种空白 的行跳过
// 单元格解析失败就地恢复，只计数，不报错
// ==========================================

use crate::domain::record::{DailyChargeRow, ProductGroupRecord, ProductionRecord};
use crate::importer::month_columns::MonthColumn;
use crate::importer::table::{CellValue, RawTable};

/// 抽取统计（在组件边界统一上报）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// 参与抽取的数据行数
    pub rows_seen: usize,
    /// 整行丢弃数（标签空白 / 日期缺失等）
    pub rows_dropped: usize,
    /// 空白单元格（视为无产量）
    pub empty_cells: usize,
    /// 无法解析为数值的单元格
    pub skipped_cells: usize,
}

/// 抽取结果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub stats: ExtractionStats,
}

/// 向下填充：空白值继承上方最近的非空值
pub fn fill_down(values: &[Option<String>]) -> Vec<Option<String>> {
    let mut last: Option<String> = None;
    values
        .iter()
        .map(|value| {
            if let Some(v) = value {
                last = Some(v.clone());
            }
            last.clone()
        })
        .collect()
}

/// 单元格数值读取结果
enum Numeric {
    Blank,
    Value(f64),
    Unparsable,
}

fn read_numeric(cell: &CellValue) -> Numeric {
    match cell {
        CellValue::Empty => Numeric::Blank,
        CellValue::Number(v) => Numeric::Value(*v),
        CellValue::Text(s) if s.trim().is_empty() => Numeric::Blank,
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Numeric::Value(v),
            _ => Numeric::Unparsable,
        },
        CellValue::Date(_) => Numeric::Unparsable,
    }
}

/// 读取正数值；空白/非数值/非正数返回 None 并累计统计
fn positive_value(cell: &CellValue, stats: &mut ExtractionStats) -> Option<f64> {
    match read_numeric(cell) {
        Numeric::Blank => {
            stats.empty_cells += 1;
            None
        }
        Numeric::Unparsable => {
            stats.skipped_cells += 1;
            None
        }
        Numeric::Value(v) => (v > 0.0).then_some(v),
    }
}

fn column_labels(table: &RawTable, column: usize) -> Vec<Option<String>> {
    (0..table.row_count())
        .map(|row| table.cell(row, column).as_label())
        .collect()
}

// ==========================================
// 钢种级抽取
// ==========================================

/// 钢种级宽表 → ProductionRecord
///
/// # 参数
/// - group_column: 产品组列号（向下填充）
/// - grade_column: 钢种列号（空白行跳过）
/// - months: 已识别的月份列
pub fn extract_grade_records(
    table: &RawTable,
    group_column: usize,
    grade_column: usize,
    months: &[MonthColumn],
) -> Extraction<ProductionRecord> {
    let groups = fill_down(&column_labels(table, group_column));
    let mut stats = ExtractionStats::default();
    let mut records = Vec::new();

    for (row, product_group) in groups.into_iter().enumerate() {
        stats.rows_seen += 1;
        let Some(steel_grade) = table.cell(row, grade_column).as_label() else {
            stats.rows_dropped += 1;
            continue;
        };

        for month in months {
            let Some(tons) = positive_value(table.cell(row, month.index), &mut stats) else {
                continue;
            };
            records.push(ProductionRecord {
                year_month: month.year_month(),
                product_group: product_group.clone(),
                steel_grade: steel_grade.clone(),
                tons,
            });
        }
    }

    Extraction { records, stats }
}

// ==========================================
// 产品组级抽取
// ==========================================

/// 产品组级宽表（单元格为炉次）→ ProductGroupRecord
///
/// tons = heats * heat_tonnage
pub fn extract_group_records(
    table: &RawTable,
    group_column: usize,
    months: &[MonthColumn],
    heat_tonnage: f64,
) -> Extraction<ProductGroupRecord> {
    let mut stats = ExtractionStats::default();
    let mut records = Vec::new();

    for row in 0..table.row_count() {
        stats.rows_seen += 1;
        let Some(product_group) = table.cell(row, group_column).as_label() else {
            stats.rows_dropped += 1;
            continue;
        };

        for month in months {
            let Some(heats) = positive_value(table.cell(row, month.index), &mut stats) else {
                continue;
            };
            records.push(ProductGroupRecord {
                year_month: month.year_month(),
                product_group: product_group.clone(),
                tons: heats * heat_tonnage,
                heats,
            });
        }
    }

    Extraction { records, stats }
}

// ==========================================
// 日装炉顺序抽取
// ==========================================

fn read_sequence(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Number(v) if v.fract() == 0.0 => Some(*v as i64),
        CellValue::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// 日装炉顺序表 → DailyChargeRow
pub fn extract_daily_charges(
    table: &RawTable,
    date_column: usize,
    sequence_column: usize,
    grade_column: usize,
) -> Extraction<DailyChargeRow> {
    let mut stats = ExtractionStats::default();
    let mut records = Vec::new();

    for row in 0..table.row_count() {
        stats.rows_seen += 1;

        let date_cell = table.cell(row, date_column);
        let Some(run_date) = date_cell.as_date() else {
            if date_cell.is_blank() {
                stats.empty_cells += 1;
            } else {
                stats.skipped_cells += 1;
            }
            stats.rows_dropped += 1;
            continue;
        };

        let Some(sequence_order) = read_sequence(table.cell(row, sequence_column)) else {
            stats.skipped_cells += 1;
            stats.rows_dropped += 1;
            continue;
        };

        let Some(steel_grade) = table.cell(row, grade_column).as_label() else {
            stats.rows_dropped += 1;
            continue;
        };

        records.push(DailyChargeRow {
            run_date,
            sequence_order,
            steel_grade,
        });
    }

    Extraction { records, stats }
}
