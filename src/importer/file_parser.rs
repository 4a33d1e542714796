// ==========================================
// 炼钢产量预测系统 - 文件解析器实现
// ==========================================
// 职责: 原始字节/文件 → RawTable（表头行偏移可配）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table::{CellValue, RawTable};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

// ==========================================
// TableReader Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvTableReader, ExcelTableReader
pub trait TableReader: Send + Sync {
    /// 解析字节内容为表格
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - header_row: 表头所在行（0 起；之前的行视为标题行丢弃）
    fn read_table(&self, bytes: &[u8], header_row: usize) -> ImportResult<RawTable>;
}

/// 表头 + 数据行 → RawTable（跳过完全空白的行）
fn build_table<I>(mut lines: I, header_row: usize) -> ImportResult<RawTable>
where
    I: Iterator<Item = Vec<CellValue>>,
{
    for _ in 0..header_row {
        if lines.next().is_none() {
            break;
        }
    }
    let headers = lines.next().ok_or(ImportError::MissingHeaderRow {
        row: header_row + 1,
    })?;

    let rows = lines
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();

    Ok(RawTable::new(headers, rows))
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvTableReader;

impl TableReader for CsvTableReader {
    fn read_table(&self, bytes: &[u8], header_row: usize) -> ImportResult<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 表头行推断类型（日期表头即月份）；数据行保留原文，标签列不被转成数字
        let mut lines = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let convert: fn(&str) -> CellValue = if idx == header_row {
                CellValue::infer
            } else {
                CellValue::raw
            };
            lines.push(record.iter().map(convert).collect::<Vec<_>>());
        }

        build_table(lines.into_iter(), header_row)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelFormat {
    Xlsx,
    Xls,
}

pub struct ExcelTableReader {
    pub format: ExcelFormat,
}

impl ExcelTableReader {
    pub fn xlsx() -> Self {
        Self {
            format: ExcelFormat::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: ExcelFormat::Xls,
        }
    }
}

impl TableReader for ExcelTableReader {
    fn read_table(&self, bytes: &[u8], header_row: usize) -> ImportResult<RawTable> {
        let cursor = Cursor::new(bytes.to_vec());
        let range = match self.format {
            ExcelFormat::Xlsx => {
                let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                first_sheet_range(&mut workbook)?
            }
            ExcelFormat::Xls => {
                let mut workbook: Xls<_> = Xls::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                first_sheet_range(&mut workbook)?
            }
        };

        let lines = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>());
        build_table(lines, header_row)
    }
}

/// 读取第一个 sheet
fn first_sheet_range<RS, R>(workbook: &mut R) -> ImportResult<Range<Data>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

    workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))
}

/// calamine 单元格 → CellValue
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        // as_datetime 处理 1904 日期系统与 1900 闰年缺陷
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => CellValue::infer(s),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ==========================================
// 通用解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalTableReader;

impl UniversalTableReader {
    /// 按文件名扩展名选择解析器
    pub fn reader_for(file_name: &str) -> ImportResult<Box<dyn TableReader>> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Box::new(CsvTableReader)),
            "xlsx" | "xlsm" => Ok(Box::new(ExcelTableReader::xlsx())),
            "xls" => Ok(Box::new(ExcelTableReader::xls())),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 解析上传内容
    pub fn read_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        header_row: usize,
    ) -> ImportResult<RawTable> {
        Self::reader_for(file_name)?.read_table(bytes, header_row)
    }

    /// 解析本地文件
    pub fn read_path<P: AsRef<Path>>(&self, file_path: P, header_row: usize) -> ImportResult<RawTable> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.read_bytes(file_name, &bytes, header_row)
    }
}
