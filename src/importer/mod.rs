// ==========================================
// 炼钢产量预测系统 - 导入层
// ==========================================
// 职责: 表格导入 → 月份列识别 → 宽转窄 → 维度归并 → 事实 upsert
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod dimension_resolver;
pub mod error;
pub mod fact_writer;
pub mod file_parser;
pub mod month_columns;
pub mod production_importer;
pub mod record_extractor;
pub mod table;

// 重导出核心类型
pub use dimension_resolver::DimensionResolver;
pub use error::{ImportError, ImportResult};
pub use fact_writer::{FactWriter, WriteSummary};
pub use file_parser::{CsvTableReader, ExcelTableReader, TableReader, UniversalTableReader};
pub use month_columns::{parse_month_label, ColumnClassifier, MonthColumn};
pub use production_importer::{labels, ImportOutcome, ProductionImporter};
pub use record_extractor::{
    extract_daily_charges, extract_grade_records, extract_group_records, fill_down, Extraction,
    ExtractionStats,
};
pub use table::{CellValue, RawTable};
