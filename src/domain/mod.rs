// ==========================================
// 炼钢产量预测系统 - 领域模型层
// ==========================================
// 职责: 定义维度、事实、抽取记录、预测结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod dimension;
pub mod fact;
pub mod forecast;
pub mod record;
pub mod types;

// 重导出核心类型
pub use dimension::{ProductGroup, SteelGrade};
pub use fact::{
    DailyChargeRecord, ProductGroupGradeMonthlyFact, ProductGroupMonthlyFact, ProductionFact,
};
pub use forecast::ForecastEntry;
pub use record::{DailyChargeRow, ProductGroupRecord, ProductionRecord};
pub use types::{month_from_abbreviation, MonthHeader, YearMonth, MONTH_ABBREVIATIONS};
