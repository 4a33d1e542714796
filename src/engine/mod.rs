// ==========================================
// 炼钢产量预测系统 - 引擎层
// ==========================================
// 职责: 基于事实表的计算规则
// 红线: Engine 不拼 SQL，只通过 TableStore 读取
// ==========================================

pub mod forecast;

// 重导出核心引擎
pub use forecast::{project_heats, trailing_mean, ForecastEngine, ForecastError};
