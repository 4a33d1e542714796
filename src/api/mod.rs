// ==========================================
// 炼钢产量预测系统 - API 层
// ==========================================
// 职责: 提供导入/预测 API 接口，供命令行或外部 HTTP 框架调用
// ==========================================

pub mod dto;
pub mod error;
pub mod forecast_api;
pub mod import_api;

// 重导出核心类型
pub use dto::{BatchIngestItem, ForecastQuery, IngestKind, IngestResponse, Upload};
pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
pub use import_api::ImportApi;
