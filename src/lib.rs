// ==========================================
// 炼钢产量预测系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 产量表格导入 + 下期炉次预测
// 数据流: 表格 → 月份列识别 → 宽转窄 → 维度归并/事实 upsert → 预测
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部表格
pub mod importer;

// 引擎层 - 预测
pub mod engine;

// 审计落盘
pub mod audit;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ForecastEntry, MonthHeader, ProductGroup, ProductGroupRecord, ProductionRecord, SteelGrade,
    YearMonth,
};

// 仓储
pub use repository::{MemoryTableStore, SqliteTableStore, TableStore};

// 导入与引擎
pub use engine::ForecastEngine;
pub use importer::{ColumnClassifier, DimensionResolver, FactWriter, ProductionImporter};

// API
pub use api::{ApiError, ForecastApi, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "炼钢产量预测系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
