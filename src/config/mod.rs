// ==========================================
// 炼钢产量预测系统 - 配置层
// ==========================================
// 职责: 流水线配置（炉次吨位、滑动月数、表头行、审计目录）
// 存储: 静态默认 + 环境变量 + config_kv 表
// ==========================================

pub mod config_manager;
pub mod pipeline_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use pipeline_config::{PipelineConfigReader, PipelineSettings};
