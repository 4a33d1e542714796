// ==========================================
// 炼钢产量预测系统 - 流水线配置读取 Trait
// ==========================================
// 职责: 定义导入/预测所需的配置读取接口与静态默认值
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::path::PathBuf;

/// 默认每炉吨位
pub const DEFAULT_HEAT_TONNAGE: f64 = 100.0;
/// 默认滑动平均月数
pub const DEFAULT_TRAILING_MONTHS: usize = 3;
/// 钢种级表格表头行（首行为标题）
pub const DEFAULT_GRADE_HEADER_ROW: usize = 1;
/// 产品组级表格表头行
pub const DEFAULT_GROUP_HEADER_ROW: usize = 0;
/// 默认审计目录
pub const DEFAULT_AUDIT_DIR: &str = "uploads";

/// 环境变量名
pub mod env_keys {
    pub const HEAT_TONNAGE: &str = "MELT_SHOP_HEAT_TONNAGE";
    pub const TRAILING_MONTHS: &str = "MELT_SHOP_TRAILING_MONTHS";
    pub const AUDIT_DIR: &str = "MELT_SHOP_AUDIT_DIR";
}

// ==========================================
// PipelineConfigReader Trait
// ==========================================
// 用途: 导入与预测所需的配置读取接口
// 实现者: PipelineSettings（静态/环境变量）、ConfigManager（config_kv 表）
pub trait PipelineConfigReader: Send + Sync {
    /// 每炉吨位（炉次 ↔ 吨位换算）
    ///
    /// # 默认值
    /// - 100.0
    fn heat_tonnage(&self) -> f64;

    /// 预测滑动平均的月数
    ///
    /// # 默认值
    /// - 3
    fn trailing_months(&self) -> usize;

    /// 钢种级表格的表头行（0 起）
    fn grade_header_row(&self) -> usize;

    /// 产品组级表格的表头行（0 起）
    fn group_header_row(&self) -> usize;

    /// 审计文件目录
    fn audit_dir(&self) -> PathBuf;
}

// ==========================================
// PipelineSettings - 静态配置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub heat_tonnage: f64,
    pub trailing_months: usize,
    pub grade_header_row: usize,
    pub group_header_row: usize,
    pub audit_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            heat_tonnage: DEFAULT_HEAT_TONNAGE,
            trailing_months: DEFAULT_TRAILING_MONTHS,
            grade_header_row: DEFAULT_GRADE_HEADER_ROW,
            group_header_row: DEFAULT_GROUP_HEADER_ROW,
            audit_dir: PathBuf::from(DEFAULT_AUDIT_DIR),
        }
    }
}

impl PipelineSettings {
    /// 默认值 + 环境变量覆写（非法值忽略）
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// 按 env_keys 查询覆写值
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(env_keys::HEAT_TONNAGE).and_then(|v| v.trim().parse::<f64>().ok()) {
            if v > 0.0 {
                self.heat_tonnage = v;
            }
        }
        if let Some(v) =
            lookup(env_keys::TRAILING_MONTHS).and_then(|v| v.trim().parse::<usize>().ok())
        {
            if v > 0 {
                self.trailing_months = v;
            }
        }
        if let Some(v) = lookup(env_keys::AUDIT_DIR) {
            if !v.trim().is_empty() {
                self.audit_dir = PathBuf::from(v.trim());
            }
        }
        self
    }
}

impl PipelineConfigReader for PipelineSettings {
    fn heat_tonnage(&self) -> f64 {
        self.heat_tonnage
    }

    fn trailing_months(&self) -> usize {
        self.trailing_months
    }

    fn grade_header_row(&self) -> usize {
        self.grade_header_row
    }

    fn group_header_row(&self) -> usize {
        self.group_header_row
    }

    fn audit_dir(&self) -> PathBuf {
        self.audit_dir.clone()
    }
}
