// ==========================================
// 炼钢产量预测系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类:
// - 客户端输入错误（无表头/缺列/无月份列/无有效记录）→ 上层返回 4xx + columns_found
// - 存储错误 → 中止本次导入，已写入行保留（幂等重跑即恢复）
// 单元格解析失败不在此列：抽取阶段就地跳过
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 表结构错误（客户端输入）=====
    #[error("第 {row} 行无表头（文件只有标题行或为空）")]
    MissingHeaderRow { row: usize },

    #[error("缺少必需列: {}", required.join(", "))]
    MissingColumns {
        required: Vec<String>,
        columns_found: Vec<String>,
    },

    #[error("未找到 'Mon YY' 格式或日期格式的月份列")]
    NoMonthColumns { columns_found: Vec<String> },

    #[error("未抽取到有效记录")]
    NoRecords { columns_found: Vec<String> },

    // ===== 存储错误 =====
    #[error("存储写入失败: {0}")]
    Storage(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为客户端输入错误（上传内容本身的问题）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::MissingHeaderRow { .. }
                | ImportError::MissingColumns { .. }
                | ImportError::NoMonthColumns { .. }
                | ImportError::NoRecords { .. }
        )
    }

    /// 诊断用：实际读到的列
    pub fn columns_found(&self) -> Option<&[String]> {
        match self {
            ImportError::MissingColumns { columns_found, .. }
            | ImportError::NoMonthColumns { columns_found }
            | ImportError::NoRecords { columns_found } => Some(columns_found),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
