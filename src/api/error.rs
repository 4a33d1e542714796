// ==========================================
// 炼钢产量预测系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把导入/仓储/预测错误转换为可返回给调用方的形状
// 约定:
// - 客户端输入错误 → 400，响应体带 columnsFound
// - 存储/内部错误 → 500
// ==========================================

use crate::engine::ForecastError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use serde_json::{json, Value};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 客户端输入错误
    // ==========================================
    #[error("未提供文件")]
    NoFileProvided,

    /// 上传内容形状不符（缺列、无月份列、无有效记录、格式不支持）
    #[error("{message}")]
    ClientInput {
        message: String,
        columns_found: Vec<String>,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储错误: {0}")]
    Storage(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// HTTP 等价状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NoFileProvided
            | ApiError::ClientInput { .. }
            | ApiError::InvalidInput(_) => 400,
            ApiError::Storage(_) | ApiError::InternalError(_) => 500,
        }
    }

    /// 响应体: { "error": ..., "columnsFound": [...] }
    pub fn to_body(&self) -> Value {
        match self {
            ApiError::ClientInput { columns_found, .. } => json!({
                "error": self.to_string(),
                "columnsFound": columns_found,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_client_error() {
            let columns_found = err.columns_found().map(<[String]>::to_vec).unwrap_or_default();
            return ApiError::ClientInput {
                message: err.to_string(),
                columns_found,
            };
        }
        match err {
            ImportError::Storage(e) => ApiError::Storage(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

// ==========================================
// 从 ForecastError 转换
// ==========================================
impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidParameter(msg) => ApiError::InvalidInput(msg),
            ForecastError::Storage(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_maps_to_400_with_columns() {
        let err: ApiError = ImportError::MissingColumns {
            required: vec!["Quality group".to_string(), "Grade".to_string()],
            columns_found: vec!["Group".to_string(), "Jun 24".to_string()],
        }
        .into();

        assert_eq!(err.status_code(), 400);
        let body = err.to_body();
        assert_eq!(body["columnsFound"], json!(["Group", "Jun 24"]));
        assert!(body["error"].as_str().unwrap().contains("Quality group"));
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let err: ApiError =
            ImportError::Storage(RepositoryError::DatabaseConnectionError("down".into())).into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_body().get("columnsFound").is_none());
    }

    #[test]
    fn test_unsupported_format_is_client_error() {
        let err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_body()["columnsFound"], json!([]));
    }

    #[test]
    fn test_no_file_provided() {
        let err = ApiError::NoFileProvided;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_body(), json!({"error": "未提供文件"}));
    }

    #[test]
    fn test_forecast_parameter_error() {
        let err: ApiError = ForecastError::InvalidParameter("x".to_string()).into();
        assert_eq!(err.status_code(), 400);
    }
}
