// ==========================================
// 炼钢产量预测系统 - 导入API
// ==========================================
// 职责: 封装表格导入，供命令行/外部框架调用
// 约束:
// - 每次导入在独立阻塞线程上运行（同步存储 I/O 不阻塞异步运行时）
// - 单个文件内部全部顺序执行；批量导入时文件之间并发
// ==========================================

use crate::api::dto::{BatchIngestItem, IngestKind, IngestResponse, Upload};
use crate::api::error::{ApiError, ApiResult};
use crate::importer::{ImportOutcome, ImportResult, ProductionImporter};
use crate::repository::TableStore;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// 导入API
pub struct ImportApi<S: TableStore + ?Sized + 'static> {
    importer: Arc<ProductionImporter<S>>,
}

impl<S: TableStore + ?Sized + 'static> Clone for ImportApi<S> {
    fn clone(&self) -> Self {
        Self {
            importer: Arc::clone(&self.importer),
        }
    }
}

impl<S: TableStore + ?Sized + 'static> ImportApi<S> {
    /// 创建新的ImportApi实例
    pub fn new(importer: Arc<ProductionImporter<S>>) -> Self {
        Self { importer }
    }

    /// 导入单个上传文件
    ///
    /// # 参数
    /// - kind: 导入种类
    /// - upload: 上传文件（None 视为未提供文件）
    ///
    /// # 返回
    /// - Ok(IngestResponse): 导入结果
    /// - Err(ApiError): 客户端错误（400）或存储/内部错误（500）
    pub async fn ingest(&self, kind: IngestKind, upload: Option<Upload>) -> ApiResult<IngestResponse> {
        let upload = upload.ok_or(ApiError::NoFileProvided)?;
        if upload.bytes.is_empty() {
            return Err(ApiError::NoFileProvided);
        }

        let importer = Arc::clone(&self.importer);
        let file_name = upload.file_name.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            run_import(&importer, kind, &upload.file_name, &upload.bytes)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导入任务异常终止: {}", e)))?;

        match outcome {
            Ok(outcome) => {
                info!(
                    file_name = %file_name,
                    ?kind,
                    records = outcome.records_processed,
                    "导入完成"
                );
                Ok(IngestResponse::from_outcome(kind, outcome))
            }
            Err(e) => {
                error!(file_name = %file_name, ?kind, error = %e, "导入失败");
                Err(e.into())
            }
        }
    }

    /// 批量导入（文件之间并发，每个文件一个结果）
    pub async fn ingest_batch(&self, kind: IngestKind, uploads: Vec<Upload>) -> Vec<BatchIngestItem> {
        info!(count = uploads.len(), ?kind, "开始批量导入文件");

        let tasks = uploads.into_iter().map(|upload| {
            let file_name = upload.file_name.clone();
            async move {
                match self.ingest(kind, Some(upload)).await {
                    Ok(response) => BatchIngestItem {
                        file_name,
                        status_code: 200,
                        body: serde_json::to_value(&response)
                            .unwrap_or_else(|e| json!({ "error": e.to_string() })),
                    },
                    Err(e) => BatchIngestItem {
                        file_name,
                        status_code: e.status_code(),
                        body: e.to_body(),
                    },
                }
            }
        });

        join_all(tasks).await
    }
}

fn run_import<S: TableStore + ?Sized>(
    importer: &ProductionImporter<S>,
    kind: IngestKind,
    file_name: &str,
    bytes: &[u8],
) -> ImportResult<ImportOutcome> {
    match kind {
        IngestKind::GradeProduction => importer.import_grade_table(file_name, bytes),
        IngestKind::GroupMonthly => importer.import_group_table(file_name, bytes),
        IngestKind::GroupGradeMonthly => importer.import_group_grade_table(file_name, bytes),
        IngestKind::DailySchedule => importer.import_daily_schedule(file_name, bytes),
    }
}
