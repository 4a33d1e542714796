// ==========================================
// 炼钢产量预测系统 - 预测API
// ==========================================
// 职责: 封装下期炉次预测，参数缺省取配置
// 约定: 无数据时返回空列表，不报错
// ==========================================

use crate::api::dto::ForecastQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::config::PipelineConfigReader;
use crate::domain::ForecastEntry;
use crate::engine::ForecastEngine;
use crate::repository::TableStore;
use std::sync::Arc;

/// 预测API
pub struct ForecastApi<S: TableStore + ?Sized + 'static> {
    engine: Arc<ForecastEngine<S>>,
    config: Arc<dyn PipelineConfigReader>,
}

impl<S: TableStore + ?Sized + 'static> ForecastApi<S> {
    pub fn new(engine: Arc<ForecastEngine<S>>, config: Arc<dyn PipelineConfigReader>) -> Self {
        Self { engine, config }
    }

    /// 预测下一期各钢种炉次
    pub async fn forecast(&self, query: ForecastQuery) -> ApiResult<Vec<ForecastEntry>> {
        let engine = Arc::clone(&self.engine);
        let config = Arc::clone(&self.config);
        // 配置读取可能落到 config_kv 表，与预测一起放到阻塞线程
        let entries = tokio::task::spawn_blocking(move || {
            let trailing_months = query
                .trailing_months
                .unwrap_or_else(|| config.trailing_months());
            let heat_tonnage = query
                .heat_tonnage
                .unwrap_or_else(|| config.heat_tonnage());
            engine.forecast_next_period(trailing_months, heat_tonnage)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("预测任务异常终止: {}", e)))??;

        Ok(entries)
    }
}
