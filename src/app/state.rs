// ==========================================
// 炼钢产量预测系统 - 应用状态
// ==========================================
// 职责: 从数据库路径装配存储、配置、审计与 API 实例
// 说明: 存储与配置共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ForecastApi, ImportApi};
use crate::audit::{AuditSink, FsAuditSink};
use crate::config::{ConfigManager, PipelineConfigReader, PipelineSettings};
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::ForecastEngine;
use crate::importer::ProductionImporter;
use crate::repository::SqliteTableStore;

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 表存储
    pub store: Arc<SqliteTableStore>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 导入API
    pub import_api: ImportApi<SqliteTableStore>,

    /// 预测API
    pub forecast_api: ForecastApi<SqliteTableStore>,
}

impl AppState {
    /// 创建新的AppState实例（基础配置取默认值 + 环境变量）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_settings(db_path, PipelineSettings::from_env())
    }

    /// 以指定基础配置创建AppState
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化存储与配置
    /// 3. 创建导入/预测 API 实例
    pub fn with_settings(db_path: String, settings: PipelineSettings) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v != CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    found = v,
                    expected = CURRENT_SCHEMA_VERSION,
                    "schema_version 与当前代码不一致"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("schema_version 读取失败: {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 存储与配置
        // ==========================================
        let store = Arc::new(SqliteTableStore::from_connection(Arc::clone(&conn)));
        let config = Arc::new(ConfigManager::from_connection(conn, settings));
        let config_reader: Arc<dyn PipelineConfigReader> = config.clone();

        let audit_dir = config_reader.audit_dir();
        tracing::info!("审计目录: {}", audit_dir.display());
        let audit: Arc<dyn AuditSink> = Arc::new(FsAuditSink::new(audit_dir));

        // ==========================================
        // API 层
        // ==========================================
        let importer = Arc::new(ProductionImporter::new(
            Arc::clone(&store),
            Arc::clone(&audit),
            Arc::clone(&config_reader),
        ));
        let engine = Arc::new(ForecastEngine::new(Arc::clone(&store)).with_audit(audit));

        Ok(Self {
            db_path,
            store,
            config,
            import_api: ImportApi::new(importer),
            forecast_api: ForecastApi::new(engine, config_reader),
        })
    }
}

/// 默认数据库路径
///
/// 优先级: MELT_SHOP_DB_PATH → 用户数据目录 → ./melt_shop.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MELT_SHOP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./melt_shop.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("melt-shop-forecast");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("melt_shop.db");
        }
    }

    path.to_string_lossy().to_string()
}
