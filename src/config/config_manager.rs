// ==========================================
// 炼钢产量预测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失或非法值回落到基础配置（PipelineSettings）
// ==========================================

use crate::config::pipeline_config::{PipelineConfigReader, PipelineSettings};
use crate::db::open_sqlite_connection;
use crate::repository::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    base: PipelineSettings,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - base: 表内无配置时的回落值
    pub fn new(db_path: &str, base: PipelineSettings) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            base,
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>, base: PipelineSettings) -> Self {
        Self { conn, base }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 格式，按键排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map)).map_err(|e| RepositoryError::Other(e.into()))
    }

    /// 读取并解析配置，失败时回落
    fn parsed_or<T, F>(&self, key: &str, default: T, parse: F) -> T
    where
        F: Fn(&str) -> Option<T>,
    {
        match self.get_global_config_value(key) {
            Ok(Some(raw)) => parse(raw.trim()).unwrap_or_else(|| {
                warn!(key, value = %raw, "配置值非法，使用默认值");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "配置读取失败，使用默认值");
                default
            }
        }
    }
}

impl PipelineConfigReader for ConfigManager {
    fn heat_tonnage(&self) -> f64 {
        self.parsed_or(config_keys::HEAT_TONNAGE, self.base.heat_tonnage, |v| {
            v.parse::<f64>().ok().filter(|t| *t > 0.0)
        })
    }

    fn trailing_months(&self) -> usize {
        self.parsed_or(config_keys::TRAILING_MONTHS, self.base.trailing_months, |v| {
            v.parse::<usize>().ok().filter(|n| *n > 0)
        })
    }

    fn grade_header_row(&self) -> usize {
        self.parsed_or(config_keys::GRADE_HEADER_ROW, self.base.grade_header_row, |v| {
            v.parse::<usize>().ok()
        })
    }

    fn group_header_row(&self) -> usize {
        self.parsed_or(config_keys::GROUP_HEADER_ROW, self.base.group_header_row, |v| {
            v.parse::<usize>().ok()
        })
    }

    fn audit_dir(&self) -> PathBuf {
        self.parsed_or(config_keys::AUDIT_DIR, self.base.audit_dir.clone(), |v| {
            (!v.is_empty()).then(|| PathBuf::from(v))
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 炉次换算
    pub const HEAT_TONNAGE: &str = "heat_tonnage";

    // 预测
    pub const TRAILING_MONTHS: &str = "trailing_months";

    // 表格布局
    pub const GRADE_HEADER_ROW: &str = "grade_header_row";
    pub const GROUP_HEADER_ROW: &str = "group_header_row";

    // 审计
    pub const AUDIT_DIR: &str = "audit_dir";
}
