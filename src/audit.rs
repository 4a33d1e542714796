// ==========================================
// 炼钢产量预测系统 - 审计落盘
// ==========================================
// 职责: 抽取后的窄记录 → CSV；预测结果 → JSON 文档
// 约束: 审计失败不影响主流程（调用方记录 warn，返回位置为空）
// ==========================================

use crate::domain::record::{ProductGroupRecord, ProductionRecord};
use anyhow::Context;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

/// 可写入审计表的记录
pub trait AuditRecord {
    /// 表头
    const HEADERS: &'static [&'static str];

    /// 与 HEADERS 对齐的字段文本
    fn audit_fields(&self) -> Vec<String>;
}

impl AuditRecord for ProductionRecord {
    const HEADERS: &'static [&'static str] = &["YearMonth", "ProductGroup", "SteelGrade", "Tons"];

    fn audit_fields(&self) -> Vec<String> {
        vec![
            self.year_month.key(),
            self.product_group.clone().unwrap_or_default(),
            self.steel_grade.clone(),
            self.tons.to_string(),
        ]
    }
}

impl AuditRecord for ProductGroupRecord {
    const HEADERS: &'static [&'static str] = &["YearMonth", "ProductGroup", "Tons", "Heats"];

    fn audit_fields(&self) -> Vec<String> {
        vec![
            self.year_month.key(),
            self.product_group.clone(),
            self.tons.to_string(),
            self.heats.to_string(),
        ]
    }
}

/// 列式审计表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AuditTable {
    pub fn from_records<T: AuditRecord>(records: &[T]) -> Self {
        Self {
            headers: T::HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: records.iter().map(AuditRecord::audit_fields).collect(),
        }
    }
}

// ==========================================
// AuditSink Trait
// ==========================================
pub trait AuditSink: Send + Sync {
    /// 写入列式表，返回位置
    fn write_table(&self, name: &str, table: &AuditTable) -> anyhow::Result<String>;

    /// 写入 JSON 文档，返回位置
    fn write_document(&self, name: &str, document: &Value) -> anyhow::Result<String>;
}

// ==========================================
// FsAuditSink - 本地目录落盘
// ==========================================
#[derive(Debug, Clone)]
pub struct FsAuditSink {
    dir: PathBuf,
}

impl FsAuditSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn prepare(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("创建审计目录失败: {}", self.dir.display()))?;
        Ok(self.dir.join(file_name))
    }
}

impl AuditSink for FsAuditSink {
    fn write_table(&self, name: &str, table: &AuditTable) -> anyhow::Result<String> {
        let path = self.prepare(&format!("{}.csv", name))?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("打开审计文件失败: {}", path.display()))?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(path.display().to_string())
    }

    fn write_document(&self, name: &str, document: &Value) -> anyhow::Result<String> {
        let path = self.prepare(&format!("{}.json", name))?;
        let content = serde_json::to_string_pretty(document)?;
        std::fs::write(&path, content)
            .with_context(|| format!("写入审计文档失败: {}", path.display()))?;
        Ok(path.display().to_string())
    }
}

// ==========================================
// MemoryAuditSink - 进程内记录（测试/无盘运行）
// ==========================================
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    tables: Mutex<Vec<(String, AuditTable)>>,
    documents: Mutex<Vec<(String, Value)>>,
    failing: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有写入都失败的替身
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn tables(&self) -> Vec<(String, AuditTable)> {
        self.tables.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn documents(&self) -> Vec<(String, Value)> {
        self.documents.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write_table(&self, name: &str, table: &AuditTable) -> anyhow::Result<String> {
        if self.failing {
            anyhow::bail!("审计存储不可用");
        }
        self.tables
            .lock()
            .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?
            .push((name.to_string(), table.clone()));
        Ok(format!("memory://{}.csv", name))
    }

    fn write_document(&self, name: &str, document: &Value) -> anyhow::Result<String> {
        if self.failing {
            anyhow::bail!("审计存储不可用");
        }
        self.documents
            .lock()
            .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?
            .push((name.to_string(), document.clone()));
        Ok(format!("memory://{}.json", name))
    }
}
