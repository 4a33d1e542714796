// ==========================================
// 炼钢产量预测系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供通用表存储接口,屏蔽存储细节
// 约束: 所有值参数化,标识符白名单校验,防止 SQL 注入
// ==========================================

pub mod error;
pub mod memory_store;
pub mod sqlite_store;
pub mod table_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use memory_store::MemoryTableStore;
pub use sqlite_store::SqliteTableStore;
pub use table_store::{
    decode_row, encode_row, row_id, tables, Filter, Query, Row, SortOrder, TableStore,
};
