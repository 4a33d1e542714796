// ==========================================
// 炼钢产量预测系统 - 维度实体
// ==========================================
// 职责: 产品组 / 钢种维度行
// 约束: name 为业务主键，id 为首次出现时分配的代理键
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ProductGroup - 产品组
// ==========================================
// 对齐: product_groups 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub id: i64,
    pub name: String,
}

// ==========================================
// SteelGrade - 钢种
// ==========================================
// 对齐: steel_grades 表
// product_group_id 首次为空，后续出现非空产品组时回填（后写覆盖）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteelGrade {
    pub id: i64,
    pub name: String,
    pub product_group_id: Option<i64>,
}
