// ==========================================
// 炼钢产量预测系统 - 预测结果
// ==========================================

use serde::{Deserialize, Serialize};

/// 单钢种下期预测
///
/// - tons: 滑动平均得到的平推吨位
/// - heats: ceil(tons / heat_tonnage)，只向上取整
/// - product_group: 产品组名称（未关联或 id 无法解析时为 None）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub steel_grade: String,
    pub product_group: Option<String>,
    pub tons: f64,
    pub heats: i64,
}
