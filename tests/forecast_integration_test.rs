// ==========================================
// 预测引擎集成测试（SQLite）
// ==========================================
// 测试目标: 导入钢种月产量后按最近 N 月均值预测下期炉次
// ==========================================


use melt_shop_forecast::audit::MemoryAuditSink;
use melt_shop_forecast::engine::{ForecastEngine, ForecastError};
use melt_shop_forecast::logging;
use melt_shop_forecast::ForecastEntry;
use std::sync::Arc;
use test_helpers::*;

fn entry<'a>(entries: &'a [ForecastEntry], grade: &str) -> &'a ForecastEntry {
    entries
        .iter()
        .find(|e| e.steel_grade == grade)
        .unwrap_or_else(|| panic!("缺少钢种 {} 的预测", grade))
}

#[tokio::test]
async fn test_forecast_after_import() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let store = open_store(&db_path);
    let importer = create_importer(Arc::clone(&store), Arc::new(MemoryAuditSink::new()));
    importer
        .import_grade_table("grades.csv", GRADE_PRODUCTION_CSV.as_bytes())
        .expect("导入失败");

    let audit = Arc::new(MemoryAuditSink::new());
    let engine = ForecastEngine::new(Arc::clone(&store)).with_audit(audit.clone());
    let entries = engine.forecast_next_period(3, 100.0).expect("预测失败");

    // 钢种按登记顺序输出
    let grades: Vec<&str> = entries.iter().map(|e| e.steel_grade.as_str()).collect();
    assert_eq!(grades, vec!["S355", "S235", "S275", "B30"]);

    // [90, 100, 110] → 均值 100 → 1 炉
    let s355 = entry(&entries, "S355");
    assert!((s355.tons - 100.0).abs() < 1e-9);
    assert_eq!(s355.heats, 1);
    assert_eq!(s355.product_group.as_deref(), Some("Structural"));

    // [100, 100, 101] → 均值略大于 100 → 2 炉
    let s235 = entry(&entries, "S235");
    assert_eq!(s235.heats, 2);

    // 只有一个月有产量，按一个月平均
    let s275 = entry(&entries, "S275");
    assert!((s275.tons - 12.5).abs() < 1e-9);
    assert_eq!(s275.heats, 1);

    // [200, 250] → 225 → 3 炉
    let b30 = entry(&entries, "B30");
    assert!((b30.tons - 225.0).abs() < 1e-9);
    assert_eq!(b30.heats, 3);
    assert_eq!(b30.product_group.as_deref(), Some("Boron"));

    // 预测快照
    let documents = audit.documents();
    assert_eq!(documents.len(), 1);
    assert!(documents[0].0.starts_with("forecast_"));
}

#[tokio::test]
async fn test_forecast_uses_latest_months_only() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let store = open_store(&db_path);
    let importer = create_importer(Arc::clone(&store), Arc::new(MemoryAuditSink::new()));
    importer
        .import_grade_table("grades.csv", GRADE_PRODUCTION_CSV.as_bytes())
        .expect("导入失败");

    let engine = ForecastEngine::new(Arc::clone(&store));
    let entries = engine.forecast_next_period(1, 100.0).expect("预测失败");

    // 最近一个月: S355 = 110 → 2 炉; S235 = 101 → 2 炉
    let s355 = entry(&entries, "S355");
    assert!((s355.tons - 110.0).abs() < 1e-9);
    assert_eq!(s355.heats, 2);
    assert_eq!(entry(&entries, "S235").heats, 2);
}

#[tokio::test]
async fn test_forecast_omits_grades_without_facts() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let store = open_store(&db_path);
    let importer = create_importer(Arc::clone(&store), Arc::new(MemoryAuditSink::new()));

    // 日装炉表只登记钢种，不产生月产量
    importer
        .import_daily_schedule("schedule.csv", DAILY_SCHEDULE_CSV.as_bytes())
        .expect("导入失败");

    let engine = ForecastEngine::new(Arc::clone(&store));
    let entries = engine.forecast_next_period(3, 100.0).expect("预测失败");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_forecast_rejects_invalid_parameters() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let engine = ForecastEngine::new(open_store(&db_path));

    assert!(matches!(
        engine.forecast_next_period(0, 100.0),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        engine.forecast_next_period(3, 0.0),
        Err(ForecastError::InvalidParameter(_))
    ));
}
