// ==========================================
// API 端到端测试
// ==========================================
// 模拟调用方经 AppState 完成: 上传 → 导入 → 审计落盘 → 预测
// ==========================================


use melt_shop_forecast::api::{ForecastQuery, IngestKind, Upload};
use melt_shop_forecast::app::AppState;
use melt_shop_forecast::config::{config_keys, PipelineSettings};
use melt_shop_forecast::logging;
use test_helpers::*;

fn create_state(db_path: &str, audit_dir: &std::path::Path) -> AppState {
    let settings = PipelineSettings {
        audit_dir: audit_dir.to_path_buf(),
        ..PipelineSettings::default()
    };
    AppState::with_settings(db_path.to_string(), settings).expect("AppState 初始化失败")
}

#[tokio::test]
async fn test_upload_then_forecast_full_flow() {
    logging::init_test();
    println!("\n=== 测试 上传 → 预测 完整流程 ===\n");

    // 步骤 1: 创建测试数据库与审计目录
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    // 步骤 2: 上传钢种月产量表
    let response = state
        .import_api
        .ingest(
            IngestKind::GradeProduction,
            Some(Upload::new("grades.csv", GRADE_PRODUCTION_CSV.as_bytes())),
        )
        .await
        .expect("导入失败");
    println!("✓ 导入完成: {:?}", response);

    assert_eq!(response.status, "steel_grade_production data processed and saved");
    assert_eq!(response.records_processed, 9);

    // 步骤 3: 审计文件落盘
    let location = response.audit_location.expect("应有审计文件");
    assert!(location.contains(&response.batch_id));
    let content = std::fs::read_to_string(&location).expect("读取审计文件失败");
    assert!(content.starts_with("YearMonth,ProductGroup,SteelGrade,Tons"));

    // 步骤 4: 预测
    let entries = state
        .forecast_api
        .forecast(ForecastQuery::default())
        .await
        .expect("预测失败");
    println!("✓ 预测完成: {} 个钢种", entries.len());

    assert_eq!(entries.len(), 4);
    let body = serde_json::to_value(&entries).expect("序列化失败");
    assert_eq!(body[0]["steelGrade"], "S355");
    assert_eq!(body[0]["productGroup"], "Structural");
    assert_eq!(body[0]["heats"], 1);
    assert!(body[0]["tons"].is_number());

    // 预测快照也写入审计目录
    let snapshots = std::fs::read_dir(audit_dir.path())
        .expect("读取审计目录失败")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("forecast_"))
        .count();
    assert_eq!(snapshots, 1);
}

#[tokio::test]
async fn test_missing_columns_returns_400_with_columns_found() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    let csv = "Title\nFamily,Grade,Jun 24\nStructural,S355,90\n";
    let err = state
        .import_api
        .ingest(
            IngestKind::GradeProduction,
            Some(Upload::new("bad.csv", csv.as_bytes())),
        )
        .await
        .expect_err("缺列应返回错误");

    assert_eq!(err.status_code(), 400);
    let body = err.to_body();
    assert!(body["error"].as_str().is_some());
    assert_eq!(body["columnsFound"], serde_json::json!(["Family", "Grade", "Jun 24"]));
}

#[tokio::test]
async fn test_title_only_upload_returns_400() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    // 钢种表表头在第 2 行，文件只有标题行
    let err = state
        .import_api
        .ingest(
            IngestKind::GradeProduction,
            Some(Upload::new("grades.csv", "Steel grade production\n".as_bytes())),
        )
        .await
        .expect_err("缺表头应返回错误");

    assert_eq!(err.status_code(), 400);
    let body = err.to_body();
    assert!(body["error"].as_str().is_some());
    assert_eq!(body["columnsFound"], serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_upload_returns_400() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    let err = state
        .import_api
        .ingest(IngestKind::GroupMonthly, None)
        .await
        .expect_err("未上传文件应失败");
    assert_eq!(err.status_code(), 400);
    assert!(err.to_body().get("columnsFound").is_none());
}

#[tokio::test]
async fn test_batch_ingest_reports_each_file() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    let results = state
        .import_api
        .ingest_batch(
            IngestKind::GroupMonthly,
            vec![
                Upload::new("groups.csv", GROUP_MONTHLY_CSV.as_bytes()),
                Upload::new("notes.txt", "hello".as_bytes()),
                Upload::new("empty_months.csv", "Quality,Remark\nStructural,x\n".as_bytes()),
            ],
        )
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].file_name, "groups.csv");
    assert_eq!(results[0].status_code, 200);
    assert_eq!(results[0].body["recordsProcessed"], 3);
    assert_eq!(results[1].status_code, 400);
    assert_eq!(results[2].status_code, 400);
    assert_eq!(
        results[2].body["columnsFound"],
        serde_json::json!(["Quality", "Remark"])
    );

    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "product_group_monthly"), 3);
}

#[tokio::test]
async fn test_batch_files_sharing_new_names() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    // 每个文件都引入同一个新产品组与新钢种，并发落库
    let contents: Vec<String> = (1..=6)
        .map(|n| format!("Title\nQuality group,Grade,Jun 24\nAlloy,A1,{}\n", n * 10))
        .collect();
    let uploads = contents
        .iter()
        .enumerate()
        .map(|(i, content)| Upload::new(format!("alloy_{}.csv", i), content.as_bytes()))
        .collect();

    let results = state
        .import_api
        .ingest_batch(IngestKind::GradeProduction, uploads)
        .await;

    assert_eq!(results.len(), 6);
    for result in &results {
        assert_eq!(result.status_code, 200, "{}: {}", result.file_name, result.body);
    }

    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "product_groups"), 1);
    assert_eq!(count_rows(&conn, "steel_grades"), 1);
    assert_eq!(count_rows(&conn, "steel_grade_production"), 1);

    let group_id: Option<i64> = conn
        .query_row(
            "SELECT product_group_id FROM steel_grades WHERE name = 'A1'",
            [],
            |row| row.get(0),
        )
        .expect("查询 A1 失败");
    assert!(group_id.is_some());
}

#[tokio::test]
async fn test_stored_config_overrides_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let audit_dir = tempfile::tempdir().expect("创建审计目录失败");
    let state = create_state(&db_path, audit_dir.path());

    state
        .import_api
        .ingest(
            IngestKind::GradeProduction,
            Some(Upload::new("grades.csv", GRADE_PRODUCTION_CSV.as_bytes())),
        )
        .await
        .expect("导入失败");

    // 每炉 50 吨: S355 均值 100 → 2 炉
    state
        .config
        .set_config_value(config_keys::HEAT_TONNAGE, "50")
        .expect("写配置失败");

    let entries = state
        .forecast_api
        .forecast(ForecastQuery::default())
        .await
        .expect("预测失败");
    let s355 = entries
        .iter()
        .find(|e| e.steel_grade == "S355")
        .expect("缺少 S355");
    assert_eq!(s355.heats, 2);

    // 查询参数优先于配置
    let entries = state
        .forecast_api
        .forecast(ForecastQuery {
            trailing_months: Some(1),
            heat_tonnage: Some(110.0),
        })
        .await
        .expect("预测失败");
    let s355 = entries
        .iter()
        .find(|e| e.steel_grade == "S355")
        .expect("缺少 S355");
    assert_eq!(s355.heats, 1);
}
