// ==========================================
// 炼钢产量预测系统 - 命令行入口
// ==========================================
// 子命令:
// - import-grades / import-groups / import-group-grades / import-schedule
// - forecast
// 输出: JSON（成功为响应体，失败为 { error, columnsFound }，退出码 1）
// ==========================================

use clap::{Parser, Subcommand};
use melt_shop_forecast::api::{ApiError, ForecastQuery, IngestKind, Upload};
use melt_shop_forecast::app::{get_default_db_path, AppState};
use melt_shop_forecast::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "melt-shop-forecast", version, about = "炼钢产量导入与下期炉次预测")]
struct Cli {
    /// 数据库文件路径（缺省取 MELT_SHOP_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入钢种级月产量表（Quality group / Grade / 月份列）
    ImportGrades { files: Vec<PathBuf> },
    /// 导入产品组级月度炉次表（Quality / 月份列）
    ImportGroups { files: Vec<PathBuf> },
    /// 导入产品组×钢种月产量表
    ImportGroupGrades { files: Vec<PathBuf> },
    /// 导入日装炉顺序表（Date / SequenceOrder / SteelGrade）
    ImportSchedule { files: Vec<PathBuf> },
    /// 预测下一期各钢种炉次
    Forecast {
        /// 参与平均的最近月数
        #[arg(long)]
        trailing_months: Option<usize>,
        /// 每炉吨位
        #[arg(long)]
        heat_tonnage: Option<f64>,
    },
}

fn read_uploads(files: &[PathBuf]) -> Result<Vec<Upload>, ApiError> {
    files
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path).map_err(|e| ApiError::ClientInput {
                message: format!("文件读取失败: {}: {}", path.display(), e),
                columns_found: Vec::new(),
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(Upload::new(file_name, bytes))
        })
        .collect()
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("输出序列化失败: {}", e),
    }
}

fn report_error(err: &ApiError) -> ExitCode {
    tracing::error!(status = err.status_code(), error = %err, "命令执行失败");
    print_json(&err.to_body());
    ExitCode::FAILURE
}

async fn run_import(state: &AppState, kind: IngestKind, files: &[PathBuf]) -> ExitCode {
    let uploads = match read_uploads(files) {
        Ok(uploads) => uploads,
        Err(e) => return report_error(&e),
    };

    if uploads.len() <= 1 {
        return match state.import_api.ingest(kind, uploads.into_iter().next()).await {
            Ok(response) => {
                print_json(&serde_json::to_value(&response).unwrap_or_default());
                ExitCode::SUCCESS
            }
            Err(e) => report_error(&e),
        };
    }

    let results = state.import_api.ingest_batch(kind, uploads).await;
    let failed = results.iter().any(|r| r.status_code != 200);
    print_json(&serde_json::to_value(&results).unwrap_or_default());
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    tracing::info!("{} v{}", melt_shop_forecast::APP_NAME, melt_shop_forecast::VERSION);

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::ImportGrades { files } => {
            run_import(&state, IngestKind::GradeProduction, &files).await
        }
        Command::ImportGroups { files } => run_import(&state, IngestKind::GroupMonthly, &files).await,
        Command::ImportGroupGrades { files } => {
            run_import(&state, IngestKind::GroupGradeMonthly, &files).await
        }
        Command::ImportSchedule { files } => {
            run_import(&state, IngestKind::DailySchedule, &files).await
        }
        Command::Forecast {
            trailing_months,
            heat_tonnage,
        } => {
            let query = ForecastQuery {
                trailing_months,
                heat_tonnage,
            };
            match state.forecast_api.forecast(query).await {
                Ok(entries) => {
                    print_json(&serde_json::to_value(&entries).unwrap_or_default());
                    ExitCode::SUCCESS
                }
                Err(e) => report_error(&e),
            }
        }
    }
}
