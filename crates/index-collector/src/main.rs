//! Sector index pipeline CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use index_collector::modules::{self, BackfillOptions, IncrementalOptions};
use index_collector::{CollectorConfig, CollectorError};
use index_core::{LogConfig, LogFormat};
use index_data::{Database, DatabaseConfig, IndexStore, MemoryIndexStore, PgIndexStore};
use index_exchange::BinanceKlineClient;

#[derive(Parser)]
#[command(name = "index-collector")]
#[command(about = "Sector index backfill and incremental updater", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 백필: history_start부터 모든 섹터 인덱스 재계산
    Backfill {
        /// 기록 전에 sector_index 전체 삭제
        #[arg(long)]
        truncate: bool,

        /// 메모리 저장소에 계산만 하고 DB에 기록하지 않음
        #[arg(long)]
        dry_run: bool,

        /// 특정 섹터만 처리 (쉼표로 구분, 예: "L1,DEFI")
        #[arg(long, value_delimiter = ',')]
        sectors: Option<Vec<String>>,
    },

    /// 증분 업데이트 1회 실행
    Update,

    /// 데몬 모드: 주기적으로 증분 업데이트 실행
    Daemon,
}

async fn connect_store(
    config: &CollectorConfig,
) -> Result<(Database, Arc<dyn IndexStore>), CollectorError> {
    let url = config.require_database_url()?.clone();
    let db = Database::connect(&DatabaseConfig::new(url)).await?;
    db.migrate().await?;
    tracing::info!("데이터베이스 연결 성공");
    let store: Arc<dyn IndexStore> = Arc::new(PgIndexStore::from_database(&db));
    Ok((db, store))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 로깅 초기화
    index_core::init_logging(LogConfig::new(cli.log_level.as_str()).with_format(cli.log_format))?;

    tracing::info!("Sector Index Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        sectors = config.index.sectors.len(),
        database = config.database_url.is_some(),
        "설정 로드 완료"
    );

    let source = BinanceKlineClient::new(&config.index.exchange)?;

    match cli.command {
        Commands::Backfill {
            truncate,
            dry_run,
            sectors,
        } => {
            let options = BackfillOptions {
                truncate,
                sectors,
                end_time_ms: None,
            };

            if dry_run {
                tracing::info!("드라이런: 메모리 저장소 사용");
                let store: Arc<dyn IndexStore> = Arc::new(MemoryIndexStore::new());
                let mut stats =
                    modules::run_backfill(store, &source, &config.index, &options).await?;
                stats.dry_run = true;
                stats.log_summary("백필");
            } else {
                let (db, store) = connect_store(&config).await?;
                if truncate {
                    tracing::warn!("--truncate 지정: 기존 인덱스 행이 모두 삭제됩니다");
                }
                let stats = modules::run_backfill(store, &source, &config.index, &options).await?;
                stats.log_summary("백필");
                db.pool().close().await;
            }
        }
        Commands::Update => {
            let (db, store) = connect_store(&config).await?;
            let options = IncrementalOptions {
                budget: config.incremental.budget(),
            };
            let stats = modules::run_incremental(store, &source, &config.index, options).await?;
            stats.log_summary("증분 업데이트");
            db.pool().close().await;
        }
        Commands::Daemon => {
            let (db, store) = connect_store(&config).await?;
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        let options = IncrementalOptions {
                            budget: config.incremental.budget(),
                        };
                        match modules::run_incremental(store.clone(), &source, &config.index, options).await {
                            Ok(stats) => stats.log_summary("증분 업데이트"),
                            Err(e) => tracing::error!("증분 업데이트 실패: {}", e),
                        }

                        tracing::info!(
                            "=== 업데이트 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }

            db.pool().close().await;
        }
    }

    tracing::info!("Sector Index Collector 종료");

    Ok(())
}
