//! 백필/증분 업데이트 파이프라인 통합 테스트.
//!
//! 메모리 저장소와 스크립트 캔들 소스로 전체 흐름을 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use index_collector::modules::{run_backfill, run_incremental, BackfillOptions, IncrementalOptions};
use index_core::{
    Candle, IndexConfig, IndexRecord, ProfileConfig, SectorDefinition, SeriesKind, Timeframe,
};
use index_data::{IndexStore, MemoryIndexStore};
use index_exchange::testing::ScriptedKlineSource;
use index_exchange::ExchangeError;

const HOUR: i64 = 3600;

fn config(series: SeriesKind, scale: f64, sectors: Vec<SectorDefinition>) -> IndexConfig {
    IndexConfig {
        profile: ProfileConfig {
            series,
            timeframe: Timeframe::H1,
            scale_constant: scale,
            history_start: "1970-01-01".to_string(),
            ..ProfileConfig::default()
        },
        exchange: Default::default(),
        sectors,
    }
}

fn closes(start_hour: i64, values: &[f64]) -> Vec<Candle> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Candle::new((start_hour + i as i64) * HOUR, *v, 0.0))
        .collect()
}

fn volumes(points: &[(i64, f64)]) -> Vec<Candle> {
    points.iter().map(|(t, v)| Candle::new(*t, 0.0, *v)).collect()
}

fn backfill_options(end_hour: i64) -> BackfillOptions {
    BackfillOptions {
        end_time_ms: Some(end_hour * HOUR * 1000),
        ..BackfillOptions::default()
    }
}

fn rows_for<'a>(rows: &'a [IndexRecord], key: &str) -> Vec<&'a IndexRecord> {
    rows.iter().filter(|r| r.sector_key == key).collect()
}

#[tokio::test]
async fn backfill_price_basket_scenario() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[10.0, 20.0, 30.0]))
        .with_history("BUSDT", closes(0, &[30.0, 40.0, 50.0]))
        .with_history("QUIETUSDT", Vec::new());
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("L1", ["AUSDT", "BUSDT"]),
            SectorDefinition::new("QUIET", ["QUIETUSDT"]),
            SectorDefinition::new("GONE", ["DELISTEDUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::new());

    let stats = run_backfill(store.clone(), &source, &config, &backfill_options(3))
        .await
        .unwrap();

    assert_eq!(stats.sectors_processed, 1);
    assert_eq!(stats.sectors_empty, 1);
    assert_eq!(stats.sectors_failed(), 1);
    assert_eq!(stats.failures[0].sector, "GONE");

    let rows = store.snapshot().await;
    let l1 = rows_for(&rows, "L1");
    let raws: Vec<(i64, f64)> = l1.iter().map(|r| (r.timestamp, r.raw_value)).collect();
    assert_eq!(raws, vec![(0, 20.0), (HOUR, 30.0), (2 * HOUR, 40.0)]);
    assert_eq!(l1[2].index_value, 1333.33);
    assert_eq!(l1[0].index_value, 666.67);
    assert!(l1.iter().all(|r| r.scale_constant == 1000.0));

    // 빈 섹터와 실패 섹터는 행이 없고 컴포지트에서도 빠짐
    assert!(rows_for(&rows, "QUIET").is_empty());
    assert!(rows_for(&rows, "GONE").is_empty());
    let all = rows_for(&rows, "ALL");
    assert_eq!(all.len(), 3);
    for (composite, sector) in all.iter().zip(l1.iter()) {
        assert_eq!(composite.timestamp, sector.timestamp);
        assert_eq!(composite.index_value, sector.index_value);
        assert_eq!(composite.raw_value, 0.0);
    }
}

#[tokio::test]
async fn backfill_composite_is_mean_of_sectors() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[10.0, 20.0]))
        .with_history("BUSDT", closes(0, &[50.0, 40.0]))
        .with_history("CUSDT", closes(1, &[7.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("A", ["AUSDT"]),
            SectorDefinition::new("B", ["BUSDT"]),
            SectorDefinition::new("C", ["CUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::new());

    run_backfill(store.clone(), &source, &config, &backfill_options(2))
        .await
        .unwrap();

    let rows = store.snapshot().await;
    for ts in [0, HOUR] {
        let sectors: Vec<f64> = rows
            .iter()
            .filter(|r| r.timestamp == ts && r.sector_key != "ALL")
            .map(|r| r.index_value)
            .collect();
        let expected = sectors.iter().sum::<f64>() / sectors.len() as f64;
        let composite = store.get("ALL", ts).await.unwrap();
        assert!((composite.index_value - expected).abs() <= 0.005 + 1e-9);
    }
    // t=0에는 C가 없으므로 A, B 두 섹터만 평균
    assert_eq!(
        rows.iter()
            .filter(|r| r.timestamp == 0 && r.sector_key != "ALL")
            .count(),
        2
    );
}

#[tokio::test]
async fn backfill_twice_is_idempotent() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[1.0, 2.0, 3.0, 4.0, 5.0]))
        .with_history("BUSDT", closes(0, &[5.0, 4.0, 3.0, 2.0, 1.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("A", ["AUSDT"]),
            SectorDefinition::new("B", ["BUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::new());

    run_backfill(store.clone(), &source, &config, &backfill_options(5))
        .await
        .unwrap();
    let first = store.snapshot().await;
    run_backfill(store.clone(), &source, &config, &backfill_options(5))
        .await
        .unwrap();

    assert_eq!(store.snapshot().await, first);
    assert_eq!(first.len(), 15);
}

#[tokio::test]
async fn backfill_truncate_removes_stale_rows() {
    let store = Arc::new(MemoryIndexStore::new());
    store
        .upsert_chunk(&[IndexRecord {
            sector_key: "OLD".to_string(),
            timestamp: 0,
            raw_value: 1.0,
            index_value: 1.0,
            scale_constant: 100.0,
        }])
        .await
        .unwrap();
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(0, &[1.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );

    let options = BackfillOptions {
        truncate: true,
        ..backfill_options(1)
    };
    run_backfill(store.clone(), &source, &config, &options)
        .await
        .unwrap();

    assert!(store.get("OLD", 0).await.is_none());
    assert_eq!(store.count().await.unwrap(), 2);
}

fn assert_composite_matches_sectors(rows: &[IndexRecord]) {
    let composite = rows_for(rows, "ALL");
    assert!(!composite.is_empty());
    for all in composite {
        let sectors: Vec<f64> = rows
            .iter()
            .filter(|r| r.timestamp == all.timestamp && r.sector_key != "ALL")
            .map(|r| r.index_value)
            .collect();
        let mean = sectors.iter().sum::<f64>() / sectors.len() as f64;
        assert!(
            (all.index_value - mean).abs() <= 0.005 + 1e-9,
            "ALL@{} = {}, sector mean = {}",
            all.timestamp,
            all.index_value,
            mean
        );
    }
}

#[tokio::test]
async fn backfill_sector_subset_rebuilds_composite_from_stored_peers() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[10.0, 20.0, 30.0]))
        .with_history("BUSDT", closes(0, &[10.0, 10.0, 10.0]))
        .with_history("CUSDT", closes(0, &[50.0, 50.0, 50.0]));
    let mut config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("A", ["AUSDT"]),
            SectorDefinition::new("B", ["BUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::new());

    run_backfill(store.clone(), &source, &config, &backfill_options(3))
        .await
        .unwrap();
    assert_eq!(store.get("ALL", 2 * HOUR).await.unwrap().index_value, 1250.0);

    // 바스켓 변경 후 A만 다시 백필
    config.sectors[0].symbols.push("CUSDT".to_string());
    let options = BackfillOptions {
        sectors: Some(vec!["A".to_string()]),
        ..backfill_options(3)
    };
    let stats = run_backfill(store.clone(), &source, &config, &options)
        .await
        .unwrap();

    assert_eq!(stats.sectors_processed, 1);
    assert_eq!(stats.composite_records, 3);
    assert_eq!(store.get("A", 2 * HOUR).await.unwrap().index_value, 1142.86);
    assert_eq!(store.get("B", 2 * HOUR).await.unwrap().index_value, 1000.0);
    assert_eq!(store.get("ALL", 2 * HOUR).await.unwrap().index_value, 1071.43);
    assert_composite_matches_sectors(&store.snapshot().await);
}

#[tokio::test]
async fn backfill_falls_back_to_insert_per_sector_and_composite() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[10.0, 20.0]))
        .with_history("BUSDT", closes(0, &[10.0, 10.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("A", ["AUSDT"]),
            SectorDefinition::new("B", ["BUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::without_unique_constraint());

    let stats = run_backfill(store.clone(), &source, &config, &backfill_options(2))
        .await
        .unwrap();

    // 섹터별 기록 2회 + 컴포지트 1회, 모두 insert 폴백
    assert_eq!(stats.write.fallback_inserted, 6);
    assert_eq!(stats.write.failed_chunks, 0);
    assert_composite_matches_sectors(&store.snapshot().await);
}

#[tokio::test]
async fn incremental_recovers_base_past_zero_volume_first_bucket() {
    let mut points = vec![(0, 0.0)];
    points.extend((1..10).map(|h| (h * HOUR, 100.0)));
    let source = ScriptedKlineSource::new().with_history("AUSDT", volumes(&points));
    let config = config(
        SeriesKind::Volume,
        100.0,
        vec![SectorDefinition::new("VOL", ["AUSDT"])],
    );
    let store = Arc::new(MemoryIndexStore::new());

    run_backfill(store.clone(), &source, &config, &backfill_options(10))
        .await
        .unwrap();
    let historical = store.get("VOL", 9 * HOUR).await.unwrap();
    assert_eq!(store.get("VOL", 0).await.unwrap().index_value, 0.0);
    assert_eq!(historical.index_value, 111.11);

    run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    let incremental = store.get("VOL", 9 * HOUR).await.unwrap();
    assert!((incremental.index_value - historical.index_value).abs() <= 0.01);
}

#[tokio::test]
async fn incremental_continues_backfilled_scale() {
    let mut history = vec![100.0; 4];
    history.extend((1..=20).map(|i| 100.0 + i as f64 * 0.37));
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(0, &history));
    let mut config = config(
        SeriesKind::Price,
        1000.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );
    config.profile.base_window = Some(4);
    let store = Arc::new(MemoryIndexStore::new());

    run_backfill(store.clone(), &source, &config, &backfill_options(24))
        .await
        .unwrap();
    let before = store.snapshot().await;

    let stats = run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    assert_eq!(stats.sectors_processed, 1);
    assert_eq!(stats.records_updated(), 4); // A 2행 + ALL 2행
    for ts in [22 * HOUR, 23 * HOUR] {
        let old = before
            .iter()
            .find(|r| r.sector_key == "A" && r.timestamp == ts)
            .unwrap();
        let new = store.get("A", ts).await.unwrap();
        assert!((new.index_value - old.index_value).abs() <= 0.01);
    }
    assert_eq!(store.snapshot().await.len(), before.len());
}

#[tokio::test]
async fn incremental_volume_rerun_overwrites_same_timestamp() {
    let store = Arc::new(MemoryIndexStore::new());
    store
        .upsert_chunk(&[IndexRecord {
            sector_key: "VOL".to_string(),
            timestamp: 0,
            raw_value: 1000.0,
            index_value: 100.0,
            scale_constant: 100.0,
        }])
        .await
        .unwrap();
    let source = ScriptedKlineSource::new().with_history("AUSDT", volumes(&[(HOUR, 1250.0)]));
    let mut config = config(
        SeriesKind::Volume,
        100.0,
        vec![SectorDefinition::new("VOL", ["AUSDT"])],
    );
    config.profile.recent_limit = 1;

    run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();
    assert_eq!(store.get("VOL", HOUR).await.unwrap().index_value, 125.0);

    source.set_history("AUSDT", volumes(&[(HOUR, 1300.0)]));
    run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    let rows = store.snapshot().await;
    assert_eq!(rows_for(&rows, "VOL").len(), 2);
    assert_eq!(store.get("VOL", HOUR).await.unwrap().index_value, 130.0);
    assert_eq!(store.get("ALL", HOUR).await.unwrap().index_value, 130.0);
}

#[tokio::test]
async fn incremental_uses_stored_scale_constant() {
    let store = Arc::new(MemoryIndexStore::new());
    store
        .upsert_chunk(&[IndexRecord {
            sector_key: "A".to_string(),
            timestamp: 0,
            raw_value: 30.0,
            index_value: 1000.0,
            scale_constant: 1000.0,
        }])
        .await
        .unwrap();
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(1, &[40.0]));
    // 설정은 100이지만 저장된 행은 1000으로 계산됨
    let config = config(
        SeriesKind::Price,
        100.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );

    run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    let row = store.get("A", HOUR).await.unwrap();
    assert_eq!(row.index_value, 1333.33);
    assert_eq!(row.scale_constant, 1000.0);
}

#[tokio::test]
async fn incremental_without_history_falls_back_to_first_value() {
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(5, &[50.0, 55.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );
    let store = Arc::new(MemoryIndexStore::new());

    run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    assert_eq!(store.get("A", 5 * HOUR).await.unwrap().index_value, 1000.0);
    assert_eq!(store.get("A", 6 * HOUR).await.unwrap().index_value, 1100.0);
}

#[tokio::test]
async fn incremental_sector_failure_does_not_stop_others() {
    let source = ScriptedKlineSource::new()
        .with_history("AUSDT", closes(0, &[10.0]))
        .fail_after("AUSDT", 0, || ExchangeError::Timeout("30s".into()))
        .with_history("BUSDT", closes(0, &[20.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![
            SectorDefinition::new("A", ["AUSDT"]),
            SectorDefinition::new("B", ["BUSDT"]),
        ],
    );
    let store = Arc::new(MemoryIndexStore::new());

    let stats = run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    assert_eq!(stats.sectors_failed(), 1);
    assert_eq!(stats.failures[0].sector, "A");
    assert_eq!(stats.failures[0].stage, "FETCH_RECENT");
    assert_eq!(stats.sectors_processed, 1);
    assert!(store.get("A", 0).await.is_none());
    assert_eq!(store.get("B", 0).await.unwrap().index_value, 1000.0);
    assert_eq!(store.get("ALL", 0).await.unwrap().index_value, 1000.0);
}

#[tokio::test]
async fn incremental_falls_back_to_insert_without_constraint() {
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(0, &[10.0, 11.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );
    let store = Arc::new(MemoryIndexStore::without_unique_constraint());

    let stats = run_incremental(store.clone(), &source, &config, IncrementalOptions::default())
        .await
        .unwrap();

    assert_eq!(stats.write.upserted, 0);
    assert_eq!(stats.write.fallback_inserted, 4);
    assert_eq!(stats.records_updated(), 4);
}

#[tokio::test]
async fn incremental_zero_budget_starts_no_sector() {
    let source = ScriptedKlineSource::new().with_history("AUSDT", closes(0, &[10.0]));
    let config = config(
        SeriesKind::Price,
        1000.0,
        vec![SectorDefinition::new("A", ["AUSDT"])],
    );
    let store = Arc::new(MemoryIndexStore::new());

    let stats = run_incremental(
        store.clone(),
        &source,
        &config,
        IncrementalOptions {
            budget: Some(Duration::ZERO),
        },
    )
    .await
    .unwrap();

    assert!(stats.budget_exhausted);
    assert_eq!(stats.records_updated(), 0);
    assert_eq!(source.requests("AUSDT"), 0);
}
