//! End-to-end extraction tests: census fixtures in, ranked metrics out.

use graveyard_core::domain::{CensusRecord, FailureMetricRecord, MonthLabel, TickerStatus};
use graveyard_runner::config::ExtractConfig;
use graveyard_runner::export::write_census;
use graveyard_runner::extract::run_extraction;
use graveyard_runner::progress::SilentProgress;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Rows: (ticker, timestamp, close, volume).
fn write_snapshot(dir: &Path, month: &str, rows: &[(&str, i64, f64, f64)]) {
    let tickers: Vec<&str> = rows.iter().map(|r| r.0).collect();
    let timestamps: Vec<i64> = rows.iter().map(|r| r.1).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let volumes: Vec<f64> = rows.iter().map(|r| r.3).collect();

    let mut df = DataFrame::new(vec![
        Column::new("ticker".into(), tickers),
        Column::new("timestamp".into(), timestamps),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .unwrap();

    let file = fs::File::create(dir.join(format!("ohlcv_{month}.parquet"))).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();
}

/// `n` constant-price rows for one ticker.
fn trace_rows(ticker: &str, n: usize, close: f64, volume: f64) -> Vec<(&str, i64, f64, f64)> {
    (0..n).map(|i| (ticker, i as i64, close, volume)).collect()
}

fn dead_record(ticker: &str, birth: &str, death: &str, destruction: f64) -> CensusRecord {
    CensusRecord {
        ticker: ticker.into(),
        birth_month: MonthLabel::new(birth),
        death_month: MonthLabel::new(death),
        status: TickerStatus::Delisted,
        all_time_high: 100.0,
        all_time_low: 100.0 * (1.0 - destruction),
        destruction_pct: Some(destruction),
    }
}

fn alive_record(ticker: &str) -> CensusRecord {
    CensusRecord {
        ticker: ticker.into(),
        birth_month: MonthLabel::new("2019-01"),
        death_month: MonthLabel::new("2024-06"),
        status: TickerStatus::Alive,
        all_time_high: 100.0,
        all_time_low: 50.0,
        destruction_pct: None,
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    data_dir: PathBuf,
    config: ExtractConfig,
}

fn workspace(records: &[CensusRecord]) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let census_path = dir.path().join("graveyard_index.csv");
    write_census(&census_path, records).unwrap();

    let config = ExtractConfig {
        data_dir: data_dir.clone(),
        census_path,
        metrics_path: dir.path().join("death_metrics.csv"),
        ..Default::default()
    };

    Workspace {
        _dir: dir,
        data_dir,
        config,
    }
}

fn read_metrics(path: &Path) -> Vec<FailureMetricRecord> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn liquidity_floor_drops_thin_traces() {
    let ws = workspace(&[
        dead_record("THIN", "2019-01", "2021-07", 0.95),
        dead_record("THICK", "2019-01", "2021-07", 0.95),
    ]);

    let mut rows = trace_rows("THIN", 59, 10.0, 5.0);
    rows.extend(trace_rows("THICK", 60, 10.0, 5.0));
    write_snapshot(&ws.data_dir, "2021-07", &rows);

    let summary = run_extraction(&ws.config, &SilentProgress).unwrap();
    assert_eq!(summary.records, 1);

    let metrics = read_metrics(&ws.config.metrics_path);
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].ticker, "THICK");
    assert_eq!(metrics[0].death_date, MonthLabel::new("2021-07"));
}

#[test]
fn output_is_ranked_by_dollar_volume_and_capped() {
    let ws = workspace(&[
        dead_record("LOW", "2019-01", "2021-07", 0.95),
        dead_record("MID", "2019-01", "2021-07", 0.95),
        dead_record("TOP", "2019-01", "2021-07", 0.95),
    ]);

    let mut rows = trace_rows("LOW", 60, 10.0, 1.0);
    rows.extend(trace_rows("MID", 60, 10.0, 10.0));
    rows.extend(trace_rows("TOP", 60, 10.0, 100.0));
    write_snapshot(&ws.data_dir, "2021-07", &rows);

    let mut config = ws.config.clone();
    config.sample_size = 2;
    let summary = run_extraction(&config, &SilentProgress).unwrap();
    assert_eq!(summary.records, 2);

    let metrics = read_metrics(&config.metrics_path);
    let tickers: Vec<&str> = metrics.iter().map(|m| m.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["TOP", "MID"]);
    assert!(metrics[0].dollar_volume >= metrics[1].dollar_volume);
}

#[test]
fn metric_values_match_the_formulas() {
    let ws = workspace(&[dead_record("DEAD", "2019-01", "2021-07", 0.95)]);
    // 60 rows, constant close 10, constant volume 2.
    write_snapshot(&ws.data_dir, "2021-07", &trace_rows("DEAD", 60, 10.0, 2.0));

    run_extraction(&ws.config, &SilentProgress).unwrap();
    let metrics = read_metrics(&ws.config.metrics_path);
    let m = &metrics[0];

    // dollar volume = sum(volume) * mean(close) = 120 * 10
    assert!((m.dollar_volume - 1200.0).abs() < 1e-9);
    // constant volume: late mean 2 / (early mean 2 + 1)
    assert!((m.exodus_ratio - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(m.volatility, 0.0);
    assert_eq!(m.final_drop_pct, 0.0);
}

#[test]
fn destruction_threshold_gates_candidates() {
    let ws = workspace(&[
        dead_record("WIPED", "2019-01", "2021-07", 0.95),
        dead_record("BRUISED", "2019-01", "2021-07", 0.50),
        alive_record("LIVE"),
    ]);

    let mut rows = trace_rows("WIPED", 60, 10.0, 5.0);
    rows.extend(trace_rows("BRUISED", 60, 10.0, 5.0));
    write_snapshot(&ws.data_dir, "2021-07", &rows);

    let summary = run_extraction(&ws.config, &SilentProgress).unwrap();
    assert_eq!(summary.census_rows, 3);
    assert_eq!(summary.candidates, 1);

    let metrics = read_metrics(&ws.config.metrics_path);
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].ticker, "WIPED");
}

#[test]
fn raising_the_threshold_never_adds_candidates() {
    let records = vec![
        dead_record("A", "2019-01", "2021-07", 0.85),
        dead_record("B", "2019-01", "2021-07", 0.90),
        dead_record("C", "2019-01", "2021-07", 0.99),
    ];

    let ws = workspace(&records);
    let mut low = ws.config.clone();
    low.min_destruction = 0.80;
    let mut high = ws.config.clone();
    high.min_destruction = 0.95;

    let low_summary = run_extraction(&low, &SilentProgress).unwrap();
    let high_summary = run_extraction(&high, &SilentProgress).unwrap();

    assert_eq!(low_summary.candidates, 3);
    assert_eq!(high_summary.candidates, 1);
    assert!(high_summary.candidates <= low_summary.candidates);
}

#[test]
fn search_pool_keeps_longest_lived_candidates() {
    let ws = workspace(&[
        dead_record("OLD", "2015-01", "2020-01", 0.95),
        dead_record("YOUNG", "2019-10", "2020-02", 0.95),
    ]);

    write_snapshot(&ws.data_dir, "2020-01", &trace_rows("OLD", 60, 10.0, 5.0));
    write_snapshot(&ws.data_dir, "2020-02", &trace_rows("YOUNG", 60, 10.0, 5.0));

    let mut config = ws.config.clone();
    config.search_pool = 1;
    let summary = run_extraction(&config, &SilentProgress).unwrap();

    assert_eq!(summary.pool, 1);
    assert_eq!(summary.files_read, 1);

    let metrics = read_metrics(&config.metrics_path);
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].ticker, "OLD");
}

#[test]
fn missing_death_file_omits_its_candidates() {
    let ws = workspace(&[
        dead_record("GONE", "2019-01", "2020-01", 0.95),
        dead_record("KEPT", "2019-01", "2020-02", 0.95),
    ]);
    // Only KEPT's death month exists on disk.
    write_snapshot(&ws.data_dir, "2020-02", &trace_rows("KEPT", 60, 10.0, 5.0));

    let summary = run_extraction(&ws.config, &SilentProgress).unwrap();
    assert_eq!(summary.files_missing, 1);
    assert_eq!(summary.files_read, 1);
    assert_eq!(summary.records, 1);

    let metrics = read_metrics(&ws.config.metrics_path);
    assert_eq!(metrics[0].ticker, "KEPT");
}

#[test]
fn corrupt_death_file_omits_its_candidates() {
    let ws = workspace(&[
        dead_record("CORRUPT", "2019-01", "2020-01", 0.95),
        dead_record("KEPT", "2019-01", "2020-02", 0.95),
    ]);
    fs::write(ws.data_dir.join("ohlcv_2020-01.parquet"), b"garbage").unwrap();
    write_snapshot(&ws.data_dir, "2020-02", &trace_rows("KEPT", 60, 10.0, 5.0));

    let summary = run_extraction(&ws.config, &SilentProgress).unwrap();
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.records, 1);
}

#[test]
fn no_qualifying_candidates_is_a_clean_exit() {
    let ws = workspace(&[alive_record("LIVE"), dead_record("MILD", "2019-01", "2020-01", 0.10)]);

    let summary = run_extraction(&ws.config, &SilentProgress).unwrap();
    assert_eq!(summary.candidates, 0);
    assert_eq!(summary.records, 0);
    assert!(summary.metrics_path.is_none());
    assert!(!ws.config.metrics_path.exists());
}

#[test]
fn malformed_census_aborts_the_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let census_path = dir.path().join("graveyard_index.csv");
    fs::write(&census_path, "ticker,birth_month\nAAA,2020-01\n").unwrap();

    let config = ExtractConfig {
        data_dir: dir.path().join("data"),
        census_path,
        metrics_path: dir.path().join("death_metrics.csv"),
        ..Default::default()
    };

    assert!(run_extraction(&config, &SilentProgress).is_err());
}
