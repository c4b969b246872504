use chrono::NaiveDate;
use core_types::DateRange;
use data_provider::{JsonDirectoryProvider, ProviderError, ReturnSeriesProvider};
use std::fs;

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
}

#[tokio::test]
async fn reads_sorts_and_filters_observations() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("gld.json"),
        r#"[
            {"date": "2020-01-03", "return": 0.002},
            {"date": "2020-01-02", "return": null},
            {"date": "2020-01-06", "return": -0.001},
            {"date": "2019-12-31", "return": 0.004}
        ]"#,
    )
    .unwrap();

    let provider = JsonDirectoryProvider::new(dir.path());
    let series = provider
        .fetch_returns("gld", range("2020-01-01", "2020-01-31"))
        .await
        .unwrap();

    assert_eq!(series.name(), "gld");
    assert_eq!(series.len(), 3);
    assert_eq!(series.start_date(), NaiveDate::from_ymd_opt(2020, 1, 2));
    assert!(series.values()[0].is_nan());
    assert_eq!(&series.values()[1..], &[0.002, -0.001]);
}

#[tokio::test]
async fn missing_file_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let provider = JsonDirectoryProvider::new(dir.path());
    let err = provider
        .fetch_returns("nope", range("2020-01-01", "2020-12-31"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::DataUnavailable { ref ticker, .. } if ticker == "nope"));
}

#[tokio::test]
async fn malformed_file_is_a_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
    let provider = JsonDirectoryProvider::new(dir.path());
    let err = provider
        .fetch_returns("bad", range("2020-01-01", "2020-12-31"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Deserialization { .. }));
}

#[tokio::test]
async fn duplicate_dates_are_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("dup.json"),
        r#"[{"date": "2020-01-02", "return": 0.1}, {"date": "2020-01-02", "return": 0.2}]"#,
    )
    .unwrap();
    let provider = JsonDirectoryProvider::new(dir.path());
    let err = provider
        .fetch_returns("dup", range("2020-01-01", "2020-12-31"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidData(_)));
}
