mod common;

use watchlens::export::ExportBackendKind;
use watchlens::normalize::{NormalizeError, TimestampFormats};
use watchlens::pipeline::{self, LoadError, load_history};

use common::{run_options, test_config, write_fixture};

#[test]
fn malformed_timestamp_aborts_the_run() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp_dir.path(),
        "sample_data.csv",
        "Title,Date\nGood,2024-01-01\nBad,31/31/2024\nAlso bad,yesterday\n",
    );
    let output = temp_dir.path().join("output");

    let (cfg, hash) = test_config("malformed");
    let opts = run_options(
        &cfg,
        &hash,
        temp_dir.path(),
        &output,
        Some(ExportBackendKind::Jsonl),
    );
    let mut buf = Vec::new();
    let err = pipeline::run_analysis(&cfg, &opts, &mut buf).expect_err("must fail");

    let cause = err
        .downcast_ref::<LoadError>()
        .expect("load error in chain");
    match cause {
        LoadError::Normalize(NormalizeError::MalformedTimestamp { row, value }) => {
            assert_eq!(*row, 2);
            assert_eq!(value, "31/31/2024");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(buf.is_empty());
    assert!(!output.exists());
}

#[test]
fn missing_date_column_is_reported() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(temp_dir.path(), "history.csv", "Title,When\nA,2024-01-01\n");
    let (cfg, _) = test_config("missing_date");

    let err = load_history(
        &[path],
        temp_dir.path(),
        &TimestampFormats::from_config(&cfg),
    )
    .expect_err("must fail");
    assert!(matches!(
        err,
        LoadError::Normalize(NormalizeError::MissingField { row: 1, field: "date" })
    ));
}

#[test]
fn ragged_rows_and_unknown_columns_pass_through() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        temp_dir.path(),
        "history.csv",
        "Title,Date,Profile Name,Device\nA,2024-01-01,Sam,TV\nB,2024-01-02\n",
    );
    let (cfg, _) = test_config("ragged");

    let history = load_history(
        &[path.clone()],
        temp_dir.path(),
        &TimestampFormats::from_config(&cfg),
    )
    .expect("load");
    assert_eq!(history.path, path);
    assert_eq!(history.records.len(), 2);
    assert_eq!(
        history.records[0].extra.get("Device").map(String::as_str),
        Some("TV")
    );
    assert_eq!(history.records[1].profile_name, None);
    assert!(history.records[1].extra.is_empty());
}

#[test]
fn explicit_absolute_candidate_ignores_search_dir() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let other_dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(temp_dir.path(), "mine.csv", "Title,Date\nA,2024-01-01\n");
    let (cfg, _) = test_config("absolute");

    let history = load_history(
        &[path.clone()],
        other_dir.path(),
        &TimestampFormats::from_config(&cfg),
    )
    .expect("load");
    assert_eq!(history.path, path);
    assert_eq!(history.records.len(), 1);
}
