use std::fs;
use salesdash::models::{BucketKind, GroupOrder, RawValue, YearFilter};
use salesdash::{aggregate, stats, storage};

const CSV_ROWS: &str = "\
order_date,total,qty,seller,region
2024-01-05,100.00,2,Ana,south
2024-01-20,50,,Bruno,north
2024-02-01,200,1,Ana,south
2024-02-03,oops,1,Bruno,north
,10,1,Ana,south
";

#[test]
fn load_csv_with_aliases_and_bad_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(&path, CSV_ROWS).unwrap();

    let rows = storage::load_rows(&path).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].date.as_deref(), Some("2024-01-05"));
    assert_eq!(rows[0].amount, Some(RawValue::Number(100.0)));
    assert_eq!(rows[1].quantity, None);
    assert_eq!(rows[3].amount, Some(RawValue::Text("oops".into())));
    assert_eq!(rows[4].date, None);

    let series = aggregate(
        &rows,
        BucketKind::ByGroupKey(GroupOrder::AmountDesc),
        YearFilter::All,
    )
    .unwrap();
    assert_eq!(series.skipped.len(), 2);
    assert_eq!(series.entries[0].label, "Ana");
    assert_eq!(series.entries[0].amount, 300.0);
    assert_eq!(series.entries[0].quantity, 3);
    assert_eq!(series.entries[1].label, "Bruno");
}

#[test]
fn load_json_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.json");
    fs::write(
        &path,
        r#"[{"date":"2023-12-31","amount":"5.5"},{"date":"2024-01-01","amount":4.5}]"#,
    )
    .unwrap();
    let rows = storage::load_rows(&path).unwrap();
    let series = aggregate(&rows, BucketKind::ByYear, YearFilter::All).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(stats::summarize(&series).total, 10.0);
}

#[test]
fn load_missing_file_names_the_path() {
    let err = storage::load_rows("/definitely/not/here.csv").unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.csv"));
}

#[test]
fn saved_csv_prefixes_formula_like_labels() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.json");
    fs::write(
        &src,
        r#"[{"date":"2024-01-01","amount":1,"seller":"=HYPERLINK(\"http://evil\")"},
            {"date":"2024-01-01","amount":3,"seller":"Ana"}]"#,
    )
    .unwrap();
    let rows = storage::load_rows(&src).unwrap();
    let series = aggregate(
        &rows,
        BucketKind::ByGroupKey(GroupOrder::Insertion),
        YearFilter::All,
    )
    .unwrap();

    let out = dir.path().join("series.csv");
    storage::save_series_csv(&series, &out).unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        ["bucket", "amount", "quantity", "count", "share"]
    );
    let recs: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert!(recs[0][0].starts_with('\''), "not prefixed: {}", &recs[0][0]);
    assert!(recs[0][0].contains("=HYPERLINK"));
    assert_eq!(&recs[1][0], "Ana");
    assert_eq!(&recs[1][4], "0.75");
}

#[test]
fn saved_json_round_trips_series_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.csv");
    fs::write(&src, CSV_ROWS).unwrap();
    let rows = storage::load_rows(&src).unwrap();
    let series = aggregate(&rows, BucketKind::ByMonth, YearFilter::Year(2024)).unwrap();

    let series_path = dir.path().join("series.json");
    storage::save_series_json(&series, &series_path).unwrap();
    let v: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&series_path).unwrap()).unwrap();
    assert_eq!(v["entries"].as_array().unwrap().len(), 2);
    assert_eq!(v["entries"][0]["label"], "Jan-2024");
    assert_eq!(v["skipped"].as_array().unwrap().len(), 2);

    let summary_path = dir.path().join("summary.json");
    storage::save_summary_json(&stats::summarize(&series), &summary_path).unwrap();
    let v: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(v["total"], 350.0);
    assert_eq!(v["max"]["label"], "Feb-2024");
}

#[test]
fn oversized_integer_cell_skips_only_its_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(
        &path,
        "date,amount,quantity\n2024-01-01,10,1\n2024-01-02,20,99999999999999999999999\n",
    )
    .unwrap();

    let rows = storage::load_rows(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(matches!(rows[1].quantity, Some(RawValue::Number(_))));

    let series = aggregate(&rows, BucketKind::ByMonth, YearFilter::All).unwrap();
    assert_eq!(series.entries[0].amount, 10.0);
    assert_eq!(series.skipped.len(), 1);
    assert_eq!(series.skipped[0].index, 1);
}
