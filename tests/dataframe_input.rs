use chrono::{TimeZone, Utc};
use labelcraft::config::SearchConfig;
use labelcraft::engines::windowing::{MinimumData, Offset, WindowSize};
use labelcraft::labeling::builtin::{self, Aggregation};
use labelcraft::{EventFrame, LabelcraftError, SearchEngine, Value};
use polars::df;
use polars::prelude::*;

#[test]
fn test_datetime_column_round_trips_through_labels() {
    let df = df! {
        "customer" => &["x", "y", "x", "x", "y"],
        "time" => &[0i64, 60_000_000, 120_000_000, 240_000_000, 300_000_000],
        "amount" => &[1.0, 10.0, 2.0, 4.0, 20.0],
    }
    .unwrap()
    .lazy()
    .with_column(col("time").cast(DataType::Datetime(TimeUnit::Microseconds, None)))
    .collect()
    .unwrap();

    let engine = SearchEngine::new("customer", "time", builtin::sum("amount"));
    let config = SearchConfig::new(WindowSize::Duration(Offset::minutes(3)))
        .with_minimum_data(MinimumData::Duration(Offset::minutes(1)));
    let labels = engine.search_dataframe(&df, &config).unwrap();

    let out = labels.to_dataframe().unwrap();
    let names: Vec<&str> = out.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["customer", "time", "sum_amount"]);
    assert_eq!(
        out.column("time").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Milliseconds, None)
    );

    let entities = out.column("customer").unwrap();
    let entities: Vec<Option<&str>> = entities.str().unwrap().into_iter().collect();
    assert_eq!(entities, vec![Some("x"), Some("x"), Some("y")]);

    let sums = out.column("sum_amount").unwrap();
    let sums: Vec<Option<f64>> = sums.f64().unwrap().into_iter().collect();
    assert_eq!(sums, vec![Some(2.0), Some(4.0), Some(20.0)]);

    let cutoffs = out.column("time").unwrap().cast(&DataType::Int64).unwrap();
    let cutoffs: Vec<Option<i64>> = cutoffs.i64().unwrap().into_iter().collect();
    assert_eq!(cutoffs, vec![Some(60_000), Some(240_000), Some(300_000)]);
}

#[test]
fn test_date_column() {
    let df = df! {
        "store" => &[1i32, 1, 2],
        "day" => &[0i32, 1, 0],
        "sales" => &[3i64, 4, 5],
    }
    .unwrap()
    .lazy()
    .with_column(col("day").cast(DataType::Date))
    .collect()
    .unwrap();

    let frame = EventFrame::from_dataframe(&df, "store", "day").unwrap();
    let store = frame.group("1").unwrap();
    assert_eq!(
        frame.timestamps(store),
        &[
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap()
        ]
    );
    assert_eq!(frame.rows(store)[1], vec![Value::Integer(4)]);

    let function = builtin::aggregate(Aggregation::Max, Some("sales")).unwrap();
    let engine = SearchEngine::new("store", "day", function);
    let labels = engine
        .search(&frame, &SearchConfig::new(WindowSize::All))
        .unwrap();
    let maxima: Vec<&Value> = labels.labels().collect();
    assert_eq!(maxima, vec![&Value::Float(4.0), &Value::Float(5.0)]);
}

#[test]
fn test_unparseable_time_text() {
    let df = df! {
        "customer" => &["a", "a"],
        "time" => &["2024-01-01", "yesterday"],
    }
    .unwrap();

    assert!(matches!(
        EventFrame::from_dataframe(&df, "customer", "time"),
        Err(LabelcraftError::Timestamp(_))
    ));
}

#[test]
fn test_write_csv() {
    let df = df! {
        "customer" => &["a", "a", "b"],
        "time" => &[0i64, 60_000, 0],
        "amount" => &[1.0, 2.0, 3.0],
    }
    .unwrap();

    let engine = SearchEngine::new("customer", "time", builtin::count());
    let labels = engine
        .search_dataframe(&df, &SearchConfig::new(WindowSize::All))
        .unwrap();

    let path = std::env::temp_dir().join(format!("labelcraft_labels_{}.csv", std::process::id()));
    labels.write_csv(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("customer,time,count"));
    assert_eq!(text.lines().count(), 3);
}
