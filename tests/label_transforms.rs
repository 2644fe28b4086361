use chrono::{TimeDelta, TimeZone, Utc};
use labelcraft::config::SearchConfig;
use labelcraft::engines::windowing::{MinimumData, Offset, Span, WindowSize};
use labelcraft::labeling::builtin;
use labelcraft::labels::{SampleSpec, TransformRecord};
use labelcraft::{
    BinOptions, Bins, EventFrame, LabelTable, LabelType, LabelcraftError, SampleOptions, SearchEngine, Timestamp,
    Value,
};
use std::collections::BTreeMap;

fn at(minute: i64) -> Timestamp {
    Utc.timestamp_opt(minute * 60, 0).unwrap()
}

fn search(events: &[(&str, i64, f64)], config: &SearchConfig) -> LabelTable {
    let mut builder = EventFrame::builder(["amount"]);
    for &(entity, minute, amount) in events {
        builder
            .push(entity, at(minute), vec![Value::Float(amount)])
            .unwrap();
    }
    SearchEngine::new("entity_id", "time", builtin::sum("amount"))
        .search(&builder.build(), config)
        .unwrap()
}

/// Two windows whose amounts sum to 10 each; the second is partial and
/// holds the events at 40 and 50.
fn tens() -> LabelTable {
    let events: Vec<(&str, i64, f64)> = (0..6).map(|i| ("A", i * 10, 5.0)).collect();
    let config = SearchConfig::new(WindowSize::Duration(Offset::minutes(20)))
        .with_gap(Span::Duration(Offset::minutes(20)))
        .with_minimum_data(MinimumData::Duration(Offset::minutes(20)));
    search(&events, &config)
}

/// One record per event with labels 1 through 10.
fn one_to_ten() -> LabelTable {
    let events: Vec<(&str, i64, f64)> = (1..=10)
        .map(|i| (if i <= 5 { "A" } else { "B" }, i, i as f64))
        .collect();
    search(&events, &SearchConfig::new(WindowSize::Rows(1)))
}

fn floats(table: &LabelTable) -> Vec<f64> {
    table.labels().map(|l| l.as_f64().unwrap()).collect()
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let table = tens();
    assert_eq!(floats(&table), vec![10.0, 10.0]);

    let at_ten = table.threshold(10.0).unwrap();
    assert_eq!(at_ten.labels().cloned().collect::<Vec<_>>(), vec![Value::Bool(true); 2]);
    assert_eq!(at_ten.label_type(), LabelType::Discrete);

    let at_eleven = table.threshold(11.0).unwrap();
    assert_eq!(at_eleven.labels().cloned().collect::<Vec<_>>(), vec![Value::Bool(false); 2]);

    // the source table is untouched
    assert_eq!(floats(&table), vec![10.0, 10.0]);
    assert!(table.transforms().is_empty());
}

#[test]
fn test_threshold_twice_is_idempotent() {
    let once = one_to_ten().threshold(6.0).unwrap();
    let twice = once.threshold(6.0).unwrap();

    assert_eq!(
        once.labels().collect::<Vec<_>>(),
        twice.labels().collect::<Vec<_>>()
    );
    assert_eq!(twice.transforms().len(), 2);

    let other = once.threshold(3.0);
    assert!(matches!(other, Err(LabelcraftError::Transform(_))));
}

#[test]
fn test_threshold_in_place_logs_transform() {
    let mut table = one_to_ten();
    table.threshold_in_place(5.0).unwrap();

    assert_eq!(table.transforms(), &[TransformRecord::Threshold { value: 5.0 }]);
    let trues = table.labels().filter(|l| **l == Value::Bool(true)).count();
    assert_eq!(trues, 6);
}

#[test]
fn test_equal_width_bins() {
    let binned = one_to_ten().bin(Bins::Count(2), BinOptions::default()).unwrap();

    match &binned.transforms()[0] {
        TransformRecord::Bin { edges, labels, quantiles, .. } => {
            assert!(!quantiles);
            assert_eq!(edges.len(), 3);
            assert!((edges[0] - 0.991).abs() < 1e-9);
            assert_eq!(edges[1], 5.5);
            assert_eq!(edges[2], 10.0);
            assert_eq!(labels, &vec!["(0.991, 5.500]".to_string(), "(5.500, 10.000]".to_string()]);
        }
        other => panic!("expected bin transform, got {:?}", other),
    }

    let distribution = binned.distribution();
    assert_eq!(
        distribution,
        vec![
            (Value::String("(0.991, 5.500]".to_string()), 5),
            (Value::String("(5.500, 10.000]".to_string()), 5),
        ]
    );
}

#[test]
fn test_quantile_bins_reported_by_describe() {
    let options = BinOptions {
        precision: Some(2),
        ..BinOptions::quantiles()
    };
    let binned = one_to_ten().bin(Bins::Count(4), options).unwrap();

    let description = binned.describe();
    assert_eq!(description.transforms, binned.transforms().to_vec());
    match &description.transforms[0] {
        TransformRecord::Bin { edges, labels, .. } => {
            assert_eq!(edges, &vec![1.0, 3.25, 5.5, 7.75, 10.0]);
            assert_eq!(labels[0], "[1.00, 3.25]");
            assert_eq!(labels[3], "(7.75, 10.00]");
        }
        other => panic!("expected bin transform, got {:?}", other),
    }

    let counts: BTreeMap<String, usize> = binned
        .distribution()
        .into_iter()
        .map(|(label, n)| (label.to_string(), n))
        .collect();
    assert_eq!(counts["[1.00, 3.25]"], 3);
    assert_eq!(counts["(3.25, 5.50]"], 2);
    assert_eq!(counts["(5.50, 7.75]"], 2);
    assert_eq!(counts["(7.75, 10.00]"], 3);

    let report = description.to_string();
    assert!(report.contains("Transforms"));
    assert!(report.contains("7.75"));
}

#[test]
fn test_close_edges_get_distinct_names() {
    let events = [("A", 1, 1.0001), ("A", 2, 1.00025), ("A", 3, 1.0004)];
    let table = search(&events, &SearchConfig::new(WindowSize::Rows(1)));
    let binned = table.bin(Bins::Count(3), BinOptions::default()).unwrap();

    match &binned.transforms()[0] {
        TransformRecord::Bin { labels, precision, .. } => {
            assert_eq!(*precision, 4);
            assert_eq!(labels[2], "(1.0003, 1.0004]");
            let unique: std::collections::BTreeSet<&String> = labels.iter().collect();
            assert_eq!(unique.len(), 3);
        }
        other => panic!("expected bin transform, got {:?}", other),
    }

    let distribution = binned.distribution();
    assert_eq!(distribution.len(), 3);
    assert!(distribution.iter().all(|(_, n)| *n == 1));
}

#[test]
fn test_explicit_edges_and_custom_labels() {
    let options = BinOptions {
        labels: Some(vec!["low".to_string(), "high".to_string()]),
        ..BinOptions::default()
    };
    let binned = one_to_ten().bin(Bins::Edges(vec![2.0, 5.0, 8.0]), options).unwrap();

    let labels: Vec<String> = binned.labels().map(|l| l.to_string()).collect();
    assert_eq!(
        labels,
        vec!["null", "null", "low", "low", "low", "high", "high", "high", "null", "null"]
    );

    let wrong = BinOptions {
        labels: Some(vec!["only".to_string()]),
        ..BinOptions::default()
    };
    assert!(one_to_ten().bin(Bins::Edges(vec![2.0, 5.0, 8.0]), wrong).is_err());
    assert!(one_to_ten().bin(Bins::Edges(vec![5.0, 2.0]), BinOptions::default()).is_err());
}

#[test]
fn test_bin_needs_numeric_labels() {
    let booleans = one_to_ten().threshold(5.0).unwrap();
    assert!(matches!(
        booleans.bin(Bins::Count(2), BinOptions::default()),
        Err(LabelcraftError::Transform(_))
    ));
}

#[test]
fn test_apply_lead() {
    let table = tens();
    let cutoffs: Vec<Timestamp> = table.cutoffs().collect();

    let unchanged = table.apply_lead(Offset::zero()).unwrap();
    assert_eq!(unchanged.cutoffs().collect::<Vec<_>>(), cutoffs);
    assert_eq!(unchanged.labels().collect::<Vec<_>>(), table.labels().collect::<Vec<_>>());
    assert_eq!(unchanged.transforms().len(), 1);

    let shifted = table.apply_lead(Offset::minutes(20)).unwrap();
    assert_eq!(shifted.cutoffs().collect::<Vec<_>>(), vec![at(0), at(20)]);
    assert_eq!(floats(&shifted), vec![10.0, 10.0]);
}

#[test]
fn test_apply_lead_before_first_event_fails_atomically() {
    let mut table = tens();
    let before = table.clone();

    let result = table.apply_lead_in_place(Offset::minutes(21));
    assert!(matches!(
        result,
        Err(LabelcraftError::InvalidParameter { ref parameter, .. }) if parameter == "lead"
    ));
    assert_eq!(table, before);

    let negative = Offset::new(TimeDelta::minutes(-5));
    assert!(table.apply_lead(negative).is_err());
}

#[test]
fn test_sample_is_reproducible_and_ordered() {
    let table = one_to_ten();
    let options = SampleOptions {
        seed: 7,
        ..SampleOptions::default()
    };

    let first = table.sample(SampleSpec::N(4), options).unwrap();
    let second = table.sample(SampleSpec::N(4), options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    let values = floats(&first);
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(values, sorted);

    assert_eq!(table.sample(SampleSpec::Frac(0.5), options).unwrap().len(), 5);
    assert!(table.sample(SampleSpec::N(20), options).is_err());

    let replaced = SampleOptions {
        replace: true,
        ..options
    };
    assert_eq!(table.sample(SampleSpec::N(20), replaced).unwrap().len(), 20);
}

#[test]
fn test_sample_per_label_and_per_entity() {
    let table = one_to_ten().threshold(8.0).unwrap();
    let mut counts = BTreeMap::new();
    counts.insert("true".to_string(), 2);
    counts.insert("false".to_string(), 1);

    let sampled = table
        .sample(SampleSpec::PerLabel(counts), SampleOptions::default())
        .unwrap();
    let trues = sampled.labels().filter(|l| **l == Value::Bool(true)).count();
    assert_eq!(trues, 2);
    assert_eq!(sampled.len(), 3);

    let per_entity = SampleOptions {
        per_entity: true,
        seed: 3,
        ..SampleOptions::default()
    };
    let sampled = one_to_ten().sample(SampleSpec::N(2), per_entity).unwrap();
    assert_eq!(
        sampled.count_per_entity(),
        vec![("A".to_string(), 2), ("B".to_string(), 2)]
    );
    assert!(matches!(
        sampled.transforms().last(),
        Some(TransformRecord::Sample { before: 10, after: 4, .. })
    ));
}

#[test]
fn test_describe_reports_settings_and_counts() {
    let table = tens().threshold(10.0).unwrap();
    let description = table.describe();

    assert_eq!(description.total, 2);
    assert_eq!(description.distribution, vec![(Value::Bool(true), 2)]);
    assert!(description
        .settings
        .contains(&("window_size".to_string(), "20min".to_string())));
    assert!(description
        .settings
        .contains(&("minimum_data".to_string(), "20min".to_string())));
    assert_eq!(description.entity_counts, vec![("A".to_string(), 2)]);

    let report = description.to_string();
    assert!(report.contains("Label Distribution (sum_amount)"));
    assert!(report.contains("1. threshold: label >= 10"));
}

#[test]
fn test_continuous_summary() {
    let summary = one_to_ten().describe().summary.unwrap();
    assert_eq!(summary.count, 10);
    assert_eq!(summary.mean, 5.5);
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.median, 5.5);
    assert_eq!(summary.max, 10.0);
    assert!((summary.std - 3.0276503540974917).abs() < 1e-12);
}

#[test]
fn test_count_by_time_is_cumulative() {
    let table = one_to_ten();
    let counts = table.count_by_time();
    assert_eq!(counts.first(), Some(&(at(1), 1)));
    assert_eq!(counts.last(), Some(&(at(10), 10)));
}

#[test]
fn test_json_round_trip_keeps_metadata() {
    let table = one_to_ten()
        .bin(Bins::Count(3), BinOptions::quantiles())
        .unwrap()
        .apply_lead(Offset::zero())
        .unwrap();
    let path = std::env::temp_dir().join(format!("labelcraft_table_{}.json", std::process::id()));

    table.save_json(&path).unwrap();
    let loaded = LabelTable::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, table);
    assert_eq!(loaded.describe().to_string(), table.describe().to_string());
}
