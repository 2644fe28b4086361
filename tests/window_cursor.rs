use chrono::{TimeZone, Utc};
use labelcraft::engines::windowing::{MinimumData, Offset, Span, Window, WindowCursor, WindowPlan, WindowSize};
use labelcraft::Timestamp;

fn minutes(values: &[i64]) -> Vec<Timestamp> {
    values
        .iter()
        .map(|m| Utc.timestamp_opt(m * 60, 0).unwrap())
        .collect()
}

fn at(minute: i64) -> Timestamp {
    Utc.timestamp_opt(minute * 60, 0).unwrap()
}

#[test]
fn test_duration_windows_are_half_open() {
    let ts = minutes(&[0, 10, 20, 30, 40]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(20)))
        .with_gap(Span::Duration(Offset::minutes(20)))
        .with_minimum_data(MinimumData::Duration(Offset::minutes(20)));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].start, at(20));
    assert_eq!(windows[0].end, at(40));
    assert!(!windows[0].closed_end);
    // the event at 40 belongs to the next window, not this one
    assert!(!windows[0].contains(at(40)));
    assert_eq!(windows[0].rows, 2..4);

    assert_eq!(windows[1].start, at(40));
    assert!(windows[1].partial);
    assert!(windows[1].closed_end);
    assert_eq!(windows[1].end, at(40));
    assert_eq!(windows[1].rows, 4..5);
}

#[test]
fn test_overlapping_windows_with_small_gap() {
    let ts = minutes(&[0, 10, 20, 30]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(20)))
        .with_gap(Span::Duration(Offset::minutes(10)));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    let starts: Vec<Timestamp> = windows.iter().map(|w| w.start).collect();
    assert_eq!(starts, vec![at(0), at(10), at(20), at(30)]);
    assert_eq!(windows[0].rows, 0..2);
    assert_eq!(windows[1].rows, 1..3);
    assert!(!windows[1].partial);
    assert!(windows[2].partial);
    assert_eq!(windows[2].rows, 2..4);
}

#[test]
fn test_sparse_stream_yields_empty_windows() {
    let ts = minutes(&[0, 100]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(30)));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows.len(), 4);
    assert_eq!(windows[0].rows, 0..1);
    assert!(windows[1].is_empty());
    assert!(windows[2].is_empty());
    assert_eq!(windows[3].start, at(90));
    assert_eq!(windows[3].rows, 1..2);
    assert!(windows[3].partial);
}

#[test]
fn test_row_count_windows() {
    let ts = minutes(&[0, 1, 2, 3, 4]);
    let plan = WindowPlan::new(WindowSize::Rows(2)).with_minimum_data(MinimumData::Rows(1));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].start, at(1));
    assert_eq!(windows[0].end, at(2));
    assert!(windows[0].closed_end);
    assert_eq!(windows[0].rows, 1..3);
    assert_eq!(windows[1].rows, 3..5);
    assert!(!windows[1].partial);
}

#[test]
fn test_minimum_data_longer_than_stream() {
    let ts = minutes(&[0, 10]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(5)))
        .with_minimum_data(MinimumData::Duration(Offset::hours(1)));
    let cursor = WindowCursor::new(&ts, plan);

    assert_eq!(cursor.first_cutoff(), None);
    assert_eq!(cursor.count(), 0);
}

#[test]
fn test_explicit_first_cutoff() {
    let ts = minutes(&[0, 10, 20, 30]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(10)))
        .with_minimum_data(MinimumData::Cutoff(at(15)));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows[0].start, at(15));
    assert_eq!(windows[0].rows, 2..3);
    assert_eq!(windows.len(), 2);
}

#[test]
fn test_maximum_data_caps_cutoffs() {
    let ts = minutes(&[0, 10, 20, 30, 40, 50]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(10)))
        .with_maximum_data(Span::Duration(Offset::minutes(20)));
    let starts: Vec<Timestamp> = WindowCursor::new(&ts, plan).map(|w| w.start).collect();

    assert_eq!(starts, vec![at(0), at(10), at(20)]);
}

#[test]
fn test_all_data_single_window() {
    let ts = minutes(&[0, 10, 20]);
    let plan = WindowPlan::new(WindowSize::All).with_minimum_data(MinimumData::Rows(1));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].rows, 1..3);
    assert_eq!(windows[0].next_start, None);
    assert!(!windows[0].partial);
}

#[test]
fn test_every_row_lies_inside_its_window() {
    let ts = minutes(&[0, 3, 3, 7, 12, 12, 19, 25, 26, 26, 26, 40]);
    let size = WindowSize::Duration(Offset::minutes(7));
    let plans = [
        WindowPlan::new(size)
            .with_gap(Span::Duration(Offset::minutes(4)))
            .with_minimum_data(MinimumData::Duration(Offset::minutes(2))),
        WindowPlan::new(size)
            .with_gap(Span::Rows(2))
            .with_minimum_data(MinimumData::Rows(2)),
        WindowPlan::new(size)
            .with_gap(Span::Rows(3))
            .with_minimum_data(MinimumData::Rows(5)),
        WindowPlan::new(WindowSize::All).with_minimum_data(MinimumData::Rows(2)),
    ];

    for plan in plans {
        let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();
        assert!(!windows.is_empty());
        for window in windows {
            for &t in &ts[window.rows.clone()] {
                assert!(window.contains(t), "{} outside window {:?}", t, window);
            }
            let outside = ts
                .iter()
                .enumerate()
                .filter(|(i, _)| !window.rows.contains(i))
                .all(|(_, t)| !window.contains(*t));
            assert!(outside, "window {:?} misses a row it contains", window);
        }
    }
}

#[test]
fn test_row_placed_cutoff_keeps_tied_rows() {
    let ts = minutes(&[0, 10, 10, 20]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(15)))
        .with_minimum_data(MinimumData::Rows(2));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows[0].start, at(10));
    assert_eq!(windows[0].rows, 1..4);

    let ts = minutes(&[0, 5, 5, 9, 12]);
    let plan = WindowPlan::new(WindowSize::Duration(Offset::minutes(3))).with_gap(Span::Rows(2));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    let starts: Vec<Timestamp> = windows.iter().map(|w| w.start).collect();
    assert_eq!(starts, vec![at(0), at(5), at(12)]);
    assert_eq!(windows[1].rows, 1..3);
    // steps still count positional rows: 0, 2, 4
    assert_eq!(windows[2].rows, 4..5);
}

#[test]
fn test_row_windows_stay_positional() {
    let ts = minutes(&[0, 10, 10, 20]);
    let plan = WindowPlan::new(WindowSize::Rows(2)).with_minimum_data(MinimumData::Rows(2));
    let windows: Vec<Window> = WindowCursor::new(&ts, plan).collect();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].rows, 2..4);
}
