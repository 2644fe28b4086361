//! Polars input adapter for [`EventFrame`].

use super::validator::DataValidator;
use crate::data::events::EventFrame;
use crate::error::{LabelcraftError, Result};
use crate::types::{parse_timestamp, Timestamp, Value};
use chrono::DateTime;
use polars::prelude::*;

const MILLIS_PER_DAY: i64 = 86_400_000;

impl EventFrame {
    /// Build an event arena from a polars frame.
    ///
    /// The time column may be a `Datetime`, a `Date`, integer epoch
    /// milliseconds, or text. Every other column becomes payload.
    pub fn from_dataframe(df: &DataFrame, entity_column: &str, time_column: &str) -> Result<EventFrame> {
        DataValidator::validate_event_columns(df, entity_column, time_column)?;

        let entities = entity_keys(df.column(entity_column)?)?;
        let timestamps = timestamps(df.column(time_column)?)?;

        let payload: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != entity_column && c.name().as_str() != time_column)
            .collect();
        let names: Vec<String> = payload.iter().map(|c| c.name().to_string()).collect();
        let cells = payload
            .iter()
            .map(|c| values(c))
            .collect::<Result<Vec<Vec<Value>>>>()?;

        let mut builder = EventFrame::builder(names);
        for (row, (entity, timestamp)) in entities.into_iter().zip(timestamps).enumerate() {
            let values = cells.iter().map(|column| column[row].clone()).collect();
            builder.push(entity, timestamp, values)?;
        }
        Ok(builder.build())
    }
}

fn entity_keys(column: &Column) -> Result<Vec<String>> {
    let keys = column.cast(&DataType::String)?;
    let keys = keys.str()?;
    (0..keys.len())
        .map(|i| {
            keys.get(i).map(str::to_string).ok_or_else(|| {
                LabelcraftError::DataLoading(format!(
                    "Null entity key in column '{}' at row {}",
                    column.name(),
                    i
                ))
            })
        })
        .collect()
}

fn timestamps(column: &Column) -> Result<Vec<Timestamp>> {
    let name = column.name().to_string();
    let null_at = |row: usize| {
        LabelcraftError::Timestamp(format!("Null or out of range value in '{}' at row {}", name, row))
    };

    match column.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = column.cast(&DataType::Int64)?;
            let physical = physical.i64()?;
            (0..physical.len())
                .map(|i| {
                    physical
                        .get(i)
                        .and_then(|v| match unit {
                            TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
                            TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                            TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                        })
                        .ok_or_else(|| null_at(i))
                })
                .collect()
        }
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            let days = days.i32()?;
            (0..days.len())
                .map(|i| {
                    days.get(i)
                        .and_then(|d| DateTime::from_timestamp_millis(d as i64 * MILLIS_PER_DAY))
                        .ok_or_else(|| null_at(i))
                })
                .collect()
        }
        dtype if dtype.is_integer() => {
            let millis = column.cast(&DataType::Int64)?;
            let millis = millis.i64()?;
            (0..millis.len())
                .map(|i| {
                    millis
                        .get(i)
                        .and_then(DateTime::from_timestamp_millis)
                        .ok_or_else(|| null_at(i))
                })
                .collect()
        }
        DataType::String => {
            let text = column.str()?;
            (0..text.len())
                .map(|i| match text.get(i) {
                    Some(s) => parse_timestamp(s).ok_or_else(|| {
                        LabelcraftError::Timestamp(format!(
                            "Cannot parse '{}' in '{}' at row {} as a timestamp",
                            s, name, i
                        ))
                    }),
                    None => Err(null_at(i)),
                })
                .collect()
        }
        other => Err(LabelcraftError::Timestamp(format!(
            "Column '{}' has type {:?}, which cannot be ordered as time",
            name, other
        ))),
    }
}

fn values(column: &Column) -> Result<Vec<Value>> {
    let dtype = column.dtype().clone();
    let out = match dtype {
        DataType::Boolean => {
            let ca = column.bool()?;
            (0..ca.len()).map(|i| ca.get(i).into()).collect()
        }
        DataType::String => {
            let ca = column.str()?;
            (0..ca.len()).map(|i| ca.get(i).into()).collect()
        }
        DataType::Datetime(_, _) | DataType::Date => timestamps(column)
            .map(|ts| ts.into_iter().map(|t| Value::String(t.to_rfc3339())).collect())
            .or_else(|_| as_text(column))?,
        ref d if d.is_integer() => {
            let cast = column.cast(&DataType::Int64)?;
            let ca = cast.i64()?;
            (0..ca.len()).map(|i| ca.get(i).into()).collect()
        }
        ref d if d.is_float() => {
            let cast = column.cast(&DataType::Float64)?;
            let ca = cast.f64()?;
            (0..ca.len()).map(|i| ca.get(i).into()).collect()
        }
        _ => as_text(column)?,
    };
    Ok(out)
}

fn as_text(column: &Column) -> Result<Vec<Value>> {
    let cast = column.cast(&DataType::String)?;
    let ca = cast.str()?;
    Ok((0..ca.len()).map(|i| ca.get(i).into()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use polars::df;

    #[test]
    fn test_epoch_millis_and_payload() {
        let df = df! {
            "customer" => &["a", "b", "a"],
            "time" => &[120_000i64, 0, 60_000],
            "amount" => &[Some(1.5), None, Some(3.0)],
            "flag" => &[true, false, true],
        }
        .unwrap();

        let frame = EventFrame::from_dataframe(&df, "customer", "time").unwrap();
        assert_eq!(frame.columns(), &["amount".to_string(), "flag".to_string()]);

        let a = frame.group("a").unwrap();
        assert_eq!(
            frame.timestamps(a),
            &[Utc.timestamp_opt(60, 0).unwrap(), Utc.timestamp_opt(120, 0).unwrap()]
        );
        assert_eq!(frame.rows(a)[0], vec![Value::Float(3.0), Value::Bool(true)]);

        let b = frame.group("b").unwrap();
        assert_eq!(frame.rows(b)[0][0], Value::Null);
    }

    #[test]
    fn test_string_timestamps() {
        let df = df! {
            "customer" => &[1i64, 1],
            "time" => &["2024-01-01 00:10:00", "2024-01-01"],
        }
        .unwrap();

        let frame = EventFrame::from_dataframe(&df, "customer", "time").unwrap();
        let group = frame.group("1").unwrap();
        assert_eq!(
            frame.timestamps(group)[0],
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_null_timestamp_is_fatal() {
        let df = df! {
            "customer" => &["a", "a"],
            "time" => &[Some(1i64), None],
        }
        .unwrap();

        assert!(matches!(
            EventFrame::from_dataframe(&df, "customer", "time"),
            Err(LabelcraftError::Timestamp(_))
        ));
    }
}
