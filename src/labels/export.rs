use super::table::LabelTable;
use crate::error::{LabelcraftError, Result};
use crate::types::Value;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

static NULL: Value = Value::Null;

/// Build a typed polars column from label-like values.
///
/// Numbers become Float64, all-boolean columns Boolean, anything else String.
fn value_column(name: &str, values: &[&Value]) -> Column {
    let present = || values.iter().filter(|v| !v.is_null());
    if present().all(|v| v.is_numeric()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.as_f64().filter(|x| !x.is_nan())).collect();
        Column::new(name.into(), data)
    } else if present().all(|v| v.as_bool().is_some()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
        Column::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| if v.is_null() { None } else { Some(v.to_string()) })
            .collect();
        Column::new(name.into(), data)
    }
}

impl LabelTable {
    /// Entity, cutoff (Datetime ms, UTC), label and extra columns.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let entities: Vec<&str> = self.records.iter().map(|r| r.entity.as_str()).collect();
        let cutoffs: Vec<i64> = self.records.iter().map(|r| r.cutoff.timestamp_millis()).collect();
        let labels: Vec<&Value> = self.labels().collect();
        let extras = self.extra_columns();
        self.check_column_names(&extras)?;

        let mut columns = vec![
            Column::new(self.metadata.entity_column.as_str().into(), entities),
            Column::new(self.metadata.time_column.as_str().into(), cutoffs)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
            value_column(&self.metadata.label_name, &labels),
        ];

        for name in extras {
            let values: Vec<&Value> = self
                .records
                .iter()
                .map(|r| r.extra(&name).unwrap_or(&NULL))
                .collect();
            columns.push(value_column(&name, &values));
        }

        Ok(DataFrame::new(columns)?)
    }

    fn check_column_names(&self, extras: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        let names = [
            self.metadata.entity_column.as_str(),
            self.metadata.time_column.as_str(),
            self.metadata.label_name.as_str(),
        ];
        for name in names.into_iter().chain(extras.iter().map(String::as_str)) {
            if !seen.insert(name) {
                return Err(LabelcraftError::Transform(format!(
                    "output column '{}' is used more than once; rename the labeling function or its extra outputs",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        log::info!("Wrote {} label records to {}", df.height(), path.as_ref().display());
        Ok(())
    }

    /// Persist records and metadata so the table can be reloaded and described.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<LabelTable> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
