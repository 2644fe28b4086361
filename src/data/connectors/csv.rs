use super::{types::DatasetMetadata, validator::DataValidator};
use crate::data::events::EventFrame;
use crate::error::{LabelcraftError, Result};
use polars::prelude::*;
use std::path::Path;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame, parsing date-like text columns
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| LabelcraftError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.as_ref().display()
        );
        Ok(df)
    }

    /// Load a CSV event log and group it by entity
    pub fn load_events<P: AsRef<Path>>(
        path: P,
        entity_column: &str,
        time_column: &str,
    ) -> Result<(EventFrame, DatasetMetadata)> {
        let df = Self::load(&path)?;
        DataValidator::validate_event_columns(&df, entity_column, time_column)?;

        // Warn about nulls but don't fail; null keys and times fail in the adapter
        let null_counts = DataValidator::check_nulls(&df)?;
        if !null_counts.is_empty() {
            log::warn!("Null values detected: {:?}", null_counts);
        }

        let events = EventFrame::from_dataframe(&df, entity_column, time_column)?;
        let metadata = Self::create_metadata(&path, &df, &events, entity_column, time_column, null_counts);
        Ok((events, metadata))
    }

    pub fn create_metadata<P: AsRef<Path>>(
        path: P,
        df: &DataFrame,
        events: &EventFrame,
        entity_column: &str,
        time_column: &str,
        null_counts: Vec<(String, usize)>,
    ) -> DatasetMetadata {
        let first = events
            .groups()
            .iter()
            .filter_map(|g| events.timestamps(g).first())
            .min()
            .copied();
        let last = events
            .groups()
            .iter()
            .filter_map(|g| events.timestamps(g).last())
            .max()
            .copied();

        DatasetMetadata {
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: df.height(),
            num_columns: df.width(),
            columns: df.get_column_names().iter().map(|s| s.to_string()).collect(),
            entity_column: entity_column.to_string(),
            time_column: time_column.to_string(),
            num_entities: events.num_entities(),
            time_range: first.zip(last),
            null_counts,
        }
    }
}
