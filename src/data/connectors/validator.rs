use crate::error::{LabelcraftError, Result};
use polars::prelude::*;

pub struct DataValidator;

impl DataValidator {
    /// Fail with the first missing column, listing what the frame does have.
    pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        for column in required {
            if !available.iter().any(|name| name == column) {
                return Err(LabelcraftError::MissingColumn {
                    column: column.to_string(),
                    available,
                });
            }
        }
        Ok(())
    }

    /// Check the entity and time columns differ and exist
    pub fn validate_event_columns(df: &DataFrame, entity_column: &str, time_column: &str) -> Result<()> {
        if entity_column == time_column {
            return Err(LabelcraftError::invalid(
                "time_column",
                format!("'{}' is also the entity column", time_column),
            ));
        }
        Self::require_columns(df, &[entity_column, time_column])
    }

    /// Check for null values in every column
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for col_name in df.get_column_names() {
            let series = df.column(col_name)?;
            let null_count = series.null_count();
            if null_count > 0 {
                null_report.push((col_name.to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}
